//! Perceptual difference images via the external FLIP tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Summary statistics FLIP prints for a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlipStats {
    pub mean: Option<f64>,
    pub weighted_median: Option<f64>,
    pub first_quartile: Option<f64>,
    pub third_quartile: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FlipStats {
    /// Parse `Key: value` lines from FLIP's stdout. Unknown lines are ignored.
    pub fn parse(output: &str) -> FlipStats {
        let mut stats = FlipStats::default();
        for line in output.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let Ok(value) = value.trim().parse::<f64>() else {
                continue;
            };
            let slot = match key.trim().to_ascii_lowercase().as_str() {
                "mean" => &mut stats.mean,
                "weighted median" => &mut stats.weighted_median,
                "1st weighted quartile" => &mut stats.first_quartile,
                "3rd weighted quartile" => &mut stats.third_quartile,
                "min" => &mut stats.min,
                "max" => &mut stats.max,
                _ => continue,
            };
            *slot = Some(value);
        }
        stats
    }
}

/// A difference image on disk plus whatever statistics came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipOutput {
    pub image: PathBuf,
    pub stats: FlipStats,
}

/// Anything that can turn a reference/test pair into a difference image.
pub trait DiffTool {
    fn diff(&mut self, reference: &Path, test: &Path) -> Result<FlipOutput>;
}

/// Settings for invoking FLIP as a subprocess.
#[derive(Debug, Clone)]
pub struct FlipConfig {
    /// Interpreter or executable to run.
    pub program: String,
    /// Script passed as the first argument; omitted when `None`.
    pub script: Option<PathBuf>,
    /// Directory the difference images are written to.
    pub dir: PathBuf,
}

impl Default for FlipConfig {
    fn default() -> Self {
        Self {
            program: "python".into(),
            script: Some(PathBuf::from("./flip/python/flip.py")),
            dir: PathBuf::from(".flip"),
        }
    }
}

/// Runs FLIP once per comparison, numbering outputs `1.png`, `2.png`, ...
#[derive(Debug)]
pub struct FlipCli {
    config: FlipConfig,
    count: usize,
}

impl FlipCli {
    pub fn new(config: FlipConfig) -> Self {
        Self { config, count: 0 }
    }

    /// Number of difference images requested so far.
    pub fn count(&self) -> usize {
        self.count
    }

    fn command(&self, reference: &Path, test: &Path, dir: &Path, basename: &str) -> Command {
        let mut cmd = Command::new(&self.config.program);
        if let Some(script) = &self.config.script {
            cmd.arg(absolute(script));
        }
        cmd.arg("-r")
            .arg(reference)
            .arg("-t")
            .arg(test)
            .arg("-d")
            .arg(dir)
            .arg("-b")
            .arg(basename);
        cmd
    }
}

impl DiffTool for FlipCli {
    fn diff(&mut self, reference: &Path, test: &Path) -> Result<FlipOutput> {
        self.count += 1;
        std::fs::create_dir_all(&self.config.dir)?;
        let dir = absolute(&self.config.dir);
        let basename = self.count.to_string();

        let mut cmd = self.command(reference, test, &dir, &basename);
        info!("flip nr {}", self.count);
        debug!("{cmd:?}");

        let output = cmd.output().map_err(|source| Error::FlipSpawn {
            program: self.config.program.clone(),
            source,
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("{}", stdout.trim_end());
        if !output.status.success() {
            return Err(Error::FlipFailed {
                test: test.to_path_buf(),
                status: output.status.to_string(),
            });
        }

        let image = dir.join(format!("{basename}.png"));
        if !image.exists() {
            return Err(Error::FlipMissingOutput(image));
        }
        Ok(FlipOutput {
            image,
            stats: FlipStats::parse(&stdout),
        })
    }
}

/// Absolute form of `path` without requiring it to exist.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Invoking LDR-FLIP
\tPixels per degree: 67
Mean: 0.045312
Weighted median: 0.078125
1st weighted quartile: 0.031250
3rd weighted quartile: 0.125000
Min: 0.000000
Max: 0.703125
Evaluation time: 0.1234 seconds
";

    #[test]
    fn parses_all_statistics() {
        let stats = FlipStats::parse(SAMPLE);
        assert_eq!(stats.mean, Some(0.045312));
        assert_eq!(stats.weighted_median, Some(0.078125));
        assert_eq!(stats.first_quartile, Some(0.03125));
        assert_eq!(stats.third_quartile, Some(0.125));
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(0.703125));
    }

    #[test]
    fn missing_keys_stay_empty() {
        let stats = FlipStats::parse("Mean: 0.5\nsomething else\nMax: n/a\n");
        assert_eq!(stats.mean, Some(0.5));
        assert_eq!(stats.max, None);
        assert_eq!(stats.min, None);
    }

    #[test]
    fn command_line_layout() {
        let flip = FlipCli::new(FlipConfig {
            program: "flip".into(),
            script: None,
            dir: PathBuf::from("out"),
        });
        let cmd = flip.command(Path::new("ref.png"), Path::new("test.png"), Path::new("/abs/out"), "3");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(cmd.get_program(), "flip");
        assert_eq!(args, ["-r", "ref.png", "-t", "test.png", "-d", "/abs/out", "-b", "3"]);
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut flip = FlipCli::new(FlipConfig {
            program: "compfig-no-such-flip-binary".into(),
            script: None,
            dir: dir.path().join("flip"),
        });
        let err = flip
            .diff(Path::new("a.png"), Path::new("b.png"))
            .unwrap_err();
        assert!(matches!(err, Error::FlipSpawn { .. }));
        assert_eq!(flip.count(), 1);
    }

    #[cfg(unix)]
    fn shell_tool(program: &str, dir: &Path) -> FlipCli {
        FlipCli::new(FlipConfig {
            program: program.into(),
            script: None,
            dir: dir.join("flip"),
        })
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut flip = shell_tool("false", dir.path());
        let err = flip
            .diff(Path::new("a.png"), Path::new("b.png"))
            .unwrap_err();
        match err {
            Error::FlipFailed { test, .. } => assert_eq!(test, PathBuf::from("b.png")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn success_without_image_is_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut flip = shell_tool("true", dir.path());
        let err = flip
            .diff(Path::new("a.png"), Path::new("b.png"))
            .unwrap_err();
        match err {
            Error::FlipMissingOutput(path) => {
                assert!(path.is_absolute());
                assert!(path.ends_with("flip/1.png"), "{}", path.display());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
