//! TOML job files describing the figures to build.

use std::path::PathBuf;

use serde::Deserialize;

use crate::crop::{CropStore, DEFAULT_CROP_DIR};
use crate::document::LatexCommand;
use crate::error::{Error, Result};
use crate::figure::{Figure, FigureJob, LabeledImage, Series};
use crate::flip::FlipConfig;
use crate::geometry::{GridBox, Trim};
use crate::layout::FigureOptions;

/// A whole job file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default, rename = "figure")]
    pub figures: Vec<FigureConfig>,
}

impl JobConfig {
    pub fn from_toml(toml_str: &str) -> Result<JobConfig> {
        toml::from_str(toml_str).map_err(|e| Error::Config(e.to_string()))
    }

    /// Validate every figure and turn it into a job.
    pub fn jobs(&self) -> Result<Vec<FigureJob>> {
        self.figures.iter().map(FigureConfig::to_job).collect()
    }
}

/// External tool settings; every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub flip_program: String,
    /// Empty string runs `flip_program` without a script argument.
    pub flip_script: String,
    pub flip_dir: PathBuf,
    pub crop_dir: PathBuf,
    /// Crop zoom squares into scratch files instead of trimming in LaTeX.
    pub precrop: bool,
    pub latex: String,
    pub latex_args: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let flip = FlipConfig::default();
        let latex = LatexCommand::default();
        Self {
            flip_program: flip.program,
            flip_script: flip
                .script
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            flip_dir: flip.dir,
            crop_dir: PathBuf::from(DEFAULT_CROP_DIR),
            precrop: true,
            latex: latex.program,
            latex_args: latex.args,
        }
    }
}

impl ToolsConfig {
    pub fn flip_config(&self) -> FlipConfig {
        FlipConfig {
            program: self.flip_program.clone(),
            script: (!self.flip_script.is_empty()).then(|| PathBuf::from(&self.flip_script)),
            dir: self.flip_dir.clone(),
        }
    }

    pub fn crop_store(&self) -> CropStore {
        if self.precrop {
            CropStore::new(&self.crop_dir)
        } else {
            CropStore::passthrough()
        }
    }

    pub fn latex_command(&self) -> LatexCommand {
        LatexCommand {
            program: self.latex.clone(),
            args: self.latex_args.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FigureKind {
    OneLine,
    VerticalFlip,
    HorizontalIterations,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    #[serde(default)]
    pub label: Option<String>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesConfig {
    pub label: String,
    pub paths: Vec<PathBuf>,
}

/// One `[[figure]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FigureConfig {
    pub kind: FigureKind,
    pub output: PathBuf,
    #[serde(default = "default_compile")]
    pub compile: bool,
    pub reference: ImageConfig,
    #[serde(default)]
    pub candidates: Vec<ImageConfig>,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    #[serde(default)]
    pub ref_crop: Option<[f64; 4]>,
    #[serde(default)]
    pub ref_width: Option<f64>,
    #[serde(default)]
    pub margin: Option<f64>,
    #[serde(default)]
    pub box1: Option<[f64; 3]>,
    #[serde(default)]
    pub box2: Option<[f64; 3]>,
    #[serde(default)]
    pub show_grid: bool,
}

fn default_compile() -> bool {
    true
}

impl FigureConfig {
    pub fn options(&self) -> FigureOptions {
        let defaults = FigureOptions::default();
        FigureOptions {
            ref_crop: self.ref_crop.map(Trim::from).unwrap_or(defaults.ref_crop),
            ref_width: self.ref_width,
            margin: self.margin.unwrap_or(defaults.margin),
            box1: self.box1.map(GridBox::from).unwrap_or(defaults.box1),
            box2: self.box2.map(GridBox::from).unwrap_or(defaults.box2),
            show_grid: self.show_grid,
        }
    }

    pub fn to_job(&self) -> Result<FigureJob> {
        let reference = image_of(&self.reference);
        let candidates: Vec<LabeledImage> = self.candidates.iter().map(image_of).collect();
        let invalid = |msg: &str| {
            Error::InvalidFigure(format!("{}: {msg}", self.output.display()))
        };

        let figure = match self.kind {
            FigureKind::OneLine | FigureKind::VerticalFlip if !self.series.is_empty() => {
                return Err(invalid("`series` is only used by horizontal-iterations"));
            }
            FigureKind::HorizontalIterations if !self.candidates.is_empty() => {
                return Err(invalid("horizontal-iterations takes `series`, not `candidates`"));
            }
            FigureKind::OneLine => Figure::OneLine {
                reference,
                candidates,
            },
            FigureKind::VerticalFlip => Figure::VerticalFlip {
                reference,
                candidates,
            },
            FigureKind::HorizontalIterations => Figure::HorizontalIterations {
                reference,
                series: self
                    .series
                    .iter()
                    .map(|s| Series::new(s.label.clone(), s.paths.clone()))
                    .collect(),
            },
        };

        let options = self.options();
        figure
            .validate(&options)
            .map_err(|e| invalid(&e.to_string()))?;

        Ok(FigureJob {
            output: self.output.clone(),
            compile: self.compile,
            figure,
            options,
        })
    }
}

fn image_of(c: &ImageConfig) -> LabeledImage {
    LabeledImage::new(c.label.clone(), c.path.clone())
}
