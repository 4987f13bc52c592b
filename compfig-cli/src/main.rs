use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use compfig::config::JobConfig;
use compfig::flip::{DiffTool, FlipCli, FlipConfig};
use compfig::metrics;
use compfig::Session;

mod report;

/// Reference/candidate comparison figures for LaTeX
#[derive(Parser)]
#[command(name = "compfig", version)]
struct Cli {
    /// Log debug output (commands, box geometry, FLIP output)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the figures of a job file
    Render {
        /// Path to the .toml job file
        job: PathBuf,
        /// Only build the figure with this output path
        #[arg(long)]
        figure: Option<PathBuf>,
        /// Write .tex files without running LaTeX
        #[arg(long)]
        no_compile: bool,
    },
    /// Print similarity metrics of candidates against a reference
    Metrics {
        /// Reference image
        #[arg(short, long)]
        reference: PathBuf,
        /// Candidate images
        #[arg(required = true)]
        candidates: Vec<PathBuf>,
        /// Also run FLIP and report its statistics
        #[arg(long)]
        flip: bool,
        /// FLIP executable or interpreter
        #[arg(long, default_value = "python")]
        flip_program: String,
        /// FLIP script passed to the interpreter (empty for none)
        #[arg(long, default_value = "./flip/python/flip.py")]
        flip_script: String,
        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Parse and validate a job file without building anything
    Check {
        /// Path to the .toml job file
        job: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Render {
            job,
            figure,
            no_compile,
        } => cmd_render(&job, figure.as_deref(), no_compile),
        Command::Metrics {
            reference,
            candidates,
            flip,
            flip_program,
            flip_script,
            json,
            pretty,
        } => {
            let flip = flip.then(|| FlipConfig {
                program: flip_program,
                script: (!flip_script.is_empty()).then(|| PathBuf::from(flip_script)),
                ..FlipConfig::default()
            });
            cmd_metrics(&reference, &candidates, flip, json, pretty)
        }
        Command::Check { job } => cmd_check(&job),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_job(path: &Path) -> Result<JobConfig> {
    let toml_str =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    JobConfig::from_toml(&toml_str).with_context(|| format!("parsing {}", path.display()))
}

fn cmd_render(job_path: &Path, only: Option<&Path>, no_compile: bool) -> Result<()> {
    let job = load_job(job_path)?;
    let mut jobs = job
        .jobs()
        .with_context(|| format!("validating {}", job_path.display()))?;

    if let Some(only) = only {
        jobs.retain(|j| same_output(&j.output, only));
        anyhow::ensure!(
            !jobs.is_empty(),
            "no figure with output '{}' in {}",
            only.display(),
            job_path.display()
        );
    }
    anyhow::ensure!(!jobs.is_empty(), "{} defines no figures", job_path.display());

    let tools = &job.tools;
    let mut session = Session::new(
        tools.crop_store(),
        FlipCli::new(tools.flip_config()),
        tools.latex_command(),
    );
    session.no_compile = no_compile;

    let mut failed = Vec::new();
    for j in &jobs {
        let outcome = session
            .run(j)
            .with_context(|| format!("building {}", j.output.display()))?;

        if !outcome.metrics.is_empty() {
            println!("{}", j.output.display());
            report::print_metrics(&outcome.metrics);
        }
        match outcome.compiled {
            Some(status) if !status.success => {
                warn!(code = ?status.code, "no PDF for {}", outcome.tex.display());
                failed.push(outcome.tex);
            }
            Some(_) => println!("compiled {}", outcome.tex.display()),
            None => println!("wrote {}", outcome.tex.display()),
        }
    }

    if !failed.is_empty() {
        let names: Vec<String> = failed.iter().map(|p| p.display().to_string()).collect();
        anyhow::bail!("LaTeX failed for: {}", names.join(", "));
    }
    Ok(())
}

/// Output paths are equal once `.` components are dropped, so `./a.tex`
/// selects `output = "a.tex"`.
fn same_output(a: &Path, b: &Path) -> bool {
    let plain = |p: &Path| -> PathBuf {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    };
    plain(a) == plain(b)
}

fn cmd_metrics(
    reference: &Path,
    candidates: &[PathBuf],
    flip: Option<FlipConfig>,
    json: bool,
    pretty: bool,
) -> Result<()> {
    let similarity = metrics::similarity_all(reference, candidates)
        .with_context(|| format!("comparing against {}", reference.display()))?;

    let mut flip_tool = flip.map(FlipCli::new);
    let mut rows = Vec::with_capacity(candidates.len());
    for (path, s) in candidates.iter().zip(similarity) {
        let flip = match flip_tool.as_mut() {
            Some(tool) => Some(
                tool.diff(reference, path)
                    .with_context(|| format!("running FLIP on {}", path.display()))?,
            ),
            None => None,
        };
        rows.push(report::MetricsRow::new(path, &s, flip.as_ref()));
    }

    if json {
        println!("{}", report::to_json(reference, &rows, pretty)?);
    } else {
        report::print_terminal(&rows);
    }
    Ok(())
}

fn cmd_check(job_path: &Path) -> Result<()> {
    let job = load_job(job_path)?;
    let jobs = job
        .jobs()
        .with_context(|| format!("validating {}", job_path.display()))?;

    println!("{:<24} {:<32} {:>10} {:>8}", "Kind", "Output", "Images", "Compile");
    println!("{}", "-".repeat(77));
    for j in &jobs {
        let images = match &j.figure {
            compfig::Figure::OneLine { candidates, .. }
            | compfig::Figure::VerticalFlip { candidates, .. } => candidates.len() + 1,
            compfig::Figure::HorizontalIterations { series, .. } => {
                series.iter().map(|s| s.paths.len()).sum::<usize>() + 1
            }
        };
        println!(
            "{:<24} {:<32} {:>10} {:>8}",
            j.figure.kind(),
            j.output.display().to_string(),
            images,
            if j.compile { "yes" } else { "no" }
        );
    }
    info!("{} figure(s) ok", jobs.len());
    Ok(())
}
