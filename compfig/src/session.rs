use std::path::PathBuf;

use tracing::info;

use crate::crop::CropStore;
use crate::document::{self, CompileStatus, LatexCommand};
use crate::error::Result;
use crate::figure::FigureJob;
use crate::flip::DiffTool;
use crate::metrics::CandidateMetrics;

/// What running one [`FigureJob`] produced.
#[derive(Debug, Clone)]
pub struct FigureOutcome {
    pub tex: PathBuf,
    /// `None` when compiling was skipped.
    pub compiled: Option<CompileStatus>,
    pub metrics: Vec<(String, CandidateMetrics)>,
}

/// Scratch state shared across the figures of one run: crop and FLIP
/// counters keep increasing from figure to figure.
pub struct Session<D: DiffTool> {
    pub crops: CropStore,
    pub diff: D,
    pub latex: LatexCommand,
    /// Skip the LaTeX engine regardless of the job's setting.
    pub no_compile: bool,
}

impl<D: DiffTool> Session<D> {
    pub fn new(crops: CropStore, diff: D, latex: LatexCommand) -> Self {
        Self {
            crops,
            diff,
            latex,
            no_compile: false,
        }
    }

    /// Render, write and optionally compile one figure.
    pub fn run(&mut self, job: &FigureJob) -> Result<FigureOutcome> {
        info!(kind = job.figure.kind(), "building {}", job.output.display());
        let rendered = job
            .figure
            .render(&job.options, &mut self.crops, &mut self.diff)?;
        document::write_standalone(&job.output, &rendered.body)?;

        let compiled = if job.compile && !self.no_compile {
            Some(document::compile(&job.output, &self.latex)?)
        } else {
            None
        };

        Ok(FigureOutcome {
            tex: job.output.clone(),
            compiled,
            metrics: rendered.metrics,
        })
    }
}
