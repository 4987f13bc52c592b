//! Standalone LaTeX documents and compiling them to PDF.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::latex::Latex;

const PREAMBLE: &str = r"\documentclass[preview]{standalone}
\usepackage{tikz}
\usepackage{adjustbox}
\usetikzlibrary{calc}

\begin{document}";

/// Wrap a figure body in a `standalone` document.
pub fn standalone(body: &Latex) -> String {
    let mut doc = String::with_capacity(PREAMBLE.len() + body.as_str().len() + 16);
    doc.push_str(PREAMBLE);
    doc.push_str(body.as_str());
    doc.push_str("\\end{document}\n");
    doc
}

/// Write `body` as a standalone document to `path`.
pub fn write_standalone(path: &Path, body: &Latex) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, standalone(body))?;
    info!("wrote {}", path.display());
    Ok(())
}

/// The LaTeX engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct LatexCommand {
    pub program: String,
    /// Extra arguments placed before the file name.
    pub args: Vec<String>,
}

impl Default for LatexCommand {
    fn default() -> Self {
        Self {
            program: "pdflatex".into(),
            args: Vec::new(),
        }
    }
}

/// Result of running the LaTeX engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileStatus {
    pub success: bool,
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

/// Run the LaTeX engine on `tex`. A failing engine is reported through the
/// returned status, not as an error.
pub fn compile(tex: &Path, latex: &LatexCommand) -> Result<CompileStatus> {
    let mut cmd = Command::new(&latex.program);
    cmd.args(&latex.args).arg(tex);
    info!("compiling {}", tex.display());
    debug!("{cmd:?}");

    let status = cmd.status().map_err(|source| Error::CompileSpawn {
        program: latex.program.clone(),
        source,
    })?;
    let result = CompileStatus {
        success: status.success(),
        code: status.code(),
    };
    if result.success {
        info!("compiled {}", tex.display());
    } else {
        warn!(code = ?result.code, "{} failed on {}", latex.program, tex.display());
    }
    Ok(result)
}
