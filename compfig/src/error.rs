use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("image size mismatch: reference is {expected:?}, {path} is {actual:?}")]
    SizeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("image {width}x{height} is smaller than the {window}x{window} SSIM window")]
    WindowTooLarge { width: u32, height: u32, window: u32 },

    #[error("trim {0:?} leaves an empty crop")]
    EmptyCrop([f64; 4]),

    #[error("failed to run FLIP ({program}): {source}")]
    FlipSpawn {
        program: String,
        source: std::io::Error,
    },

    #[error("FLIP exited with {status} for {test}")]
    FlipFailed { test: PathBuf, status: String },

    #[error("FLIP did not produce {0}")]
    FlipMissingOutput(PathBuf),

    #[error("failed to run {program}: {source}")]
    CompileSpawn {
        program: String,
        source: std::io::Error,
    },

    #[error("invalid figure: {0}")]
    InvalidFigure(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
