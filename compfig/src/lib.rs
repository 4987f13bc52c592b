pub mod error;
pub mod geometry;
pub mod metrics;
pub mod crop;
pub mod flip;
pub mod latex;
pub mod layout;
pub mod figure;
pub mod document;
pub mod session;
#[cfg(feature = "serde")]
pub mod config;

pub use error::{Error, Result};
pub use figure::{Figure, FigureJob, LabeledImage, Series};
pub use layout::FigureOptions;
pub use session::Session;
