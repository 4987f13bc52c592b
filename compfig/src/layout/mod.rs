//! Table layouts that place reference, zoom squares, FLIP images and
//! metric tables.

pub mod columns;
pub mod iterations;
pub mod one_line;

pub use columns::columns;
pub use iterations::iteration_columns;
pub use one_line::one_line;

use crate::geometry::{GridBox, Trim};

/// Layout parameters shared by every figure.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureOptions {
    /// Crop applied to the full reference, in grid units (left, bottom,
    /// right, top).
    pub ref_crop: Trim,
    /// Reference column width as a fraction of `\textwidth`; computed from
    /// the aspect ratio when `None`.
    pub ref_width: Option<f64>,
    /// Column separation as a fraction of `\textwidth`.
    pub margin: f64,
    /// First (orange) zoom box.
    pub box1: GridBox,
    /// Second (blue) zoom box.
    pub box2: GridBox,
    /// Overlay the 10 x 10 grid on the reference.
    pub show_grid: bool,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            ref_crop: Trim::ZERO,
            ref_width: None,
            margin: 0.005,
            box1: GridBox::new(0.0, 0.0, 1.0),
            box2: GridBox::new(1.0, 1.0, 1.0),
            show_grid: false,
        }
    }
}
