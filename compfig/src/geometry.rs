//! Grid-space geometry for zoom boxes and crops.
//!
//! The reference image is addressed as a 10 x 10 grid with the origin at the
//! bottom-left corner, matching tikz coordinates inside a scope scaled to the
//! image node.

/// Number of grid cells along each image side.
pub const GRID: f64 = 10.0;

pub fn lerp(a: f64, t: f64, b: f64) -> f64 {
    (1.0 - t) * a + t * b
}

pub fn unlerp(a: f64, x: f64, b: f64) -> f64 {
    (x - a) / (b - a)
}

/// Map `x` from the range `[a, b]` onto `[c, d]`.
pub fn remap(a: f64, x: f64, b: f64, c: f64, d: f64) -> f64 {
    lerp(c, unlerp(a, x, b), d)
}

/// Concatenate a sequence of sequences.
pub fn flatten<I>(lists: I) -> impl Iterator<Item = <I::Item as IntoIterator>::Item>
where
    I: IntoIterator,
    I::Item: IntoIterator,
{
    lists.into_iter().flatten()
}

/// Pair up two slices element-wise and flatten: `[a0, b0, a1, b1, ...]`.
///
/// Stops at the shorter slice.
pub fn interleave<T: Clone>(a: &[T], b: &[T]) -> Vec<T> {
    flatten(a.iter().zip(b).map(|(x, y)| [x.clone(), y.clone()])).collect()
}

/// A square zoom box in grid units.
///
/// `size` is the horizontal extent; the vertical extent is `size * aspect`
/// so that the box is square in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBox {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl GridBox {
    pub const fn new(x: f64, y: f64, size: f64) -> Self {
        Self { x, y, size }
    }

    /// Top-right corner in grid units for the given aspect ratio.
    pub fn far_corner(&self, aspect: f64) -> (f64, f64) {
        (self.x + self.size, self.y + self.size * aspect)
    }

    /// Fractional trim that cuts this box out of the full image.
    pub fn trim(&self, aspect: f64) -> Trim {
        Trim {
            left: self.x / GRID,
            bottom: self.y / GRID,
            right: (GRID - self.x - self.size) / GRID,
            top: (GRID - self.y - self.size * aspect) / GRID,
        }
    }

    /// Express this box in the frame of a reference cropped by `crop`
    /// (grid units).
    pub fn reframe(&self, crop: &Trim) -> GridBox {
        let left = crop.left;
        let right = GRID - crop.right;
        let bottom = crop.bottom;
        let top = GRID - crop.top;

        GridBox {
            x: remap(left, self.x, right, 0.0, GRID),
            y: remap(bottom, self.y, top, 0.0, GRID),
            size: GRID / (right - left) * self.size,
        }
    }
}

impl From<[f64; 3]> for GridBox {
    fn from(v: [f64; 3]) -> Self {
        GridBox::new(v[0], v[1], v[2])
    }
}

/// Amount cut from each side: left, bottom, right, top.
///
/// Depending on context the values are grid units (0..10) or fractions of
/// the image width/height (0..1).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Trim {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Trim {
    pub const ZERO: Trim = Trim {
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
        top: 0.0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Trim::ZERO
    }

    /// Convert a grid-unit trim into a fractional one.
    pub fn grid_to_fraction(&self) -> Trim {
        Trim {
            left: self.left / GRID,
            bottom: self.bottom / GRID,
            right: self.right / GRID,
            top: self.top / GRID,
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.left, self.bottom, self.right, self.top]
    }
}

impl From<[f64; 4]> for Trim {
    fn from(v: [f64; 4]) -> Self {
        Trim {
            left: v[0],
            bottom: v[1],
            right: v[2],
            top: v[3],
        }
    }
}

/// Width / height in pixels.
pub fn aspect(width: u32, height: u32) -> f64 {
    width as f64 / height as f64
}

/// Aspect ratio of the visible part of an image cropped by `crop` (grid units).
pub fn cropped_aspect(width: u32, height: u32, crop: &Trim) -> f64 {
    (width as f64 * (GRID - crop.right - crop.left)) / (height as f64 * (GRID - crop.top - crop.bottom))
}

/// Reference column width (fraction of `\textwidth`) that makes the full
/// reference as tall as the stacked pair of squares next to it.
pub fn auto_ref_width(count: usize, aspect: f64, margin: f64) -> f64 {
    let n = count as f64;
    (n * aspect * ((2.0 - 4.0 * n * margin) / n + 2.0 * margin)) / (n + 2.0 * aspect)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        assert_eq!(lerp(2.0, 0.0, 6.0), 2.0);
        assert_eq!(lerp(2.0, 1.0, 6.0), 6.0);
        assert_eq!(lerp(2.0, 0.5, 6.0), 4.0);
    }

    #[test]
    fn unlerp_inverts_lerp() {
        let t = unlerp(2.0, lerp(2.0, 0.3, 6.0), 6.0);
        assert!(close(t, 0.3));
    }

    #[test]
    fn remap_between_ranges() {
        assert!(close(remap(0.0, 5.0, 10.0, 0.0, 1.0), 0.5));
        assert!(close(remap(2.0, 2.0, 8.0, 0.0, 10.0), 0.0));
        assert!(close(remap(2.0, 8.0, 8.0, 0.0, 10.0), 10.0));
    }

    #[test]
    fn flatten_and_interleave() {
        let nested = vec![vec![1, 2], vec![], vec![3]];
        assert_eq!(flatten(nested).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(interleave(&["a", "b"], &["x", "y", "z"]), vec!["a", "x", "b", "y"]);
    }

    #[test]
    fn box_trim_square_image() {
        let trim = GridBox::new(0.0, 0.0, 1.0).trim(1.0);
        assert_eq!(trim.left, 0.0);
        assert_eq!(trim.bottom, 0.0);
        assert!(close(trim.right, 0.9));
        assert!(close(trim.top, 0.9));
    }

    #[test]
    fn box_trim_uses_aspect_for_height() {
        let trim = GridBox::new(1.0, 2.0, 2.0).trim(2.0);
        assert!(close(trim.left, 0.1));
        assert!(close(trim.bottom, 0.2));
        assert!(close(trim.right, 0.7));
        // 10 - 2 - 2*2 = 4
        assert!(close(trim.top, 0.4));
    }

    #[test]
    fn reframe_zero_crop_is_identity() {
        let b = GridBox::new(5.5, 2.0, 3.0);
        assert_eq!(b.reframe(&Trim::ZERO), b);
    }

    #[test]
    fn reframe_into_cropped_reference() {
        // Visible area spans x 4..9, y 2..9.
        let crop = Trim::from([4.0, 2.0, 1.0, 1.0]);
        let b = GridBox::new(6.5, 5.5, 1.0).reframe(&crop);
        assert!(close(b.x, 5.0));
        assert!(close(b.y, 5.0));
        assert!(close(b.size, 2.0));
    }

    #[test]
    fn cropped_aspect_matches_visible_region() {
        assert!(close(cropped_aspect(200, 100, &Trim::ZERO), 2.0));
        // 200 * 5 / (100 * 5)
        let crop = Trim::from([3.0, 2.0, 2.0, 3.0]);
        assert!(close(cropped_aspect(200, 100, &crop), 2.0));
        let crop = Trim::from([0.0, 1.5, 0.0, 2.0]);
        assert!(close(cropped_aspect(100, 100, &crop), 10.0 / 6.5));
    }

    #[test]
    fn grid_crop_to_fraction() {
        let t = Trim::from([0.0, 1.5, 0.0, 2.0]).grid_to_fraction();
        assert_eq!(t.to_array(), [0.0, 0.15, 0.0, 0.2]);
    }

    #[test]
    fn auto_width_single_square_image() {
        // One image, square: (1 * 1 * ((2 - 4m) + 2m)) / 3
        let m = 0.005;
        let w = auto_ref_width(1, 1.0, m);
        assert!(close(w, (2.0 - 2.0 * m) / 3.0));
    }

    #[test]
    fn far_corner_scales_height() {
        assert_eq!(GridBox::new(1.0, 1.0, 2.0).far_corner(1.5), (3.0, 4.0));
    }
}
