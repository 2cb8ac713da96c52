use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::data::line::DataLine;

/// A dense three-dimensional block of scalar values, one spectrum of
/// length `zres` per spatial pixel `(x, y)`.
///
/// Values are stored plane by plane: the element at `(x, y, z)` lives at
/// `z * xres * yres + y * xres + x`, so one z-plane is a contiguous
/// `xres * yres` slice. Physical extents and offsets are carried along
/// untouched; the brick does not interpret units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Brick {
    pub xres: usize,
    pub yres: usize,
    pub zres: usize,
    pub xreal: f64,
    pub yreal: f64,
    pub zreal: f64,
    pub xoffset: f64,
    pub yoffset: f64,
    pub zoffset: f64,
    pub data: Vec<f64>,
    /// Optional calibration of the z axis, `zres` values when present.
    pub zcalibration: Option<DataLine>,
}

impl Brick {
    /// Constructs a new `Brick` from plane-major data.
    ///
    /// # Arguments
    ///
    /// * `xres`, `yres`, `zres` - grid resolution per axis.
    /// * `xreal`, `yreal`, `zreal` - physical extent per axis.
    /// * `data` - `xres * yres * zres` values, plane by plane.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not match the resolution product.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use spmcore::data::brick::Brick;
    /// let brick = Brick::new(1, 1, 2, 1.0, 1.0, 2.0, vec![0.5, 1.5]);
    /// assert_eq!(brick.value(0, 0, 1), 1.5);
    /// ```
    pub fn new(
        xres: usize,
        yres: usize,
        zres: usize,
        xreal: f64,
        yreal: f64,
        zreal: f64,
        data: Vec<f64>,
    ) -> Self {
        assert_eq!(
            data.len(),
            xres * yres * zres,
            "data length must match resolution"
        );
        Brick {
            xres,
            yres,
            zres,
            xreal,
            yreal,
            zreal,
            xoffset: 0.0,
            yoffset: 0.0,
            zoffset: 0.0,
            data,
            zcalibration: None,
        }
    }

    /// A zero-filled brick with the same shape, extents and offsets as
    /// `self`. The z calibration is not carried over.
    pub fn new_alike(&self) -> Self {
        let mut brick = Brick::new(
            self.xres,
            self.yres,
            self.zres,
            self.xreal,
            self.yreal,
            self.zreal,
            vec![0.0; self.data.len()],
        );
        brick.xoffset = self.xoffset;
        brick.yoffset = self.yoffset;
        brick.zoffset = self.zoffset;
        brick
    }

    pub fn with_zcalibration(mut self, calibration: DataLine) -> Self {
        self.zcalibration = Some(calibration);
        self
    }

    /// Number of spatial pixels, i.e. spectra.
    #[inline]
    pub fn npix(&self) -> usize {
        self.xres * self.yres
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.xres * self.yres + y * self.xres + x
    }

    #[inline]
    pub fn value(&self, x: usize, y: usize, z: usize) -> f64 {
        self.data[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set_value(&mut self, x: usize, y: usize, z: usize, value: f64) {
        let idx = self.idx(x, y, z);
        self.data[idx] = value;
    }

    /// Smallest value in the brick, positive infinity when empty.
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_major_layout() {
        // 2x2x2, planes filled 0..4 and 4..8
        let data: Vec<f64> = (0..8).map(|v| v as f64).collect();
        let brick = Brick::new(2, 2, 2, 1.0, 1.0, 1.0, data);
        assert_eq!(brick.value(0, 0, 0), 0.0);
        assert_eq!(brick.value(1, 0, 0), 1.0);
        assert_eq!(brick.value(0, 1, 0), 2.0);
        assert_eq!(brick.value(0, 0, 1), 4.0);
        assert_eq!(brick.value(1, 1, 1), 7.0);
    }

    #[test]
    fn test_new_alike_keeps_shape_and_offsets() {
        let mut brick = Brick::new(2, 1, 3, 4.0, 2.0, 9.0, vec![1.0; 6]);
        brick.zoffset = -1.5;
        let alike = brick.new_alike();
        assert_eq!(alike.xres, 2);
        assert_eq!(alike.zres, 3);
        assert_eq!(alike.zreal, 9.0);
        assert_eq!(alike.zoffset, -1.5);
        assert!(alike.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_min() {
        let brick = Brick::new(1, 2, 2, 1.0, 1.0, 1.0, vec![3.0, -2.0, 0.5, 8.0]);
        assert_eq!(brick.min(), -2.0);
    }
}
