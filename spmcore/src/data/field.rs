use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A dense two-dimensional map of scalar values with spatial metadata.
///
/// Rows are stored contiguously: the element at `(x, y)` lives at
/// `y * xres + x`. This is the output carrier for per-pixel maps derived
/// from volume data (cluster indices, residuals, intensities).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct DataField {
    pub xres: usize,
    pub yres: usize,
    pub xreal: f64,
    pub yreal: f64,
    pub xoffset: f64,
    pub yoffset: f64,
    pub data: Vec<f64>,
}

impl DataField {
    /// Constructs a new `DataField` from row-major data.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not match `xres * yres`.
    pub fn new(xres: usize, yres: usize, xreal: f64, yreal: f64, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), xres * yres, "data length must match resolution");
        DataField {
            xres,
            yres,
            xreal,
            yreal,
            xoffset: 0.0,
            yoffset: 0.0,
            data,
        }
    }

    /// A zero-filled field of the given shape.
    pub fn zeros(xres: usize, yres: usize, xreal: f64, yreal: f64) -> Self {
        DataField::new(xres, yres, xreal, yreal, vec![0.0; xres * yres])
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.xres + x
    }

    #[inline]
    pub fn value(&self, x: usize, y: usize) -> f64 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set_value(&mut self, x: usize, y: usize, value: f64) {
        let idx = self.idx(x, y);
        self.data[idx] = value;
    }

    /// Adds a constant to every value in place.
    pub fn add(&mut self, value: f64) {
        for v in self.data.iter_mut() {
            *v += value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing() {
        let mut field = DataField::zeros(3, 2, 1.0, 1.0);
        field.set_value(2, 1, 7.0);
        assert_eq!(field.value(2, 1), 7.0);
        assert_eq!(field.data[5], 7.0);
    }

    #[test]
    fn test_add() {
        let mut field = DataField::new(2, 1, 1.0, 1.0, vec![1.0, 2.0]);
        field.add(1.0);
        assert_eq!(field.data, vec![2.0, 3.0]);
    }
}
