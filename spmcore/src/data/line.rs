use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A one-dimensional array of scalar values with a physical extent, used
/// for axis calibrations and exported curves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct DataLine {
    pub res: usize,
    pub real: f64,
    pub offset: f64,
    pub data: Vec<f64>,
}

impl DataLine {
    /// Constructs a new `DataLine`.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not match `res`.
    pub fn new(res: usize, real: f64, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), res, "data length must match resolution");
        DataLine {
            res,
            real,
            offset: 0.0,
            data,
        }
    }

    pub fn zeros(res: usize, real: f64) -> Self {
        DataLine::new(res, real, vec![0.0; res])
    }

    #[inline]
    pub fn value(&self, i: usize) -> f64 {
        self.data[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_line() {
        let line = DataLine::new(3, 6.0, vec![1.0, 2.0, 3.0]);
        assert_eq!(line.res, 3);
        assert_eq!(line.value(1), 2.0);
        assert_eq!(line.offset, 0.0);
    }

    #[test]
    #[should_panic]
    fn test_length_mismatch() {
        let _ = DataLine::new(4, 1.0, vec![1.0]);
    }
}
