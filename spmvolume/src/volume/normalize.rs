use rayon::prelude::*;
use spmcore::data::brick::Brick;
use spmcore::data::field::DataField;

/// Area-normalizes every pixel spectrum of a brick.
///
/// Each value becomes `(value - min) * zres / integral`, where `min` is
/// the global brick minimum and `integral` is the pixel's sum of
/// `value - min` over z. After the pass the integral of every rescaled
/// spectrum equals `zres`, removing per-pixel intensity bias while
/// preserving relative shape. Pixels whose integral is zero are left at
/// the neutral value instead of being divided.
///
/// Returns the normalized brick together with a map of the pre-normalized
/// intensity, `integral / zres` per pixel.
pub fn normalize_brick(brick: &Brick) -> (Brick, DataField) {
    let npix = brick.npix();
    let zres = brick.zres;
    if npix == 0 || zres == 0 {
        let intensity = DataField::zeros(brick.xres, brick.yres, brick.xreal, brick.yreal);
        return (brick.new_alike(), intensity);
    }
    let wmin = brick.min();

    let integrals: Vec<f64> = (0..npix)
        .into_par_iter()
        .map(|pix| {
            let mut integral = 0.0;
            for l in 0..zres {
                integral += brick.data[l * npix + pix] - wmin;
            }
            integral
        })
        .collect();

    let mut result = brick.new_alike();
    result
        .data
        .par_chunks_mut(npix)
        .enumerate()
        .for_each(|(l, plane)| {
            let source = &brick.data[l * npix..(l + 1) * npix];
            for (pix, value) in plane.iter_mut().enumerate() {
                if integrals[pix] != 0.0 {
                    *value = (source[pix] - wmin) * zres as f64 / integrals[pix];
                }
            }
        });

    let mut intensity = DataField::zeros(brick.xres, brick.yres, brick.xreal, brick.yreal);
    intensity.xoffset = brick.xoffset;
    intensity.yoffset = brick.yoffset;
    for (pix, value) in intensity.data.iter_mut().enumerate() {
        *value = integrals[pix] / zres as f64;
    }

    (result, intensity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel_normalization() {
        let brick = Brick::new(1, 1, 3, 1.0, 1.0, 3.0, vec![1.0, 2.0, 3.0]);
        let (normalized, intensity) = normalize_brick(&brick);
        // min = 1, integral = 0 + 1 + 2 = 3, scale = zres / integral = 1
        assert_eq!(normalized.data, vec![0.0, 1.0, 2.0]);
        assert_eq!(intensity.data, vec![1.0]);
    }

    #[test]
    fn test_per_pixel_scaling() {
        // pixel 0 spectrum [0, 2], pixel 1 spectrum [4, 4]; global min 0
        let brick = Brick::new(2, 1, 2, 1.0, 1.0, 2.0, vec![0.0, 4.0, 2.0, 4.0]);
        let (normalized, intensity) = normalize_brick(&brick);
        assert_eq!(normalized.value(0, 0, 0), 0.0);
        assert_eq!(normalized.value(0, 0, 1), 2.0);
        assert_eq!(normalized.value(1, 0, 0), 1.0);
        assert_eq!(normalized.value(1, 0, 1), 1.0);
        assert_eq!(intensity.data, vec![1.0, 4.0]);
    }

    #[test]
    fn test_zero_integral_left_neutral() {
        // Every value equals the global minimum, so all integrals vanish.
        let brick = Brick::new(2, 2, 3, 1.0, 1.0, 1.0, vec![5.0; 12]);
        let (normalized, intensity) = normalize_brick(&brick);
        assert!(normalized.data.iter().all(|&v| v == 0.0));
        assert!(intensity.data.iter().all(|&v| v == 0.0));
        assert!(normalized.data.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_metadata_carried_over() {
        let mut brick = Brick::new(2, 1, 2, 4.0, 2.0, 1.0, vec![0.0, 1.0, 2.0, 3.0]);
        brick.xoffset = -1.0;
        let (normalized, intensity) = normalize_brick(&brick);
        assert_eq!(normalized.xreal, 4.0);
        assert_eq!(normalized.xoffset, -1.0);
        assert_eq!(intensity.xreal, 4.0);
        assert_eq!(intensity.xoffset, -1.0);
    }
}
