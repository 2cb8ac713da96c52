use bincode::{Decode, Encode};
use itertools::Itertools;
use log::{debug, warn};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use spmcore::data::brick::Brick;
use spmcore::data::field::DataField;

use crate::volume::normalize::normalize_brick;
use crate::volume::utility::{median_in_place, squared_distance};

/// Errors produced by volume clustering.
#[derive(Error, Debug)]
pub enum VolumeError {
    /// Structurally unusable input brick.
    #[error("invalid input brick: {0}")]
    InvalidInput(String),
}

/// Options for K-medians clustering of a brick.
///
/// All values are clamped into their usable ranges by [`sanitized`]
/// before a run; out-of-range values never abort the operation.
///
/// [`sanitized`]: KMediansOpts::sanitized
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KMediansOpts {
    /// Number of clusters.
    pub k: usize,
    /// Convergence threshold on the maximum per-coordinate center
    /// movement between consecutive iterations.
    pub epsilon: f64,
    /// Hard cap on the number of assignment/update iterations. Zero means
    /// the random centers are emitted after a single assignment pass.
    pub max_iterations: usize,
    /// Area-normalize every pixel spectrum before clustering.
    pub normalize: bool,
}

impl Default for KMediansOpts {
    fn default() -> Self {
        Self {
            k: 10,
            epsilon: 1e-12,
            max_iterations: 100,
            normalize: false,
        }
    }
}

impl KMediansOpts {
    /// Clamps all options into their usable ranges.
    pub fn sanitized(&self) -> Self {
        Self {
            k: self.k.clamp(2, 100),
            epsilon: self.epsilon.clamp(1e-20, 0.1),
            max_iterations: self.max_iterations.min(10_000),
            normalize: self.normalize,
        }
    }
}

/// One exportable center spectrum, tagged for display.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CenterCurve {
    pub xdata: Vec<f64>,
    pub ydata: Vec<f64>,
    pub description: String,
    /// Preset color slot, equal to the cluster index.
    pub color_index: usize,
}

/// Output of one K-medians run over a brick.
#[derive(Clone, Debug, Serialize, Deserialize, Encode, Decode)]
pub struct KMediansResult {
    /// Cluster index per pixel, row-major, in `[0, k)`.
    pub assignments: Vec<u32>,
    /// Euclidean residual per pixel between the raw brick spectrum and
    /// its cluster's final center.
    pub error_map: DataField,
    /// Final center spectra, `k` rows of `zres` values.
    pub centers: Vec<Vec<f64>>,
    /// Pre-normalized intensity per pixel; present when the run
    /// normalized its input.
    pub intensity_map: Option<DataField>,
    /// Member count per cluster under the final assignment.
    pub cluster_sizes: Vec<usize>,
    /// How many times an update pass found a cluster without members and
    /// zeroed its center.
    pub empty_cluster_events: usize,
    pub iterations_run: usize,
    /// True when the epsilon criterion stopped the run, false when the
    /// iteration cap did.
    pub converged: bool,
}

impl KMediansResult {
    /// Cluster map as a display field. Indices are exported one-based
    /// since the host reserves 0 for "no data".
    pub fn cluster_field(&self, brick: &Brick) -> DataField {
        let mut field = DataField::zeros(brick.xres, brick.yres, brick.xreal, brick.yreal);
        field.xoffset = brick.xoffset;
        field.yoffset = brick.yoffset;
        for (value, &c) in field.data.iter_mut().zip(self.assignments.iter()) {
            *value = c as f64;
        }
        field.add(1.0);
        field
    }

    /// Exports the final centers as XY curves against the brick's z
    /// calibration, or a synthetic linear z axis when no calibration of
    /// matching length is attached.
    pub fn center_curves(&self, brick: &Brick) -> Vec<CenterCurve> {
        let xdata: Vec<f64> = match &brick.zcalibration {
            Some(calibration) if calibration.data.len() == brick.zres => {
                calibration.data.clone()
            }
            _ => (0..brick.zres)
                .map(|i| brick.zreal * i as f64 / brick.zres as f64 + brick.zoffset)
                .collect(),
        };
        self.centers
            .iter()
            .enumerate()
            .map(|(c, center)| CenterCurve {
                xdata: xdata.clone(),
                ydata: center.clone(),
                description: format!("K-medians center {}", c + 1),
                color_index: c,
            })
            .collect()
    }
}

/// Runs K-medians clustering over the pixel spectra of a brick.
///
/// Every pixel's spectrum is assigned to the nearest of `k` center
/// spectra by squared Euclidean distance; centers are then replaced by
/// per-coordinate medians of their members, until no coordinate moves by
/// more than `epsilon` or the iteration cap is reached. Initial centers
/// are spectra of pixels drawn uniformly at random; duplicates across
/// clusters are permitted. The same brick, options and seed always
/// produce the same result.
///
/// The input brick is never mutated. Running into the iteration cap is a
/// normal termination, reported as `converged = false`.
///
/// # Errors
///
/// [`VolumeError::InvalidInput`] when the brick has no pixels or no
/// spectral planes.
pub fn kmedians_brick(
    brick: &Brick,
    opts: &KMediansOpts,
    seed: u64,
) -> Result<KMediansResult, VolumeError> {
    let xres = brick.xres;
    let yres = brick.yres;
    let zres = brick.zres;
    let npix = xres * yres;

    if npix == 0 || zres == 0 || brick.data.is_empty() {
        return Err(VolumeError::InvalidInput(format!(
            "brick must be non-empty, got {}x{}x{}",
            xres, yres, zres
        )));
    }

    let opts = opts.sanitized();
    let k = opts.k;

    let normalized;
    let mut intensity_map = None;
    let data: &[f64] = if opts.normalize {
        let (norm, intensity) = normalize_brick(brick);
        normalized = norm;
        intensity_map = Some(intensity);
        &normalized.data
    } else {
        &brick.data
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let xdist = Uniform::from(0..xres);
    let ydist = Uniform::from(0..yres);
    let mut centers = vec![vec![0.0f64; zres]; k];
    for center in centers.iter_mut() {
        let i = xdist.sample(&mut rng);
        let j = ydist.sample(&mut rng);
        let pix = j * xres + i;
        for (l, value) in center.iter_mut().enumerate() {
            *value = data[l * npix + pix];
        }
    }

    let mut assignments = vec![0u32; npix];
    let mut iterations_run = 0usize;
    let mut converged = false;
    let mut empty_cluster_events = 0usize;

    if opts.max_iterations == 0 {
        // Centers stay at their random seeds; one assignment pass keeps
        // the cluster and error maps defined.
        assign_pass(data, &centers, npix, &mut assignments);
    }

    while !converged && iterations_run < opts.max_iterations {
        assign_pass(data, &centers, npix, &mut assignments);

        let previous = centers.clone();
        let emptied = update_centers(data, &assignments, npix, zres, &mut centers);
        if emptied > 0 {
            warn!(
                "k-medians update pass left {} of {} clusters without members",
                emptied, k
            );
            empty_cluster_events += emptied;
        }

        iterations_run += 1;
        let movement = max_center_movement(&previous, &centers);
        converged = movement <= opts.epsilon;
        debug!(
            "k-medians iteration {}: max center movement {:.3e}",
            iterations_run, movement
        );
    }

    // Residuals are reported against the raw brick values even when the
    // clustering itself ran on normalized data.
    let raw = &brick.data;
    let mut error_map = DataField::zeros(xres, yres, brick.xreal, brick.yreal);
    error_map.xoffset = brick.xoffset;
    error_map.yoffset = brick.yoffset;
    error_map
        .data
        .par_iter_mut()
        .enumerate()
        .for_each_init(
            || vec![0.0f64; zres],
            |spectrum, (pix, value)| {
                for (l, v) in spectrum.iter_mut().enumerate() {
                    *v = raw[l * npix + pix];
                }
                *value = squared_distance(spectrum, &centers[assignments[pix] as usize]).sqrt();
            },
        );

    let counts = assignments.iter().copied().counts();
    let cluster_sizes = (0..k)
        .map(|c| counts.get(&(c as u32)).copied().unwrap_or(0))
        .collect();

    Ok(KMediansResult {
        assignments,
        error_map,
        centers,
        intensity_map,
        cluster_sizes,
        empty_cluster_events,
        iterations_run,
        converged,
    })
}

/// Assigns every pixel to the center with the smallest squared Euclidean
/// distance to its spectrum. Ties keep the lowest cluster index.
fn assign_pass(data: &[f64], centers: &[Vec<f64>], npix: usize, assignments: &mut [u32]) {
    let zres = centers[0].len();
    assignments.par_iter_mut().enumerate().for_each_init(
        || vec![0.0f64; zres],
        |spectrum, (pix, slot)| {
            for (l, v) in spectrum.iter_mut().enumerate() {
                *v = data[l * npix + pix];
            }
            let mut best = 0u32;
            let mut min = f64::INFINITY;
            for (c, center) in centers.iter().enumerate() {
                let dist = squared_distance(spectrum, center);
                if dist < min {
                    min = dist;
                    best = c as u32;
                }
            }
            *slot = best;
        },
    );
}

/// Replaces every center coordinate by the median of that coordinate over
/// the cluster's members. Clusters without members are zeroed rather than
/// left stale. Returns how many clusters were empty.
fn update_centers(
    data: &[f64],
    assignments: &[u32],
    npix: usize,
    zres: usize,
    centers: &mut [Vec<f64>],
) -> usize {
    let k = centers.len();
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (pix, &c) in assignments.iter().enumerate() {
        members[c as usize].push(pix);
    }
    let emptied = members.iter().filter(|m| m.is_empty()).count();

    centers.par_iter_mut().enumerate().for_each(|(c, center)| {
        let pixels = &members[c];
        if pixels.is_empty() {
            for value in center.iter_mut() {
                *value = 0.0;
            }
            return;
        }
        // One member-sized scratch buffer per cluster, refilled per plane.
        let mut samples = vec![0.0f64; pixels.len()];
        for l in 0..zres {
            let plane = &data[l * npix..(l + 1) * npix];
            for (slot, &pix) in samples.iter_mut().zip(pixels.iter()) {
                *slot = plane[pix];
            }
            center[l] = median_in_place(&mut samples);
        }
    });

    emptied
}

fn max_center_movement(previous: &[Vec<f64>], current: &[Vec<f64>]) -> f64 {
    previous
        .iter()
        .flatten()
        .zip(current.iter().flatten())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}
