use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ElevationGridError {
    #[error("elevation grid needs at least 2x2 samples, got size {0}")]
    TooSmall(usize),
    #[error("elevation grid of size {size} needs {expected} samples, got {actual}")]
    SampleCount {
        size: usize,
        expected: usize,
        actual: usize,
    },
    #[error("elevation grid radius must be positive, got {0}")]
    InvalidRadius(f64),
}

#[derive(Debug, Deserialize)]
struct RawElevationGrid {
    size: usize,
    radius: f64,
    samples: Vec<f64>,
}

/// Square grid of raw terrain heights (meters) centered on the map origin
///
/// Samples are row-major `[lat_row][lon_col]`: row 0 is the northernmost row
/// (`z = -radius`), column 0 the westernmost (`x = -radius`).
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawElevationGrid")]
pub struct ElevationGrid {
    size: usize,
    radius: f64,
    samples: Vec<f64>,
}

impl TryFrom<RawElevationGrid> for ElevationGrid {
    type Error = ElevationGridError;

    fn try_from(raw: RawElevationGrid) -> Result<Self, Self::Error> {
        Self::new(raw.size, raw.radius, raw.samples)
    }
}

impl ElevationGrid {
    pub fn new(size: usize, radius: f64, samples: Vec<f64>) -> Result<Self, ElevationGridError> {
        if size < 2 {
            return Err(ElevationGridError::TooSmall(size));
        }
        if samples.len() != size * size {
            return Err(ElevationGridError::SampleCount {
                size,
                expected: size * size,
                actual: samples.len(),
            });
        }
        if radius.is_nan() || radius <= 0.0 {
            return Err(ElevationGridError::InvalidRadius(radius));
        }
        Ok(Self {
            size,
            radius,
            samples,
        })
    }

    /// Grid with every sample at the same height
    pub fn flat(size: usize, radius: f64, height: f64) -> Result<Self, ElevationGridError> {
        Self::new(size, radius, vec![height; size * size])
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn sample(&self, row: usize, col: usize) -> f64 {
        self.samples[row * self.size + col]
    }

    pub fn min_sample(&self) -> f64 {
        self.samples.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_sample(&self) -> f64 {
        self.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Bilinear raw elevation at planar (x, z), clamped to the grid edges
    pub fn interpolate(&self, x: f64, z: f64) -> f64 {
        let last = (self.size - 1) as f64;
        let to_grid = |v: f64| ((v + self.radius) / (2.0 * self.radius) * last).clamp(0.0, last);

        let u = to_grid(x);
        let v = to_grid(z);

        // keep one cell to the right/below so (c0 + 1, r0 + 1) stays in range
        let c0 = (u.floor() as usize).min(self.size - 2);
        let r0 = (v.floor() as usize).min(self.size - 2);
        let fu = u - c0 as f64;
        let fv = v - r0 as f64;

        let top = self.sample(r0, c0) * (1.0 - fu) + self.sample(r0, c0 + 1) * fu;
        let bottom = self.sample(r0 + 1, c0) * (1.0 - fu) + self.sample(r0 + 1, c0 + 1) * fu;
        top * (1.0 - fv) + bottom * fv
    }
}

/// Terrain height at (x, z) in meters above `ground_reference`, never negative
///
/// A missing grid means flat terrain and always yields 0.
pub fn elevation_at(grid: Option<&ElevationGrid>, x: f64, z: f64, ground_reference: f64) -> f64 {
    match grid {
        Some(grid) => (grid.interpolate(x, z) - ground_reference).max(0.0),
        None => 0.0,
    }
}
