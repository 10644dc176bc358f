use crate::error::{Error, Result};
use crate::types::{Direction, Position};

/// Source of scalar intensities at continuous positions (millimetres).
///
/// CPU- and GPU-backed implementations are interchangeable; the filters only
/// rely on `value_at` being a pure function of the sampler's state.
pub trait ScalarFieldSampler {
    fn value_at(&self, position: &Position) -> f64;

    /// Whether the sampler holds a configured field. Graphs refuse to be
    /// built over a sampler that is not ready.
    fn is_ready(&self) -> bool {
        true
    }
}

impl<F> ScalarFieldSampler for F
where
    F: Fn(&Position) -> f64,
{
    #[inline]
    fn value_at(&self, position: &Position) -> f64 {
        self(position)
    }
}

/// Dense voxel volume sampled by trilinear interpolation, clamping to the
/// nearest edge voxel outside the volume.
#[derive(Debug, Clone)]
pub struct VolumeSampler {
    data: Vec<f32>,
    dims: [usize; 3],
    spacing: Direction,
    origin: Position,
}

impl VolumeSampler {
    /// `data` is laid out x-fastest: `x + dims[0] * (y + dims[1] * z)`.
    pub fn new(data: Vec<f32>, dims: [usize; 3], spacing: Direction, origin: Position) -> Result<Self> {
        let expected = dims[0] * dims[1] * dims[2];
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        for (axis, &s) in spacing.iter().enumerate() {
            if !(s > 0.0) {
                return Err(Error::InvalidParameter {
                    name: ["voxel spacing x", "voxel spacing y", "voxel spacing z"][axis],
                    value: s,
                });
            }
        }
        Ok(VolumeSampler {
            data,
            dims,
            spacing,
            origin,
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn spacing(&self) -> &Direction {
        &self.spacing
    }

    pub fn origin(&self) -> &Position {
        &self.origin
    }

    /// Physical extent covered by voxel centres.
    pub fn extent(&self) -> Direction {
        Direction::new(
            self.dims[0].saturating_sub(1) as f64 * self.spacing.x,
            self.dims[1].saturating_sub(1) as f64 * self.spacing.y,
            self.dims[2].saturating_sub(1) as f64 * self.spacing.z,
        )
    }

    #[inline]
    fn voxel(&self, x: isize, y: isize, z: isize) -> f64 {
        let cx = x.clamp(0, self.dims[0] as isize - 1) as usize;
        let cy = y.clamp(0, self.dims[1] as isize - 1) as usize;
        let cz = z.clamp(0, self.dims[2] as isize - 1) as usize;
        self.data[cx + self.dims[0] * (cy + self.dims[1] * cz)] as f64
    }
}

impl ScalarFieldSampler for VolumeSampler {
    fn value_at(&self, position: &Position) -> f64 {
        let rel = position - self.origin;
        let fx = rel.x / self.spacing.x;
        let fy = rel.y / self.spacing.y;
        let fz = rel.z / self.spacing.z;

        let x0 = fx.floor() as isize;
        let y0 = fy.floor() as isize;
        let z0 = fz.floor() as isize;
        let dx = fx - x0 as f64;
        let dy = fy - y0 as f64;
        let dz = fz - z0 as f64;

        let c00 = self.voxel(x0, y0, z0) * (1.0 - dx) + self.voxel(x0 + 1, y0, z0) * dx;
        let c10 = self.voxel(x0, y0 + 1, z0) * (1.0 - dx) + self.voxel(x0 + 1, y0 + 1, z0) * dx;
        let c01 = self.voxel(x0, y0, z0 + 1) * (1.0 - dx) + self.voxel(x0 + 1, y0, z0 + 1) * dx;
        let c11 =
            self.voxel(x0, y0 + 1, z0 + 1) * (1.0 - dx) + self.voxel(x0 + 1, y0 + 1, z0 + 1) * dx;

        let c0 = c00 * (1.0 - dy) + c10 * dy;
        let c1 = c01 * (1.0 - dy) + c11 * dy;
        c0 * (1.0 - dz) + c1 * dz
    }

    fn is_ready(&self) -> bool {
        !self.data.is_empty()
    }
}
