//! Morton (Z-order) codes for box centroids.
//!
//! Centroids are normalized against the box enclosing all centroids and
//! quantized to 16 bits per axis in 2D and 10 bits per axis in 3D. Axis 0
//! takes the most significant bit of every interleaved group.

use crate::{Aabb, BuildError};
use lbvh_utils::ExecutionPolicy;

/// Bits per axis used for dimension `dim`, `None` when `dim` cannot be encoded.
pub const fn bits_per_axis(dim: usize) -> Option<u32> {
    match dim {
        2 => Some(16),
        3 => Some(10),
        _ => None,
    }
}

/// Spreads the low 16 bits of `n` so one zero bit separates each of them.
fn expand_bits_2(mut n: u32) -> u32 {
    n &= 0x0000ffff;
    n = (n | (n << 8)) & 0x00ff00ff;
    n = (n | (n << 4)) & 0x0f0f0f0f;
    n = (n | (n << 2)) & 0x33333333;
    n = (n | (n << 1)) & 0x55555555;
    n
}

/// Spreads the low 10 bits of `n` so two zero bits separate each of them.
fn expand_bits_3(mut n: u32) -> u32 {
    n &= 0x000003ff;
    n = (n | (n << 16)) & 0x030000ff;
    n = (n | (n << 8)) & 0x0300f00f;
    n = (n | (n << 4)) & 0x030c30c3;
    n = (n | (n << 2)) & 0x09249249;
    n
}

pub fn morton_encode_2(x: u32, y: u32) -> u32 {
    (expand_bits_2(x) << 1) | expand_bits_2(y)
}

pub fn morton_encode_3(x: u32, y: u32, z: u32) -> u32 {
    (expand_bits_3(x) << 2) | (expand_bits_3(y) << 1) | expand_bits_3(z)
}

/// Box enclosing the centroids of `aabbs`; the empty box when there are none.
pub fn centroid_bounds<E, const D: usize>(policy: &E, aabbs: &[Aabb<D>]) -> Aabb<D>
where
    E: ExecutionPolicy,
{
    policy.reduce(
        aabbs.len(),
        Aabb::new(),
        |i| Aabb::from_point(aabbs[i].center()),
        |a, b| a.union_of(&b),
    )
}

#[derive(Debug, Copy, Clone)]
pub struct MortonEncoder<const D: usize> {
    origin: [f32; D],
    extent: [f32; D],
    bits: u32,
}

impl<const D: usize> MortonEncoder<D> {
    /// Encoder normalizing against `scene_box`, usually [`centroid_bounds`].
    pub fn new(scene_box: &Aabb<D>) -> Result<Self, BuildError> {
        let bits = bits_per_axis(D).ok_or(BuildError::UnsupportedDimension { dim: D })?;

        let mut origin = [0.0; D];
        let mut extent = [0.0; D];
        if !scene_box.is_empty() {
            origin = scene_box.min;
            extent = scene_box.lengths();
        }

        Ok(Self {
            origin,
            extent,
            bits,
        })
    }

    /// Maps `point` to integer grid coordinates in `[0, 2^bits)`.
    ///
    /// Axes without extent map to cell zero; everything is clamped to the grid.
    pub fn quantize(&self, point: [f32; D]) -> [u32; D] {
        let domain = (1u32 << self.bits) as f32;
        let max_cell = (1u32 << self.bits) - 1;

        let mut cells = [0u32; D];
        for axis in 0..D {
            let normalized = if self.extent[axis] > 0.0 {
                ((point[axis] - self.origin[axis]) / self.extent[axis]).clamp(0.0, 1.0)
            } else {
                0.0
            };
            cells[axis] = ((normalized * domain) as u32).min(max_cell);
        }
        cells
    }

    pub fn encode(&self, point: [f32; D]) -> u32 {
        match self.quantize(point).as_slice() {
            [x, y] => morton_encode_2(*x, *y),
            [x, y, z] => morton_encode_3(*x, *y, *z),
            _ => unreachable!("encoder constructed for unsupported dimension {}", D),
        }
    }

    /// Writes the code of every box centroid into `codes`.
    pub fn encode_all<E: ExecutionPolicy>(&self, policy: &E, aabbs: &[Aabb<D>], codes: &mut [u32]) {
        debug_assert_eq!(aabbs.len(), codes.len());
        policy.for_each_mut(codes, |i, code| *code = self.encode(aabbs[i].center()));
    }
}
