use glam::*;
use std::fmt::{Display, Formatter};

/// Axis-aligned box in `D` dimensions with closed bounds.
///
/// The empty box has `min = +inf` and `max = -inf` on every axis, so it is the
/// identity of [`Aabb::union_of`] and intersects nothing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb<const D: usize> {
    pub min: [f32; D],
    pub max: [f32; D],
}

pub trait Bounds<const D: usize> {
    fn bounds(&self) -> Aabb<D>;
}

impl<const D: usize> Display for Aabb<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(min: {:?},  max: {:?})", self.min, self.max)
    }
}

impl<const D: usize> Default for Aabb<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> Aabb<D> {
    pub fn new() -> Aabb<D> {
        Aabb {
            min: [f32::INFINITY; D],
            max: [f32::NEG_INFINITY; D],
        }
    }

    pub fn from_corners(min: [f32; D], max: [f32; D]) -> Aabb<D> {
        Aabb { min, max }
    }

    pub fn from_point(point: [f32; D]) -> Aabb<D> {
        Aabb {
            min: point,
            max: point,
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..D).any(|axis| !(self.min[axis] <= self.max[axis]))
    }

    pub fn grow(&mut self, pos: [f32; D]) {
        for axis in 0..D {
            self.min[axis] = self.min[axis].min(pos[axis]);
            self.max[axis] = self.max[axis].max(pos[axis]);
        }
    }

    pub fn grow_bb(&mut self, aabb: &Aabb<D>) {
        for axis in 0..D {
            self.min[axis] = self.min[axis].min(aabb.min[axis]);
            self.max[axis] = self.max[axis].max(aabb.max[axis]);
        }
    }

    pub fn union_of(&self, bb: &Self) -> Self {
        let mut union = *self;
        union.grow_bb(bb);
        union
    }

    pub fn offset_by(&mut self, delta: f32) {
        for axis in 0..D {
            self.min[axis] -= delta;
            self.max[axis] += delta;
        }
    }

    pub fn center(&self) -> [f32; D] {
        let mut center = [0.0; D];
        for axis in 0..D {
            center[axis] = (self.min[axis] + self.max[axis]) * 0.5;
        }
        center
    }

    pub fn lengths(&self) -> [f32; D] {
        let mut lengths = [0.0; D];
        for axis in 0..D {
            lengths[axis] = self.extend(axis);
        }
        lengths
    }

    pub fn extend(&self, axis: usize) -> f32 {
        self.max[axis] - self.min[axis]
    }

    pub fn volume(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        (0..D).map(|axis| self.extend(axis)).product()
    }

    /// Closed-interval overlap test; touching boxes overlap, NaN never does.
    pub fn intersects(&self, other: &Aabb<D>) -> bool {
        (0..D).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    pub fn contains(&self, point: [f32; D]) -> bool {
        (0..D).all(|axis| self.min[axis] <= point[axis] && point[axis] <= self.max[axis])
    }

    /// Squared distance from `point` to the nearest point of the box, zero inside.
    pub fn distance_squared(&self, point: [f32; D]) -> f32 {
        let mut sum = 0.0;
        for axis in 0..D {
            let d = if point[axis] < self.min[axis] {
                self.min[axis] - point[axis]
            } else if point[axis] > self.max[axis] {
                point[axis] - self.max[axis]
            } else {
                0.0
            };
            sum += d * d;
        }
        sum
    }

    /// Equality of the stored bit patterns, so NaN corners compare equal to themselves.
    pub fn bitwise_eq(&self, other: &Aabb<D>) -> bool {
        (0..D).all(|axis| {
            self.min[axis].to_bits() == other.min[axis].to_bits()
                && self.max[axis].to_bits() == other.max[axis].to_bits()
        })
    }
}

impl Aabb<2> {
    pub fn points(&self) -> (Vec2, Vec2) {
        (self.min.into(), self.max.into())
    }
}

impl Aabb<3> {
    pub fn points(&self) -> (Vec3, Vec3) {
        (self.min.into(), self.max.into())
    }
}

impl From<(Vec2, Vec2)> for Aabb<2> {
    fn from(v: (Vec2, Vec2)) -> Self {
        Aabb {
            min: v.0.into(),
            max: v.1.into(),
        }
    }
}

impl From<(Vec3, Vec3)> for Aabb<3> {
    fn from(v: (Vec3, Vec3)) -> Self {
        Aabb {
            min: v.0.into(),
            max: v.1.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_is_union_identity() {
        let empty = Aabb::<3>::new();
        assert!(empty.is_empty());

        let b = Aabb::from_corners([0.0, 1.0, 2.0], [3.0, 4.0, 5.0]);
        assert_eq!(empty.union_of(&b), b);
        assert_eq!(b.union_of(&empty), b);
        assert!(!empty.intersects(&b));
    }

    #[test]
    fn overlap_is_closed() {
        let a = Aabb::from_corners([0.0, 0.0], [1.0, 1.0]);
        let touching = Aabb::from_corners([1.0, 0.5], [2.0, 2.0]);
        let apart = Aabb::from_corners([1.5, 0.0], [2.0, 1.0]);

        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
        assert!(a.contains([1.0, 0.0]));
        assert!(!a.contains([1.0, -0.1]));
    }

    #[test]
    fn nan_never_overlaps() {
        let a = Aabb::from_corners([0.0, 0.0], [1.0, 1.0]);
        assert!(!a.contains([f32::NAN, 0.5]));
        assert!(!a.intersects(&Aabb::from_point([0.5, f32::NAN])));
    }

    #[test]
    fn distance_to_box() {
        let a = Aabb::from_corners([0.0, 0.0], [1.0, 1.0]);
        assert_eq!(a.distance_squared([0.5, 0.5]), 0.0);
        assert_eq!(a.distance_squared([3.0, 0.5]), 4.0);
        assert_eq!(a.distance_squared([-1.0, -1.0]), 2.0);
    }

    #[test]
    fn padding_gives_points_volume() {
        let mut p = Aabb::from_point([1.0, 2.0, 3.0]);
        assert_eq!(p.volume(), 0.0);
        p.offset_by(0.5);
        assert_eq!(p.volume(), 1.0);
        assert_eq!(p.center(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn glam_round_trip() {
        let b: Aabb<3> = (Vec3::new(0.0, 1.0, 2.0), Vec3::new(1.0, 2.0, 3.0)).into();
        assert_eq!(b.points().1, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.lengths(), [1.0; 3]);

        let b: Aabb<2> = (Vec2::ZERO, Vec2::ONE).into();
        assert_eq!(b.max, [1.0, 1.0]);
    }
}
