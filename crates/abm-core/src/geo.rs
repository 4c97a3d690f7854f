//! Model-space point and envelope types.
//!
//! Coordinates are `f64` throughout: projections round-trip through
//! geographic degrees and must stay within 1e-9 relative error.

use std::fmt;
use std::ops::{Add, Sub};

/// A 3D point in model space.  2D data keeps `z == 0.0`.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance, all three axes.
    pub fn distance(self, other: Point3) -> f64 {
        let d = other - self;
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }

    /// Euclidean distance ignoring `z`.
    pub fn distance_2d(self, other: Point3) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Component-wise equality within `tolerance`.
    pub fn approx_eq(self, other: Point3, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl Add for Point3 {
    type Output = Point3;
    #[inline]
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;
    #[inline]
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, {}}}", self.x, self.y, self.z)
    }
}

// ── Envelope3 ─────────────────────────────────────────────────────────────────

/// Axis-aligned 3D bounding box.  The empty envelope has inverted bounds so
/// that the first `expand_to_include` sets it exactly.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope3 {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for Envelope3 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Envelope3 {
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    /// Envelope spanning two corners, in any order.
    pub fn from_corners(a: Point3, b: Point3) -> Self {
        let mut env = Self::of_point(a);
        env.expand_to_include(b);
        env
    }

    pub fn of_point(p: Point3) -> Self {
        Self { min_x: p.x, max_x: p.x, min_y: p.y, max_y: p.y, min_z: p.z, max_z: p.z }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn expand_to_include(&mut self, p: Point3) {
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_y = self.max_y.max(p.y);
        self.min_z = self.min_z.min(p.z);
        self.max_z = self.max_z.max(p.z);
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_x - self.min_x }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_y - self.min_y }
    }

    pub fn depth(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_z - self.min_z }
    }

    pub fn centre(&self) -> Option<Point3> {
        (!self.is_empty()).then(|| {
            Point3::new(
                (self.min_x + self.max_x) * 0.5,
                (self.min_y + self.max_y) * 0.5,
                (self.min_z + self.max_z) * 0.5,
            )
        })
    }

    /// Inclusive containment test on x and y only.
    pub fn contains_2d(&self, p: Point3) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn intersects_2d(&self, other: &Envelope3) -> bool {
        !(self.is_empty()
            || other.is_empty()
            || other.min_x > self.max_x
            || other.max_x < self.min_x
            || other.min_y > self.max_y
            || other.max_y < self.min_y)
    }
}
