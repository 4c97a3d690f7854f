//! Mutable, dimensioned coordinate buffers.
//!
//! # Single-point specialization
//!
//! A sequence of exactly one point stores it inline (`Storage::Unique`) and
//! never allocates.  Every read path goes through [`as_slice`], so the
//! specialization answers `size`, `coordinate` and `envelope` exactly as a
//! one-element buffer would.
//!
//! [`as_slice`]: CoordinateSequence::as_slice

use std::slice;

use abm_core::{CoreError, CoreResult, Envelope3, Point3, Violations};

/// Number of meaningful ordinates per point.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dimension {
    Two,
    #[default]
    Three,
}

impl Dimension {
    pub fn from_ordinates(n: usize) -> Option<Dimension> {
        match n {
            2 => Some(Dimension::Two),
            3 => Some(Dimension::Three),
            _ => None,
        }
    }

    pub fn as_usize(self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Storage {
    Unique(Point3),
    Many(Vec<Point3>),
}

/// The backing buffer of points for one geometry.
///
/// `Clone` deep-copies the point data; two sequences never share storage.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateSequence {
    dimension: Dimension,
    storage:   Storage,
}

impl CoordinateSequence {
    // ── Construction ──────────────────────────────────────────────────────

    /// Wrap `points`.  A single point takes the inline path.  In a 2D
    /// sequence every `z` is forced to 0.
    pub fn from_points(mut points: Vec<Point3>, dimension: Dimension) -> Self {
        if dimension == Dimension::Two {
            points.iter_mut().for_each(|p| p.z = 0.0);
        }
        let storage = if points.len() == 1 {
            Storage::Unique(points[0])
        } else {
            Storage::Many(points)
        };
        Self { dimension, storage }
    }

    /// A sequence holding one point, without allocating.
    pub fn single(point: Point3, dimension: Dimension) -> Self {
        Self::from_points_unique(point, dimension)
    }

    fn from_points_unique(mut point: Point3, dimension: Dimension) -> Self {
        if dimension == Dimension::Two {
            point.z = 0.0;
        }
        Self { dimension, storage: Storage::Unique(point) }
    }

    /// `size` points at the origin.
    pub fn with_size(size: usize, dimension: Dimension) -> Self {
        if size == 1 {
            return Self::from_points_unique(Point3::ORIGIN, dimension);
        }
        Self { dimension, storage: Storage::Many(vec![Point3::ORIGIN; size]) }
    }

    /// Deep copy of `other`.
    pub fn copy_of(other: &CoordinateSequence) -> Self {
        other.clone()
    }

    /// Build from raw ordinate rows (`[x, y]` or `[x, y, z]`).  Every row must
    /// have the same arity; all offending rows are reported together.
    pub fn from_ordinates<R: AsRef<[f64]>>(rows: &[R]) -> CoreResult<Self> {
        let mut violations = Violations::new("coordinate sequence");
        let expected = rows.first().map(|r| r.as_ref().len());
        let dimension = expected.and_then(Dimension::from_ordinates);

        for (i, row) in rows.iter().enumerate() {
            let len = row.as_ref().len();
            if Dimension::from_ordinates(len).is_none() {
                violations.push(format!("row {i}"), format!("expected 2 or 3 ordinates, got {len}"));
            } else if Some(len) != expected {
                violations.push(
                    format!("row {i}"),
                    format!("dimension {len} does not match first row's {}", expected.unwrap_or(0)),
                );
            }
        }
        violations.finish()?;

        let dimension = dimension.unwrap_or_default();
        let points = rows
            .iter()
            .map(|r| match *r.as_ref() {
                [x, y] => Point3::new_2d(x, y),
                [x, y, z] => Point3::new(x, y, z),
                _ => Point3::ORIGIN,
            })
            .collect();
        Ok(Self::from_points(points, dimension))
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// `true` if the inline single-point representation is in use.
    #[inline]
    pub fn is_unique(&self) -> bool {
        matches!(self.storage, Storage::Unique(_))
    }

    pub fn as_slice(&self) -> &[Point3] {
        match &self.storage {
            Storage::Unique(p) => slice::from_ref(p),
            Storage::Many(v) => v,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [Point3] {
        match &mut self.storage {
            Storage::Unique(p) => slice::from_mut(p),
            Storage::Many(v) => v,
        }
    }

    pub fn coordinate(&self, index: usize) -> CoreResult<&Point3> {
        let len = self.size();
        self.as_slice().get(index).ok_or(CoreError::Index { index, len })
    }

    /// Live view: writing through the reference mutates the sequence.
    pub fn coordinate_mut(&mut self, index: usize) -> CoreResult<&mut Point3> {
        let len = self.size();
        self.as_mut_slice().get_mut(index).ok_or(CoreError::Index { index, len })
    }

    pub fn first(&self) -> Option<Point3> {
        self.as_slice().first().copied()
    }

    pub fn last(&self) -> Option<Point3> {
        self.as_slice().last().copied()
    }

    pub fn iter(&self) -> slice::Iter<'_, Point3> {
        self.as_slice().iter()
    }

    pub fn to_vec(&self) -> Vec<Point3> {
        self.as_slice().to_vec()
    }

    pub fn envelope(&self) -> Envelope3 {
        let mut env = Envelope3::empty();
        for p in self.iter() {
            env.expand_to_include(*p);
        }
        env
    }

    /// Closed (first == last in x/y) with at least 4 points.
    pub fn is_ring(&self) -> bool {
        self.size() >= 4 && self.endpoints_match()
    }

    fn endpoints_match(&self) -> bool {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => a.x == b.x && a.y == b.y,
            _ => false,
        }
    }

    /// Shoelace area: positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        let pts = self.as_slice();
        if pts.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for w in pts.windows(2) {
            sum += w[0].x * w[1].y - w[1].x * w[0].y;
        }
        if !self.endpoints_match() {
            let (a, b) = (pts[pts.len() - 1], pts[0]);
            sum += a.x * b.y - b.x * a.y;
        }
        sum * 0.5
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    pub fn push(&mut self, mut point: Point3) {
        if self.dimension == Dimension::Two {
            point.z = 0.0;
        }
        self.storage = match std::mem::replace(&mut self.storage, Storage::Many(Vec::new())) {
            Storage::Unique(p) => Storage::Many(vec![p, point]),
            Storage::Many(v) if v.is_empty() => Storage::Unique(point),
            Storage::Many(mut v) => {
                v.push(point);
                Storage::Many(v)
            }
        };
    }

    /// Append the first point if the sequence is not already closed.
    pub fn close_ring(&mut self) {
        if let Some(first) = self.first() {
            if self.size() == 1 || !self.endpoints_match() {
                self.push(first);
            }
        }
    }

    pub fn reverse(&mut self) {
        self.as_mut_slice().reverse();
    }

    /// Reverse counter-clockwise rings so they wind clockwise.
    pub fn ensure_clockwise(&mut self) {
        if self.signed_area() > 0.0 {
            self.reverse();
        }
    }

    pub fn ensure_counter_clockwise(&mut self) {
        if self.signed_area() < 0.0 {
            self.reverse();
        }
    }

    pub fn apply(&mut self, mut f: impl FnMut(&mut Point3)) {
        let flat = self.dimension == Dimension::Two;
        for p in self.as_mut_slice() {
            f(p);
            if flat {
                p.z = 0.0;
            }
        }
    }

    pub fn try_apply<E>(&mut self, mut f: impl FnMut(&mut Point3) -> Result<(), E>) -> Result<(), E> {
        let flat = self.dimension == Dimension::Two;
        for p in self.as_mut_slice() {
            f(p)?;
            if flat {
                p.z = 0.0;
            }
        }
        Ok(())
    }

    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.apply(|p| {
            p.x += dx;
            p.y += dy;
            p.z += dz;
        });
    }

    /// Set every `z` to `z`; promotes a 2D sequence to 3D.
    pub fn replace_z(&mut self, z: f64) {
        self.dimension = Dimension::Three;
        self.as_mut_slice().iter_mut().for_each(|p| p.z = z);
    }
}

impl<'a> IntoIterator for &'a CoordinateSequence {
    type Item = &'a Point3;
    type IntoIter = slice::Iter<'a, Point3>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
