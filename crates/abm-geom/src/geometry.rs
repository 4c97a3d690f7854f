//! Owned shapes built on [`CoordinateSequence`].
//!
//! A `Geometry` exclusively owns its sequences.  Derived data (envelope,
//! centroid) is computed lazily and cached; every in-place mutation must end
//! with [`Geometry::geometry_changed`], which the mutation helpers here call
//! for you.

use std::cell::OnceCell;

use abm_core::{CoreError, CoreResult, Envelope3, Point3, Violations};

use crate::sequence::{CoordinateSequence, Dimension};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

#[derive(Clone, Debug, Default)]
struct Derived {
    envelope: OnceCell<Envelope3>,
    centroid: OnceCell<Point3>,
}

#[derive(Clone, Debug)]
pub struct Geometry {
    kind:  GeometryKind,
    shell: CoordinateSequence,
    holes: Vec<CoordinateSequence>,
    cache: Derived,
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.shell == other.shell && self.holes == other.holes
    }
}

impl Geometry {
    // ── Construction ──────────────────────────────────────────────────────

    pub fn point(p: Point3) -> Self {
        Self::from_parts(GeometryKind::Point, CoordinateSequence::single(p, Dimension::Three), Vec::new())
    }

    pub fn line_string(points: Vec<Point3>) -> CoreResult<Self> {
        if points.len() < 2 {
            return Err(CoreError::argument(format!(
                "a line string needs at least 2 points, got {}",
                points.len()
            )));
        }
        Ok(Self::from_parts(
            GeometryKind::LineString,
            CoordinateSequence::from_points(points, Dimension::Three),
            Vec::new(),
        ))
    }

    /// Build a polygon.  Rings are closed if needed; the shell is normalised
    /// to clockwise winding.  Every ring that is still shorter than 4 points
    /// is reported in a single validation error.
    pub fn polygon(shell: Vec<Point3>, holes: Vec<Vec<Point3>>) -> CoreResult<Self> {
        let mut violations = Violations::new("polygon");

        let mut shell = CoordinateSequence::from_points(shell, Dimension::Three);
        shell.close_ring();
        if !shell.is_ring() {
            violations.push("shell", format!("ring has {} point(s) after closing, need 4", shell.size()));
        }

        let mut rings = Vec::with_capacity(holes.len());
        for (i, hole) in holes.into_iter().enumerate() {
            let mut ring = CoordinateSequence::from_points(hole, Dimension::Three);
            ring.close_ring();
            if !ring.is_ring() {
                violations.push(
                    format!("hole {i}"),
                    format!("ring has {} point(s) after closing, need 4", ring.size()),
                );
            }
            rings.push(ring);
        }
        violations.finish()?;

        shell.ensure_clockwise();
        Ok(Self::from_parts(GeometryKind::Polygon, shell, rings))
    }

    fn from_parts(kind: GeometryKind, shell: CoordinateSequence, holes: Vec<CoordinateSequence>) -> Self {
        Self { kind, shell, holes, cache: Derived::default() }
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// The outer ring, or the only sequence of a point / line string.
    pub fn shell(&self) -> &CoordinateSequence {
        &self.shell
    }

    pub fn holes(&self) -> &[CoordinateSequence] {
        &self.holes
    }

    pub fn num_points(&self) -> usize {
        self.shell.size() + self.holes.iter().map(CoordinateSequence::size).sum::<usize>()
    }

    /// Every coordinate, shell first, then holes in order.
    pub fn coordinates(&self) -> impl Iterator<Item = &Point3> {
        self.shell.iter().chain(self.holes.iter().flat_map(|h| h.iter()))
    }

    pub fn envelope(&self) -> Envelope3 {
        *self.cache.envelope.get_or_init(|| self.shell.envelope())
    }

    /// Point: itself.  Line string: length-weighted segment midpoints.
    /// Polygon: area centroid of the shell minus holes.  Degenerate shapes
    /// fall back to the vertex mean.
    pub fn centroid(&self) -> Point3 {
        *self.cache.centroid.get_or_init(|| self.compute_centroid())
    }

    fn compute_centroid(&self) -> Point3 {
        match self.kind {
            GeometryKind::Point => self.shell.first().unwrap_or_default(),
            GeometryKind::LineString => {
                let mut total = 0.0;
                let (mut cx, mut cy, mut cz) = (0.0, 0.0, 0.0);
                for w in self.shell.as_slice().windows(2) {
                    let len = w[0].distance(w[1]);
                    total += len;
                    cx += len * (w[0].x + w[1].x) * 0.5;
                    cy += len * (w[0].y + w[1].y) * 0.5;
                    cz += len * (w[0].z + w[1].z) * 0.5;
                }
                if total > 0.0 {
                    Point3::new(cx / total, cy / total, cz / total)
                } else {
                    vertex_mean(&self.shell)
                }
            }
            GeometryKind::Polygon => {
                let mut area = 0.0;
                let (mut cx, mut cy) = (0.0, 0.0);
                for (ring, sign) in std::iter::once((&self.shell, 1.0)).chain(self.holes.iter().map(|h| (h, -1.0))) {
                    let a = ring.signed_area().abs() * sign;
                    let (rx, ry) = ring_centroid(ring);
                    area += a;
                    cx += a * rx;
                    cy += a * ry;
                }
                if area.abs() > f64::EPSILON {
                    Point3::new(cx / area, cy / area, vertex_mean(&self.shell).z)
                } else {
                    vertex_mean(&self.shell)
                }
            }
        }
    }

    pub fn area(&self) -> f64 {
        match self.kind {
            GeometryKind::Polygon => {
                let holes: f64 = self.holes.iter().map(|h| h.signed_area().abs()).sum();
                self.shell.signed_area().abs() - holes
            }
            _ => 0.0,
        }
    }

    /// Perimeter for polygons (shell and holes), path length for lines.
    pub fn length(&self) -> f64 {
        let seq_len = |s: &CoordinateSequence| -> f64 {
            s.as_slice().windows(2).map(|w| w[0].distance_2d(w[1])).sum()
        };
        match self.kind {
            GeometryKind::Point => 0.0,
            GeometryKind::LineString => seq_len(&self.shell),
            GeometryKind::Polygon => seq_len(&self.shell) + self.holes.iter().map(seq_len).sum::<f64>(),
        }
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Drop cached envelope and centroid.
    pub fn geometry_changed(&mut self) {
        self.cache = Derived::default();
    }

    /// Apply `f` to every coordinate in place.
    pub fn apply(&mut self, mut f: impl FnMut(&mut Point3)) {
        self.shell.apply(&mut f);
        for h in &mut self.holes {
            h.apply(&mut f);
        }
        self.geometry_changed();
    }

    /// Fallible [`apply`](Self::apply).  On error the geometry is left
    /// untouched: the work happens on a copy that is committed only when
    /// every coordinate succeeded.
    pub fn try_apply<E>(&mut self, mut f: impl FnMut(&mut Point3) -> Result<(), E>) -> Result<(), E> {
        let mut shell = self.shell.clone();
        shell.try_apply(&mut f)?;
        let mut holes = self.holes.clone();
        for h in &mut holes {
            h.try_apply(&mut f)?;
        }
        self.shell = shell;
        self.holes = holes;
        self.geometry_changed();
        Ok(())
    }

    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.apply(|p| {
            p.x += dx;
            p.y += dy;
            p.z += dz;
        });
    }

    /// Write one shell coordinate through the live view, then invalidate.
    pub fn set_coordinate(&mut self, index: usize, p: Point3) -> CoreResult<()> {
        *self.shell.coordinate_mut(index)? = p;
        self.geometry_changed();
        Ok(())
    }
}

fn vertex_mean(seq: &CoordinateSequence) -> Point3 {
    let pts = seq.as_slice();
    // A closed ring repeats its first point; count it once.
    let pts = if pts.len() > 1 && seq.is_ring() { &pts[..pts.len() - 1] } else { pts };
    if pts.is_empty() {
        return Point3::ORIGIN;
    }
    let n = pts.len() as f64;
    let sum = pts.iter().fold(Point3::ORIGIN, |acc, p| acc + *p);
    Point3::new(sum.x / n, sum.y / n, sum.z / n)
}

fn ring_centroid(ring: &CoordinateSequence) -> (f64, f64) {
    let a = ring.signed_area();
    if a.abs() <= f64::EPSILON {
        let m = vertex_mean(ring);
        return (m.x, m.y);
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for w in ring.as_slice().windows(2) {
        let cross = w[0].x * w[1].y - w[1].x * w[0].y;
        cx += (w[0].x + w[1].x) * cross;
        cy += (w[0].y + w[1].y) * cross;
    }
    (cx / (6.0 * a), cy / (6.0 * a))
}
