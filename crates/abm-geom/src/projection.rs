//! Model-space ⇄ real-world projections.
//!
//! A forward transform runs three stages in order, and the inverse runs
//! their inverses in reverse:
//!
//! 1. the CRS math transform (`source` → `target`),
//! 2. the world translation (origin at the projected envelope's min x /
//!    max y, y axis flipped so model y grows downward),
//! 3. the unit conversion (`× unit_factor`).
//!
//! [`ScalingProjection`] is the no-CRS fallback: it only scales.

use std::fmt;
use std::sync::Arc;

use abm_core::{CoreError, Envelope3, Point3};
use tracing::debug;

use crate::crs::{Crs, MathTransform, find_math_transform};
use crate::error::GeomResult;
use crate::geometry::Geometry;

/// Samples per envelope edge when projecting world bounds.
const ENVELOPE_EDGE_SAMPLES: usize = 16;

// ── Projection ────────────────────────────────────────────────────────────────

/// A geometry transform between model space and a real-world system.
///
/// Implementors provide the point-level stages; the geometry-level methods
/// apply them to every coordinate and invalidate cached derived data.
pub trait Projection: Send + Sync + fmt::Debug {
    fn transform_point(&self, p: &mut Point3) -> GeomResult<()>;

    fn inverse_transform_point(&self, p: &mut Point3) -> GeomResult<()>;

    fn translate_point(&self, p: &mut Point3);

    fn inverse_translate_point(&self, p: &mut Point3);

    fn convert_unit_point(&self, p: &mut Point3);

    fn inverse_convert_unit_point(&self, p: &mut Point3);

    /// `None` means no georeferencing is available, which is not an error.
    fn source_crs(&self) -> Option<&Crs>;

    fn target_crs(&self) -> Option<&Crs>;

    /// On failure the geometry is left unchanged.
    fn transform(&self, g: &mut Geometry) -> GeomResult<()> {
        g.try_apply(|p| self.transform_point(p))
    }

    fn inverse_transform(&self, g: &mut Geometry) -> GeomResult<()> {
        g.try_apply(|p| self.inverse_transform_point(p))
    }

    fn translate(&self, g: &mut Geometry) {
        g.apply(|p| self.translate_point(p));
    }

    fn inverse_translate(&self, g: &mut Geometry) {
        g.apply(|p| self.inverse_translate_point(p));
    }

    fn convert_unit(&self, g: &mut Geometry) {
        g.apply(|p| self.convert_unit_point(p));
    }

    fn inverse_convert_unit(&self, g: &mut Geometry) {
        g.apply(|p| self.inverse_convert_unit_point(p));
    }
}

// ── CrsProjection ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
struct Offsets {
    min_x: f64,
    max_y: f64,
}

/// CRS-aware projection.  Starts uninitialized; usable once
/// [`create_transformation`](Self::create_transformation) has run.
#[derive(Debug)]
pub struct CrsProjection {
    source:      Crs,
    target:      Crs,
    transform:   Option<Arc<dyn MathTransform>>,
    offsets:     Option<Offsets>,
    unit_factor: f64,
    projected:   Option<Envelope3>,
}

impl CrsProjection {
    pub fn new(source: Crs, target: Crs) -> Self {
        Self { source, target, transform: None, offsets: None, unit_factor: 1.0, projected: None }
    }

    /// Use the registry transform between `source` and `target`.
    pub fn initialized(source: Crs, target: Crs) -> Self {
        let mut p = Self::new(source, target);
        let t = find_math_transform(&p.source, &p.target);
        p.create_transformation(t);
        p
    }

    /// Uninitialized → Ready.
    pub fn create_transformation(&mut self, transform: Arc<dyn MathTransform>) {
        debug!(source = %self.source, target = %self.target, math = transform.name(), "projection ready");
        self.transform = Some(transform);
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.transform.is_some()
    }

    /// Multiplier applied after translation.  Zero or non-finite factors are
    /// rejected.
    pub fn with_unit_factor(mut self, factor: f64) -> GeomResult<Self> {
        if factor == 0.0 || !factor.is_finite() {
            return Err(CoreError::argument(format!("unit factor must be finite and non-zero, got {factor}")).into());
        }
        self.unit_factor = factor;
        Ok(self)
    }

    pub fn unit_factor(&self) -> f64 {
        self.unit_factor
    }

    /// Project the world bounds (given in the source system) and anchor the
    /// translation on the result.
    pub fn fit_to(&mut self, world: &Envelope3) -> GeomResult<Envelope3> {
        let t = self.math()?;
        let mut projected = Envelope3::empty();
        for p in envelope_outline(world) {
            let mut q = p;
            t.forward(&mut q)?;
            projected.expand_to_include(q);
        }
        self.offsets = Some(Offsets { min_x: projected.min_x, max_y: projected.max_y });
        self.projected = Some(projected);
        debug!(
            width = projected.width(),
            height = projected.height(),
            "projection fitted to world envelope"
        );
        Ok(projected)
    }

    /// The projected world envelope, if [`fit_to`](Self::fit_to) ran.
    pub fn projected_envelope(&self) -> Option<Envelope3> {
        self.projected
    }

    fn math(&self) -> GeomResult<&Arc<dyn MathTransform>> {
        self.transform
            .as_ref()
            .ok_or_else(|| CoreError::not_ready(format!("projection {} -> {}", self.source, self.target)).into())
    }
}

fn envelope_outline(env: &Envelope3) -> Vec<Point3> {
    if env.is_empty() {
        return Vec::new();
    }
    let n = ENVELOPE_EDGE_SAMPLES;
    let mut pts = Vec::with_capacity(4 * (n + 1));
    for i in 0..=n {
        let f = i as f64 / n as f64;
        let x = env.min_x + f * env.width();
        let y = env.min_y + f * env.height();
        pts.push(Point3::new_2d(x, env.min_y));
        pts.push(Point3::new_2d(x, env.max_y));
        pts.push(Point3::new_2d(env.min_x, y));
        pts.push(Point3::new_2d(env.max_x, y));
    }
    pts
}

impl Projection for CrsProjection {
    fn transform_point(&self, p: &mut Point3) -> GeomResult<()> {
        self.math()?.forward(p)?;
        self.translate_point(p);
        self.convert_unit_point(p);
        Ok(())
    }

    fn inverse_transform_point(&self, p: &mut Point3) -> GeomResult<()> {
        let t = self.math()?;
        self.inverse_convert_unit_point(p);
        self.inverse_translate_point(p);
        t.inverse(p)
    }

    fn translate_point(&self, p: &mut Point3) {
        if let Some(o) = self.offsets {
            p.x -= o.min_x;
            p.y = -p.y + o.max_y;
        }
    }

    fn inverse_translate_point(&self, p: &mut Point3) {
        if let Some(o) = self.offsets {
            p.x += o.min_x;
            p.y = -p.y + o.max_y;
        }
    }

    fn convert_unit_point(&self, p: &mut Point3) {
        p.x *= self.unit_factor;
        p.y *= self.unit_factor;
        p.z *= self.unit_factor;
    }

    fn inverse_convert_unit_point(&self, p: &mut Point3) {
        p.x /= self.unit_factor;
        p.y /= self.unit_factor;
        p.z /= self.unit_factor;
    }

    fn source_crs(&self) -> Option<&Crs> {
        Some(&self.source)
    }

    fn target_crs(&self) -> Option<&Crs> {
        Some(&self.target)
    }
}

// ── ScalingProjection ─────────────────────────────────────────────────────────

/// Pure uniform scaling; carries no reference system.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScalingProjection {
    scale: f64,
}

impl ScalingProjection {
    pub fn new(scale: f64) -> GeomResult<Self> {
        if scale == 0.0 || !scale.is_finite() {
            return Err(CoreError::argument(format!("scale must be finite and non-zero, got {scale}")).into());
        }
        Ok(Self { scale })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Projection for ScalingProjection {
    fn transform_point(&self, p: &mut Point3) -> GeomResult<()> {
        p.x *= self.scale;
        p.y *= self.scale;
        p.z *= self.scale;
        Ok(())
    }

    fn inverse_transform_point(&self, p: &mut Point3) -> GeomResult<()> {
        p.x /= self.scale;
        p.y /= self.scale;
        p.z /= self.scale;
        Ok(())
    }

    fn translate_point(&self, _p: &mut Point3) {}

    fn inverse_translate_point(&self, _p: &mut Point3) {}

    fn convert_unit_point(&self, _p: &mut Point3) {}

    fn inverse_convert_unit_point(&self, _p: &mut Point3) {}

    fn source_crs(&self) -> Option<&Crs> {
        None
    }

    fn target_crs(&self) -> Option<&Crs> {
        None
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Declarative projection setup, as read from a simulation config file.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ProjectionConfig {
    Crs {
        source: String,
        target: String,
        /// `[min_x, min_y, max_x, max_y]` in the source system.
        #[cfg_attr(feature = "serde", serde(default))]
        world_bounds: Option<[f64; 4]>,
        #[cfg_attr(feature = "serde", serde(default = "one"))]
        unit_factor: f64,
    },
    Scaling {
        scale: f64,
    },
}

#[cfg(feature = "serde")]
fn one() -> f64 {
    1.0
}

pub struct ProjectionFactory;

impl ProjectionFactory {
    /// Build a ready-to-use projection.  Configuration errors (unknown CRS
    /// codes, zero factors) surface here, once, at simulation build time.
    pub fn from_config(config: &ProjectionConfig) -> GeomResult<Arc<dyn Projection>> {
        match config {
            ProjectionConfig::Crs { source, target, world_bounds, unit_factor } => {
                let source = Crs::from_code(source)?;
                let target = Crs::from_code(target)?;
                let mut p = CrsProjection::initialized(source, target).with_unit_factor(*unit_factor)?;
                if let Some([min_x, min_y, max_x, max_y]) = *world_bounds {
                    let world = Envelope3::from_corners(Point3::new_2d(min_x, min_y), Point3::new_2d(max_x, max_y));
                    p.fit_to(&world)?;
                }
                Ok(Arc::new(p))
            }
            ProjectionConfig::Scaling { scale } => Ok(Arc::new(ScalingProjection::new(*scale)?)),
        }
    }
}
