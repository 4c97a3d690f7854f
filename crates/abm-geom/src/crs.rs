//! Coordinate reference systems and the math transforms between them.
//!
//! Only the systems agent models actually use are built in:
//!
//! | Code                        | System                          | Unit   |
//! |-----------------------------|---------------------------------|--------|
//! | `EPSG:4326`                 | WGS84 geographic                | degree |
//! | `EPSG:3857` / `EPSG:900913` | Web (pseudo) Mercator           | metre  |
//! | custom                      | affine plane over WGS84 degrees | metre  |
//!
//! Every transform routes through WGS84, so any two registered systems can
//! be connected by [`find_math_transform`].

use std::fmt;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::sync::Arc;

use abm_core::{CoreError, Point3};

use crate::error::{GeomError, GeomResult};

/// Web Mercator sphere radius (metres).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

// ── Crs ───────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
enum CrsKind {
    Geographic,
    WebMercator,
    /// Plane defined by an affine map from WGS84 degrees.
    Custom(Affine2),
}

/// A resolved coordinate reference system.
#[derive(Clone, Debug, PartialEq)]
pub struct Crs {
    code: String,
    kind: CrsKind,
}

impl Crs {
    /// Look up a built-in code (case-insensitive).
    pub fn from_code(code: &str) -> GeomResult<Crs> {
        let upper = code.trim().to_ascii_uppercase();
        let kind = match upper.as_str() {
            "EPSG:4326" => CrsKind::Geographic,
            "EPSG:3857" | "EPSG:900913" => CrsKind::WebMercator,
            _ => return Err(CoreError::argument(format!("unknown CRS code '{code}'")).into()),
        };
        Ok(Crs { code: upper, kind })
    }

    /// A custom projected system: `affine` maps WGS84 degrees to its plane.
    pub fn custom(code: impl Into<String>, affine: Affine2) -> Crs {
        Crs { code: code.into(), kind: CrsKind::Custom(affine) }
    }

    pub fn wgs84() -> Crs {
        Crs { code: "EPSG:4326".into(), kind: CrsKind::Geographic }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self.kind, CrsKind::Geographic)
    }

    pub fn unit(&self) -> &'static str {
        if self.is_geographic() { "degree" } else { "metre" }
    }

    /// Transform from WGS84 degrees into this system.
    fn from_wgs84(&self) -> Arc<dyn MathTransform> {
        match &self.kind {
            CrsKind::Geographic => Arc::new(Identity),
            CrsKind::WebMercator => Arc::new(WebMercator),
            CrsKind::Custom(a) => Arc::new(a.clone()),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

// ── MathTransform ─────────────────────────────────────────────────────────────

/// An invertible point-wise map.  `inverse` must undo `forward` to within
/// floating-point tolerance over the transform's domain.
pub trait MathTransform: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn forward(&self, p: &mut Point3) -> GeomResult<()>;

    fn inverse(&self, p: &mut Point3) -> GeomResult<()>;

    fn is_identity(&self) -> bool {
        false
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Identity;

impl MathTransform for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn forward(&self, _p: &mut Point3) -> GeomResult<()> {
        Ok(())
    }

    fn inverse(&self, _p: &mut Point3) -> GeomResult<()> {
        Ok(())
    }

    fn is_identity(&self) -> bool {
        true
    }
}

/// `x' = a·x + b·y + c`, `y' = d·x + e·y + f`; `z` passes through.
#[derive(Clone, Debug, PartialEq)]
pub struct Affine2 {
    m:   [f64; 6],
    inv: [f64; 6],
}

impl Affine2 {
    /// Fails with an argument error when the linear part is singular.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> GeomResult<Self> {
        let det = a * e - b * d;
        if det == 0.0 || !det.is_finite() {
            return Err(CoreError::argument(format!("affine transform is not invertible (det = {det})")).into());
        }
        let inv = [
            e / det,
            -b / det,
            (b * f - c * e) / det,
            -d / det,
            a / det,
            (c * d - a * f) / det,
        ];
        Ok(Self { m: [a, b, c, d, e, f], inv })
    }

    pub fn scale_translate(sx: f64, sy: f64, tx: f64, ty: f64) -> GeomResult<Self> {
        Self::new(sx, 0.0, tx, 0.0, sy, ty)
    }

    fn apply(m: &[f64; 6], p: &mut Point3) {
        let (x, y) = (p.x, p.y);
        p.x = m[0] * x + m[1] * y + m[2];
        p.y = m[3] * x + m[4] * y + m[5];
    }
}

impl MathTransform for Affine2 {
    fn name(&self) -> &'static str {
        "affine"
    }

    fn forward(&self, p: &mut Point3) -> GeomResult<()> {
        Self::apply(&self.m, p);
        Ok(())
    }

    fn inverse(&self, p: &mut Point3) -> GeomResult<()> {
        Self::apply(&self.inv, p);
        Ok(())
    }
}

/// Spherical Web Mercator, degrees ⇄ metres.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WebMercator;

impl MathTransform for WebMercator {
    fn name(&self) -> &'static str {
        "web_mercator"
    }

    fn forward(&self, p: &mut Point3) -> GeomResult<()> {
        if !(p.x.is_finite() && p.y.is_finite()) || p.y.abs() >= 90.0 {
            return Err(GeomError::Domain {
                transform: self.name(),
                point:     p.to_string(),
                reason:    "latitude must be finite and strictly inside (-90, 90)",
            });
        }
        let lat = p.y.to_radians();
        p.x = EARTH_RADIUS * p.x.to_radians();
        p.y = EARTH_RADIUS * (FRAC_PI_4 + lat * 0.5).tan().ln();
        Ok(())
    }

    fn inverse(&self, p: &mut Point3) -> GeomResult<()> {
        if !(p.x.is_finite() && p.y.is_finite()) {
            return Err(GeomError::Domain {
                transform: self.name(),
                point:     p.to_string(),
                reason:    "coordinates must be finite",
            });
        }
        p.x = (p.x / EARTH_RADIUS).to_degrees();
        p.y = (2.0 * (p.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
        Ok(())
    }
}

/// Swaps `forward` and `inverse` of the wrapped transform.
#[derive(Clone, Debug)]
pub struct Inverted(pub Arc<dyn MathTransform>);

impl MathTransform for Inverted {
    fn name(&self) -> &'static str {
        "inverted"
    }

    fn forward(&self, p: &mut Point3) -> GeomResult<()> {
        self.0.inverse(p)
    }

    fn inverse(&self, p: &mut Point3) -> GeomResult<()> {
        self.0.forward(p)
    }

    fn is_identity(&self) -> bool {
        self.0.is_identity()
    }
}

/// Applies each step in order; the inverse runs them backwards.
#[derive(Clone, Debug)]
pub struct Chain(Vec<Arc<dyn MathTransform>>);

impl MathTransform for Chain {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn forward(&self, p: &mut Point3) -> GeomResult<()> {
        self.0.iter().try_for_each(|t| t.forward(p))
    }

    fn inverse(&self, p: &mut Point3) -> GeomResult<()> {
        self.0.iter().rev().try_for_each(|t| t.inverse(p))
    }

    fn is_identity(&self) -> bool {
        self.0.iter().all(|t| t.is_identity())
    }
}

/// The transform taking `source` coordinates to `target` coordinates.
pub fn find_math_transform(source: &Crs, target: &Crs) -> Arc<dyn MathTransform> {
    if source == target {
        return Arc::new(Identity);
    }
    let to_wgs84: Arc<dyn MathTransform> = Arc::new(Inverted(source.from_wgs84()));
    let from_wgs84 = target.from_wgs84();
    let mut steps: Vec<_> = [to_wgs84, from_wgs84].into_iter().filter(|t| !t.is_identity()).collect();
    match steps.len() {
        0 => Arc::new(Identity),
        1 => steps.remove(0),
        _ => Arc::new(Chain(steps)),
    }
}
