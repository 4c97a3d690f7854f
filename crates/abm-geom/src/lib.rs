//! `abm-geom`: geometry and projection for the `rust_abm` agent runtime.
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`sequence`]   | `CoordinateSequence`, `Dimension`                          |
//! | [`geometry`]   | `Geometry` (point / line string / polygon) with cached data |
//! | [`crs`]        | `Crs`, `MathTransform`, `Affine2`, `WebMercator`           |
//! | [`projection`] | `Projection`, `CrsProjection`, `ScalingProjection`, config |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on config and enum types.  |

pub mod crs;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod sequence;

#[cfg(test)]
mod tests;

pub use crs::{Affine2, Crs, Identity, Inverted, MathTransform, WebMercator, find_math_transform};
pub use error::{GeomError, GeomResult};
pub use geometry::{Geometry, GeometryKind};
pub use projection::{CrsProjection, Projection, ProjectionConfig, ProjectionFactory, ScalingProjection};
pub use sequence::{CoordinateSequence, Dimension};
