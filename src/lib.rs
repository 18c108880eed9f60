//! # skyglyph
//!
//! Trace words through a real star catalog.
//!
//! Given a viewpoint on the sky and a zoom level, `skyglyph` lays out a short
//! word of stylized glyphs near the look-at point and snaps every glyph
//! vertex onto a real, bright catalog star, producing constellation-like
//! polylines ready for a globe renderer.
//!
//! ## Features
//!
//! - **Spherical nearest-neighbor search**: a HEALPix-style binned index with
//!   great-circle distances, correct near the poles and across RA 0/360
//! - **Brightness-aware binding**: each vertex takes the brightest unused
//!   star within a zoom-scaled radius, falling back to the nearest unused star
//! - **Antimeridian-safe output**: paths are split at RA 0/360 with
//!   interpolated boundary points, so no segment wraps the wrong way
//! - **Deterministic**: identical catalog, viewpoint and configuration give
//!   identical output
//! - **Zero-copy persistence**: the built index serializes with
//!   [rkyv](https://docs.rs/rkyv)
//!
//! ## Example
//!
//! ```no_run
//! use skyglyph::{resolve, ResolveConfig, SkyIndex, Star, Viewpoint};
//!
//! let stars = vec![
//!     Star::new(32349, 101.287, -16.716, -1.46),
//!     Star::new(30438, 95.988, -52.696, -0.74),
//!     // ... the rest of the catalog ...
//! ];
//! let index = SkyIndex::new(16, stars);
//!
//! let viewpoint = Viewpoint::new(100.0, -20.0, 5.0);
//! let result = resolve(&index, &viewpoint, &ResolveConfig::default()).unwrap();
//! for segment in &result.segments {
//!     println!("{:?}: {} points", segment.letter, segment.points.len());
//! }
//! println!("used {} stars", result.used_stars.len());
//! ```
//!
//! ## Algorithm overview
//!
//! 1. **Projection**: a cursor starts just west of the viewpoint and places
//!    each glyph in turn, scaled by `unit = 5000 / 2^(zoom + 8)` degrees and
//!    stretched in RA by `1 / cos(dec)`
//! 2. **Star mapping**: each vertex queries the 5 nearest stars within
//!    `0.3 * unit` and keeps the brightest unused one; an empty neighborhood
//!    widens to the nearest unused star anywhere
//! 3. **Splitting**: each letter's polyline is cut wherever neighbors are more
//!    than 180 degrees apart in RA
//!

mod error;
pub mod glyph;
pub mod resolver;
pub mod skyindex;
pub mod star;

pub use error::{ResolveError, Result};
pub use glyph::{Glyph, GlyphPoint};
pub use resolver::walk::{nearest_star, trace_walk, WalkConfig, WalkResult};
pub use resolver::{
    resolve, DegradedPoint, PathSegment, ResolveConfig, ResolveResult, Viewpoint,
};
pub use skyindex::{NearestNeighbors, Neighbor, SkyIndex};
pub use star::*;
