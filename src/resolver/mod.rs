//! Glyph-to-catalog path resolver.
//!
//! Traces a word of glyphs across the sky near a viewpoint, binding each
//! glyph vertex to a real catalog star:
//!
//! 1. **Projection**: a cursor starts near the viewpoint and walks letter by
//!    letter, placing each unit-square glyph in sky coordinates scaled by the
//!    zoom level ([`projector`]).
//! 2. **Star mapping**: every projected vertex is bound to the brightest
//!    unused star within a zoom-dependent radius, widening to the nearest
//!    unused star when the neighborhood is exhausted ([`star_mapper`]).
//! 3. **Antimeridian splitting**: each letter's polyline is cut where it
//!    crosses RA 0/360 so renderers never draw a segment the long way around
//!    the sphere ([`path_split`]).
//!
//! All mutable state (cursor, used stars) lives inside one [`resolve`] call.
//! The index is only read, so any number of calls may share it across threads.

pub mod path_split;
pub mod projector;
pub mod star_mapper;
pub mod walk;

use tracing::{debug, warn};

use crate::error::{ResolveError, Result};
use crate::glyph::{Glyph, DEFAULT_WORD};
use crate::skyindex::NearestNeighbors;
use crate::star::SkyCoord;

use path_split::split_at_antimeridian;
use projector::Projector;
use star_mapper::StarMapper;

// ── Viewpoint ───────────────────────────────────────────────────────────────

/// Where the viewer is looking, and how far they are zoomed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    /// Look-at right ascension, degrees.
    pub ra_deg: f64,
    /// Look-at declination, degrees.
    pub dec_deg: f64,
    /// Map-style zoom level; each step halves the on-sky size of a glyph.
    pub zoom: f64,
}

impl Viewpoint {
    pub const fn new(ra_deg: f64, dec_deg: f64, zoom: f64) -> Self {
        Self {
            ra_deg,
            dec_deg,
            zoom,
        }
    }

    pub fn coord(&self) -> SkyCoord {
        SkyCoord::new(self.ra_deg, self.dec_deg)
    }
}

// ── Configuration ───────────────────────────────────────────────────────────

/// Parameters controlling glyph placement and star selection.
///
/// Distances below are in "units": the on-sky glyph size in degrees,
/// `unit = unit_base / 2^(zoom + 8)`.
#[derive(Debug, Clone)]
pub struct ResolveConfig {
    /// Numerator of the zoom-to-unit mapping. Default 5000.
    pub unit_base: f64,
    /// Search radius around each vertex, in units. Default 0.3.
    pub radius_factor: f64,
    /// Gap inserted before each letter, in units. Default 1.0.
    pub inter_letter_spacing: f64,
    /// Neighbors requested in the radius-bounded query. Default 5.
    pub initial_k: usize,
    /// Offset of antimeridian boundary points from RA 0/360, degrees. Must be
    /// positive so boundary points stay inside `[0, 360)`. Default 1e-4.
    pub boundary_epsilon: f64,
    /// Cursor origin relative to the viewpoint, in units (east, north).
    /// Default `[-3, -1]`, which roughly centres the default word.
    pub start_offset: [f64; 2],
    /// Baseline direction of the text in the local (east, north) plane.
    /// Normalized before use. Default `[1, 0]`.
    pub initial_direction: [f64; 2],
    /// Floor for `cos(dec)` in the RA stretch, keeping offsets finite near the poles.
    /// Default 0.05.
    pub min_cos_dec: f64,
    /// Letters to trace, in layout order.
    pub glyphs: Vec<Glyph>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            unit_base: 5000.0,
            radius_factor: 0.3,
            inter_letter_spacing: 1.0,
            initial_k: 5,
            boundary_epsilon: 1e-4,
            start_offset: [-3.0, -1.0],
            initial_direction: [1.0, 0.0],
            min_cos_dec: 0.05,
            glyphs: DEFAULT_WORD.to_vec(),
        }
    }
}

impl ResolveConfig {
    /// On-sky size of one glyph unit at `zoom`, in degrees.
    pub fn unit(&self, zoom: f64) -> f64 {
        self.unit_base / 2f64.powf(zoom + 8.0)
    }

    /// Multiplier turning an eastward offset into an RA offset at `dec_deg`.
    ///
    /// Meridians converge towards the poles, so a fixed angular step east
    /// spans more RA the further the viewpoint is from the equator.
    pub fn ra_scale(&self, dec_deg: f64) -> f64 {
        1.0 / dec_deg.to_radians().cos().abs().max(self.min_cos_dec)
    }

    /// Radius of the bounded star query at `zoom`, in degrees.
    pub fn max_distance_deg(&self, zoom: f64) -> f64 {
        self.radius_factor * self.unit(zoom)
    }

    pub fn validate(&self) -> Result<()> {
        let finite_positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ResolveError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {v}"
                )))
            }
        };
        let finite_non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ResolveError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {v}"
                )))
            }
        };

        finite_positive("unit_base", self.unit_base)?;
        finite_non_negative("radius_factor", self.radius_factor)?;
        finite_non_negative("inter_letter_spacing", self.inter_letter_spacing)?;
        finite_positive("boundary_epsilon", self.boundary_epsilon)?;
        finite_positive("min_cos_dec", self.min_cos_dec)?;
        if self.min_cos_dec > 1.0 {
            return Err(ResolveError::InvalidConfig(format!(
                "min_cos_dec must not exceed 1, got {}",
                self.min_cos_dec
            )));
        }
        if self.initial_k == 0 {
            return Err(ResolveError::InvalidConfig(
                "initial_k must be at least 1".to_string(),
            ));
        }
        if self.boundary_epsilon >= 180.0 {
            return Err(ResolveError::InvalidConfig(format!(
                "boundary_epsilon must be below 180, got {}",
                self.boundary_epsilon
            )));
        }
        if !self.start_offset.iter().all(|v| v.is_finite()) {
            return Err(ResolveError::InvalidConfig(
                "start_offset must be finite".to_string(),
            ));
        }
        let [dx, dy] = self.initial_direction;
        if !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
            return Err(ResolveError::InvalidConfig(
                "initial_direction must be a finite, non-zero vector".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_viewpoint(viewpoint: &Viewpoint) -> Result<()> {
    if viewpoint.ra_deg.is_finite() && viewpoint.dec_deg.is_finite() && viewpoint.zoom.is_finite()
    {
        Ok(())
    } else {
        Err(ResolveError::InvalidConfig(format!(
            "viewpoint must be finite, got {viewpoint:?}"
        )))
    }
}

// ── Results ─────────────────────────────────────────────────────────────────

/// An ordered run of sky coordinates that never jumps more than 180 degrees
/// in RA between neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    /// The glyph this segment traces, when it comes from a glyph.
    pub letter: Option<char>,
    pub points: Vec<SkyCoord>,
}

/// A glyph vertex that could not be bound to any star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegradedPoint {
    pub letter: char,
    /// Position of the vertex within its glyph.
    pub vertex: usize,
    /// The projected coordinate used in place of a star.
    pub coord: SkyCoord,
}

/// Output of one [`resolve`] call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolveResult {
    /// Path segments of all letters, in letter order.
    pub segments: Vec<PathSegment>,
    /// Catalog ids of the stars used, in order of first use. No duplicates.
    pub used_stars: Vec<u64>,
    /// Vertices that fell back to their projected position.
    pub degraded: Vec<DegradedPoint>,
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Trace the configured glyphs through the catalog around `viewpoint`.
///
/// Fails with [`ResolveError::EmptyCatalog`] when `index` holds no stars.
/// Identical inputs always produce an identical result.
pub fn resolve<N>(index: &N, viewpoint: &Viewpoint, config: &ResolveConfig) -> Result<ResolveResult>
where
    N: NearestNeighbors + ?Sized,
{
    config.validate()?;
    validate_viewpoint(viewpoint)?;
    if index.is_empty() {
        return Err(ResolveError::EmptyCatalog);
    }

    let unit = config.unit(viewpoint.zoom);
    let mut mapper = StarMapper::new(index, config.max_distance_deg(viewpoint.zoom), config.initial_k);
    let mut result = ResolveResult::default();

    for letter in Projector::new(viewpoint, config) {
        let name = letter.glyph.name;
        let mut coords = Vec::with_capacity(letter.points.len());
        for (vertex, point) in letter.points.iter().enumerate() {
            let mapped = mapper.map_point(point);
            if mapped.star_id.is_none() {
                warn!(
                    "No star available for vertex {} of '{}', using projected position ({:.4}, {:.4})",
                    vertex, name, mapped.coord.ra_deg, mapped.coord.dec_deg
                );
                result.degraded.push(DegradedPoint {
                    letter: name,
                    vertex,
                    coord: mapped.coord,
                });
            }
            coords.push(mapped.coord);
        }

        let pieces = split_at_antimeridian(&coords, config.boundary_epsilon);
        debug!(
            "Letter '{}': {} vertices, {} segment(s), unit={:.6} deg",
            name,
            coords.len(),
            pieces.len(),
            unit
        );
        result
            .segments
            .extend(pieces.into_iter().map(|points| PathSegment {
                letter: Some(name),
                points,
            }));
    }

    result.used_stars = mapper.into_used_stars();
    Ok(result)
}
