//! Glyph layout on the sky.
//!
//! The projector works in a local plane around the viewpoint: `x` points
//! east and `y` points north, both measured in glyph units. Plane offsets are
//! turned into sky offsets with `dDec = y * unit` and
//! `dRA = x * unit * ra_scale`, where `ra_scale = 1 / cos(dec_viewpoint)`
//! compensates for meridian convergence.

use nalgebra::{Rotation2, Vector2};

use crate::glyph::Glyph;
use crate::star::SkyCoord;

use super::{ResolveConfig, Viewpoint};

/// Layout position between letters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub position: SkyCoord,
    /// Text baseline in the local (east, north) plane.
    pub direction: Vector2<f64>,
}

/// One glyph placed on the sky. Coordinates are not yet RA-wrapped.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLetter {
    pub glyph: Glyph,
    pub points: Vec<SkyCoord>,
}

/// Iterator placing each configured glyph in turn.
///
/// Pure: the sequence depends only on the viewpoint and the configuration.
/// Empty glyphs are skipped without moving the cursor.
#[derive(Debug, Clone)]
pub struct Projector<'a> {
    glyphs: &'a [Glyph],
    next: usize,
    cursor: Cursor,
    unit: f64,
    ra_scale: f64,
    spacing: f64,
}

impl<'a> Projector<'a> {
    pub fn new(viewpoint: &Viewpoint, config: &'a ResolveConfig) -> Self {
        let unit = config.unit(viewpoint.zoom);
        let ra_scale = config.ra_scale(viewpoint.dec_deg);
        let [dx, dy] = config.start_offset;
        let mut projector = Self {
            glyphs: &config.glyphs,
            next: 0,
            cursor: Cursor {
                position: viewpoint.coord(),
                direction: Vector2::new(config.initial_direction[0], config.initial_direction[1]),
            },
            unit,
            ra_scale,
            spacing: config.inter_letter_spacing,
        };
        projector.cursor.position = projector.offset(&projector.cursor.position, Vector2::new(dx, dy));
        projector
    }

    /// Move `from` by a plane offset given in glyph units.
    fn offset(&self, from: &SkyCoord, delta: Vector2<f64>) -> SkyCoord {
        SkyCoord::new(
            from.ra_deg + delta.x * self.unit * self.ra_scale,
            from.dec_deg + delta.y * self.unit,
        )
    }

    fn place(&mut self, glyph: &Glyph) -> ProjectedLetter {
        let norm = self.cursor.direction.norm();
        self.cursor.direction = if norm > 0.0 && norm.is_finite() {
            self.cursor.direction / norm
        } else {
            Vector2::x()
        };

        let direction = self.cursor.direction;
        self.cursor.position = self.offset(&self.cursor.position, direction * self.spacing);

        // Align the glyph's local x axis with the baseline
        let rotation = Rotation2::new(direction.y.atan2(direction.x));
        let origin = self.cursor.position;
        let points: Vec<SkyCoord> = glyph
            .points
            .iter()
            .map(|p| self.offset(&origin, rotation * Vector2::new(p.x, p.y)))
            .collect();

        self.cursor.position = self.offset(&origin, Vector2::new(glyph.max_x(), glyph.min_y()));

        ProjectedLetter {
            glyph: *glyph,
            points,
        }
    }
}

impl Iterator for Projector<'_> {
    type Item = ProjectedLetter;

    fn next(&mut self) -> Option<Self::Item> {
        let glyphs = self.glyphs;
        while let Some(glyph) = glyphs.get(self.next) {
            self.next += 1;
            if !glyph.is_empty() {
                return Some(self.place(glyph));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{Glyph, GlyphPoint, I, L};

    fn close(a: &SkyCoord, ra: f64, dec: f64) -> bool {
        (a.ra_deg - ra).abs() < 1e-9 && (a.dec_deg - dec).abs() < 1e-9
    }

    fn config_with(glyphs: Vec<Glyph>) -> ResolveConfig {
        ResolveConfig {
            // unit = 1 deg at zoom 0
            unit_base: 256.0,
            start_offset: [0.0, 0.0],
            glyphs,
            ..Default::default()
        }
    }

    #[test]
    fn places_letters_left_to_right() {
        let config = config_with(vec![L, I]);
        let vp = Viewpoint::new(50.0, 0.0, 0.0);
        let letters: Vec<ProjectedLetter> = Projector::new(&vp, &config).collect();

        assert_eq!(letters.len(), 2);
        // L starts one spacing to the east
        assert!(close(&letters[0].points[0], 51.0, 1.0));
        assert!(close(&letters[0].points[1], 51.0, 0.0));
        assert!(close(&letters[0].points[2], 52.0, 0.0));
        // cursor moved by L's (max_x, min_y) = (1, 0), then another spacing
        assert!(close(&letters[1].points[0], 53.0, 1.0));
        assert!(close(&letters[1].points[1], 53.0, 0.0));
    }

    #[test]
    fn start_offset_is_applied() {
        let mut config = config_with(vec![I]);
        config.start_offset = [-3.0, -1.0];
        let vp = Viewpoint::new(50.0, 0.0, 0.0);
        let letter = Projector::new(&vp, &config).next().unwrap();
        assert!(close(&letter.points[1], 48.0, -1.0));
    }

    #[test]
    fn ra_offsets_stretch_with_declination() {
        let config = config_with(vec![L]);
        let vp = Viewpoint::new(50.0, 60.0, 0.0);
        let letter = Projector::new(&vp, &config).next().unwrap();
        // cos(60) = 0.5, so one unit east is two degrees of RA
        assert!(close(&letter.points[0], 52.0, 61.0));
        assert!(close(&letter.points[2], 54.0, 60.0));
    }

    #[test]
    fn glyph_rotates_with_direction() {
        let mut config = config_with(vec![L]);
        config.initial_direction = [0.0, 2.0];
        let vp = Viewpoint::new(50.0, 0.0, 0.0);
        let letter = Projector::new(&vp, &config).next().unwrap();
        // spacing moves north; glyph x axis points north, y axis points west
        assert!(close(&letter.points[0], 49.0, 1.0));
        assert!(close(&letter.points[1], 50.0, 1.0));
        assert!(close(&letter.points[2], 50.0, 2.0));
    }

    #[test]
    fn empty_glyphs_do_not_move_cursor() {
        const EMPTY: Glyph = Glyph::new('?', &[]);
        const DOT: Glyph = Glyph::new('.', &[GlyphPoint { x: 0.0, y: 0.0 }]);
        let vp = Viewpoint::new(50.0, 0.0, 0.0);

        let with_empty = config_with(vec![EMPTY, DOT]);
        let without = config_with(vec![DOT]);
        let a: Vec<ProjectedLetter> = Projector::new(&vp, &with_empty).collect();
        let b: Vec<ProjectedLetter> = Projector::new(&vp, &without).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn vertices_past_the_pole_stay_apart() {
        let config = ResolveConfig::default();
        let vp = Viewpoint::new(250.0, -89.0, 1.0);
        let unit = config.unit(vp.zoom);
        let letters: Vec<ProjectedLetter> = Projector::new(&vp, &config).collect();
        let on_sky: Vec<SkyCoord> = letters
            .iter()
            .flat_map(|letter| letter.points.iter().map(SkyCoord::normalized))
            .collect();

        assert_eq!(on_sky.len(), 18);
        assert!(on_sky.iter().all(|p| p.dec_deg > -90.0 && p.dec_deg < 90.0));
        for (i, a) in on_sky.iter().enumerate() {
            for b in &on_sky[i + 1..] {
                assert!(a.angular_distance_deg(b) > 1e-6, "{a:?} and {b:?} collapsed");
            }
        }

        // L's vertical stroke runs from dec -89 across the pole, one unit long
        let stroke = &letters[0].points;
        let d = stroke[0].normalized().angular_distance_deg(&stroke[1].normalized());
        assert!((d - unit).abs() < 1e-9);
    }

    #[test]
    fn projection_is_repeatable() {
        let config = ResolveConfig::default();
        let vp = Viewpoint::new(359.9, -30.0, 6.5);
        let a: Vec<ProjectedLetter> = Projector::new(&vp, &config).collect();
        let b: Vec<ProjectedLetter> = Projector::new(&vp, &config).collect();
        assert_eq!(a, b);
    }
}
