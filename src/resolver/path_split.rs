//! Cutting polylines at the RA 0/360 discontinuity.
//!
//! Globe renderers draw a segment between RA 350 and RA 10 the long way
//! round unless it is split. Any pair of neighbors more than 180 degrees
//! apart in RA is taken to cross the antimeridian; the path is closed at a
//! boundary point just inside 360 (or 0) and resumed just inside the other
//! side, at the declination interpolated for the crossing.

use crate::star::SkyCoord;

/// Split `points` wherever consecutive RAs differ by more than 180 degrees.
///
/// Input RAs are expected in `[0, 360)`. `epsilon` keeps boundary points off
/// the exact seam. A path that never crosses comes back as a single segment
/// equal to the input; an empty path yields no segments.
pub fn split_at_antimeridian(points: &[SkyCoord], epsilon: f64) -> Vec<Vec<SkyCoord>> {
    let Some((first, rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut current = vec![*first];
    let mut prev = *first;

    for &next in rest {
        if (next.ra_deg - prev.ra_deg).abs() <= 180.0 {
            current.push(next);
        } else {
            let meet_dec = crossing_dec(&prev, &next);
            let (close_ra, open_ra) = if prev.ra_deg > 180.0 {
                (360.0 - epsilon, epsilon)
            } else {
                (epsilon, 360.0 - epsilon)
            };
            current.push(SkyCoord::new(close_ra, meet_dec));
            segments.push(std::mem::take(&mut current));
            current.push(SkyCoord::new(open_ra, meet_dec));
            current.push(next);
        }
        prev = next;
    }

    segments.push(current);
    segments
}

/// Angular distance from `ra_deg` to the nearer side of the seam.
fn dist_to_meridian(ra_deg: f64) -> f64 {
    if ra_deg < 180.0 {
        ra_deg
    } else {
        360.0 - ra_deg
    }
}

/// Declination where the straight line from `a` to `b` meets the seam.
fn crossing_dec(a: &SkyCoord, b: &SkyCoord) -> f64 {
    let da = dist_to_meridian(a.ra_deg);
    let db = dist_to_meridian(b.ra_deg);
    let total = da + db;
    let t = if total > 0.0 { da / total } else { 0.5 };
    a.dec_deg + (b.dec_deg - a.dec_deg) * t
}
