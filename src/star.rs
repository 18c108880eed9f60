use rkyv::{Archive, Deserialize, Serialize};

/// A catalog star.
/// Coordinates are ICRS right ascension and declination in degrees.
/// The magnitude is a generic "brightness" value; lower is brighter.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Star {
    pub id: u64,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub mag: f32,
}

impl Star {
    pub fn new(id: u64, ra_deg: f64, dec_deg: f64, mag: f32) -> Self {
        Self {
            id,
            ra_deg,
            dec_deg,
            mag,
        }
    }

    /// Unit vector pointing to the star's position on the celestial sphere.
    pub fn uvec(&self) -> nalgebra::Vector3<f64> {
        radec_to_uvec(self.ra_deg, self.dec_deg)
    }

    /// Position of the star as a sky coordinate.
    pub fn coord(&self) -> SkyCoord {
        SkyCoord::new(self.ra_deg, self.dec_deg)
    }
}

/// A position on the sky, in degrees.
///
/// No range is enforced on construction: projected glyph vertices may land
/// outside `[0, 360)` in RA until [`SkyCoord::normalized`] is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyCoord {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl SkyCoord {
    pub const fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg, dec_deg }
    }

    /// Bring the coordinate into `[0, 360) x [-90, 90]`.
    ///
    /// A declination past a pole continues down the opposite meridian, so
    /// `(ra, 95)` becomes `(ra + 180, 85)`.
    pub fn normalized(&self) -> Self {
        let (ra_deg, dec_deg) = if (-90.0..=90.0).contains(&self.dec_deg) {
            (self.ra_deg, self.dec_deg)
        } else {
            let folded = (self.dec_deg + 90.0).rem_euclid(360.0) - 90.0;
            if folded > 90.0 {
                (self.ra_deg + 180.0, 180.0 - folded)
            } else {
                (self.ra_deg, folded)
            }
        };
        Self {
            ra_deg: wrap_ra_deg(ra_deg),
            dec_deg,
        }
    }

    /// Unit vector on the celestial sphere.
    pub fn uvec(&self) -> nalgebra::Vector3<f64> {
        radec_to_uvec(self.ra_deg, self.dec_deg)
    }

    /// Great-circle distance to `other`, in degrees.
    pub fn angular_distance_deg(&self, other: &SkyCoord) -> f64 {
        angle_between_deg(&self.uvec(), &other.uvec())
    }
}

/// Wrap a right ascension into `[0, 360)`.
pub fn wrap_ra_deg(ra_deg: f64) -> f64 {
    let wrapped = ra_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

pub(crate) fn radec_to_uvec(ra_deg: f64, dec_deg: f64) -> nalgebra::Vector3<f64> {
    let (sin_ra, cos_ra) = ra_deg.to_radians().sin_cos();
    let (sin_dec, cos_dec) = dec_deg.to_radians().sin_cos();
    nalgebra::Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Angle between two unit vectors, in degrees.
///
/// Uses `atan2(|a x b|, a . b)`, which stays accurate for both tiny and
/// near-antipodal separations where `acos` loses precision.
pub(crate) fn angle_between_deg(a: &nalgebra::Vector3<f64>, b: &nalgebra::Vector3<f64>) -> f64 {
    a.cross(b).norm().atan2(a.dot(b)).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_ra_into_range() {
        assert_eq!(wrap_ra_deg(370.0), 10.0);
        assert_eq!(wrap_ra_deg(-10.0), 350.0);
        assert_eq!(wrap_ra_deg(360.0), 0.0);
        assert!(wrap_ra_deg(-1e-18) < 360.0);
    }

    #[test]
    fn normalized_folds_declination_over_the_pole() {
        let c = SkyCoord::new(-90.0, 95.0).normalized();
        assert_eq!(c.ra_deg, 90.0);
        assert_eq!(c.dec_deg, 85.0);

        let c = SkyCoord::new(350.0, -100.0).normalized();
        assert_eq!(c.ra_deg, 170.0);
        assert_eq!(c.dec_deg, -80.0);

        // In-range declinations are returned untouched, poles included
        let c = SkyCoord::new(370.0, -90.0).normalized();
        assert_eq!(c, SkyCoord::new(10.0, -90.0));
        assert_eq!(SkyCoord::new(1.0, 0.2).normalized().dec_deg, 0.2);
    }

    #[test]
    fn folding_preserves_distance_across_the_pole() {
        // 1 deg short of the pole, then 4 deg past it along the same meridian
        let a = SkyCoord::new(40.0, 89.0).normalized();
        let b = SkyCoord::new(40.0, 94.0).normalized();
        assert!((a.angular_distance_deg(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn distance_across_ra_wrap() {
        let a = SkyCoord::new(359.0, 0.0);
        let b = SkyCoord::new(1.0, 0.0);
        assert!((a.angular_distance_deg(&b) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn distance_near_pole_is_small() {
        // RA differs by 180 deg, but both points hug the pole
        let a = SkyCoord::new(0.0, 89.5);
        let b = SkyCoord::new(180.0, 89.5);
        assert!((a.angular_distance_deg(&b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn star_uvec_is_unit() {
        let s = Star::new(1, 123.0, -45.0, 3.0);
        assert!((s.uvec().norm() - 1.0).abs() < 1e-12);
    }
}
