//! Spatial star index for nearest-neighbor and cone searches.
//!
//! `SkyIndex` stores stars in a custom HEALPix-style spherical binning:
//! latitude is partitioned into `3 * nside` bins in `z = sin(dec)`, and
//! longitude into `4 * nside` bins in right ascension, for a total of
//! `12 * nside^2` cells. Each cell maps to a compact slice of star indices.
//!
//! Query flow:
//! 1. Compute candidate cells intersecting the cone around a sky position.
//! 2. Scan only stars in those cells.
//! 3. Apply exact great-circle filtering.
//!
//! Nearest-neighbor queries run cone searches with a doubling radius until
//! enough stars fall inside, so search time tracks local star density rather
//! than catalog size.
//!
//! The index is immutable once built and can be shared freely across threads.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::star::{angle_between_deg, SkyCoord};
use crate::Star;

/// One nearest-neighbor hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a> {
    /// Position of the star in the index's storage order.
    pub index: usize,
    pub star: &'a Star,
    /// Great-circle distance from the query point, in degrees.
    pub distance_deg: f64,
}

/// Nearest-neighbor search over a star catalog.
///
/// Results are ordered by ascending distance. Implementations must be
/// deterministic: the same query on the same build returns the same order,
/// including among stars at equal distance.
pub trait NearestNeighbors {
    /// Number of stars that can be returned.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` stars nearest to `point`, optionally limited to
    /// `max_distance_deg`. Returns fewer than `k` results when the catalog
    /// or the distance limit constrains it.
    fn nearest(
        &self,
        point: &SkyCoord,
        k: usize,
        max_distance_deg: Option<f64>,
    ) -> Vec<Neighbor<'_>>;
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct SkyIndex {
    pub nside: u32,
    pub n_lat: u32,
    pub n_lon: u32,
    pub stars: Vec<Star>,
    pub cell_offsets: Vec<u32>,
    pub star_indices: Vec<u32>,
}

impl SkyIndex {
    /// Build an index from owned stars.
    ///
    /// `nside` controls resolution; zero is treated as one.
    /// The number of sky cells is `12 * nside^2`.
    /// Storage order is the input order, which also breaks distance ties.
    pub fn new(nside: u32, stars: Vec<Star>) -> Self {
        let nside = nside.max(1);
        let n_lat = 3 * nside;
        let n_lon = 4 * nside;
        let n_cells = (n_lat * n_lon) as usize;

        let mut bins: Vec<Vec<u32>> = vec![Vec::new(); n_cells];
        for (star_idx, star) in stars.iter().enumerate() {
            let cell = Self::cell_for_radec(n_lat, n_lon, star.ra_deg, star.dec_deg);
            bins[cell as usize].push(star_idx as u32);
        }

        let mut cell_offsets = Vec::with_capacity(n_cells + 1);
        let mut star_indices = Vec::with_capacity(stars.len());
        cell_offsets.push(0);
        for cell_bin in bins {
            star_indices.extend(cell_bin);
            cell_offsets.push(star_indices.len() as u32);
        }

        info!("Built sky index: {} stars, nside={}", stars.len(), nside);

        Self {
            nside,
            n_lat,
            n_lon,
            stars,
            cell_offsets,
            star_indices,
        }
    }

    /// Build an index by cloning stars from a slice.
    pub fn from_slice(nside: u32, stars: &[Star]) -> Self {
        Self::new(nside, stars.to_vec())
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Indices of all stars within `radius_deg` of `center`, in storage order.
    pub fn cone_indices(&self, center: &SkyCoord, radius_deg: f64) -> Vec<usize> {
        self.collect_within(center, radius_deg)
            .into_iter()
            .map(|(idx, _)| idx)
            .collect()
    }

    /// References to all stars within `radius_deg` of `center`.
    pub fn cone_stars(&self, center: &SkyCoord, radius_deg: f64) -> Vec<&Star> {
        self.cone_indices(center, radius_deg)
            .into_iter()
            .map(|idx| &self.stars[idx])
            .collect()
    }

    /// Up to `k` stars nearest to `point`, ascending by great-circle distance.
    ///
    /// With `max_distance_deg` a single cone search bounds the candidates.
    /// Without it the search radius starts at the cell scale and doubles
    /// until `k` stars are found or the whole sphere is covered.
    pub fn nearest(
        &self,
        point: &SkyCoord,
        k: usize,
        max_distance_deg: Option<f64>,
    ) -> Vec<Neighbor<'_>> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }

        let hits = match max_distance_deg {
            Some(max_distance) => self.collect_within(point, max_distance),
            None => {
                let mut radius = self.cell_scale_deg();
                loop {
                    let hits = self.collect_within(point, radius);
                    if hits.len() >= k || radius >= 180.0 {
                        break hits;
                    }
                    radius = (radius * 2.0).min(180.0);
                }
            }
        };

        let mut neighbors: Vec<Neighbor<'_>> = hits
            .into_iter()
            .map(|(index, distance_deg)| Neighbor {
                index,
                star: &self.stars[index],
                distance_deg,
            })
            .collect();
        sort_neighbors(&mut neighbors);
        neighbors.truncate(k);
        neighbors
    }

    /// Approximate angular size of one cell, in degrees.
    fn cell_scale_deg(&self) -> f64 {
        let n_cells = (self.n_lat * self.n_lon) as f64;
        (4.0 * PI / n_cells).sqrt().to_degrees()
    }

    /// `(storage index, distance)` for every star within the cone, sorted by index.
    fn collect_within(&self, center: &SkyCoord, radius_deg: f64) -> Vec<(usize, f64)> {
        // Also rejects NaN radii
        if self.is_empty() || !(radius_deg >= 0.0) {
            return Vec::new();
        }
        let center = center.normalized();
        let dir = center.uvec();
        let radius = radius_deg.to_radians().min(PI);
        let dec_c = center.dec_deg.to_radians();

        let dec_min = (dec_c - radius).max(-FRAC_PI_2);
        let dec_max = (dec_c + radius).min(FRAC_PI_2);

        let lon_step = TAU / self.n_lon as f64;
        // Widest RA extent of the cone; a cone over a pole spans every RA
        let lon_half_span = if dec_c.abs() + radius >= FRAC_PI_2 {
            PI
        } else {
            (radius.sin() / dec_c.cos()).clamp(-1.0, 1.0).asin() + 1e-9
        };
        let full_ring = 2.0 * (lon_half_span + lon_step) >= TAU;
        let phi = center.ra_deg.to_radians();

        let mut out = Vec::new();
        for lat_bin in Self::z_bin_range(self.n_lat, dec_min.sin(), dec_max.sin()) {
            if full_ring {
                for lon_bin in 0..self.n_lon {
                    self.collect_cell_matches(lat_bin, lon_bin, &dir, radius_deg, &mut out);
                }
                continue;
            }
            self.for_each_wrapped_lon_bin(phi - lon_half_span, phi + lon_half_span, |lon_bin| {
                self.collect_cell_matches(lat_bin, lon_bin, &dir, radius_deg, &mut out);
            });
        }

        out.sort_unstable_by_key(|&(idx, _)| idx);
        out.dedup_by_key(|&mut (idx, _)| idx);
        out
    }

    fn collect_cell_matches(
        &self,
        lat_bin: u32,
        lon_bin: u32,
        dir: &nalgebra::Vector3<f64>,
        radius_deg: f64,
        out: &mut Vec<(usize, f64)>,
    ) {
        let cell = (lat_bin * self.n_lon + lon_bin) as usize;
        let start = self.cell_offsets[cell] as usize;
        let end = self.cell_offsets[cell + 1] as usize;

        for flat_idx in start..end {
            let star_idx = self.star_indices[flat_idx] as usize;
            let distance = angle_between_deg(dir, &self.stars[star_idx].uvec());
            if distance <= radius_deg {
                out.push((star_idx, distance));
            }
        }
    }

    fn for_each_wrapped_lon_bin<F>(&self, lon_min: f64, lon_max: f64, mut f: F)
    where
        F: FnMut(u32),
    {
        let start_bin = Self::phi_to_lon_bin(self.n_lon, lon_min.rem_euclid(TAU));
        let end_bin = Self::phi_to_lon_bin(self.n_lon, lon_max.rem_euclid(TAU));

        if start_bin <= end_bin {
            for lon_bin in start_bin..=end_bin {
                f(lon_bin);
            }
            return;
        }

        for lon_bin in start_bin..self.n_lon {
            f(lon_bin);
        }
        for lon_bin in 0..=end_bin {
            f(lon_bin);
        }
    }

    fn z_bin_range(n_lat: u32, z_min: f64, z_max: f64) -> std::ops::RangeInclusive<u32> {
        let start = Self::z_to_lat_bin(n_lat, z_min);
        let end = Self::z_to_lat_bin(n_lat, z_max);
        start..=end
    }

    fn cell_for_radec(n_lat: u32, n_lon: u32, ra_deg: f64, dec_deg: f64) -> u32 {
        let phi = ra_deg.to_radians().rem_euclid(TAU);
        let z = dec_deg.to_radians().sin();
        let lat_bin = Self::z_to_lat_bin(n_lat, z);
        let lon_bin = Self::phi_to_lon_bin(n_lon, phi);
        lat_bin * n_lon + lon_bin
    }

    fn z_to_lat_bin(n_lat: u32, z: f64) -> u32 {
        let u = ((z.clamp(-1.0, 1.0) + 1.0) * 0.5).clamp(0.0, 1.0);
        ((u * n_lat as f64).floor() as u32).min(n_lat - 1)
    }

    fn phi_to_lon_bin(n_lon: u32, phi: f64) -> u32 {
        let u = (phi / TAU).clamp(0.0, 1.0);
        ((u * n_lon as f64).floor() as u32).min(n_lon - 1)
    }
}

impl NearestNeighbors for SkyIndex {
    fn len(&self) -> usize {
        self.stars.len()
    }

    fn nearest(
        &self,
        point: &SkyCoord,
        k: usize,
        max_distance_deg: Option<f64>,
    ) -> Vec<Neighbor<'_>> {
        SkyIndex::nearest(self, point, k, max_distance_deg)
    }
}

/// Linear scan over a plain slice. Slow, but trivially correct.
impl NearestNeighbors for [Star] {
    fn len(&self) -> usize {
        <[Star]>::len(self)
    }

    fn nearest(
        &self,
        point: &SkyCoord,
        k: usize,
        max_distance_deg: Option<f64>,
    ) -> Vec<Neighbor<'_>> {
        if k == 0 {
            return Vec::new();
        }
        let dir = point.normalized().uvec();
        let limit = max_distance_deg.unwrap_or(f64::INFINITY);
        let mut neighbors: Vec<Neighbor<'_>> = self
            .iter()
            .enumerate()
            .map(|(index, star)| Neighbor {
                index,
                star,
                distance_deg: angle_between_deg(&dir, &star.uvec()),
            })
            .filter(|n| n.distance_deg <= limit)
            .collect();
        sort_neighbors(&mut neighbors);
        neighbors.truncate(k);
        neighbors
    }
}

fn sort_neighbors(neighbors: &mut [Neighbor<'_>]) {
    neighbors.sort_by(|a, b| {
        a.distance_deg
            .total_cmp(&b.distance_deg)
            .then(a.index.cmp(&b.index))
    });
}

// ── Serialization ───────────────────────────────────────────────────────────

impl SkyIndex {
    /// Serialize the index to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| anyhow::anyhow!("rkyv serialization failed: {}", e))?;
        Ok(bytes.to_vec())
    }

    /// Save the index to a file using rkyv.
    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let bytes = self.to_rkyv_bytes()?;
        std::fs::write(path, &bytes)?;
        info!("Saved sky index to {} ({} bytes)", path, bytes.len());
        Ok(())
    }

    /// Verify that the cell table is consistent with `nside` and the star list.
    ///
    /// rkyv validates bytes, not the relations between fields, and queries
    /// index the tables without bounds recovery.
    fn check_layout(&self) -> anyhow::Result<()> {
        let nside = self.nside as u64;
        if nside == 0 || self.n_lat as u64 != 3 * nside || self.n_lon as u64 != 4 * nside {
            anyhow::bail!(
                "inconsistent grid: nside={}, n_lat={}, n_lon={}",
                self.nside,
                self.n_lat,
                self.n_lon
            );
        }
        let n_cells = self.n_lat as usize * self.n_lon as usize;
        if self.cell_offsets.len() != n_cells + 1 {
            anyhow::bail!(
                "expected {} cell offsets, found {}",
                n_cells + 1,
                self.cell_offsets.len()
            );
        }
        if self.cell_offsets.first() != Some(&0)
            || self.cell_offsets.windows(2).any(|w| w[0] > w[1])
            || self.cell_offsets.last().map(|&o| o as usize) != Some(self.star_indices.len())
        {
            anyhow::bail!("cell offsets are not a monotone partition of the star indices");
        }
        if let Some(&bad) = self
            .star_indices
            .iter()
            .find(|&&i| i as usize >= self.stars.len())
        {
            anyhow::bail!("star index {} out of range for {} stars", bad, self.stars.len());
        }
        Ok(())
    }

    /// Load an index from an rkyv file.
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(&bytes);
        let index = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))?;
        index.check_layout()?;
        info!("Loaded sky index: {} stars, nside={}", index.len(), index.nside);
        Ok(index)
    }
}
