//! Binding projected glyph vertices to catalog stars.
//!
//! For each vertex the mapper asks the index for the `initial_k` nearest
//! stars inside the search radius and keeps the brightest one not already
//! used in this call. When every nearby star is taken it widens to an
//! unbounded query, growing `k` one star at a time up to the catalog size.

use std::collections::HashSet;

use tracing::debug;

use crate::skyindex::{NearestNeighbors, Neighbor};
use crate::star::SkyCoord;

/// A vertex after mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedPoint {
    /// The star's catalog position, or the RA-wrapped projected position
    /// when no star could be bound.
    pub coord: SkyCoord,
    pub star_id: Option<u64>,
}

/// Call-scoped star binder. Holds the set of stars already used.
pub struct StarMapper<'a, N: NearestNeighbors + ?Sized> {
    index: &'a N,
    max_distance_deg: f64,
    initial_k: usize,
    used: HashSet<u64>,
    used_order: Vec<u64>,
}

impl<'a, N: NearestNeighbors + ?Sized> StarMapper<'a, N> {
    pub fn new(index: &'a N, max_distance_deg: f64, initial_k: usize) -> Self {
        Self {
            index,
            max_distance_deg,
            initial_k,
            used: HashSet::new(),
            used_order: Vec::new(),
        }
    }

    /// Ids of the stars bound so far, in binding order.
    pub fn used_stars(&self) -> &[u64] {
        &self.used_order
    }

    pub fn into_used_stars(self) -> Vec<u64> {
        self.used_order
    }

    pub fn map_point(&mut self, point: &SkyCoord) -> MappedPoint {
        let point = point.normalized();

        let mut candidates = self.unused(self.index.nearest(
            &point,
            self.initial_k,
            Some(self.max_distance_deg),
        ));

        if candidates.is_empty() {
            debug!(
                "No unused star within {:.5} deg of ({:.4}, {:.4}); widening",
                self.max_distance_deg, point.ra_deg, point.dec_deg
            );
            // Each step adds at most one star, so this finds the nearest
            // unused star; bounded by catalog size.
            for k in 1..=self.index.len() {
                candidates = self.unused(self.index.nearest(&point, k, None));
                if !candidates.is_empty() {
                    break;
                }
            }
        }

        // min_by keeps the first of equal elements, i.e. the index's order
        let brightest = candidates
            .iter()
            .min_by(|a, b| a.star.mag.total_cmp(&b.star.mag))
            .map(|n| (n.star.id, n.star.coord()));

        match brightest {
            Some((id, coord)) => {
                self.used.insert(id);
                self.used_order.push(id);
                MappedPoint {
                    coord,
                    star_id: Some(id),
                }
            }
            None => MappedPoint {
                coord: point,
                star_id: None,
            },
        }
    }

    fn unused<'n>(&self, neighbors: Vec<Neighbor<'n>>) -> Vec<Neighbor<'n>> {
        neighbors
            .into_iter()
            .filter(|n| !self.used.contains(&n.star.id))
            .collect()
    }
}
