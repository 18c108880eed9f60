//! Free-form "constellation walk" from the star nearest the viewpoint.
//!
//! Instead of tracing glyphs, the walk hops from star to star, always to the
//! nearest star not yet visited. Each hop first asks for `initial_k`
//! neighbors and grows the request one star at a time, up to `max_query`,
//! while every returned star has already been visited.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::skyindex::NearestNeighbors;
use crate::Star;

use super::path_split::split_at_antimeridian;
use super::{validate_viewpoint, PathSegment, Viewpoint};

/// Parameters controlling the walk.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Maximum number of hops after the starting star. Default 50.
    pub max_hops: usize,
    /// Neighbors requested on the first try of each hop. Default 2.
    pub initial_k: usize,
    /// Largest neighbor request before the walk gives up. Default 10.
    pub max_query: usize,
    /// Offset of antimeridian boundary points, degrees. Default 1e-4.
    pub boundary_epsilon: f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_hops: 50,
            initial_k: 2,
            max_query: 10,
            boundary_epsilon: 1e-4,
        }
    }
}

/// Output of [`trace_walk`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WalkResult {
    pub segments: Vec<PathSegment>,
    /// Visited star ids in walk order, starting with the nearest star.
    pub used_stars: Vec<u64>,
}

/// The catalog star closest to the viewpoint, if any.
pub fn nearest_star<'a, N>(index: &'a N, viewpoint: &Viewpoint) -> Option<&'a Star>
where
    N: NearestNeighbors + ?Sized,
{
    index
        .nearest(&viewpoint.coord().normalized(), 1, None)
        .first()
        .map(|n| n.star)
}

/// Walk outward from the star nearest `viewpoint`.
///
/// The walk ends after `max_hops` hops, or earlier when no unvisited star
/// turns up within `max_query` neighbors.
pub fn trace_walk<N>(index: &N, viewpoint: &Viewpoint, config: &WalkConfig) -> Result<WalkResult>
where
    N: NearestNeighbors + ?Sized,
{
    if config.initial_k == 0 || config.max_query < config.initial_k {
        return Err(ResolveError::InvalidConfig(format!(
            "walk needs 1 <= initial_k <= max_query, got {} and {}",
            config.initial_k, config.max_query
        )));
    }
    if !(config.boundary_epsilon > 0.0 && config.boundary_epsilon < 180.0) {
        return Err(ResolveError::InvalidConfig(format!(
            "boundary_epsilon must be in (0, 180), got {}",
            config.boundary_epsilon
        )));
    }
    validate_viewpoint(viewpoint)?;
    let start = nearest_star(index, viewpoint).ok_or(ResolveError::EmptyCatalog)?;

    let mut visited = HashSet::from([start.id]);
    let mut used_stars = vec![start.id];
    let mut path = vec![start.coord()];
    let mut current = start.coord();

    for _ in 0..config.max_hops {
        let mut k = config.initial_k;
        let next = loop {
            let found = index
                .nearest(&current, k, None)
                .into_iter()
                .find(|n| !visited.contains(&n.star.id));
            if found.is_some() || k >= config.max_query {
                break found;
            }
            k += 1;
        };

        let Some(next) = next else {
            debug!("Walk stopped after {} stars: no unvisited neighbor", used_stars.len());
            break;
        };
        visited.insert(next.star.id);
        used_stars.push(next.star.id);
        current = next.star.coord();
        path.push(current);
    }

    let segments = split_at_antimeridian(&path, config.boundary_epsilon)
        .into_iter()
        .map(|points| PathSegment {
            letter: None,
            points,
        })
        .collect();

    Ok(WalkResult {
        segments,
        used_stars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkyIndex;

    fn line_of_stars() -> SkyIndex {
        let stars = (0..8)
            .map(|i| Star::new(100 + i, 10.0 + i as f64, 0.0, 3.0))
            .collect();
        SkyIndex::new(8, stars)
    }

    #[test]
    fn nearest_star_to_viewpoint() {
        let index = line_of_stars();
        let star = nearest_star(&index, &Viewpoint::new(12.2, 0.1, 3.0)).unwrap();
        assert_eq!(star.id, 102);

        let empty = SkyIndex::new(8, Vec::new());
        assert!(nearest_star(&empty, &Viewpoint::new(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn walks_along_nearest_unvisited_stars() {
        let index = line_of_stars();
        let result = trace_walk(&index, &Viewpoint::new(10.0, 0.0, 3.0), &WalkConfig::default()).unwrap();
        assert_eq!(result.used_stars, (100..108).collect::<Vec<u64>>());
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].points.len(), 8);
        assert_eq!(result.segments[0].letter, None);
    }

    #[test]
    fn hop_limit_is_respected() {
        let index = line_of_stars();
        let config = WalkConfig {
            max_hops: 3,
            ..Default::default()
        };
        let result = trace_walk(&index, &Viewpoint::new(10.0, 0.0, 3.0), &config).unwrap();
        assert_eq!(result.used_stars, vec![100, 101, 102, 103]);
    }

    #[test]
    fn gives_up_when_query_limit_is_reached() {
        // Walking from the middle visits one side, then cannot see past
        // max_query visited stars to reach the far side.
        let index = line_of_stars();
        let config = WalkConfig {
            initial_k: 1,
            max_query: 2,
            ..Default::default()
        };
        let result = trace_walk(&index, &Viewpoint::new(13.0, 0.0, 3.0), &config).unwrap();
        assert!(result.used_stars.len() < 8);
        let mut ids = result.used_stars.clone();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), result.used_stars.len());
    }

    #[test]
    fn walk_across_seam_is_split() {
        let stars = vec![
            Star::new(1, 358.0, 0.0, 1.0),
            Star::new(2, 359.5, 0.0, 1.0),
            Star::new(3, 1.0, 0.0, 1.0),
        ];
        let index = SkyIndex::new(8, stars);
        let result = trace_walk(&index, &Viewpoint::new(358.0, 0.0, 3.0), &WalkConfig::default()).unwrap();
        assert_eq!(result.used_stars, vec![1, 2, 3]);
        assert_eq!(result.segments.len(), 2);
    }

    #[test]
    fn non_finite_viewpoint_is_rejected() {
        let index = line_of_stars();
        let result = trace_walk(&index, &Viewpoint::new(f64::NAN, 0.0, 3.0), &WalkConfig::default());
        assert!(matches!(result, Err(ResolveError::InvalidConfig(_))));
    }

    #[test]
    fn zero_boundary_epsilon_is_rejected() {
        let index = line_of_stars();
        let config = WalkConfig {
            boundary_epsilon: 0.0,
            ..Default::default()
        };
        let result = trace_walk(&index, &Viewpoint::new(10.0, 0.0, 3.0), &config);
        assert!(matches!(result, Err(ResolveError::InvalidConfig(_))));
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let index = SkyIndex::new(8, Vec::new());
        assert_eq!(
            trace_walk(&index, &Viewpoint::new(0.0, 0.0, 0.0), &WalkConfig::default()),
            Err(ResolveError::EmptyCatalog)
        );
    }
}
