//! Proximity clustering
//!
//! Single-linkage clustering with a hard distance cutoff: two points share a cluster iff
//! they are connected by a chain of pairwise distances each `<= distance`. Neighbours are
//! found with the quadtree [`PointIndex`] and merged with a [`UnionFind`].
//!
//! Cluster ids are assigned in ascending order of each cluster's lowest member feature id,
//! so the result does not depend on input order.

use crate::spatial::{PointIndex, is_finite};
use crate::{AttributeValue, Dataset, FeatureId, GeneralizeError, Result};
use geo::Point;
use std::collections::HashMap;

/// Cluster identifier, unique within one level
pub type ClusterId = u32;

/// Default attribute names written by [`clusterize_by_distance`]
pub const DEFAULT_CLUSTER_ID_ATTRIBUTE: &str = "CLUSTER_ID";
pub const DEFAULT_CLUSTER_SIZE_ATTRIBUTE: &str = "CLUSTER_SIZE";

/// Disjoint-set forest with path halving and union by rank
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; returns false if they were already joined
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}

/// Per-level partition of features into clusters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterAssignment {
    level: u32,
    distance: f64,
    cluster_of: HashMap<FeatureId, ClusterId>,
    /// Members per cluster id, each sorted ascending
    members: Vec<Vec<FeatureId>>,
}

impl ClusterAssignment {
    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[inline]
    pub fn cluster_id(&self, feature: FeatureId) -> Option<ClusterId> {
        self.cluster_of.get(&feature).copied()
    }

    pub fn cluster_size(&self, feature: FeatureId) -> Option<usize> {
        self.cluster_id(feature).map(|id| self.members[id as usize].len())
    }

    /// Members of a cluster in ascending feature id order
    pub fn members(&self, cluster: ClusterId) -> &[FeatureId] {
        self.members
            .get(cluster as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All clusters in id order
    pub fn clusters(&self) -> impl Iterator<Item = (ClusterId, &[FeatureId])> {
        self.members
            .iter()
            .enumerate()
            .map(|(id, members)| (id as ClusterId, members.as_slice()))
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.members.len()
    }

    /// Number of clustered features
    #[inline]
    pub fn len(&self) -> usize {
        self.cluster_of.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cluster_of.is_empty()
    }

    /// Cluster id annotation map, ready for [`Dataset::update_attribute`]
    pub fn id_attribute(&self) -> HashMap<FeatureId, AttributeValue> {
        self.cluster_of
            .iter()
            .map(|(&fid, &cid)| (fid, AttributeValue::from(cid)))
            .collect()
    }

    /// Cluster size annotation map, ready for [`Dataset::update_attribute`]
    pub fn size_attribute(&self) -> HashMap<FeatureId, AttributeValue> {
        self.cluster_of
            .iter()
            .map(|(&fid, &cid)| (fid, AttributeValue::from(self.members[cid as usize].len())))
            .collect()
    }
}

/// Cluster `points` at one level.
///
/// Fails with [`GeneralizeError::InvalidParameter`] if `distance` is not a positive finite
/// number, and with [`GeneralizeError::ClusteringFailure`] on non-finite coordinates.
/// An empty input yields an empty assignment.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn cluster_points(
    points: &[(FeatureId, Point<f64>)],
    level: u32,
    distance: f64,
) -> Result<ClusterAssignment> {
    if !(distance.is_finite() && distance > 0.0) {
        return Err(GeneralizeError::InvalidParameter(format!(
            "Clustering distance must be positive, got {distance}"
        )));
    }

    if let Some((id, _)) = points.iter().find(|(_, p)| !is_finite(p)) {
        return Err(GeneralizeError::ClusteringFailure {
            level,
            reason: format!("Feature {id} has a non-finite coordinate"),
        });
    }

    let geometries: Vec<Point<f64>> = points.iter().map(|(_, p)| *p).collect();
    let index = PointIndex::new(&geometries);
    let mut sets = UnionFind::new(points.len());

    for (i, point) in geometries.iter().enumerate() {
        for j in index.within_distance(*point, distance) {
            if j > i {
                sets.union(i, j);
            }
        }
    }

    // Group by root, then order groups by their lowest feature id
    let mut groups: HashMap<usize, Vec<FeatureId>> = HashMap::new();
    for (i, (id, _)) in points.iter().enumerate() {
        groups.entry(sets.find(i)).or_default().push(*id);
    }
    let mut members: Vec<Vec<FeatureId>> = groups
        .into_values()
        .map(|mut group| {
            group.sort_unstable();
            group
        })
        .collect();
    members.sort_unstable_by_key(|group| group[0]);

    let mut cluster_of = HashMap::with_capacity(points.len());
    for (cluster, group) in members.iter().enumerate() {
        for &fid in group {
            if cluster_of.insert(fid, cluster as ClusterId).is_some() {
                return Err(GeneralizeError::ClusteringFailure {
                    level,
                    reason: format!("Feature {fid} appears more than once"),
                });
            }
        }
    }

    Ok(ClusterAssignment {
        level,
        distance,
        cluster_of,
        members,
    })
}

/// Annotate every feature of `dataset` with its cluster id and size at `distance`
pub fn clusterize_by_distance(
    dataset: &mut Dataset,
    distance: f64,
    id_attribute: &str,
    size_attribute: &str,
) -> Result<ClusterAssignment> {
    let assignment = cluster_points(&dataset.points(), 0, distance)?;
    dataset.update_attribute(id_attribute, &assignment.id_attribute());
    dataset.update_attribute(size_attribute, &assignment.size_attribute());

    tracing::info!(
        "Clusterized '{}': {} features into {} clusters at distance {}",
        dataset.name,
        assignment.len(),
        assignment.cluster_count(),
        distance
    );
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Feature;

    fn line_points(xs: &[f64]) -> Vec<(FeatureId, Point<f64>)> {
        xs.iter()
            .enumerate()
            .map(|(i, &x)| (i as FeatureId, Point::new(x, 0.0)))
            .collect()
    }

    fn partition(assignment: &ClusterAssignment) -> Vec<Vec<FeatureId>> {
        assignment.clusters().map(|(_, m)| m.to_vec()).collect()
    }

    #[test]
    fn test_union_find() {
        let mut sets = UnionFind::new(5);
        assert!(sets.union(0, 1));
        assert!(sets.union(3, 4));
        assert!(!sets.union(1, 0));
        assert_eq!(sets.find(0), sets.find(1));
        assert_ne!(sets.find(1), sets.find(3));
        assert!(sets.union(1, 4));
        assert_eq!(sets.find(0), sets.find(3));
        assert_eq!(sets.len(), 5);
    }

    #[test]
    fn test_single_linkage_chains() {
        // dist(A,B) = dist(B,C) = 10, dist(A,C) = 20
        let points = line_points(&[0.0, 10.0, 20.0]);
        let assignment = cluster_points(&points, 0, 12.0).unwrap();
        assert_eq!(assignment.cluster_count(), 1);
        assert_eq!(assignment.cluster_size(0), Some(3));
        assert_eq!(assignment.cluster_id(0), assignment.cluster_id(2));
    }

    #[test]
    fn test_line_fixture_partitions_per_level() {
        // Levels use base / 2^level: 16, 8, 4
        let points = line_points(&[0.0, 4.0, 20.0, 26.0, 60.0]);
        let base = 16.0;

        let level0 = cluster_points(&points, 0, base).unwrap();
        assert_eq!(partition(&level0), vec![vec![0, 1, 2, 3], vec![4]]);

        let level1 = cluster_points(&points, 1, base / 2.0).unwrap();
        assert_eq!(partition(&level1), vec![vec![0, 1], vec![2, 3], vec![4]]);

        let level2 = cluster_points(&points, 2, base / 4.0).unwrap();
        assert_eq!(partition(&level2), vec![vec![0, 1], vec![2], vec![3], vec![4]]);
    }

    #[test]
    fn test_partition_invariants() {
        let points: Vec<(FeatureId, Point<f64>)> = (0..200u64)
            .map(|i| {
                let x = ((i * 37) % 101) as f64;
                let y = ((i * 53) % 89) as f64;
                (1000 - i, Point::new(x, y))
            })
            .collect();
        let assignment = cluster_points(&points, 3, 6.0).unwrap();

        assert_eq!(assignment.len(), points.len());
        let total: usize = assignment.clusters().map(|(_, m)| m.len()).sum();
        assert_eq!(total, points.len());

        for (id, _) in &points {
            let cluster = assignment.cluster_id(*id).unwrap();
            let members = assignment.members(cluster);
            assert!(members.contains(id));
            assert_eq!(assignment.cluster_size(*id), Some(members.len()));
        }
    }

    #[test]
    fn test_cluster_ids_follow_lowest_member() {
        let points = vec![
            (9, Point::new(100.0, 0.0)),
            (5, Point::new(0.0, 0.0)),
            (2, Point::new(101.0, 0.0)),
        ];
        let assignment = cluster_points(&points, 0, 2.0).unwrap();
        assert_eq!(assignment.cluster_id(2), Some(0));
        assert_eq!(assignment.cluster_id(9), Some(0));
        assert_eq!(assignment.cluster_id(5), Some(1));
    }

    #[test]
    fn test_invalid_distance_and_empty_input() {
        let points = line_points(&[0.0, 1.0]);
        for distance in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                cluster_points(&points, 0, distance),
                Err(GeneralizeError::InvalidParameter(_))
            ));
        }

        let empty = cluster_points(&[], 0, 10.0).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.cluster_count(), 0);
    }

    #[test]
    fn test_non_finite_coordinate_is_clustering_failure() {
        let points = vec![(1, Point::new(0.0, 0.0)), (2, Point::new(f64::INFINITY, 0.0))];
        match cluster_points(&points, 4, 1.0) {
            Err(GeneralizeError::ClusteringFailure { level, .. }) => assert_eq!(level, 4),
            other => panic!("expected clustering failure, got {other:?}"),
        }
    }

    #[test]
    fn test_clusterize_by_distance_writes_attributes() {
        let mut dataset = Dataset::from_features(
            "towns",
            vec![
                Feature::new(1, Point::new(0.0, 0.0)),
                Feature::new(2, Point::new(3.0, 4.0)),
                Feature::new(3, Point::new(50.0, 0.0)),
            ],
        )
        .unwrap();

        clusterize_by_distance(
            &mut dataset,
            5.0,
            DEFAULT_CLUSTER_ID_ATTRIBUTE,
            DEFAULT_CLUSTER_SIZE_ATTRIBUTE,
        )
        .unwrap();

        let f2 = dataset.feature(2).unwrap();
        assert_eq!(f2.numeric_attribute(DEFAULT_CLUSTER_ID_ATTRIBUTE), Some(0.0));
        assert_eq!(f2.numeric_attribute(DEFAULT_CLUSTER_SIZE_ATTRIBUTE), Some(2.0));
        let f3 = dataset.feature(3).unwrap();
        assert_eq!(f3.numeric_attribute(DEFAULT_CLUSTER_ID_ATTRIBUTE), Some(1.0));
        assert_eq!(f3.numeric_attribute(DEFAULT_CLUSTER_SIZE_ATTRIBUTE), Some(1.0));
    }
}
