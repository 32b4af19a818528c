//! Quadtree point index for radius and nearest-neighbour queries
//!
//! The tree is rooted at the bounding box of the indexed points and subdivides a node
//! into four children (NW, NE, SW, SE) once it holds more than a bucket's worth of
//! points. Queries cull whole nodes whose bounding box does not intersect the query
//! square before testing individual points.

use geo::{Coord, Point, Rect};
use smallvec::SmallVec;

/// Maximum depth of the quadtree to prevent infinite recursion on duplicate points
const MAX_DEPTH: u32 = 20;

/// Number of points a leaf holds before it is subdivided
const MAX_POINTS_PER_NODE: usize = 16;

#[derive(Clone, Copy, Debug)]
struct IndexedPoint {
    /// Position of the point in the slice the index was built from
    index: usize,
    point: Point<f64>,
}

/// Spatial index over a fixed set of points
#[derive(Debug, Clone)]
pub struct PointIndex {
    root: QuadtreeNode,
    len: usize,
}

/// A single node in the point quadtree
#[derive(Debug, Clone)]
struct QuadtreeNode {
    /// Bounding box of this node
    bounding_box: Rect<f64>,
    /// Depth level in the tree (0 = root)
    level: u32,
    /// Points stored at this node (leaves only, or nodes at maximum depth)
    points: SmallVec<[IndexedPoint; MAX_POINTS_PER_NODE]>,
    /// Child nodes (NW, NE, SW, SE) if subdivided
    children: Option<Box<[QuadtreeNode; 4]>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PointIndex {
    /// Build an index over `points`; query results refer to positions in this slice.
    ///
    /// Points with non-finite coordinates are skipped.
    pub fn new(points: &[Point<f64>]) -> Self {
        let bounding_box = bounding_box_of(points);
        let mut root = QuadtreeNode::new(bounding_box, 0);
        let mut len = 0;
        for (index, point) in points.iter().enumerate() {
            if !is_finite(point) {
                continue;
            }
            root.insert(IndexedPoint {
                index,
                point: *point,
            });
            len += 1;
        }
        Self { root, len }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Indices of all points at euclidean distance `<= distance` from `center`,
    /// in ascending index order
    pub fn within_distance(&self, center: Point<f64>, distance: f64) -> Vec<usize> {
        let query = Rect::new(
            Coord {
                x: center.x() - distance,
                y: center.y() - distance,
            },
            Coord {
                x: center.x() + distance,
                y: center.y() + distance,
            },
        );

        let mut results = Vec::new();
        self.root.query(query, &mut |candidate: &IndexedPoint| {
            if euclidean_distance(candidate.point, center) <= distance {
                results.push(candidate.index);
            }
        });
        results.sort_unstable();
        results
    }

    /// The closest point within `max_distance` of `center`; ties resolve to the lowest index
    pub fn nearest_within(&self, center: Point<f64>, max_distance: f64) -> Option<usize> {
        let query = Rect::new(
            Coord {
                x: center.x() - max_distance,
                y: center.y() - max_distance,
            },
            Coord {
                x: center.x() + max_distance,
                y: center.y() + max_distance,
            },
        );

        let mut best: Option<(f64, usize)> = None;
        self.root.query(query, &mut |candidate: &IndexedPoint| {
            let distance = euclidean_distance(candidate.point, center);
            if distance > max_distance {
                return;
            }
            let better = match best {
                None => true,
                Some((best_distance, best_index)) => {
                    distance < best_distance || (distance == best_distance && candidate.index < best_index)
                }
            };
            if better {
                best = Some((distance, candidate.index));
            }
        });
        best.map(|(_, index)| index)
    }
}

impl QuadtreeNode {
    fn new(bounding_box: Rect<f64>, level: u32) -> Self {
        Self {
            bounding_box,
            level,
            points: SmallVec::new(),
            children: None,
        }
    }

    /// Subdivide this node into 4 children and push its points down
    fn subdivide(&mut self) {
        if self.children.is_some() {
            return; // Already subdivided
        }

        let min = self.bounding_box.min();
        let max = self.bounding_box.max();
        let mid_x = (min.x + max.x) / 2.0;
        let mid_y = (min.y + max.y) / 2.0;
        let child_level = self.level + 1;

        let nw = QuadtreeNode::new(
            Rect::new(Coord { x: min.x, y: mid_y }, Coord { x: mid_x, y: max.y }),
            child_level,
        );
        let ne = QuadtreeNode::new(
            Rect::new(Coord { x: mid_x, y: mid_y }, Coord { x: max.x, y: max.y }),
            child_level,
        );
        let sw = QuadtreeNode::new(
            Rect::new(Coord { x: min.x, y: min.y }, Coord { x: mid_x, y: mid_y }),
            child_level,
        );
        let se = QuadtreeNode::new(
            Rect::new(Coord { x: mid_x, y: min.y }, Coord { x: max.x, y: mid_y }),
            child_level,
        );

        let mut children = Box::new([nw, ne, sw, se]);
        for point in self.points.drain(..) {
            let quadrant = Self::quadrant(mid_x, mid_y, point.point);
            children[quadrant].insert(point);
        }
        self.children = Some(children);
    }

    /// Child slot for a point: NW=0, NE=1, SW=2, SE=3 (points on a split line go east/north)
    #[inline]
    fn quadrant(mid_x: f64, mid_y: f64, point: Point<f64>) -> usize {
        let east = point.x() >= mid_x;
        let north = point.y() >= mid_y;
        match (north, east) {
            (true, false) => 0,
            (true, true) => 1,
            (false, false) => 2,
            (false, true) => 3,
        }
    }

    fn insert(&mut self, point: IndexedPoint) {
        if let Some(children) = &mut self.children {
            let min = self.bounding_box.min();
            let max = self.bounding_box.max();
            let quadrant = Self::quadrant((min.x + max.x) / 2.0, (min.y + max.y) / 2.0, point.point);
            children[quadrant].insert(point);
            return;
        }

        self.points.push(point);
        if self.points.len() > MAX_POINTS_PER_NODE && self.level < MAX_DEPTH {
            self.subdivide();
        }
    }

    /// Visit every point of nodes intersecting `query`
    fn query<F: FnMut(&IndexedPoint)>(&self, query: Rect<f64>, visit: &mut F) {
        // Frustum culling - check if this node intersects the query square
        if !self.intersects(query) {
            return;
        }

        for point in &self.points {
            visit(point);
        }

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(query, visit);
            }
        }
    }

    fn intersects(&self, query: Rect<f64>) -> bool {
        let min = self.bounding_box.min();
        let max = self.bounding_box.max();
        let qmin = query.min();
        let qmax = query.max();

        // Check for intersection (not disjoint)
        !(max.x < qmin.x || min.x > qmax.x || max.y < qmin.y || min.y > qmax.y)
    }
}

#[inline]
pub(crate) fn euclidean_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

#[inline]
pub(crate) fn is_finite(point: &Point<f64>) -> bool {
    point.x().is_finite() && point.y().is_finite()
}

fn bounding_box_of(points: &[Point<f64>]) -> Rect<f64> {
    let mut finite = points.iter().filter(|p| is_finite(p));
    let Some(first) = finite.next() else {
        return Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x(), first.y(), first.x(), first.y());
    for p in finite {
        min_x = min_x.min(p.x());
        min_y = min_y.min(p.y());
        max_x = max_x.max(p.x());
        max_y = max_y.max(p.y());
    }
    Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_within(points: &[Point<f64>], center: Point<f64>, distance: f64) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| euclidean_distance(**p, center) <= distance)
            .map(|(i, _)| i)
            .collect()
    }

    fn create_grid_points(n: usize) -> Vec<Point<f64>> {
        (0..n * n)
            .map(|i| Point::new((i % n) as f64 * 3.0, (i / n) as f64 * 2.0))
            .collect()
    }

    #[test]
    fn test_empty_index() {
        let index = PointIndex::new(&[]);
        assert!(index.is_empty());
        assert!(index.within_distance(Point::new(0.0, 0.0), 10.0).is_empty());
        assert!(index.nearest_within(Point::new(0.0, 0.0), 10.0).is_none());
    }

    #[test]
    fn test_node_subdivide() {
        let mut node = QuadtreeNode::new(Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 }), 0);
        assert!(node.children.is_none());

        node.subdivide();
        let children = node.children.as_ref().unwrap();
        assert_eq!(children.len(), 4);
        for child in children.iter() {
            assert_eq!(child.level, 1);
        }
    }

    #[test]
    fn test_within_distance_matches_brute_force() {
        let points = create_grid_points(20);
        let index = PointIndex::new(&points);
        assert_eq!(index.len(), 400);
        assert!(index.root.children.is_some());

        for (center, distance) in [
            (Point::new(0.0, 0.0), 5.0),
            (Point::new(30.0, 20.0), 7.5),
            (Point::new(57.0, 38.0), 3.0),
            (Point::new(-10.0, -10.0), 1.0),
        ] {
            assert_eq!(
                index.within_distance(center, distance),
                brute_force_within(&points, center, distance)
            );
        }
    }

    #[test]
    fn test_within_distance_is_inclusive() {
        let points = vec![Point::new(0.0, 0.0), Point::new(15.0, 0.0), Point::new(30.1, 0.0)];
        let index = PointIndex::new(&points);
        assert_eq!(index.within_distance(Point::new(15.0, 0.0), 15.0), vec![0, 1]);
    }

    #[test]
    fn test_nearest_within() {
        let points = vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(-4.0, 0.0)];
        let index = PointIndex::new(&points);
        assert_eq!(index.nearest_within(Point::new(3.0, 0.0), 2.0), Some(1));
        assert_eq!(index.nearest_within(Point::new(2.0, 10.0), 2.0), None);
        // Equidistant from 1 and 2: lowest index wins
        assert_eq!(index.nearest_within(Point::new(0.0, 3.0), 5.0), Some(0));
        assert_eq!(index.nearest_within(Point::new(0.0, 100.0), 200.0), Some(0));
    }

    #[test]
    fn test_duplicate_points_do_not_recurse_forever() {
        let points = vec![Point::new(1.0, 1.0); 100];
        let index = PointIndex::new(&points);
        assert_eq!(index.within_distance(Point::new(1.0, 1.0), 0.0).len(), 100);
    }

    #[test]
    fn test_non_finite_points_are_skipped() {
        let points = vec![Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0)];
        let index = PointIndex::new(&points);
        assert_eq!(index.len(), 1);
        assert_eq!(index.within_distance(Point::new(0.0, 0.0), 100.0), vec![0]);
    }
}
