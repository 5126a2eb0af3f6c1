use std::collections::BTreeMap;

use crate::models::{BoundingBox, FumaroleDetection, FumaroleType};

/// Margin added around every synthesized cluster box
pub const CLUSTER_MARGIN: i32 = 5;

/// Neighbours of each centroid within `radius` (Euclidean, inclusive).
///
/// Every pair is tested in both orders so the relation is symmetric.
/// Points without neighbours have no entry.
pub fn radius_search(centroids: &[(f32, f32)], radius: f32) -> BTreeMap<usize, Vec<usize>> {
    let mut neighbours: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

    for (i, a) in centroids.iter().enumerate() {
        for (j, b) in centroids.iter().enumerate() {
            if i == j {
                continue;
            }

            let dx = a.0 - b.0;
            let dy = a.1 - b.1;
            if (dx * dx + dy * dy).sqrt() <= radius {
                neighbours.entry(i).or_default().push(j);
            }
        }
    }

    neighbours
}

/// Greedy single-pass grouping of boxes whose centres lie within `radius`.
///
/// Indices are visited in ascending order; an unused index that has
/// neighbours claims itself and all of its unused neighbours. Groups of a
/// single box are discarded. Returns the member indices of every group.
pub fn pairwise_radius_cluster(boxes: &[BoundingBox], radius: f32) -> Vec<Vec<usize>> {
    let centroids: Vec<(f32, f32)> = boxes.iter().map(|b| b.center()).collect();
    let neighbours = radius_search(&centroids, radius);

    // A box belongs to at most one group
    let mut used = vec![false; boxes.len()];
    let mut groups = Vec::new();

    for (&index, adjacent) in &neighbours {
        if used[index] {
            continue;
        }
        used[index] = true;

        let mut group = vec![index];
        for &other in adjacent {
            if !used[other] {
                used[other] = true;
                group.push(other);
            }
        }

        // Singletons are not clusters
        if group.len() > 1 {
            groups.push(group);
        }
    }

    groups
}

/// Box enclosing `boxes` grown by [`CLUSTER_MARGIN`]
pub fn enclosing_bounding_box(boxes: &[BoundingBox]) -> Option<BoundingBox> {
    BoundingBox::enclosing(boxes).map(|b| b.expand(CLUSTER_MARGIN))
}

/// Cluster detections into higher order detections of type `kind`
pub fn cluster_detections(
    detections: &[FumaroleDetection],
    radius: f32,
    kind: FumaroleType,
) -> Vec<FumaroleDetection> {
    if detections.is_empty() {
        return Vec::new();
    }

    let boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bounding_box).collect();

    pairwise_radius_cluster(&boxes, radius)
        .into_iter()
        .filter_map(|group| {
            let members: Vec<BoundingBox> = group.iter().map(|&i| boxes[i]).collect();
            enclosing_bounding_box(&members)
        })
        .map(|bbox| FumaroleDetection::synthesized(kind, bbox))
        .collect()
}
