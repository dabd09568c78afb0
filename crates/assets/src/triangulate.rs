//! Cap triangulation for extruded glyph shapes.
//!
//! Contours are grouped into shapes (an outline plus the counters inside it)
//! by nesting depth, since typeface fonts do not agree on winding. Each shape
//! is then ear-clipped with `earcutr`.

use glam::Vec2;

/// Signed area; positive for counter-clockwise contours.
pub(crate) fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

/// Even-odd test against a closed contour.
pub(crate) fn contains(contour: &[Vec2], p: Vec2) -> bool {
    let n = contour.len();
    let mut inside = false;
    for i in 0..n {
        let (a, b) = (contour[i], contour[(i + n - 1) % n]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

/// Group contours into shapes. A contour nested inside an odd number of
/// others is a hole of the smallest even-depth contour around it. Returned
/// outers are counter-clockwise and holes clockwise.
pub(crate) fn shapes(contours: &[Vec<Vec2>]) -> Vec<(Vec<Vec2>, Vec<Vec<Vec2>>)> {
    let contours: Vec<&Vec<Vec2>> = contours
        .iter()
        .filter(|c| c.len() >= 3 && signed_area(c) != 0.0)
        .collect();
    let areas: Vec<f32> = contours.iter().map(|c| signed_area(c).abs()).collect();
    let depth: Vec<usize> = (0..contours.len())
        .map(|i| {
            (0..contours.len())
                .filter(|&j| j != i && contains(contours[j], contours[i][0]))
                .count()
        })
        .collect();

    let mut outers: Vec<usize> = Vec::new();
    let mut shapes: Vec<(Vec<Vec2>, Vec<Vec<Vec2>>)> = Vec::new();
    for i in (0..contours.len()).filter(|&i| depth[i] % 2 == 0) {
        outers.push(i);
        shapes.push((oriented(contours[i], true), Vec::new()));
    }
    for i in (0..contours.len()).filter(|&i| depth[i] % 2 == 1) {
        let parent = outers
            .iter()
            .enumerate()
            .filter(|&(_, &o)| contains(contours[o], contours[i][0]))
            .min_by(|a, b| areas[*a.1].total_cmp(&areas[*b.1]))
            .map(|(slot, _)| slot);
        match parent {
            Some(slot) => shapes[slot].1.push(oriented(contours[i], false)),
            None => tracing::warn!(contour = i, "hole outside every outline"),
        }
    }
    shapes
}

fn oriented(contour: &[Vec2], ccw: bool) -> Vec<Vec2> {
    let mut c = contour.to_vec();
    if (signed_area(&c) > 0.0) != ccw {
        c.reverse();
    }
    c
}

/// Triangulate one shape. Indices refer to `outer` followed by each hole in
/// order; every triangle is counter-clockwise.
pub(crate) fn triangulate(outer: &[Vec2], holes: &[Vec<Vec2>]) -> Vec<[u32; 3]> {
    let points: Vec<Vec2> = outer.iter().chain(holes.iter().flatten()).copied().collect();
    let coords: Vec<f64> = points
        .iter()
        .flat_map(|p| [f64::from(p.x), f64::from(p.y)])
        .collect();
    let mut hole_indices = Vec::with_capacity(holes.len());
    let mut start = outer.len();
    for hole in holes {
        hole_indices.push(start);
        start += hole.len();
    }

    let indices = match earcutr::earcut(&coords, &hole_indices, 2) {
        Ok(indices) => indices,
        Err(e) => {
            tracing::warn!(error = ?e, vertices = points.len(), "text cap triangulation failed");
            return Vec::new();
        }
    };
    indices
        .chunks_exact(3)
        .map(|t| {
            let [a, b, c] = [t[0], t[1], t[2]];
            if (points[b] - points[a]).perp_dot(points[c] - points[a]) < 0.0 {
                [a as u32, c as u32, b as u32]
            } else {
                [a as u32, b as u32, c as u32]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lo: f32, hi: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(lo, lo),
            Vec2::new(hi, lo),
            Vec2::new(hi, hi),
            Vec2::new(lo, hi),
        ]
    }

    fn area(points: &[Vec2], triangles: &[[u32; 3]]) -> f32 {
        triangles
            .iter()
            .map(|t| signed_area(&t.map(|i| points[i as usize])))
            .sum()
    }

    #[test]
    fn convex_polygon_splits_in_two() {
        let outer = square(0.0, 1.0);
        let tris = triangulate(&outer, &[]);
        assert_eq!(tris.len(), 2);
        assert!((area(&outer, &tris) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clockwise_input_still_yields_ccw_triangles() {
        let mut outer = square(0.0, 2.0);
        outer.reverse();
        let tris = triangulate(&outer, &[]);
        for t in &tris {
            assert!(signed_area(&t.map(|i| outer[i as usize])) > 0.0);
        }
        assert!((area(&outer, &tris) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn concave_polygon_stays_inside() {
        // An L shape: area 3.
        let outer = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let tris = triangulate(&outer, &[]);
        assert_eq!(tris.len(), 4);
        assert!((area(&outer, &tris) - 3.0).abs() < 1e-6);
        for t in &tris {
            let centroid = t.iter().map(|&i| outer[i as usize]).sum::<Vec2>() / 3.0;
            assert!(contains(&outer, centroid));
        }
    }

    #[test]
    fn hole_is_left_open() {
        let (outer, hole) = (square(0.0, 4.0), oriented(&square(1.0, 3.0), false));
        let tris = triangulate(&outer, std::slice::from_ref(&hole));
        let mut points = outer.clone();
        points.extend_from_slice(&hole);
        assert!((area(&points, &tris) - 12.0).abs() < 1e-5);
        for t in &tris {
            let centroid = t.iter().map(|&i| points[i as usize]).sum::<Vec2>() / 3.0;
            assert!(!contains(&hole, centroid), "triangle {t:?} covers the hole");
        }
    }

    #[test]
    fn nesting_decides_holes() {
        // Same winding for both; the inner one still becomes a hole.
        let groups = shapes(&[square(0.0, 4.0), square(1.0, 3.0), square(5.0, 6.0)]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1.len(), 1);
        assert!(signed_area(&groups[0].0) > 0.0);
        assert!(signed_area(&groups[0].1[0]) < 0.0);
        assert!(groups[1].1.is_empty());
    }

    #[test]
    fn island_inside_a_hole_is_its_own_shape() {
        let groups = shapes(&[square(0.0, 10.0), square(2.0, 8.0), square(4.0, 6.0)]);
        assert_eq!(groups.len(), 2);
        let holes: usize = groups.iter().map(|g| g.1.len()).sum();
        assert_eq!(holes, 1);
    }

    #[test]
    fn degenerate_contours_are_ignored() {
        let flat = vec![Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)];
        assert!(shapes(&[flat, vec![Vec2::ZERO, Vec2::Y]]).is_empty());
    }
}
