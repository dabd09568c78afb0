//! Extruded 3D text built from a typeface [`Font`].
//!
//! Glyph outlines are flattened into closed 2D contours, extruded along +Z
//! by `height`, then the whole block is centred on its bounding box.
//! [`TextGeometry::mesh`] turns the contours into a solid: ear-clipped caps
//! on both faces (counters such as the inside of an "O" stay open) joined by
//! side walls.

use glam::{Vec2, Vec3};

use crate::font::{Font, OutlineCommand};
use crate::triangulate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    /// Em size in world units.
    pub size: f32,
    /// Extrusion depth in world units.
    pub height: f32,
    /// Points per curve segment when flattening outlines.
    pub curve_segments: u32,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: 0.4,
            height: 0.1,
            curve_segments: 12,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextGeometry {
    /// Flattened outlines in the XY plane.
    pub contours: Vec<Vec<Vec2>>,
    /// Z of the front face.
    pub z_front: f32,
    /// Z of the back face.
    pub z_back: f32,
    /// Characters skipped because the font has no glyph for them.
    pub missing: Vec<char>,
}

impl TextGeometry {
    /// Lay out `text` (newlines start a new line) and flatten every glyph.
    pub fn build(font: &Font, text: &str, options: TextOptions) -> Self {
        let scale = options.size / font.resolution;
        let line_height = font.line_height(options.size);
        let segments = options.curve_segments.max(1);

        let mut contours = Vec::new();
        let mut missing = Vec::new();
        let mut offset = Vec2::ZERO;

        for ch in text.chars() {
            if ch == '\n' {
                offset.x = 0.0;
                offset.y -= line_height;
                continue;
            }
            let Some(glyph) = font.glyph(ch) else {
                tracing::warn!(?ch, font = %font.family_name, "font has no glyph");
                missing.push(ch);
                continue;
            };
            flatten_outline(&glyph.outline, scale, offset, segments, &mut contours);
            offset.x += glyph.advance * scale;
        }

        Self {
            contours,
            z_front: options.height,
            z_back: 0.0,
            missing,
        }
    }

    /// Axis-aligned bounds including the extrusion depth.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.contours.iter().flatten();
        let first = *points.next()?;
        let (lo, hi) = points.fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        let z_lo = self.z_back.min(self.z_front);
        let z_hi = self.z_back.max(self.z_front);
        Some((lo.extend(z_lo), hi.extend(z_hi)))
    }

    /// Translate the geometry so its bounding box is centred on the origin.
    pub fn center(&mut self) {
        let Some((lo, hi)) = self.bounds() else {
            return;
        };
        let c = (lo + hi) * 0.5;
        for p in self.contours.iter_mut().flatten() {
            *p -= c.truncate();
        }
        self.z_front -= c.z;
        self.z_back -= c.z;
    }

    /// Triangulate the extruded block. Caps and walls get their own vertices
    /// so every face is flat shaded.
    pub fn mesh(&self) -> TextMesh {
        let (top, bottom) = (self.z_front.max(self.z_back), self.z_front.min(self.z_back));
        let mut mesh = TextMesh::default();

        let rings: Vec<Vec<Vec2>> = self.contours.iter().map(|c| open_ring(c)).collect();
        for (outer, holes) in triangulate::shapes(&rings) {
            let triangles = triangulate::triangulate(&outer, &holes);
            let flat: Vec<Vec2> = outer.iter().chain(holes.iter().flatten()).copied().collect();

            let front = mesh.push_cap(&flat, top, Vec3::Z);
            mesh.indices
                .extend(triangles.iter().flat_map(|&[a, b, c]| [front + a, front + b, front + c]));
            let back = mesh.push_cap(&flat, bottom, Vec3::NEG_Z);
            mesh.indices
                .extend(triangles.iter().flat_map(|&[a, b, c]| [back + a, back + c, back + b]));

            for ring in std::iter::once(&outer).chain(&holes) {
                mesh.push_walls(ring, top, bottom);
            }
        }
        mesh
    }
}

/// Indexed triangles of an extruded text block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl TextMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Append a cap's vertices; returns the index of the first.
    fn push_cap(&mut self, points: &[Vec2], z: f32, normal: Vec3) -> u32 {
        let base = self.positions.len() as u32;
        for p in points {
            self.positions.push(p.extend(z).to_array());
            self.normals.push(normal.to_array());
        }
        base
    }

    /// One outward-facing quad per edge. Outers run counter-clockwise and
    /// holes clockwise, so the right-hand normal always leaves the solid.
    fn push_walls(&mut self, ring: &[Vec2], top: f32, bottom: f32) {
        let n = ring.len();
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            let d = b - a;
            let normal = Vec3::new(d.y, -d.x, 0.0).normalize_or_zero().to_array();
            let base = self.positions.len() as u32;
            for p in [a.extend(bottom), b.extend(bottom), b.extend(top), a.extend(top)] {
                self.positions.push(p.to_array());
                self.normals.push(normal);
            }
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }
}

/// Drop the closing point and any repeated neighbours.
fn open_ring(contour: &[Vec2]) -> Vec<Vec2> {
    let mut ring: Vec<Vec2> = Vec::with_capacity(contour.len());
    for &p in contour {
        if ring.last() != Some(&p) {
            ring.push(p);
        }
    }
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Append the contours of one glyph, scaled and offset into text space.
fn flatten_outline(
    outline: &[OutlineCommand],
    scale: f32,
    offset: Vec2,
    segments: u32,
    contours: &mut Vec<Vec<Vec2>>,
) {
    let place = |p: Vec2| p * scale + offset;
    let mut current: Vec<Vec2> = Vec::new();

    let mut finish = |current: &mut Vec<Vec2>| {
        let mut c = std::mem::take(current);
        if c.len() < 2 {
            return;
        }
        if c.first() != c.last() {
            let first = c[0];
            c.push(first);
        }
        contours.push(c);
    };

    for cmd in outline {
        match *cmd {
            OutlineCommand::MoveTo(p) => {
                finish(&mut current);
                current.push(place(p));
            }
            OutlineCommand::LineTo(p) => current.push(place(p)),
            OutlineCommand::QuadTo { ctrl, to } => {
                let start = current.last().copied().unwrap_or(place(to));
                let (c, e) = (place(ctrl), place(to));
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    current.push(start * (u * u) + c * (2.0 * u * t) + e * (t * t));
                }
            }
            OutlineCommand::CubicTo { ctrl1, ctrl2, to } => {
                let start = current.last().copied().unwrap_or(place(to));
                let (c1, c2, e) = (place(ctrl1), place(ctrl2), place(to));
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    current.push(
                        start * (u * u * u)
                            + c1 * (3.0 * u * u * t)
                            + c2 * (3.0 * u * t * t)
                            + e * (t * t * t),
                    );
                }
            }
        }
    }
    finish(&mut current);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::TEST_FONT;

    fn font() -> Font {
        Font::parse(TEST_FONT).unwrap()
    }

    fn opts() -> TextOptions {
        TextOptions {
            size: 1.0,
            height: 0.1,
            curve_segments: 4,
        }
    }

    #[test]
    fn single_glyph_box() {
        let geo = TextGeometry::build(&font(), "I", opts());
        assert_eq!(geo.contours.len(), 1);
        // Closed square: 5 points, first == last.
        assert_eq!(geo.contours[0].len(), 5);
        assert!(geo.contours[0][2].abs_diff_eq(Vec2::new(0.5, 0.7), 1e-6));
        let (lo, hi) = geo.bounds().unwrap();
        assert_eq!(lo, Vec3::new(0.0, 0.0, 0.0));
        assert!(hi.abs_diff_eq(Vec3::new(0.5, 0.7, 0.1), 1e-6));
    }

    #[test]
    fn advance_moves_next_glyph() {
        let geo = TextGeometry::build(&font(), "I I", opts());
        assert_eq!(geo.contours.len(), 2);
        // "I" (600) + " " (300) = 0.9 units.
        assert!((geo.contours[1][0].x - 0.9).abs() < 1e-6);
    }

    #[test]
    fn newline_resets_x_and_drops_a_line() {
        let f = font();
        let geo = TextGeometry::build(&f, "I\nI", opts());
        let second = geo.contours[1][0];
        assert_eq!(second.x, 0.0);
        assert!((second.y + f.line_height(1.0)).abs() < 1e-6);
    }

    #[test]
    fn curves_are_flattened() {
        let geo = TextGeometry::build(&font(), "O", opts());
        // move + 4 quad points + 4 cubic points + line back to start.
        assert_eq!(geo.contours[0].len(), 10);
        assert!(geo.contours[0][4].abs_diff_eq(Vec2::new(0.4, 0.0), 1e-6));
        assert!(geo.contours[0][8].abs_diff_eq(Vec2::new(0.4, 0.4), 1e-6));
    }

    #[test]
    fn missing_glyphs_are_skipped() {
        let geo = TextGeometry::build(&font(), "IxI", opts());
        assert_eq!(geo.missing, vec!['x']);
        assert_eq!(geo.contours.len(), 2);
        assert!((geo.contours[1][0].x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn center_moves_bounds_to_origin() {
        let mut geo = TextGeometry::build(&font(), "I", opts());
        geo.center();
        let (lo, hi) = geo.bounds().unwrap();
        assert!(((lo + hi) * 0.5).abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!((geo.z_front - 0.05).abs() < 1e-6);
        assert!((geo.z_back + 0.05).abs() < 1e-6);
    }

    fn cap_area(mesh: &TextMesh, z: f32) -> f32 {
        mesh.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]].map(|i| Vec3::from_array(mesh.positions[i as usize])))
            .filter(|[a, b, c]| a.z == z && b.z == z && c.z == z)
            .map(|[a, b, c]| (b - a).cross(c - a).z * 0.5)
            .sum()
    }

    #[test]
    fn glyph_extrudes_to_a_solid() {
        let mut geo = TextGeometry::build(&font(), "I", opts());
        geo.center();
        let mesh = geo.mesh();
        // Two triangles per cap and two per side wall.
        assert_eq!(mesh.triangle_count(), 2 + 2 + 4 * 2);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.positions.len()));

        let (lo, hi) = mesh.bounds().unwrap();
        assert!(((lo + hi) * 0.5).abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!((hi - lo).abs_diff_eq(Vec3::new(0.5, 0.7, 0.1), 1e-6));

        // Front faces +Z, back faces -Z.
        assert!((cap_area(&mesh, 0.05) - 0.35).abs() < 1e-5);
        assert!((cap_area(&mesh, -0.05) + 0.35).abs() < 1e-5);
    }

    #[test]
    fn walls_face_outwards() {
        let mesh = TextGeometry::build(&font(), "I", opts()).mesh();
        let centre = Vec3::new(0.25, 0.35, 0.05);
        for t in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [t[0], t[1], t[2]].map(|i| Vec3::from_array(mesh.positions[i as usize]));
            let n = (b - a).cross(c - a);
            let mid = (a + b + c) / 3.0;
            assert!(n.dot(mid - centre) > 0.0, "triangle {t:?} faces inwards");
            let stored = Vec3::from_array(mesh.normals[t[0] as usize]);
            assert!(stored.dot(n) > 0.0);
        }
    }

    #[test]
    fn counters_stay_open() {
        // A square ring, both contours wound the same way.
        let square = |lo: f32, hi: f32| {
            vec![
                Vec2::new(lo, lo),
                Vec2::new(hi, lo),
                Vec2::new(hi, hi),
                Vec2::new(lo, hi),
                Vec2::new(lo, lo),
            ]
        };
        let geo = TextGeometry {
            contours: vec![square(0.0, 4.0), square(1.0, 3.0)],
            z_front: 1.0,
            z_back: 0.0,
            missing: Vec::new(),
        };
        let mesh = geo.mesh();
        assert!((cap_area(&mesh, 1.0) - 12.0).abs() < 1e-4);
        assert!((cap_area(&mesh, 0.0) + 12.0).abs() < 1e-4);
        let walls = mesh
            .indices
            .chunks_exact(3)
            .filter(|t| mesh.normals[t[0] as usize][2] == 0.0)
            .count();
        assert_eq!(walls, 8 * 2);
    }

    #[test]
    fn empty_text_has_no_bounds() {
        let mut geo = TextGeometry::build(&font(), "", opts());
        assert!(geo.bounds().is_none());
        geo.center();
        let mesh = geo.mesh();
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.bounds().is_none());
    }
}
