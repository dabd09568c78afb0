//! Typeface JSON fonts.
//!
//! The format stores each glyph as an advance width (`ha`) plus an outline
//! string of commands in font units:
//!
//! ```text
//! m x y            move to
//! l x y            line to
//! q x y cx cy      quadratic curve to (x, y) with control (cx, cy)
//! b x y c1x c1y c2x c2y   cubic curve to (x, y) with controls c1, c2
//! ```
//!
//! Note that the end point comes first in `q` and `b`.

use glam::Vec2;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::AssetError;

/// A single outline drawing command in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { ctrl: Vec2, to: Vec2 },
    CubicTo { ctrl1: Vec2, ctrl2: Vec2, to: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Horizontal advance in font units.
    pub advance: f32,
    pub outline: Vec<OutlineCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

/// A parsed typeface font.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family_name: String,
    /// Font units per em.
    pub resolution: f32,
    pub bounding_box: BoundingBox,
    pub underline_thickness: f32,
    glyphs: HashMap<char, Glyph>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFont {
    glyphs: HashMap<String, RawGlyph>,
    #[serde(default)]
    family_name: String,
    resolution: f32,
    bounding_box: BoundingBox,
    #[serde(default)]
    underline_thickness: f32,
}

#[derive(Deserialize)]
struct RawGlyph {
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

impl Font {
    pub fn parse(json: &str) -> Result<Self, AssetError> {
        let raw: RawFont =
            serde_json::from_str(json).map_err(|e| AssetError::FontParse(e.to_string()))?;
        if raw.resolution <= 0.0 {
            return Err(AssetError::FontParse(format!(
                "resolution must be positive, got {}",
                raw.resolution
            )));
        }

        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (key, glyph) in raw.glyphs {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                tracing::debug!(key = %key, "ignoring multi-character glyph key");
                continue;
            };
            let outline = match glyph.o.as_deref() {
                Some(o) => parse_outline(o)
                    .map_err(|e| AssetError::FontParse(format!("glyph {ch:?}: {e}")))?,
                None => Vec::new(),
            };
            glyphs.insert(
                ch,
                Glyph {
                    advance: glyph.ha,
                    outline,
                },
            );
        }

        Ok(Self {
            family_name: raw.family_name,
            resolution: raw.resolution,
            bounding_box: raw.bounding_box,
            underline_thickness: raw.underline_thickness,
            glyphs,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&json)
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Distance between baselines for text of the given size.
    pub fn line_height(&self, size: f32) -> f32 {
        let bb = self.bounding_box;
        (bb.y_max - bb.y_min + self.underline_thickness) * size / self.resolution
    }
}

fn parse_outline(o: &str) -> Result<Vec<OutlineCommand>, String> {
    let mut tokens = o.split_whitespace();
    let mut commands = Vec::new();

    let point = |tokens: &mut std::str::SplitWhitespace<'_>| -> Result<Vec2, String> {
        let mut coord = || -> Result<f32, String> {
            let t = tokens.next().ok_or("outline ends mid-command")?;
            t.parse::<f32>().map_err(|_| format!("bad coordinate {t:?}"))
        };
        Ok(Vec2::new(coord()?, coord()?))
    };

    while let Some(cmd) = tokens.next() {
        let c = match cmd {
            "m" => OutlineCommand::MoveTo(point(&mut tokens)?),
            "l" => OutlineCommand::LineTo(point(&mut tokens)?),
            "q" => {
                let to = point(&mut tokens)?;
                let ctrl = point(&mut tokens)?;
                OutlineCommand::QuadTo { ctrl, to }
            }
            "b" => {
                let to = point(&mut tokens)?;
                let ctrl1 = point(&mut tokens)?;
                let ctrl2 = point(&mut tokens)?;
                OutlineCommand::CubicTo { ctrl1, ctrl2, to }
            }
            other => return Err(format!("unknown outline command {other:?}")),
        };
        commands.push(c);
    }
    Ok(commands)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A tiny font: a box "I", a curved "O" and an empty space.
    pub(crate) const TEST_FONT: &str = r#"{
        "familyName": "Test Sans",
        "resolution": 1000,
        "underlineThickness": 50,
        "boundingBox": {"xMin": 0, "xMax": 1000, "yMin": -200, "yMax": 800},
        "glyphs": {
            "I": {"ha": 600, "x_min": 0, "x_max": 500, "o": "m 0 0 l 500 0 l 500 700 l 0 700 l 0 0"},
            " ": {"ha": 300, "x_min": 0, "x_max": 0},
            "O": {"ha": 800, "o": "m 0 0 q 400 0 200 -100 b 400 400 500 100 500 300 l 0 0"}
        }
    }"#;

    #[test]
    fn parse_test_font() {
        let font = Font::parse(TEST_FONT).unwrap();
        assert_eq!(font.family_name, "Test Sans");
        assert_eq!(font.glyph_count(), 3);

        let i = font.glyph('I').unwrap();
        assert_eq!(i.advance, 600.0);
        assert_eq!(i.outline.len(), 5);
        assert_eq!(i.outline[0], OutlineCommand::MoveTo(Vec2::ZERO));

        assert!(font.glyph(' ').unwrap().outline.is_empty());
        assert!(font.glyph('x').is_none());
    }

    #[test]
    fn curve_commands_put_end_point_first() {
        let font = Font::parse(TEST_FONT).unwrap();
        let o = &font.glyph('O').unwrap().outline;
        assert_eq!(
            o[1],
            OutlineCommand::QuadTo {
                ctrl: Vec2::new(200.0, -100.0),
                to: Vec2::new(400.0, 0.0),
            }
        );
        assert_eq!(
            o[2],
            OutlineCommand::CubicTo {
                ctrl1: Vec2::new(500.0, 100.0),
                ctrl2: Vec2::new(500.0, 300.0),
                to: Vec2::new(400.0, 400.0),
            }
        );
    }

    #[test]
    fn line_height_scales_with_size() {
        let font = Font::parse(TEST_FONT).unwrap();
        // (800 - -200 + 50) * 0.4 / 1000
        assert!((font.line_height(0.4) - 0.42).abs() < 1e-6);
    }

    #[test]
    fn reject_bad_outline() {
        let json = TEST_FONT.replace("l 500 0 l", "z 500 0 l");
        assert!(Font::parse(&json).is_err());
        let json = TEST_FONT.replace("l 0 0\"}", "l 0\"}");
        assert!(Font::parse(&json).is_err());
    }

    #[test]
    fn reject_zero_resolution() {
        let json = TEST_FONT.replace("\"resolution\": 1000", "\"resolution\": 0");
        assert!(Font::parse(&json).is_err());
    }
}
