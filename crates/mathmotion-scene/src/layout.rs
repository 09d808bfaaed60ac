use mathmotion_core::math::{Bounds, Point3};
use mathmotion_core::{Color, ObjectId, ObjectKind, SceneError, SceneResult};

use crate::object::{Fill, ObjectState, Stroke, Style};
use crate::tree::ObjectTree;

/// Outline of one laid-out glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphOutline {
    /// Char index of the glyph in the source string.
    pub index: usize,
    pub ch: char,
    pub points: Vec<Point3>,
}

/// Text/markup layout engine.
///
/// Implementations must return glyphs in string order and give the same
/// indices for the same input on every call; string matching relies on it.
/// Whitespace produces no glyph.
pub trait GlyphLayout {
    fn layout(&self, text: &str, style: &Style) -> Vec<GlyphOutline>;
}

/// Deterministic layout that draws every glyph as a box on a fixed-pitch grid,
/// centered on the origin. Lines break on `'\n'`.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceLayout {
    /// Glyph height in scene units at font size 48.
    pub em: f64,
    /// Advance per char, relative to `em`.
    pub advance: f64,
    /// Baseline-to-baseline distance, relative to `em`.
    pub line_height: f64,
}

impl Default for MonospaceLayout {
    fn default() -> Self {
        Self {
            em: 0.5,
            advance: 0.6,
            line_height: 1.4,
        }
    }
}

impl GlyphLayout for MonospaceLayout {
    fn layout(&self, text: &str, style: &Style) -> Vec<GlyphOutline> {
        let em = self.em * style.font_size / 48.0;
        let (w, h) = (em * self.advance * 0.8, em);
        let (mut col, mut line) = (0usize, 0usize);
        let mut glyphs = Vec::new();
        for (index, ch) in text.chars().enumerate() {
            if ch == '\n' {
                line += 1;
                col = 0;
                continue;
            }
            if !ch.is_whitespace() {
                let x = col as f64 * em * self.advance;
                let y = -(line as f64) * em * self.line_height;
                glyphs.push(GlyphOutline {
                    index,
                    ch,
                    points: vec![
                        Point3::new(x, y, 0.0),
                        Point3::new(x + w, y, 0.0),
                        Point3::new(x + w, y + h, 0.0),
                        Point3::new(x, y + h, 0.0),
                        Point3::new(x, y, 0.0),
                    ],
                });
            }
            col += 1;
        }

        if let Some(bounds) = Bounds::of(glyphs.iter().flat_map(|g| g.points.iter())) {
            let offset = -bounds.center();
            for glyph in &mut glyphs {
                glyph.points.iter_mut().for_each(|p| *p += offset);
            }
        }
        glyphs
    }
}

/// A text object's content and the glyph objects laid out from it.
#[derive(Debug, Clone)]
pub struct TextGlyphs {
    pub content: String,
    /// `(char index, glyph id)` in string order.
    pub glyphs: Vec<(usize, ObjectId)>,
}

impl TextGlyphs {
    /// Glyph ids whose char index falls in `range`.
    pub fn in_range(&self, range: &std::ops::Range<usize>) -> Vec<ObjectId> {
        self.glyphs
            .iter()
            .filter(|(i, _)| range.contains(i))
            .map(|(_, id)| *id)
            .collect()
    }
}

impl ObjectTree {
    /// Lay out `content` and insert it as a detached text object with one
    /// glyph child per non-whitespace char. Every occurrence of a key of
    /// `style.color_map` is painted in its color.
    pub fn add_text(&mut self, content: &str, style: Style, layout: &dyn GlyphLayout) -> ObjectId {
        let chars: Vec<char> = content.chars().collect();
        let mut colors = vec![None; chars.len()];
        for (key, color) in &style.color_map {
            let key: Vec<char> = key.chars().collect();
            if key.is_empty() || key.len() > chars.len() {
                continue;
            }
            for start in 0..=chars.len() - key.len() {
                if chars[start..start + key.len()] == key[..] {
                    colors[start..start + key.len()].fill(Some(*color));
                }
            }
        }

        let glyphs: Vec<ObjectId> = layout
            .layout(content, &style)
            .into_iter()
            .map(|glyph| {
                let color = colors.get(glyph.index).copied().flatten().unwrap_or(Color::WHITE);
                let state = ObjectState {
                    points: glyph.points,
                    stroke: Stroke { color, width: 0.0 },
                    fill: Fill {
                        color,
                        opacity: 1.0,
                    },
                    style: Style {
                        text: Some(glyph.ch.to_string()),
                        color_map: Default::default(),
                        ..style.clone()
                    },
                    ..ObjectState::default()
                };
                self.insert(ObjectKind::Glyph { index: glyph.index }, state)
            })
            .collect();

        let text = self.insert(
            ObjectKind::Text,
            ObjectState {
                style: Style {
                    text: Some(content.to_string()),
                    ..style
                },
                ..ObjectState::default()
            },
        );
        for glyph in glyphs {
            self.link(text, glyph);
        }
        text
    }

    /// The content and glyph ids of text object `id`.
    pub fn text_glyphs(&self, id: ObjectId) -> SceneResult<TextGlyphs> {
        let node = self.get(id)?;
        let content = match (&node.kind, &node.state.style.text) {
            (ObjectKind::Text, Some(text)) => text.clone(),
            _ => {
                return Err(SceneError::InvalidArgument(format!(
                    "{} is a {}, not a text object",
                    id, node.kind
                )))
            }
        };
        let glyphs = node
            .children()
            .iter()
            .filter_map(|child| match self.get(*child).map(|n| &n.kind) {
                Ok(ObjectKind::Glyph { index }) => Some((*index, *child)),
                _ => None,
            })
            .collect();
        Ok(TextGlyphs { content, glyphs })
    }
}
