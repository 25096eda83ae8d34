//! Text elements: Glyph and TextLine.

use serde::{Deserialize, Serialize};

use crate::utils::{HasBBox, Rect, bound_rects};

use super::component::Component;

/// A single positioned character (or ligature) inside a text line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    component: Component,
    pub text: String,
    pub font_name: Option<String>,
    pub font_size: f64,
}

impl Glyph {
    pub fn new(bbox: Rect, text: impl Into<String>, font_name: Option<String>, font_size: f64) -> Self {
        Self {
            component: Component::new(bbox),
            text: text.into(),
            font_name,
            font_size,
        }
    }

    pub fn is_alphanumeric(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_alphanumeric)
    }
}

impl_has_bbox_delegate!(Glyph, component);

/// A horizontal line of text, the atomic unit of layout clustering.
///
/// `font_name`/`font_size` describe the first alphanumeric glyph of the
/// line; `font_name` is `None` when the line carries no such glyph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    component: Component,
    text: String,
    pub font_name: Option<String>,
    pub font_size: f64,
    #[serde(default)]
    pub glyphs: Vec<Glyph>,
}

impl TextLine {
    pub fn new(bbox: Rect, text: impl Into<String>) -> Self {
        Self {
            component: Component::new(bbox),
            text: text.into(),
            font_name: None,
            font_size: 0.0,
            glyphs: Vec::new(),
        }
    }

    pub fn with_font(mut self, name: impl Into<String>, size: f64) -> Self {
        self.font_name = Some(name.into());
        self.font_size = size;
        self
    }

    pub fn with_glyphs(mut self, glyphs: Vec<Glyph>) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub fn get_text(&self) -> &str {
        &self.text
    }

    pub fn set_bbox(&mut self, bbox: Rect) {
        self.component.set_bbox(bbox);
    }

    /// Splits the line on whitespace and locates each word.
    ///
    /// Word boxes are unions of the matching glyph boxes. When glyphs are
    /// missing or run out, the line box is divided evenly per character.
    pub fn words(&self) -> Vec<(String, Rect)> {
        let n_chars = self.text.chars().count().max(1) as f64;
        let per_char = self.width() / n_chars;
        let mut glyphs = self
            .glyphs
            .iter()
            .filter(|g| !g.text.trim().is_empty())
            .peekable();

        let mut words = Vec::new();
        for (offset, word) in split_words(&self.text) {
            let need = word.chars().count();
            let mut taken = 0;
            let mut boxes = Vec::new();
            while taken < need {
                let Some(g) = glyphs.next() else { break };
                taken += g.text.chars().count().max(1);
                boxes.push(g.bbox());
            }
            let bbox = if boxes.is_empty() {
                let x0 = self.x0() + offset as f64 * per_char;
                (x0, self.y0(), x0 + need as f64 * per_char, self.y1())
            } else {
                bound_rects(boxes)
            };
            words.push((word.to_string(), bbox));
        }
        words
    }
}

impl_has_bbox_delegate!(TextLine, component);

/// Whitespace-separated words with their character offsets.
fn split_words(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start: Option<(usize, usize)> = None;
    for (char_idx, (byte_idx, c)) in text.char_indices().enumerate() {
        match (c.is_whitespace(), start) {
            (true, Some((ci, bi))) => {
                out.push((ci, &text[bi..byte_idx]));
                start = None;
            }
            (false, None) => start = Some((char_idx, byte_idx)),
            _ => {}
        }
    }
    if let Some((ci, bi)) = start {
        out.push((ci, &text[bi..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(x0: f64, c: &str) -> Glyph {
        Glyph::new((x0, 10.0, x0 + 5.0, 20.0), c, Some("Times".into()), 10.0)
    }

    #[test]
    fn test_words_from_glyphs() {
        let glyphs = ["a", "b", " ", "c", "d"]
            .iter()
            .enumerate()
            .map(|(i, c)| glyph(i as f64 * 5.0, c))
            .collect();
        let line = TextLine::new((0.0, 10.0, 25.0, 20.0), "ab cd").with_glyphs(glyphs);
        let words = line.words();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], ("ab".to_string(), (0.0, 10.0, 10.0, 20.0)));
        assert_eq!(words[1], ("cd".to_string(), (15.0, 10.0, 25.0, 20.0)));
    }

    #[test]
    fn test_words_proportional_fallback() {
        let line = TextLine::new((0.0, 0.0, 50.0, 10.0), "abcd efghi");
        let words = line.words();
        assert_eq!(words[0].1, (0.0, 0.0, 20.0, 10.0));
        assert_eq!(words[1].1, (25.0, 0.0, 50.0, 10.0));
    }

    #[test]
    fn test_split_words_multibyte() {
        assert_eq!(split_words("  é x  "), vec![(2, "é"), (4, "x")]);
    }
}
