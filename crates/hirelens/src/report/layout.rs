//! Minimal top-down page layout over raw PDF content operators.

use lopdf::content::Operation;
use lopdf::Object;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN_X: f32 = 72.0;
pub const MARGIN_TOP: f32 = 36.0;
pub const MARGIN_BOTTOM: f32 = 36.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

/// Line height as a multiple of the font size.
const LEADING: f32 = 1.3;

/// A `0xRRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u32);

impl Rgb {
    /// Channels scaled to 0.0..=1.0 for the `rg` operator.
    pub fn components(&self) -> [f32; 3] {
        [
            ((self.0 >> 16) & 0xff) as f32 / 255.0,
            ((self.0 >> 8) & 0xff) as f32 / 255.0,
            (self.0 & 0xff) as f32 / 255.0,
        ]
    }
}

pub const BLACK: Rgb = Rgb(0x1a1a1a);
pub const WHITE: Rgb = Rgb(0xffffff);
pub const GREY: Rgb = Rgb(0x808080);
pub const ACCENT: Rgb = Rgb(0x2563eb);
pub const LABEL_FILL: Rgb = Rgb(0xf3f4f6);
pub const STRIPE_FILL: Rgb = Rgb(0xf9fafb);

/// Fonts registered in every page's resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    /// ZapfDingbats; "4" is a check mark and "8" a cross.
    Symbols,
}

impl Font {
    pub fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Symbols => "F3",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Symbols => "ZapfDingbats",
        }
    }
}

/// Approximate advance width of one character, in thousandths of the font
/// size. Close enough to Helvetica's metrics for line wrapping.
fn char_units(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | '\'' | '!' | '|' | ':' | ';' | 'I' => 278.0,
        'f' | 't' | 'r' | ' ' | '(' | ')' | '-' | '[' | ']' | '/' => 333.0,
        'm' | 'w' | 'M' | 'W' | '@' => 889.0,
        'A'..='Z' => 667.0,
        '0'..='9' => 556.0,
        _ => 556.0,
    }
}

pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let scale = if font == Font::Bold { 1.05 } else { 1.0 };
    text.chars().map(char_units).sum::<f32>() * size * scale / 1000.0
}

/// Greedy word wrap. Words wider than a full line are split by character.
pub fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, font, size) <= max_width {
            current = word.to_string();
            continue;
        }
        for c in word.chars() {
            current.push(c);
            if text_width(&current, font, size) > max_width {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encodes text for a WinAnsiEncoding font. Characters outside the
/// encoding become `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

/// Accumulates the content operators of one page, writing from the top
/// margin downwards. Anything that would pass the bottom margin is dropped.
pub struct PageBuilder {
    ops: Vec<Operation>,
    y: f32,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN_TOP,
        }
    }

    pub fn cursor(&self) -> f32 {
        self.y
    }

    pub fn fits(&self, height: f32) -> bool {
        self.y - height >= MARGIN_BOTTOM
    }

    pub fn space(&mut self, height: f32) {
        self.y = (self.y - height).max(MARGIN_BOTTOM);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.ops.push(Operation::new("q", vec![]));
        self.set_fill(color);
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        self.ops.push(Operation::new("f", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    /// Places text with its baseline at `y`, without moving the cursor.
    pub fn text_at(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        let bytes = match font {
            Font::Symbols => text.as_bytes().to_vec(),
            _ => win_ansi(text),
        };
        self.ops.push(Operation::new("BT", vec![]));
        self.set_fill(color);
        self.ops.push(Operation::new(
            "Tf",
            vec![font.resource_name().into(), size.into()],
        ));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops
            .push(Operation::new("Tj", vec![Object::string_literal(bytes)]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// Writes one line at the cursor and advances. Returns false when the
    /// line was dropped for lack of room.
    pub fn line(&mut self, x: f32, font: Font, size: f32, color: Rgb, text: &str) -> bool {
        let height = size * LEADING;
        if !self.fits(height) {
            return false;
        }
        self.y -= height;
        self.text_at(x, self.y + size * 0.25, font, size, color, text);
        true
    }

    /// Wrapped text starting at `x`, up to the right margin.
    pub fn paragraph(&mut self, x: f32, font: Font, size: f32, color: Rgb, text: &str) {
        let width = PAGE_WIDTH - MARGIN_X - x;
        for line in wrap(text, font, size, width) {
            if !self.line(x, font, size, color, &line) {
                break;
            }
        }
    }

    pub fn title(&mut self, text: &str) {
        self.line(MARGIN_X, Font::Bold, 22.0, BLACK, text);
        self.space(8.0);
    }

    pub fn heading(&mut self, text: &str) {
        self.space(10.0);
        self.line(MARGIN_X, Font::Bold, 14.0, ACCENT, text);
        self.space(2.0);
    }

    pub fn body(&mut self, text: &str) {
        self.paragraph(MARGIN_X, Font::Regular, 10.0, BLACK, text);
    }

    pub fn bullet(&mut self, text: &str) {
        let size = 10.0;
        let height = size * LEADING;
        if !self.fits(height) {
            return;
        }
        self.text_at(MARGIN_X, self.y - size * LEADING + size * 0.25, Font::Regular, size, BLACK, "•");
        self.paragraph(MARGIN_X + 12.0, Font::Regular, size, BLACK, text);
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.ops
    }

    fn set_fill(&mut self, color: Rgb) {
        let [r, g, b] = color.components();
        self.ops
            .push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
    }
}
