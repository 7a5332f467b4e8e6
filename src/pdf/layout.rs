use pdf_writer::{Content, Name, Str};

use crate::fonts::{BuiltinFont, to_winansi_bytes};
use crate::paginate::LineEstimator;

use super::{CONTENT_WIDTH, INSTRUCTION_FONT_SIZE};

/// A piece of text drawn in one face.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct Span {
    pub(super) text: String,
    pub(super) font: BuiltinFont,
}

impl Span {
    pub(super) fn new(text: impl Into<String>, font: BuiltinFont) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }
}

pub(super) struct WordChunk {
    pub(super) font: BuiltinFont,
    pub(super) text: String,
    pub(super) x_offset: f32, // x relative to line start
    pub(super) width: f32,
}

pub(super) struct TextLine {
    pub(super) chunks: Vec<WordChunk>,
    pub(super) total_width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Align {
    Left,
    Center,
    Right,
}

fn finish_line(chunks: &mut Vec<WordChunk>) -> TextLine {
    let total_width = chunks.last().map(|c| c.x_offset + c.width).unwrap_or(0.0);
    TextLine {
        chunks: std::mem::take(chunks),
        total_width,
    }
}

/// Greedy word wrap across spans. No space is inserted between spans unless
/// one side carries whitespace ("*bold*," stays "bold,"). A word wider than
/// the line is kept whole and overflows.
pub(super) fn build_lines(spans: &[Span], font_size: f32, max_width: f32) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut current_chunks: Vec<WordChunk> = Vec::new();
    let mut current_x: f32 = 0.0;
    let mut prev_ended_with_ws = false;
    let mut prev_space_w: f32 = 0.0;

    for span in spans {
        let space_w = span.font.space_width(font_size);
        let starts_with_ws = span.text.starts_with(char::is_whitespace);

        for (i, word) in span.text.split_whitespace().enumerate() {
            let ww = span.font.text_width(word, font_size);
            let need_space =
                !current_chunks.is_empty() && (i > 0 || starts_with_ws || prev_ended_with_ws);
            let effective_space_w = if i > 0 || starts_with_ws {
                space_w
            } else {
                prev_space_w
            };
            let proposed_x = if need_space {
                current_x + effective_space_w
            } else {
                current_x
            };

            if !current_chunks.is_empty() && proposed_x + ww > max_width {
                lines.push(finish_line(&mut current_chunks));
                current_x = 0.0;
            } else {
                current_x = proposed_x;
            }

            current_chunks.push(WordChunk {
                font: span.font,
                text: word.to_string(),
                x_offset: current_x,
                width: ww,
            });
            current_x += ww;
        }

        if !span.text.is_empty() {
            prev_ended_with_ws = span.text.ends_with(char::is_whitespace);
            prev_space_w = space_w;
        }
    }

    if !current_chunks.is_empty() {
        lines.push(finish_line(&mut current_chunks));
    }
    lines
}

/// Draw wrapped lines top-down from `first_baseline_y`; returns the baseline
/// below the last line.
pub(super) fn render_lines(
    content: &mut Content,
    lines: &[TextLine],
    align: Align,
    left: f32,
    width: f32,
    first_baseline_y: f32,
    font_size: f32,
    line_pitch: f32,
    underline: bool,
) -> f32 {
    let mut y = first_baseline_y;
    for line in lines {
        let start_x = match align {
            Align::Left => left,
            Align::Center => left + (width - line.total_width) / 2.0,
            Align::Right => left + width - line.total_width,
        };
        content.begin_text();
        let mut cur_font: Option<BuiltinFont> = None;
        let (mut td_x, mut td_y) = (0.0f32, 0.0f32);
        for chunk in &line.chunks {
            if cur_font != Some(chunk.font) {
                content.set_font(Name(chunk.font.pdf_name().as_bytes()), font_size);
                cur_font = Some(chunk.font);
            }
            let x = start_x + chunk.x_offset;
            content.next_line(x - td_x, y - td_y);
            td_x = x;
            td_y = y;
            content.show(Str(&to_winansi_bytes(&chunk.text)));
        }
        content.end_text();

        if underline && line.total_width > 0.0 {
            let uy = y - font_size * 0.15;
            content.set_line_width(0.6);
            content.move_to(start_x, uy);
            content.line_to(start_x + line.total_width, uy);
            content.stroke();
        }
        y -= line_pitch;
    }
    y
}

/// Single-line convenience for labels that never wrap.
pub(super) fn draw_text(
    content: &mut Content,
    font: BuiltinFont,
    font_size: f32,
    x: f32,
    y: f32,
    text: &str,
) {
    if text.is_empty() {
        return;
    }
    content
        .begin_text()
        .set_font(Name(font.pdf_name().as_bytes()), font_size)
        .next_line(x, y)
        .show(Str(&to_winansi_bytes(text)))
        .end_text();
}

pub(super) fn draw_aligned(
    content: &mut Content,
    font: BuiltinFont,
    font_size: f32,
    align: Align,
    left: f32,
    width: f32,
    y: f32,
    text: &str,
) {
    let w = font.text_width(text, font_size);
    let x = match align {
        Align::Left => left,
        Align::Center => left + (width - w) / 2.0,
        Align::Right => left + width - w,
    };
    draw_text(content, font, font_size, x, y, text);
}

pub(super) fn draw_rule(content: &mut Content, x1: f32, x2: f32, y: f32, line_width: f32) {
    content.set_line_width(line_width);
    content.move_to(x1, y);
    content.line_to(x2, y);
    content.stroke();
}

/// How a line of patient instructions is styled on the sheet.
#[derive(Clone, Debug, PartialEq)]
pub(super) enum LineStyle {
    Blank,
    /// Starts with `•` or `-` (after trimming); drawn indented.
    Bullet,
    /// Contains `*`; odd segments between asterisks are bold.
    Emphasis(Vec<Span>),
    /// All upper-case letters and spaces, longer than four characters.
    Heading,
    Plain,
}

pub(super) fn classify_line(line: &str) -> LineStyle {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineStyle::Blank;
    }
    if trimmed.starts_with('\u{2022}') || trimmed.starts_with('-') {
        return LineStyle::Bullet;
    }
    if line.contains('*') {
        let spans = line
            .split('*')
            .enumerate()
            .filter(|(_, part)| !part.is_empty())
            .map(|(i, part)| {
                let font = if i % 2 == 1 {
                    BuiltinFont::Bold
                } else {
                    BuiltinFont::Regular
                };
                Span::new(part, font)
            })
            .collect();
        return LineStyle::Emphasis(spans);
    }
    if is_heading(line) {
        return LineStyle::Heading;
    }
    LineStyle::Plain
}

fn is_heading(line: &str) -> bool {
    line.chars().count() > 4
        && line == line.to_uppercase()
        && line
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_whitespace() || "ÁÉÍÓÚÃÕÇ".contains(c))
}

/// Line estimate from an actual word wrap at the instruction body size.
/// Opt-in alternative to the character-count heuristic.
#[derive(Clone, Copy, Debug)]
pub struct MeasuredEstimator {
    pub font_size: f32,
    pub max_width: f32,
}

impl Default for MeasuredEstimator {
    fn default() -> Self {
        Self {
            font_size: INSTRUCTION_FONT_SIZE,
            max_width: CONTENT_WIDTH,
        }
    }
}

impl LineEstimator for MeasuredEstimator {
    fn estimate_lines(&self, paragraph: &str) -> usize {
        let (spans, width) = match classify_line(paragraph) {
            LineStyle::Emphasis(spans) => (spans, self.max_width),
            LineStyle::Heading => (vec![Span::new(paragraph, BuiltinFont::Bold)], self.max_width),
            LineStyle::Bullet => (
                vec![Span::new(paragraph, BuiltinFont::Regular)],
                self.max_width - super::BULLET_INDENT,
            ),
            LineStyle::Blank | LineStyle::Plain => {
                (vec![Span::new(paragraph, BuiltinFont::Regular)], self.max_width)
            }
        };
        build_lines(&spans, self.font_size, width).len().max(1)
    }
}
