use std::num::NonZeroUsize;

pub const PARAGRAPH_SEPARATOR: &str = "\n";

/// Estimates how many printed lines a single paragraph occupies.
pub trait LineEstimator {
    fn estimate_lines(&self, paragraph: &str) -> usize;
}

/// Character-count heuristic: `ceil(max(1, len) / chars_per_line)`.
/// A blank paragraph still costs one line.
#[derive(Clone, Copy, Debug)]
pub struct CharCountEstimator {
    pub chars_per_line: NonZeroUsize,
}

impl LineEstimator for CharCountEstimator {
    fn estimate_lines(&self, paragraph: &str) -> usize {
        let len = paragraph.chars().count().max(1);
        len.div_ceil(self.chars_per_line.get())
    }
}

/// Greedy paragraph packer for the instructions section.
pub struct TextPaginator<E> {
    estimator: E,
    lines_per_page: usize,
}

impl TextPaginator<CharCountEstimator> {
    pub fn new(chars_per_line: NonZeroUsize, lines_per_page: NonZeroUsize) -> Self {
        Self::with_estimator(CharCountEstimator { chars_per_line }, lines_per_page)
    }
}

impl<E: LineEstimator> TextPaginator<E> {
    pub fn with_estimator(estimator: E, lines_per_page: NonZeroUsize) -> Self {
        Self {
            estimator,
            lines_per_page: lines_per_page.get(),
        }
    }

    pub fn estimate_lines(&self, paragraph: &str) -> usize {
        self.estimator.estimate_lines(paragraph)
    }

    /// Split `text` into page-sized chunks. Paragraphs are never split: a
    /// paragraph larger than a page gets a page of its own and overflows it.
    /// Rejoining the chunks with the separator yields `text` unchanged.
    pub fn paginate(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut pages = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut line_total = 0usize;

        for paragraph in text.split(PARAGRAPH_SEPARATOR) {
            let cost = self.estimator.estimate_lines(paragraph);
            if line_total + cost > self.lines_per_page && !buffer.is_empty() {
                log::trace!("page break before paragraph ({line_total} + {cost} lines)");
                pages.push(buffer.join(PARAGRAPH_SEPARATOR));
                buffer.clear();
                line_total = 0;
            }
            if cost > self.lines_per_page {
                log::debug!(
                    "paragraph of ~{cost} lines exceeds page capacity of {}, placed alone",
                    self.lines_per_page
                );
            }
            buffer.push(paragraph);
            line_total += cost;
        }

        if !buffer.is_empty() {
            pages.push(buffer.join(PARAGRAPH_SEPARATOR));
        }
        pages
    }
}
