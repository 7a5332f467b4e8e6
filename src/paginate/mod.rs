//! Pagination engine: turns a prescription snapshot into the ordered list of
//! sheets handed to a renderer.
//!
//! The pipeline is pure. Each call recomputes everything from the document,
//! so composing the same snapshot twice yields equal page lists.

mod copies;
mod items;
mod page;
mod text;

pub use copies::replicate;
pub use items::chunk_items;
pub use page::{
    BadgePlacement, CopyLabel, HeaderLayout, Page, PageAssembler, PageContent, PageKind,
    SheetFrame,
};
pub use text::{CharCountEstimator, LineEstimator, PARAGRAPH_SEPARATOR, TextPaginator};

use crate::config::{LineEstimate, Locale, PaginationConfig};
use crate::model::{DocumentHeader, PrescriptionDocument, PrintOptions};
use crate::pdf::MeasuredEstimator;

pub struct DocumentComposer {
    config: PaginationConfig,
    locale: Locale,
}

impl DocumentComposer {
    pub fn new(config: PaginationConfig, locale: Locale) -> Self {
        Self { config, locale }
    }

    /// Medication sheets first, then (optionally) the instruction sheets as
    /// their own section, the whole run repeated once per copy.
    pub fn compose(
        &self,
        doc: &PrescriptionDocument,
        header: &DocumentHeader,
        options: &PrintOptions,
    ) -> Vec<Page> {
        let assembler = PageAssembler::new(doc, header, self.locale);

        let groups = chunk_items(&doc.medications, self.config.items_per_page);
        let total = groups.len();
        let mut pages = Vec::with_capacity(total);
        let mut start_index = 0;
        for (i, group) in groups.into_iter().enumerate() {
            let content = PageContent::Medication {
                items: group.to_vec(),
                start_index,
            };
            start_index += group.len();
            pages.push(assembler.assemble(content, i, total));
        }
        log::debug!(
            "{} medication(s) on {} sheet(s)",
            doc.medications.len(),
            total
        );

        if doc.include_instructions && !doc.instructions.is_empty() {
            let chunks = self.paginate_instructions(&doc.instructions);
            let total = chunks.len();
            log::debug!("instructions on {total} sheet(s)");
            pages.extend(chunks.into_iter().enumerate().map(|(i, text)| {
                assembler.assemble(PageContent::Instructions { text }, i, total)
            }));
        }

        replicate(pages, options.copies)
    }

    fn paginate_instructions(&self, text: &str) -> Vec<String> {
        match self.config.line_estimate {
            LineEstimate::Heuristic => {
                TextPaginator::new(self.config.chars_per_line, self.config.lines_per_page)
                    .paginate(text)
            }
            LineEstimate::Measured => {
                TextPaginator::with_estimator(MeasuredEstimator::default(), self.config.lines_per_page)
                    .paginate(text)
            }
        }
    }
}

impl Default for DocumentComposer {
    fn default() -> Self {
        Self::new(PaginationConfig::default(), Locale::default())
    }
}
