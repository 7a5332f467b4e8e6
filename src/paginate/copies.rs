use crate::model::CopyCount;

use super::page::{CopyLabel, Page};

/// Repeat the one-copy page sequence once per physical copy. Labels are only
/// attached when more than one copy is printed; page numbers are untouched.
pub fn replicate(pages: Vec<Page>, copies: CopyCount) -> Vec<Page> {
    match copies {
        CopyCount::Single => pages,
        CopyCount::Duplicate => {
            let n = copies.get();
            let mut out = Vec::with_capacity(pages.len() * n);
            for copy in 0..n {
                let label = CopyLabel::for_copy(copy);
                out.extend(pages.iter().cloned().map(|mut page| {
                    page.copy_label = label;
                    page
                }));
            }
            out
        }
    }
}
