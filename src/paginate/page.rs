use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Locale;
use crate::model::{
    Doctor, DocumentHeader, Institution, MedicationItem, PatientInfo, PrescriptionDocument,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Medication,
    Instructions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageContent {
    /// `start_index` is the 0-based position of `items[0]` in the full list.
    Medication {
        items: Vec<MedicationItem>,
        start_index: usize,
    },
    Instructions { text: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CopyLabel {
    #[serde(rename = "1st copy")]
    First,
    #[serde(rename = "2nd copy")]
    Second,
}

impl CopyLabel {
    pub fn for_copy(copy_index: usize) -> Option<Self> {
        match copy_index {
            0 => Some(CopyLabel::First),
            1 => Some(CopyLabel::Second),
            _ => None,
        }
    }

    pub fn ordinal(self) -> usize {
        match self {
            CopyLabel::First => 1,
            CopyLabel::Second => 2,
        }
    }
}

impl std::fmt::Display for CopyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&Locale::En.copy_label(self.ordinal()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgePlacement {
    /// Right side of the header block.
    HeaderBlock,
    /// Top-right corner of the sheet, used when there is no header block.
    Floating,
}

/// Which parts of the sheet header are drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HeaderLayout {
    pub show_image: bool,
    pub show_institution: bool,
    pub show_doctor_text: bool,
}

impl HeaderLayout {
    pub fn resolve(header: &DocumentHeader) -> Self {
        let has_image = header.header_image.is_some();
        Self {
            show_image: has_image,
            show_institution: !header.institution.name.is_empty(),
            // Text is only suppressed when an image takes its place.
            show_doctor_text: !(has_image && header.hide_text_header),
        }
    }

    pub fn show_header_block(&self) -> bool {
        self.show_institution || self.show_doctor_text
    }

    pub fn badge_placement(&self) -> BadgePlacement {
        if self.show_header_block() {
            BadgePlacement::HeaderBlock
        } else {
            BadgePlacement::Floating
        }
    }
}

/// Document-level data repeated on every sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SheetFrame {
    pub header: HeaderLayout,
    pub doctor: Doctor,
    pub institution: Institution,
    pub header_image: Option<PathBuf>,
    pub patient: PatientInfo,
    pub show_address: bool,
    pub date: NaiveDate,
    pub date_label: String,
    pub locale: Locale,
}

/// One physical sheet: content plus everything needed to draw it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub content: PageContent,
    /// 1-based, local to the section.
    pub number: usize,
    pub count: usize,
    pub copy_label: Option<CopyLabel>,
    pub frame: Arc<SheetFrame>,
}

impl Page {
    pub fn kind(&self) -> PageKind {
        match self.content {
            PageContent::Medication { .. } => PageKind::Medication,
            PageContent::Instructions { .. } => PageKind::Instructions,
        }
    }

    pub fn start_index(&self) -> usize {
        match self.content {
            PageContent::Medication { start_index, .. } => start_index,
            PageContent::Instructions { .. } => 0,
        }
    }

    /// True for the empty medication sheet printed when nothing is prescribed.
    pub fn is_placeholder(&self) -> bool {
        matches!(&self.content, PageContent::Medication { items, .. } if items.is_empty())
    }

    /// "Page i of n", only when the section spans more than one sheet.
    pub fn page_counter(&self) -> Option<String> {
        (self.count > 1).then(|| self.frame.locale.page_counter(self.number, self.count))
    }

    pub fn copy_badge(&self) -> Option<(String, BadgePlacement)> {
        self.copy_label.map(|label| {
            (
                self.frame.locale.copy_label(label.ordinal()),
                self.frame.header.badge_placement(),
            )
        })
    }
}

/// Wraps content chunks into page descriptors sharing one frame.
pub struct PageAssembler {
    frame: Arc<SheetFrame>,
}

impl PageAssembler {
    pub fn new(doc: &PrescriptionDocument, header: &DocumentHeader, locale: Locale) -> Self {
        let show_address = doc.include_address
            && doc.patient.address.as_deref().is_some_and(|a| !a.trim().is_empty());
        let frame = SheetFrame {
            header: HeaderLayout::resolve(header),
            doctor: header.doctor.clone(),
            institution: header.institution.clone(),
            header_image: header.header_image.clone(),
            patient: doc.patient.clone(),
            show_address,
            date: doc.date,
            date_label: locale.long_date(doc.date),
            locale,
        };
        Self {
            frame: Arc::new(frame),
        }
    }

    /// `index` is 0-based within the section, `total` the section's page count.
    pub fn assemble(&self, content: PageContent, index: usize, total: usize) -> Page {
        debug_assert!(index < total);
        Page {
            content,
            number: index + 1,
            count: total,
            copy_label: None,
            frame: Arc::clone(&self.frame),
        }
    }
}
