use std::num::NonZeroUsize;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_CHARS_PER_LINE: usize = 95; // A4 width with 2cm margins
pub const DEFAULT_LINES_PER_PAGE: usize = 22; // leaves room for header and footer
pub const DEFAULT_ITEMS_PER_PAGE: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEstimate {
    /// `ceil(max(1, chars) / chars_per_line)` per paragraph.
    #[default]
    Heuristic,
    /// Word wrap against Helvetica advance widths at the instruction body size.
    Measured,
}

/// Capacity model used when splitting content into sheets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub chars_per_line: NonZeroUsize,
    pub lines_per_page: NonZeroUsize,
    pub items_per_page: NonZeroUsize,
    pub line_estimate: LineEstimate,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            chars_per_line: NonZeroUsize::new(DEFAULT_CHARS_PER_LINE).unwrap_or(NonZeroUsize::MIN),
            lines_per_page: NonZeroUsize::new(DEFAULT_LINES_PER_PAGE).unwrap_or(NonZeroUsize::MIN),
            items_per_page: NonZeroUsize::new(DEFAULT_ITEMS_PER_PAGE).unwrap_or(NonZeroUsize::MIN),
            line_estimate: LineEstimate::Heuristic,
        }
    }
}

impl PaginationConfig {
    /// Apply optional overrides (e.g. CLI flags). Zero is rejected.
    pub fn with_overrides(
        mut self,
        chars_per_line: Option<usize>,
        lines_per_page: Option<usize>,
        items_per_page: Option<usize>,
    ) -> Result<Self, Error> {
        if let Some(n) = chars_per_line {
            self.chars_per_line = non_zero("chars_per_line", n)?;
        }
        if let Some(n) = lines_per_page {
            self.lines_per_page = non_zero("lines_per_page", n)?;
        }
        if let Some(n) = items_per_page {
            self.items_per_page = non_zero("items_per_page", n)?;
        }
        Ok(self)
    }
}

fn non_zero(field: &str, n: usize) -> Result<NonZeroUsize, Error> {
    NonZeroUsize::new(n).ok_or_else(|| Error::InvalidConfig(format!("{field} must be greater than zero")))
}

/// Language of the fixed strings printed on a sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en", alias = "en-US")]
    En,
    #[serde(rename = "pt-BR", alias = "pt-br")]
    PtBr,
}

impl std::str::FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Locale::En),
            "pt-br" | "pt" => Ok(Locale::PtBr),
            other => Err(Error::InvalidConfig(format!("unknown locale: {other}"))),
        }
    }
}

impl Locale {
    /// Weekday-qualified long date, e.g. "Friday, October 16, 2026" or
    /// "Sexta-feira, 16 de outubro de 2026".
    pub fn long_date(self, date: NaiveDate) -> String {
        match self {
            Locale::En => date.format("%A, %B %-d, %Y").to_string(),
            Locale::PtBr => {
                let pt = chrono::Locale::pt_BR;
                // Locale data names weekdays "segunda", "sexta"; print the full "-feira" form
                let mut weekday = date.format_localized("%A", pt).to_string();
                if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !weekday.ends_with("-feira") {
                    weekday.push_str("-feira");
                }
                let rest = date.format_localized("%-d de %B de %Y", pt);
                format!("{}, {rest}", capitalize_first(&weekday))
            }
        }
    }

    pub fn copy_label(self, ordinal: usize) -> String {
        match self {
            Locale::En => match ordinal {
                1 => "1st copy".to_string(),
                2 => "2nd copy".to_string(),
                n => format!("{n}th copy"),
            },
            Locale::PtBr => format!("{ordinal}\u{00AA} VIA"),
        }
    }

    pub fn page_counter(self, number: usize, count: usize) -> String {
        match self {
            Locale::En => format!("Page {number} of {count}"),
            Locale::PtBr => format!("Página {number}/{count}"),
        }
    }

    pub fn patient_label(self) -> &'static str {
        match self {
            Locale::En => "Patient:",
            Locale::PtBr => "Paciente:",
        }
    }

    pub fn document_label(self) -> &'static str {
        match self {
            Locale::En => "ID:",
            Locale::PtBr => "CPF:",
        }
    }

    pub fn address_label(self) -> &'static str {
        match self {
            Locale::En => "Address:",
            Locale::PtBr => "Endereço:",
        }
    }

    pub fn license_label(self) -> &'static str {
        match self {
            Locale::En => "License",
            Locale::PtBr => "CRM",
        }
    }

    pub fn pregnant_marker(self) -> &'static str {
        match self {
            Locale::En => "Pregnant",
            Locale::PtBr => "Gestante",
        }
    }

    pub fn pediatric_marker(self) -> &'static str {
        match self {
            Locale::En => "Pediatric",
            Locale::PtBr => "Pediátrico",
        }
    }

    pub fn note_label(self) -> &'static str {
        match self {
            Locale::En => "Note:",
            Locale::PtBr => "Obs:",
        }
    }

    pub fn medication_placeholder(self) -> &'static str {
        match self {
            Locale::En => "Medication",
            Locale::PtBr => "Medicamento",
        }
    }

    pub fn empty_prescription(self) -> &'static str {
        match self {
            Locale::En => "Prescription area",
            Locale::PtBr => "Área de Prescrição Médica",
        }
    }

    pub fn instructions_title(self) -> &'static str {
        match self {
            Locale::En => "Patient instructions",
            Locale::PtBr => "Orientações ao Paciente",
        }
    }

    pub(crate) fn file_prefix(self) -> &'static str {
        match self {
            Locale::En => "prescription",
            Locale::PtBr => "receita",
        }
    }

    pub(crate) fn anonymous_patient(self) -> &'static str {
        match self {
            Locale::En => "patient",
            Locale::PtBr => "paciente",
        }
    }
}

// Sentence case: only the weekday at the start is capitalised.
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
