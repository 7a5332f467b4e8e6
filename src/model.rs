use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{Locale, PaginationConfig};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    #[default]
    Manual,
    AiSuggested,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicationItem {
    pub id: String,
    pub name: String,
    pub strength: String,
    pub quantity: String,
    pub unit: String,
    pub frequency: String,
    pub duration: String,
    pub note: String,
    pub provenance: Provenance,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientInfo {
    pub name: String,
    pub age: String,
    pub document_id: String,
    pub address: Option<String>,
    pub pregnant: bool,
    pub pediatric: bool,
    pub pediatric_detail: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Doctor {
    pub name: String,
    pub specialty: String,
    pub license_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Institution {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
}

impl Institution {
    /// `address - city/state • Tel: phone`, each piece only when present.
    pub fn address_line(&self) -> String {
        let mut line = self.address.clone();
        if !self.city.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.city);
        }
        if !self.state.is_empty() {
            line.push('/');
            line.push_str(&self.state);
        }
        if !self.phone.is_empty() {
            line.push_str(" \u{2022} Tel: ");
            line.push_str(&self.phone);
        }
        line
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentHeader {
    pub doctor: Doctor,
    pub institution: Institution,
    pub header_image: Option<PathBuf>,
    pub hide_text_header: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionDocument {
    #[serde(default)]
    pub patient: PatientInfo,
    #[serde(default)]
    pub medications: Vec<MedicationItem>,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub include_instructions: bool,
    #[serde(default)]
    pub include_address: bool,
    /// Context for the editor only; never printed.
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default = "today")]
    pub date: NaiveDate,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Number of physical originals to print.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CopyCount {
    #[default]
    Single,
    Duplicate,
}

impl CopyCount {
    pub fn get(self) -> usize {
        match self {
            CopyCount::Single => 1,
            CopyCount::Duplicate => 2,
        }
    }
}

impl TryFrom<u8> for CopyCount {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(CopyCount::Single),
            2 => Ok(CopyCount::Duplicate),
            other => Err(format!("copy count must be 1 or 2, got {other}")),
        }
    }
}

impl From<CopyCount> for u8 {
    fn from(c: CopyCount) -> u8 {
        c.get() as u8
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintOptions {
    pub copies: CopyCount,
}

/// Everything needed for one render request, as read from a job file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrintJob {
    pub document: PrescriptionDocument,
    #[serde(default)]
    pub header: DocumentHeader,
    #[serde(default)]
    pub options: PrintOptions,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub locale: Locale,
}
