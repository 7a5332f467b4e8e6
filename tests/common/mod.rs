#![allow(dead_code)]

use chrono::NaiveDate;
use rx_sheets::{
    Doctor, DocumentHeader, Institution, MedicationItem, PatientInfo, PrescriptionDocument,
    Provenance,
};

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date")
}

pub fn medication(i: usize) -> MedicationItem {
    MedicationItem {
        id: format!("med-{i}"),
        name: format!("Drug {i}"),
        strength: "500mg".into(),
        quantity: "1".into(),
        unit: "box".into(),
        frequency: "every 8 hours".into(),
        duration: "7 days".into(),
        note: if i % 2 == 0 { "after meals".into() } else { String::new() },
        provenance: if i % 3 == 0 {
            Provenance::AiSuggested
        } else {
            Provenance::Manual
        },
    }
}

pub fn medications(n: usize) -> Vec<MedicationItem> {
    (0..n).map(medication).collect()
}

/// A paragraph whose heuristic cost is `lines` at 95 characters per line.
pub fn paragraph(lines: usize, fill: char) -> String {
    std::iter::repeat_n(fill, lines * 95).collect()
}

pub fn document(n_meds: usize, instructions: &str) -> PrescriptionDocument {
    PrescriptionDocument {
        patient: PatientInfo {
            name: "Maria da Silva".into(),
            age: "34".into(),
            document_id: "123.456.789-00".into(),
            address: Some("Rua das Flores, 10".into()),
            pregnant: false,
            pediatric: false,
            pediatric_detail: None,
        },
        medications: medications(n_meds),
        instructions: instructions.to_string(),
        include_instructions: true,
        include_address: false,
        diagnosis: "Sinusitis".into(),
        date: date(),
    }
}

pub fn header() -> DocumentHeader {
    DocumentHeader {
        doctor: Doctor {
            name: "Ana Souza".into(),
            specialty: "General Practice".into(),
            license_id: "12345-SP".into(),
        },
        institution: Institution {
            name: "Clinica Central".into(),
            address: "Av. Paulista, 1000".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            phone: "(11) 5555-0000".into(),
        },
        header_image: None,
        hide_text_header: false,
    }
}

/// Scratch directory removed when the returned guard drops.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create scratch dir")
}
