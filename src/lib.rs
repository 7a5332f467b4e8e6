mod error;
mod fonts;
mod pdf;

pub mod config;
pub mod model;
pub mod paginate;

pub use config::{LineEstimate, Locale, PaginationConfig};
pub use error::Error;
pub use model::{
    CopyCount, Doctor, DocumentHeader, Institution, MedicationItem, PatientInfo,
    PrescriptionDocument, PrintJob, PrintOptions, Provenance,
};
pub use paginate::{DocumentComposer, Page, PageContent, PageKind};
pub use pdf::{MeasuredEstimator, render as render_pages};

use std::path::Path;
use std::time::Instant;

/// Read and validate a JSON print job.
pub fn load_job(path: &Path) -> Result<PrintJob, Error> {
    let data = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;
    parse_job(&data)
}

pub fn parse_job(json: &str) -> Result<PrintJob, Error> {
    Ok(serde_json::from_str(json)?)
}

/// Paginate a job into the final, ordered sheet list.
pub fn compose_job(job: &PrintJob) -> Vec<Page> {
    DocumentComposer::new(job.pagination, job.locale).compose(
        &job.document,
        &job.header,
        &job.options,
    )
}

/// Write an already composed page list to `output` as PDF.
pub fn export_pdf(pages: &[Page], output: &Path) -> Result<(), Error> {
    let bytes = pdf::render(pages)?;
    std::fs::write(output, &bytes)?;
    Ok(())
}

pub fn render_job_to_pdf(job: &PrintJob, output: &Path) -> Result<(), Error> {
    let t0 = Instant::now();

    let pages = compose_job(job);
    let t_compose = t0.elapsed();

    let bytes = pdf::render(&pages)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: compose={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms ({} sheets, {} bytes)",
        t_compose.as_secs_f64() * 1000.0,
        (t_render - t_compose).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        pages.len(),
        bytes.len(),
    );

    Ok(())
}

/// `prescription_<patient>_<date>.pdf`, with characters that are unsafe in
/// file names replaced by `_`.
pub fn default_output_name(doc: &PrescriptionDocument, locale: Locale) -> String {
    let patient = if doc.patient.name.trim().is_empty() {
        locale.anonymous_patient().to_string()
    } else {
        doc.patient.name.trim().to_string()
    };
    let patient: String = patient
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{}_{}_{}.pdf",
        locale.file_prefix(),
        patient,
        doc.date.format("%Y-%m-%d")
    )
}
