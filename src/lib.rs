mod csv_out;
mod error;
mod grid_detect;
mod model;
mod normalize;
mod options;
mod package;
mod page_reader;
mod stitch;
mod vocabulary;
mod warning;

use std::path::Path;

use serde::Serialize;
use tracing::info;

pub use error::ExtractError;
pub use model::{MergedTable, NO_VALUE_MARKER, NormalizedTable, PageGrid};
pub use normalize::normalize;
pub use options::{ExtractOptions, OutputEncoding, PageSelection};
pub use package::write_zip_archive;
pub use page_reader::PageGridReader;
pub use stitch::{HeaderMatch, stitch, stitch_with};
pub use vocabulary::Vocabulary;
pub use warning::{AnomalyCode, PageAnomaly};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub page_count: usize,
    pub grid_page_count: usize,
    pub column_count: usize,
    pub row_count: usize,
    pub warnings: Vec<PageAnomaly>,
}

fn validate_options(options: &ExtractOptions) -> Result<(), ExtractError> {
    if options.min_cols < 2 {
        return Err(ExtractError::InvalidOption(
            "min_cols must be at least 2".to_string(),
        ));
    }
    Ok(())
}

fn run_pipeline(
    mut reader: PageGridReader,
    options: &ExtractOptions,
) -> (NormalizedTable, Vec<PageAnomaly>, usize, usize) {
    let page_count = reader.page_count();
    let merged = stitch_with(&mut reader, options.header_match);
    let grid_page_count = reader.grids_yielded();
    let mut warnings = reader.take_anomalies();

    let table = normalize(&merged, &options.vocabulary);
    if table.rows.is_empty() {
        warnings.push(PageAnomaly::new(
            AnomalyCode::EmptyResult,
            "no table rows survived merging",
        ));
    }

    (table, warnings, page_count, grid_page_count)
}

/// Extract the procedure table of a Rol annex PDF into a delimited dataset.
///
/// Per-page anomalies are absorbed into the report; only whole-document or
/// whole-output failures are returned as errors.
pub fn extract_rol_to_csv(
    input_pdf: &Path,
    output_csv: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    validate_options(options)?;

    let reader = PageGridReader::open(input_pdf, options)?;
    let (table, mut warnings, page_count, grid_page_count) = run_pipeline(reader, options);
    csv_out::write_csv(output_csv, &table, options, &mut warnings)?;
    info!(
        rows = table.rows.len(),
        columns = table.columns.len(),
        "dataset written"
    );

    Ok(ExtractionReport {
        page_count,
        grid_page_count,
        column_count: table.columns.len(),
        row_count: table.rows.len(),
        warnings,
    })
}

/// Same pipeline over an in-memory PDF, returning the dataset as a string.
pub fn extract_rol_bytes_to_csv_string(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(String, ExtractionReport), ExtractError> {
    validate_options(options)?;

    let reader = PageGridReader::from_bytes(input_pdf, options)?;
    let (table, mut warnings, page_count, grid_page_count) = run_pipeline(reader, options);
    let csv = csv_out::write_csv_to_string(&table, options, &mut warnings)?;

    Ok((
        csv,
        ExtractionReport {
            page_count,
            grid_page_count,
            column_count: table.columns.len(),
            row_count: table.rows.len(),
            warnings,
        },
    ))
}

/// Extract to a dataset and package it into a zip archive. Packaging runs
/// at most once and only after the dataset write succeeded.
pub fn extract_rol_to_archive(
    input_pdf: &Path,
    output_csv: &Path,
    output_zip: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    let report = extract_rol_to_csv(input_pdf, output_csv, options)?;
    package::write_zip_archive(output_csv, output_zip)?;
    Ok(report)
}
