use std::path::Path;

use csv::WriterBuilder;
use tracing::warn;

use crate::error::ExtractError;
use crate::model::{NO_VALUE_MARKER, NormalizedTable};
use crate::options::{ExtractOptions, OutputEncoding};
use crate::warning::{AnomalyCode, PageAnomaly};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

fn fit_row_to_schema(
    row: &[String],
    width: usize,
    row_index: usize,
    warnings: &mut Vec<PageAnomaly>,
) -> Vec<String> {
    if row.len() == width {
        return row.to_vec();
    }

    if row.len() < width {
        warn!(row = row_index, have = row.len(), want = width, "padding short row");
        warnings.push(
            PageAnomaly::new(
                AnomalyCode::RowPadded,
                format!("row has {} fields, padded to {width}", row.len()),
            )
            .with_row(row_index),
        );
        let mut out = row.to_vec();
        out.resize(width, NO_VALUE_MARKER.to_string());
        return out;
    }

    warn!(row = row_index, have = row.len(), want = width, "truncating long row");
    warnings.push(
        PageAnomaly::new(
            AnomalyCode::RowTruncated,
            format!("row has {} fields, truncated to {width}", row.len()),
        )
        .with_row(row_index),
    );
    row[..width].to_vec()
}

fn render_records(
    table: &NormalizedTable,
    delimiter: u8,
    warnings: &mut Vec<PageAnomaly>,
) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());

    if !table.columns.is_empty() {
        writer.write_record(&table.columns)?;
        for (index, row) in table.rows.iter().enumerate() {
            let fitted = fit_row_to_schema(row, table.columns.len(), index + 1, warnings);
            writer.write_record(&fitted)?;
        }
    }
    writer.flush().map_err(csv::Error::from)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

fn encode_output(records: &str, encoding: OutputEncoding) -> Vec<u8> {
    match encoding {
        OutputEncoding::Utf8Bom => {
            let mut out = Vec::with_capacity(UTF8_BOM.len() + records.len());
            out.extend_from_slice(UTF8_BOM);
            out.extend_from_slice(records.as_bytes());
            out
        }
        OutputEncoding::Utf8 => records.as_bytes().to_vec(),
        OutputEncoding::Windows1252 => {
            let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode(records);
            encoded.into_owned()
        }
    }
}

/// Write the normalized table as a delimited dataset. Every record carries
/// exactly `columns.len()` fields; shorter rows are padded with the no-value
/// marker and longer rows truncated, both recorded as anomalies. A table
/// with no rows writes the header record only.
pub(crate) fn write_csv(
    output_csv: &Path,
    table: &NormalizedTable,
    options: &ExtractOptions,
    warnings: &mut Vec<PageAnomaly>,
) -> Result<(), ExtractError> {
    let records = render_records(table, options.delimiter, warnings)?;
    let bytes = encode_output(&records, options.encoding);
    std::fs::write(output_csv, bytes).map_err(|source| ExtractError::SinkWriteFailed {
        path: output_csv.to_path_buf(),
        source,
    })
}

pub(crate) fn write_csv_to_string(
    table: &NormalizedTable,
    options: &ExtractOptions,
    warnings: &mut Vec<PageAnomaly>,
) -> Result<String, ExtractError> {
    render_records(table, options.delimiter, warnings)
}
