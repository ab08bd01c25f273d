use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExtractError;

/// Package the written dataset into a deflate-compressed zip archive whose
/// single entry is named after the dataset file itself.
pub fn write_zip_archive(dataset_path: &Path, archive_path: &Path) -> Result<(), ExtractError> {
    let archive_error = |source: zip::result::ZipError| ExtractError::ArchiveWriteFailed {
        path: archive_path.to_path_buf(),
        source,
    };

    let dataset = std::fs::read(dataset_path).map_err(|error| archive_error(error.into()))?;
    let entry_name = dataset_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("dataset.csv");

    let file = File::create(archive_path).map_err(|error| archive_error(error.into()))?;
    let mut writer = ZipWriter::new(file);
    let entry_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer
        .start_file(entry_name, entry_options)
        .map_err(archive_error)?;
    writer
        .write_all(&dataset)
        .map_err(|error| archive_error(error.into()))?;
    writer.finish().map_err(archive_error)?;

    debug!(
        archive = %archive_path.display(),
        entry = entry_name,
        bytes = dataset.len(),
        "archive written"
    );
    Ok(())
}
