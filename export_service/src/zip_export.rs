//! ZIP packaging (§4.10): bundles rendered files plus a manifest
//! enumerating each one's size, format, and record count.

use std::io::Write;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::ExportError;
use crate::types::{Manifest, ManifestEntry};

/// One file to bundle: its archive name, rendered bytes, format tag, and
/// the number of logical records it represents (rows/tasks/sections).
pub struct ExportFile {
    pub name: String,
    pub contents: String,
    pub format: crate::types::ExportFormat,
    pub record_count: usize,
}

/// Packages `files` into a ZIP archive with a `manifest.json` entry
/// (§4.10 "ZIP packaging bundles a manifest that enumerates each
/// included file with size, format, and record count").
pub fn package(files: &[ExportFile]) -> Result<Vec<u8>, ExportError> {
    if files.is_empty() {
        return Err(ExportError::Empty);
    }
    let mut buffer = Vec::new();
    let mut manifest_entries = Vec::with_capacity(files.len());
    {
        let cursor = std::io::Cursor::new(&mut buffer);
        let mut writer = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for file in files {
            writer.start_file(&file.name, options)?;
            writer.write_all(file.contents.as_bytes())?;
            manifest_entries.push(ManifestEntry {
                name: file.name.clone(),
                format: file.format,
                size_bytes: file.contents.len() as u64,
                record_count: file.record_count,
            });
        }

        let manifest = Manifest { generated_at: chrono::Utc::now(), files: manifest_entries };
        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        writer.start_file("manifest.json", options)?;
        writer.write_all(manifest_json.as_bytes())?;

        writer.finish()?;
    }
    Ok(buffer)
}
