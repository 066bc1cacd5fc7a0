//! `zip` parser (§4.1): expands an archive into a temp tree with a
//! path-traversal guard, then hands the tree to the `code` walker so any
//! mix of source files, markdown, etc. inside the archive is recursed into.

use crate::error::ParseError;
use crate::types::ParsedDocument;
use std::path::{Path, PathBuf};

/// Resolves `entry_name` against `root`, rejecting any path that would
/// escape it (`../../etc/passwd`, absolute paths, symlink-style traversal
/// via `..` components after joining).
fn safe_join(root: &Path, entry_name: &str) -> Result<PathBuf, ParseError> {
    let candidate = root.join(entry_name);
    let mut normalized = PathBuf::new();
    for component in candidate.components() {
        match component {
            std::path::Component::ParentDir => {
                if !normalized.pop() {
                    return Err(ParseError::PathTraversal(entry_name.to_string()));
                }
            }
            std::path::Component::Normal(part) => normalized.push(part),
            std::path::Component::RootDir | std::path::Component::Prefix(_) => {}
            std::path::Component::CurDir => {}
        }
    }
    let resolved = root.join(&normalized);
    if !resolved.starts_with(root) {
        return Err(ParseError::PathTraversal(entry_name.to_string()));
    }
    Ok(resolved)
}

/// Extracts `bytes` (a zip archive) into a fresh temp directory, then walks
/// the result with the `code` parser's directory walker to produce one
/// `ParsedDocument` per contained file.
pub fn parse(bytes: &[u8]) -> Result<(Vec<ParsedDocument>, Vec<String>), ParseError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = ::zip::ZipArchive::new(cursor)?;

    let extract_dir = tempfile::tempdir()?;
    let root = extract_dir.path();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        let dest = safe_join(root, &name)?;

        if entry.is_dir() {
            std::fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&dest)?;
        std::io::copy(&mut entry, &mut out)?;
    }

    crate::code::parse(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_traversal_entries() {
        let root = tempfile::tempdir().unwrap();
        let err = safe_join(root.path(), "../../etc/passwd").unwrap_err();
        assert!(matches!(err, ParseError::PathTraversal(_)));
    }

    #[test]
    fn allows_nested_safe_paths() {
        let root = tempfile::tempdir().unwrap();
        let resolved = safe_join(root.path(), "src/lib.rs").unwrap();
        assert!(resolved.starts_with(root.path()));
    }

    #[test]
    fn extracts_and_walks_archive_contents() {
        let mut buf = Vec::new();
        {
            let cursor = std::io::Cursor::new(&mut buf);
            let mut writer = ::zip::ZipWriter::new(cursor);
            let opts: ::zip::write::FileOptions<()> = ::zip::write::FileOptions::default();
            writer.start_file("lib.rs", opts).unwrap();
            std::io::Write::write_all(&mut writer, b"pub fn hi() {}").unwrap();
            writer.finish().unwrap();
        }
        let (docs, warnings) = parse(&buf).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(docs.len(), 1);
        assert!(docs[0].metadata["functions"][0] == "hi");
    }
}
