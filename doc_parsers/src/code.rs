//! `code` parser (§4.1): walks a source tree, one document per file, with a
//! lightweight per-language structural summary (classes/functions/imports)
//! and a cyclomatic-complexity proxy.

use crate::error::ParseError;
use crate::types::ParsedDocument;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

const SKIP_DIRS: &[&str] = &[".git", "node_modules", "__pycache__", "target", "build"];

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else if", "elif", "for", "while", "case", "catch", "except", "&&", "||", "?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lang {
    Rust,
    Python,
    JavaScript,
    Java,
    Go,
    Other,
}

fn lang_for(path: &Path) -> Lang {
    match path.extension().and_then(|e| e.to_str()) {
        Some("rs") => Lang::Rust,
        Some("py") => Lang::Python,
        Some("js" | "jsx" | "ts" | "tsx") => Lang::JavaScript,
        Some("java") => Lang::Java,
        Some("go") => Lang::Go,
        _ => Lang::Other,
    }
}

struct Patterns {
    class: Regex,
    function: Regex,
    import: Regex,
}

static RUST_PAT: Lazy<Patterns> = Lazy::new(|| Patterns {
    class: Regex::new(r"(?m)^\s*(?:pub\s+)?struct\s+(\w+)").unwrap(),
    function: Regex::new(r"(?m)^\s*(?:pub\s+)?(?:async\s+)?fn\s+(\w+)").unwrap(),
    import: Regex::new(r"(?m)^\s*use\s+([\w:]+)").unwrap(),
});
static PYTHON_PAT: Lazy<Patterns> = Lazy::new(|| Patterns {
    class: Regex::new(r"(?m)^\s*class\s+(\w+)").unwrap(),
    function: Regex::new(r"(?m)^\s*def\s+(\w+)").unwrap(),
    import: Regex::new(r"(?m)^\s*(?:import|from)\s+([\w.]+)").unwrap(),
});
static JS_PAT: Lazy<Patterns> = Lazy::new(|| Patterns {
    class: Regex::new(r"(?m)^\s*(?:export\s+)?class\s+(\w+)").unwrap(),
    function: Regex::new(r"(?m)^\s*(?:export\s+)?(?:async\s+)?function\s+(\w+)").unwrap(),
    import: Regex::new(r#"(?m)^\s*import\s+.*from\s+['"]([^'"]+)['"]"#).unwrap(),
});
static JAVA_PAT: Lazy<Patterns> = Lazy::new(|| Patterns {
    class: Regex::new(r"(?m)^\s*(?:public\s+|private\s+)?(?:final\s+)?class\s+(\w+)").unwrap(),
    function: Regex::new(r"(?m)^\s*(?:public|private|protected)\s+[\w<>\[\]]+\s+(\w+)\s*\(").unwrap(),
    import: Regex::new(r"(?m)^\s*import\s+([\w.]+);").unwrap(),
});
static GO_PAT: Lazy<Patterns> = Lazy::new(|| Patterns {
    class: Regex::new(r"(?m)^\s*type\s+(\w+)\s+struct").unwrap(),
    function: Regex::new(r"(?m)^\s*func\s+(?:\([^)]*\)\s*)?(\w+)").unwrap(),
    import: Regex::new(r#"(?m)^\s*"([\w./-]+)""#).unwrap(),
});

fn patterns_for(lang: Lang) -> Option<&'static Patterns> {
    match lang {
        Lang::Rust => Some(&RUST_PAT),
        Lang::Python => Some(&PYTHON_PAT),
        Lang::JavaScript => Some(&JS_PAT),
        Lang::Java => Some(&JAVA_PAT),
        Lang::Go => Some(&GO_PAT),
        Lang::Other => None,
    }
}

fn cyclomatic_proxy(content: &str) -> usize {
    let mut count = 1;
    for keyword in CONTROL_KEYWORDS {
        count += content.matches(keyword).count();
    }
    count
}

fn is_skipped(path: &Path) -> bool {
    path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        SKIP_DIRS.iter().any(|skip| s == *skip)
    })
}

/// Walks `root`, producing one `ParsedDocument` per source file found.
/// Per-file read/decode errors warn and continue rather than fail the job.
pub fn parse(root: &Path) -> Result<(Vec<ParsedDocument>, Vec<String>), ParseError> {
    let mut documents = Vec::new();
    let mut warnings = Vec::new();

    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped(e.path()))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warnings.push(format!("walk error: {e}"));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let lang = lang_for(path);
        if lang == Lang::Other {
            continue;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warnings.push(format!("{}: {e}", path.display()));
                continue;
            }
        };

        let rel = path.strip_prefix(root).unwrap_or(path).to_string_lossy().to_string();
        let mut classes = Vec::new();
        let mut functions = Vec::new();
        let mut imports = Vec::new();
        if let Some(pat) = patterns_for(lang) {
            classes = pat.class.captures_iter(&content).map(|c| c[1].to_string()).collect();
            functions = pat.function.captures_iter(&content).map(|c| c[1].to_string()).collect();
            imports = pat.import.captures_iter(&content).map(|c| c[1].to_string()).collect();
        }

        let metadata = serde_json::json!({
            "language": format!("{lang:?}").to_lowercase(),
            "classes": classes,
            "functions": functions,
            "imports": imports,
            "cyclomatic_complexity": cyclomatic_proxy(&content),
            "line_count": content.lines().count(),
        });

        documents.push(ParsedDocument::new(rel, content).with_metadata(metadata));
    }

    Ok((documents, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn walks_tree_skipping_vendor_dirs_and_extracts_structure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/ignored.js"), "function skip() {}").unwrap();

        let mut f = std::fs::File::create(dir.path().join("lib.rs")).unwrap();
        writeln!(f, "use std::fmt;\npub struct Widget;\npub fn build() -> Widget {{ if true {{ Widget }} else {{ Widget }} }}").unwrap();

        let (docs, warnings) = parse(dir.path()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata["classes"][0], "Widget");
        assert_eq!(docs[0].metadata["functions"][0], "build");
    }
}
