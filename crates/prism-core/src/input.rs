//! Reading precomputed image embeddings.
//!
//! Accepted layouts:
//!
//! - `.json` holding a bare float array (one embedding, identified by the file path)
//! - `.json` holding an object with an `embedding` field
//! - `.json` holding an array of such objects
//! - `.jsonl` with one such object per line
//!
//! Records are identified by their `id`, `file_path`, or `file_name` field,
//! falling back to the file path plus the record's position.

use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::InputError;

/// File extensions recognized as embedding input.
pub const INPUT_EXTENSIONS: &[&str] = &["json", "jsonl"];

/// One image embedding to classify.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub id: String,
    pub embedding: Vec<f32>,
}

/// Find embedding files at a path.
///
/// A file is returned as-is when its extension is recognized. A directory is
/// walked recursively. Results are sorted by path.
pub fn discover(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return if is_supported(path) {
            vec![path.to_path_buf()]
        } else {
            vec![]
        };
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported(e.path()))
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            INPUT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"))
}

/// Read every embedding record in a file.
pub fn read_file(path: &Path) -> Result<Vec<EmbeddingRecord>, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let source = path.display().to_string();

    if is_jsonl(path) {
        parse_jsonl(&content, &source)
    } else {
        parse_json(&content, &source)
    }
    .map_err(|message| InputError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse a `.json` document. `source` names the records that carry no id.
pub fn parse_json(content: &str, source: &str) -> Result<Vec<EmbeddingRecord>, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;

    match value {
        Value::Array(items) if items.iter().all(Value::is_number) => Ok(vec![EmbeddingRecord {
            id: source.to_string(),
            embedding: floats(&items)?,
        }]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                record(item, || format!("{source}#{i}")).map_err(|e| format!("record {i}: {e}"))
            })
            .collect(),
        Value::Object(_) => Ok(vec![record(&value, || source.to_string())?]),
        _ => Err("expected a float array, an object, or an array of objects".to_string()),
    }
}

/// Parse a `.jsonl` document. Blank lines are skipped; lines count from 1.
pub fn parse_jsonl(content: &str, source: &str) -> Result<Vec<EmbeddingRecord>, String> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let line_no = i + 1;
            let value: Value =
                serde_json::from_str(line).map_err(|e| format!("line {line_no}: {e}"))?;
            record(&value, || format!("{source}:{line_no}"))
                .map_err(|e| format!("line {line_no}: {e}"))
        })
        .collect()
}

fn record(value: &Value, fallback_id: impl FnOnce() -> String) -> Result<EmbeddingRecord, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "expected an object with an \"embedding\" field".to_string())?;

    let embedding = match object.get("embedding") {
        Some(Value::Array(items)) => floats(items)?,
        Some(_) => return Err("\"embedding\" must be a float array".to_string()),
        None => return Err("missing \"embedding\" field".to_string()),
    };

    let id = ["id", "file_path", "file_name"]
        .iter()
        .find_map(|key| match object.get(*key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(fallback_id);

    Ok(EmbeddingRecord { id, embedding })
}

fn floats(items: &[Value]) -> Result<Vec<f32>, String> {
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| format!("non-numeric embedding value: {v}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array() {
        let records = parse_json("[0.6, 0.8]", "a.json").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a.json");
        assert_eq!(records[0].embedding, vec![0.6, 0.8]);
    }

    #[test]
    fn test_single_object() {
        let records =
            parse_json(r#"{"file_path": "/photos/beach.jpg", "embedding": [1, 0]}"#, "x.json")
                .unwrap();
        assert_eq!(records[0].id, "/photos/beach.jpg");
        assert_eq!(records[0].embedding, vec![1.0, 0.0]);
    }

    #[test]
    fn test_array_of_objects() {
        let records = parse_json(
            r#"[{"id": "a", "embedding": [1.0]}, {"embedding": [2.0], "tags": []}]"#,
            "batch.json",
        )
        .unwrap();
        assert_eq!(records[0].id, "a");
        assert_eq!(records[1].id, "batch.json#1");
    }

    #[test]
    fn test_empty_array_is_one_empty_embedding() {
        // `[]` matches the bare-array layout; classification rejects it later.
        let records = parse_json("[]", "e.json").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].embedding.is_empty());
    }

    #[test]
    fn test_jsonl() {
        let content = "{\"file_name\": \"a.jpg\", \"embedding\": [0.1, 0.2]}\n\n{\"embedding\": [0.3, 0.4]}\n";
        let records = parse_jsonl(content, "out.jsonl").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a.jpg");
        assert_eq!(records[1].id, "out.jsonl:3");
    }

    #[test]
    fn test_jsonl_reports_line() {
        let err = parse_jsonl("{\"embedding\": [1]}\n{\"embedding\": \"x\"}\n", "o.jsonl").unwrap_err();
        assert!(err.starts_with("line 2:"));
    }

    #[test]
    fn test_rejects_bad_layouts() {
        assert!(parse_json("42", "n.json").is_err());
        assert!(parse_json(r#"{"vector": [1.0]}"#, "o.json").is_err());
        assert!(parse_json(r#"[{"embedding": [1.0, "a"]}]"#, "o.json").is_err());
    }

    #[test]
    fn test_read_file_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("b.json"), "[1.0, 0.0]").unwrap();
        std::fs::write(nested.join("a.JSONL"), "{\"id\": 7, \"embedding\": [0.0, 1.0]}\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = discover(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b.json"));
        assert!(files[1].ends_with("nested/a.JSONL"));

        let records = read_file(&files[1]).unwrap();
        assert_eq!(records[0].id, "7");

        assert_eq!(discover(&dir.path().join("notes.txt")), Vec::<PathBuf>::new());
        assert!(matches!(
            read_file(&dir.path().join("missing.json")),
            Err(InputError::Read { .. })
        ));
    }
}
