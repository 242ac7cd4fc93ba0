use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub const CSV_HEADERS: [&str; 5] = ["image_filename", "id", "label", "type", "coords_json"];
const REQUIRED_CSV_HEADERS: [&str; 4] = ["id", "label", "type", "coords_json"];

/// One annotated region on an image.
///
/// `coords` is kept as raw JSON so rect, polygon and point shapes all survive
/// a round trip untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub coords: Value,
}

/// The JSON export envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelFile {
    pub image: Option<String>,
    pub labels: Vec<Label>,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read labels file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid JSON labels file structure.")]
    InvalidStructure,
    #[error("CSV file is empty or has no data rows.")]
    EmptyCsv,
    #[error("CSV must contain headers: {}", REQUIRED_CSV_HEADERS.join(", "))]
    MissingHeaders,
    #[error("Unsupported file type '{0}'. Please upload a .json or .csv file.")]
    UnsupportedExtension(String),
}

/// Final path component of `image`, used for the CSV filename column.
pub fn image_file_name(image: Option<&str>) -> &str {
    image
        .and_then(|p| p.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("unknown_image")
}

pub fn export_json(image: Option<&str>, labels: &[Label]) -> serde_json::Result<String> {
    let file = LabelFile {
        image: image.map(str::to_string),
        labels: labels.to_vec(),
    };
    serde_json::to_string_pretty(&file)
}

pub fn export_csv(image_filename: &str, labels: &[Label]) -> String {
    let mut lines = Vec::with_capacity(labels.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for l in labels {
        let coords = l.coords.to_string();
        lines.push(
            [
                quote_if_needed(image_filename),
                quote_if_needed(&l.id),
                quote(&l.label),
                quote_if_needed(&l.kind),
                quote(&coords),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn quote_if_needed(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quote(field)
    } else {
        field.to_string()
    }
}

/// Accepts either a bare array of labels or a `{ "labels": [...] }` envelope.
pub fn import_json(content: &str) -> Result<Vec<Label>, ImportError> {
    let value: Value = serde_json::from_str(content)?;
    let array = match value {
        Value::Array(_) => value,
        Value::Object(mut obj) => match obj.remove("labels") {
            Some(labels @ Value::Array(_)) => labels,
            _ => return Err(ImportError::InvalidStructure),
        },
        _ => return Err(ImportError::InvalidStructure),
    };
    Ok(serde_json::from_value(array)?)
}

/// Parse a labels CSV. Rows with too few fields or unparsable coordinates
/// are skipped individually.
pub fn import_csv(content: &str) -> Result<Vec<Label>, ImportError> {
    let mut lines = split_csv_records(content)
        .into_iter()
        .filter(|l| !l.trim().is_empty());

    let header_line = lines.next().ok_or(ImportError::EmptyCsv)?;
    let headers = parse_csv_line(header_line);
    let rows: Vec<&str> = lines.collect();
    if rows.is_empty() {
        return Err(ImportError::EmptyCsv);
    }

    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(id_idx), Some(label_idx), Some(type_idx), Some(coords_idx)) = (
        column("id"),
        column("label"),
        column("type"),
        column("coords_json"),
    ) else {
        return Err(ImportError::MissingHeaders);
    };

    let mut labels = Vec::with_capacity(rows.len());
    for (n, row) in rows.iter().enumerate() {
        let values = parse_csv_line(row);
        if values.len() < headers.len() {
            warn!(row = n + 1, "skipping short CSV row");
            continue;
        }
        match serde_json::from_str(&values[coords_idx]) {
            Ok(coords) => labels.push(Label {
                id: values[id_idx].clone(),
                label: values[label_idx].clone(),
                kind: values[type_idx].clone(),
                coords,
            }),
            Err(err) => warn!(row = n + 1, %err, "skipping CSV row with invalid coords"),
        }
    }
    Ok(labels)
}

/// Split CSV content into records. Line breaks inside quoted fields stay
/// part of the record; a trailing `\r` on each record is dropped.
pub fn split_csv_records(content: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in content.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                records.push(&content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    records.push(&content[start..]);
    records
        .into_iter()
        .map(|r| r.strip_suffix('\r').unwrap_or(r))
        .collect()
}

/// Split one CSV record into fields. Quoted fields may contain commas and
/// doubled quotes.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Import a `.json` or `.csv` labels file, choosing the parser by extension.
pub fn import_file(path: &Path) -> Result<Vec<Label>, ImportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let content = match ext.as_str() {
        "json" | "csv" => fs::read_to_string(path)?,
        _ => return Err(ImportError::UnsupportedExtension(ext)),
    };
    let labels = if ext == "json" {
        import_json(&content)?
    } else {
        import_csv(&content)?
    };
    info!(?path, count = labels.len(), "labels imported");
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Label> {
        vec![
            Label {
                id: "l1".into(),
                label: "cat".into(),
                kind: "rect".into(),
                coords: json!({"x": 10, "y": 20, "w": 30, "h": 40}),
            },
            Label {
                id: "l2".into(),
                label: "say \"hi\", friend".into(),
                kind: "polygon".into(),
                coords: json!([[0, 0], [5, 0], [5, 5]]),
            },
        ]
    }

    #[test]
    fn csv_export_layout() {
        let csv = export_csv("photo.jpg", &sample()[..1]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("image_filename,id,label,type,coords_json"));
        assert_eq!(
            lines.next(),
            Some(r#"photo.jpg,l1,"cat",rect,"{""h"":40,""w"":30,""x"":10,""y"":20}""#)
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_round_trip_preserves_labels() {
        let labels = sample();
        let csv = export_csv("photo.jpg", &labels);
        assert_eq!(import_csv(&csv).unwrap(), labels);
    }

    #[test]
    fn csv_round_trip_keeps_line_breaks_in_fields() {
        let mut labels = sample();
        labels.push(Label {
            id: "multi\nline".into(),
            label: "line1\nline2".into(),
            kind: "point".into(),
            coords: json!({"x": 1, "y": 2}),
        });
        labels.push(Label {
            id: "b".into(),
            label: "crlf\r\ninside".into(),
            kind: "rect".into(),
            coords: json!({}),
        });
        let csv = export_csv("photo.jpg", &labels);
        assert_eq!(import_csv(&csv).unwrap(), labels);
    }

    #[test]
    fn records_split_outside_quotes_only() {
        assert_eq!(
            split_csv_records("a,\"x\ny\"\r\nb,c\n"),
            vec!["a,\"x\ny\"", "b,c", ""]
        );
    }

    #[test]
    fn csv_parser_handles_quotes_and_empty_fields() {
        assert_eq!(parse_csv_line(r#"a,"b,c","d""e",,"#), vec!["a", "b,c", "d\"e", "", ""]);
        assert_eq!(parse_csv_line(""), vec![""]);
    }

    #[test]
    fn csv_without_rows_is_rejected() {
        assert!(matches!(import_csv(""), Err(ImportError::EmptyCsv)));
        assert!(matches!(
            import_csv("id,label,type,coords_json\n\n"),
            Err(ImportError::EmptyCsv)
        ));
    }

    #[test]
    fn csv_missing_headers_is_rejected() {
        let err = import_csv("id,label,coords_json\n1,a,{}").unwrap_err();
        assert!(matches!(err, ImportError::MissingHeaders));
        assert_eq!(
            err.to_string(),
            "CSV must contain headers: id, label, type, coords_json"
        );
    }

    #[test]
    fn csv_bad_rows_are_skipped() {
        let csv = "id,label,type,coords_json\r\n\
                   1,dog,rect,\"{\"\"x\"\":1}\"\r\n\
                   2,short\r\n\
                   3,bird,point,not-json\r\n";
        let labels = import_csv(csv).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].id, "1");
        assert_eq!(labels[0].coords, json!({"x": 1}));
    }

    #[test]
    fn json_accepts_array_and_envelope() {
        let labels = sample();
        let envelope = export_json(Some("/photos/a.png"), &labels).unwrap();
        assert_eq!(import_json(&envelope).unwrap(), labels);

        let bare = serde_json::to_string(&labels).unwrap();
        assert_eq!(import_json(&bare).unwrap(), labels);
    }

    #[test]
    fn json_with_wrong_shape_is_rejected() {
        assert!(matches!(
            import_json(r#"{"items": []}"#),
            Err(ImportError::InvalidStructure)
        ));
        assert!(matches!(import_json("42"), Err(ImportError::InvalidStructure)));
        assert!(matches!(import_json("{"), Err(ImportError::Json(_))));
    }

    #[test]
    fn file_name_falls_back_when_unknown() {
        assert_eq!(image_file_name(Some("/a/b/c.jpg")), "c.jpg");
        assert_eq!(image_file_name(Some("c.jpg")), "c.jpg");
        assert_eq!(image_file_name(None), "unknown_image");
        assert_eq!(image_file_name(Some("/a/")), "unknown_image");
    }

    #[test]
    fn import_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let labels = sample();

        let json_path = dir.path().join("labels.JSON");
        fs::write(&json_path, export_json(None, &labels).unwrap()).unwrap();
        assert_eq!(import_file(&json_path).unwrap(), labels);

        let csv_path = dir.path().join("labels.csv");
        fs::write(&csv_path, export_csv("x.png", &labels)).unwrap();
        assert_eq!(import_file(&csv_path).unwrap(), labels);

        let txt_path = dir.path().join("labels.txt");
        fs::write(&txt_path, "").unwrap();
        assert!(matches!(
            import_file(&txt_path),
            Err(ImportError::UnsupportedExtension(ext)) if ext == "txt"
        ));
    }
}
