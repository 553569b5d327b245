//! Two-pass parsing of free-text classifier output.
//!
//! Pass one looks for a JSON array of `{group_name, files}` objects, fenced
//! or embedded anywhere in the text. Pass two reads line-oriented output:
//! `Group: a.txt, b.txt` on one line, or a `Group:` header followed by file
//! lines. Neither pass knows which files exist; that check happens when the
//! groups are resolved against the scan.

use crate::error::ParseError;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

/// A group as the classifier named it, before file references are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGroup {
    pub name: String,
    pub rationale: String,
    pub files: Vec<String>,
}

#[derive(Deserialize)]
struct RawGroup {
    #[serde(alias = "name", alias = "group")]
    group_name: String,
    #[serde(default)]
    files: Vec<String>,
    #[serde(default, alias = "description", alias = "rationale")]
    summary: String,
}

const MAX_GROUP_NAME_CHARS: usize = 100;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
    })
}

fn bullet_regex() -> &'static Regex {
    static BULLET: OnceLock<Regex> = OnceLock::new();
    BULLET.get_or_init(|| {
        Regex::new(r"^(?:[-*•]+\s*|\d+[.)]\s+)").expect("bullet pattern is valid")
    })
}

/// Parse classifier output into named groups
pub fn parse_response(text: &str) -> Result<Vec<ParsedGroup>, ParseError> {
    if let Some(groups) = parse_json(text) {
        return Ok(groups);
    }
    let groups = parse_lines(text);
    if groups.is_empty() {
        Err(ParseError::NoGroups)
    } else {
        Ok(groups)
    }
}

/// First pass: fenced blocks, then the whole text, then the outermost `[...]`
pub fn parse_json(text: &str) -> Option<Vec<ParsedGroup>> {
    let mut candidates: Vec<&str> = fence_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    candidates.push(text);
    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            candidates.push(&text[start..=end]);
        }
    }

    candidates
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate.trim()).ok())
        .map(groups_from_value)
        .find(|groups| !groups.is_empty())
}

fn groups_from_value(value: Value) -> Vec<ParsedGroup> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("groups") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawGroup>(item).ok())
        .filter_map(|raw| {
            let name = clean_name(&raw.group_name)?;
            Some(ParsedGroup {
                name,
                rationale: raw.summary.trim().to_string(),
                files: raw
                    .files
                    .iter()
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect(),
            })
        })
        .collect()
}

/// Second pass: `Name: file, file` lines and `Name:` header blocks
pub fn parse_lines(text: &str) -> Vec<ParsedGroup> {
    let mut groups: Vec<ParsedGroup> = Vec::new();
    // Index into `groups` of the group that continuation lines extend
    let mut current: Option<usize> = None;

    for raw_line in text.lines() {
        let line = bullet_regex().replace(raw_line.trim(), "");
        let line = line.replace("**", "");
        let line = line.trim();
        if line.is_empty() || line.starts_with("```") {
            continue;
        }

        if let Some((head, tail)) = line.split_once(':') {
            let head = head.trim();
            let tail = tail.trim();
            let lowered = head.to_lowercase();

            if lowered == "summary" || lowered == "ringkasan" || lowered == "deskripsi" {
                if let Some(index) = current {
                    groups[index].rationale = tail.to_string();
                }
                continue;
            }

            if let Some(name) = clean_name(head) {
                groups.push(ParsedGroup {
                    name,
                    rationale: String::new(),
                    files: split_files(tail),
                });
                current = Some(groups.len() - 1);
                continue;
            }
        }

        if let Some(index) = current {
            groups[index].files.extend(split_files(line));
        }
    }

    groups.retain(|g| !g.files.is_empty());
    groups
}

fn split_files(list: &str) -> Vec<String> {
    list.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn clean_name(name: &str) -> Option<String> {
    let name = name.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`');
    if name.is_empty() || name.chars().count() > MAX_GROUP_NAME_CHARS {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_array() {
        let groups = parse_response(
            r#"[{"group_name":"Teks","summary":"catatan","files":["a.txt","c.pdf"]}]"#,
        )
        .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Teks");
        assert_eq!(groups[0].rationale, "catatan");
        assert_eq!(groups[0].files, vec!["a.txt", "c.pdf"]);
    }

    #[test]
    fn parses_fenced_json_block() {
        let text = "Berikut hasilnya:\n```json\n[{\"group_name\": \"Keuangan\", \"files\": [\"q1.csv\"]}]\n```\nSemoga membantu.";
        let groups = parse_response(text).unwrap();

        assert_eq!(groups[0].name, "Keuangan");
        assert_eq!(groups[0].files, vec!["q1.csv"]);
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let text = "Grouping: [{\"group_name\": \"Kode\", \"files\": [\"main.py\"]}] done";
        let groups = parse_json(text).unwrap();
        assert_eq!(groups[0].name, "Kode");
    }

    #[test]
    fn accepts_groups_wrapper_object() {
        let text = r#"{"groups": [{"group_name": "A", "files": ["x.txt"]}]}"#;
        assert_eq!(parse_response(text).unwrap()[0].name, "A");
    }

    #[test]
    fn parses_line_oriented_output() {
        let text = "Laporan: q1.pdf, q2.pdf\nCatatan: notes.md";
        let groups = parse_response(text).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Laporan");
        assert_eq!(groups[0].files, vec!["q1.pdf", "q2.pdf"]);
        assert_eq!(groups[1].files, vec!["notes.md"]);
    }

    #[test]
    fn parses_header_blocks_with_summary() {
        let text = "- **Kontrak:**\nsummary: perjanjian kerja\nkontrak_a.pdf, kontrak_b.pdf\nlampiran.docx";
        let groups = parse_lines(text);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Kontrak");
        assert_eq!(groups[0].rationale, "perjanjian kerja");
        assert_eq!(
            groups[0].files,
            vec!["kontrak_a.pdf", "kontrak_b.pdf", "lampiran.docx"]
        );
    }

    #[test]
    fn garbage_text_is_a_parse_error() {
        let result = parse_response("I'm sorry, I cannot help with that request.");
        assert_eq!(result, Err(ParseError::NoGroups));
    }

    #[test]
    fn json_without_usable_groups_falls_through_to_lines() {
        let text = "[1, 2, 3]";
        assert_eq!(parse_response(text), Err(ParseError::NoGroups));
    }

    #[test]
    fn headers_without_files_are_dropped() {
        assert!(parse_lines("Kosong:\n").is_empty());
    }
}
