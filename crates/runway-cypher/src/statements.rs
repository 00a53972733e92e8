//! User-supplied Cypher run before or after the generated load statements.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{CodegenError, Result};
use crate::format::INDENT;

/// Extensions that mark a configured string as a statement file path.
const STATEMENT_FILE_EXTENSIONS: [&str; 2] = [".cql", ".cypher"];

/// Extra Cypher for the pre- or post-ingest phase.
///
/// In configuration files a single string ending in `.cql` or `.cypher` is
/// read as a file path, any other string as `;`-delimited statements, and a
/// list as statements that are already split.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawIngestCode")]
pub enum IngestCode {
    Text(String),
    File(PathBuf),
    Statements(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIngestCode {
    One(String),
    Many(Vec<String>),
}

impl From<RawIngestCode> for IngestCode {
    fn from(raw: RawIngestCode) -> Self {
        match raw {
            RawIngestCode::One(s) => {
                let trimmed = s.trim();
                if STATEMENT_FILE_EXTENSIONS.iter().any(|ext| trimmed.ends_with(ext)) {
                    Self::File(PathBuf::from(trimmed))
                } else {
                    Self::Text(s)
                }
            }
            RawIngestCode::Many(statements) => Self::Statements(statements),
        }
    }
}

impl IngestCode {
    /// One item per statement, without terminators.
    pub fn into_statements(self) -> Result<Vec<String>> {
        match self {
            Self::Text(text) => Ok(split_statements(&text)),
            Self::File(path) => {
                let text = fs::read_to_string(&path).map_err(|e| {
                    CodegenError::IngestCode(format!("cannot read {}: {e}", path.display()))
                })?;
                let statements = split_statements(&text);
                tracing::debug!(path = %path.display(), count = statements.len(), "Loaded ingest code");
                Ok(statements)
            }
            Self::Statements(statements) => Ok(statements),
        }
    }
}

/// Split `;`-delimited Cypher into single statements.
///
/// Lines are trimmed and blank lines dropped; continuation lines are
/// re-indented one level under the first line. Empty segments, including
/// the one after a trailing `;`, are dropped.
pub fn split_statements(text: &str) -> Vec<String> {
    let separator = format!("\n{INDENT}");
    text.split(';')
        .filter_map(|segment| {
            let lines: Vec<&str> = segment
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            (!lines.is_empty()).then(|| lines.join(&separator))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn splits_on_semicolons() {
        assert_eq!(
            split_statements("MATCH (n) RETURN n; MATCH (m) RETURN m;"),
            vec!["MATCH (n) RETURN n", "MATCH (m) RETURN m"]
        );
    }

    #[test]
    fn reindents_continuation_lines() {
        let text = "\n  CREATE INDEX person_age IF NOT EXISTS\n        FOR (n:Person)\n\n  ON (n.age);\n;\n";
        assert_eq!(
            split_statements(text),
            vec!["CREATE INDEX person_age IF NOT EXISTS\n    FOR (n:Person)\n    ON (n.age)"]
        );
    }

    #[test]
    fn blank_input_has_no_statements() {
        assert!(split_statements("").is_empty());
        assert!(split_statements(" ;\n; ").is_empty());
    }

    #[test]
    fn file_is_split_like_text() {
        let mut file = tempfile::Builder::new().suffix(".cql").tempfile().unwrap();
        write!(file, "MATCH (n) RETURN n;\nMATCH (m)\nRETURN m;\n").unwrap();

        let code = IngestCode::File(file.path().to_path_buf());
        assert_eq!(
            code.into_statements().unwrap(),
            vec!["MATCH (n) RETURN n", "MATCH (m)\n    RETURN m"]
        );
    }

    #[test]
    fn unreadable_file_is_configuration_error() {
        let err = IngestCode::File(PathBuf::from("/nonexistent/runway/pre.cql"))
            .into_statements()
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("pre.cql"), "{err}");
    }

    #[test]
    fn statement_lists_pass_through() {
        let code = IngestCode::Statements(vec!["RETURN 1".to_string(), "RETURN 2".to_string()]);
        assert_eq!(code.into_statements().unwrap(), vec!["RETURN 1", "RETURN 2"]);
    }

    #[test]
    fn deserializes_each_form() {
        let text: IngestCode = serde_json::from_str(r#""RETURN 1; RETURN 2""#).unwrap();
        assert_eq!(text, IngestCode::Text("RETURN 1; RETURN 2".to_string()));

        let file: IngestCode = serde_json::from_str(r#""setup/pre.cypher""#).unwrap();
        assert_eq!(file, IngestCode::File(PathBuf::from("setup/pre.cypher")));

        let list: IngestCode = serde_json::from_str(r#"["RETURN 1"]"#).unwrap();
        assert_eq!(list, IngestCode::Statements(vec!["RETURN 1".to_string()]));
    }
}
