//! Allowed source columns, either for a single source or per file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// The columns a model may map its properties onto.
///
/// Deserializes from either a JSON array of column names or an object of
/// `file -> [columns]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AllowedColumns {
    /// One source; every entity resolves against the same columns.
    Flat(Vec<String>),
    /// Several files; each entity resolves against its own file.
    PerFile(BTreeMap<String, Vec<String>>),
}

impl AllowedColumns {
    pub fn flat<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Flat(columns.into_iter().map(Into::into).collect())
    }

    pub fn per_file<I, F, C, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (F, C)>,
        F: Into<String>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PerFile(
            files
                .into_iter()
                .map(|(file, cols)| (file.into(), cols.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }

    pub fn is_multi_file(&self) -> bool {
        matches!(self, Self::PerFile(_))
    }

    /// Columns visible from `source`, or `None` when the file is unknown.
    ///
    /// File names match with or without their extension, so an entity
    /// sourced from `"orders"` resolves against `"orders.csv"`.
    pub fn scope(&self, source: &str) -> Option<&[String]> {
        match self {
            Self::Flat(cols) => Some(cols),
            Self::PerFile(files) => files
                .get(source)
                .or_else(|| {
                    files
                        .iter()
                        .find(|(file, _)| file_stem(file) == file_stem(source))
                        .map(|(_, cols)| cols)
                })
                .map(Vec::as_slice),
        }
    }

    /// Whether `column` is available to entities loaded from `source`.
    pub fn contains(&self, source: &str, column: &str) -> bool {
        self.scope(source)
            .is_some_and(|cols| cols.iter().any(|c| c == column))
    }
}

/// Whether two source names refer to the same file, compared the way
/// [`AllowedColumns::scope`] resolves them.
pub fn same_source(a: &str, b: &str) -> bool {
    a == b || file_stem(a) == file_stem(b)
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}
