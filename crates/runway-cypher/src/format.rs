//! Text helpers shared by the Cypher generators.

use std::path::Path;

/// Indentation used inside `CALL { ... }` blocks and statement continuations.
pub const INDENT: &str = "    ";

/// Quote an identifier with backticks unless it is a plain Cypher name.
pub fn escape_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// `row.<column>`, escaped as needed.
pub fn row_column(column: &str) -> String {
    format!("row.{}", escape_identifier(column))
}

/// `{prop: row.column, ...}` for the given pairs, in order.
pub fn property_map<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let body = pairs
        .into_iter()
        .map(|(prop, column)| format!("{}: {}", escape_identifier(prop), row_column(column)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}

/// `SET v.prop = row.column, ...`, or an empty string without pairs.
pub fn set_clause<'a>(variable: &str, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let assignments = pairs
        .into_iter()
        .map(|(prop, column)| {
            format!("{variable}.{} = {}", escape_identifier(prop), row_column(column))
        })
        .collect::<Vec<_>>();
    if assignments.is_empty() {
        String::new()
    } else {
        format!("SET {}", assignments.join(", "))
    }
}

/// File name a source is staged under; `.csv` is appended when the source
/// has no extension.
pub fn csv_file_name(source_name: &str) -> String {
    if Path::new(source_name).extension().is_some() {
        source_name.to_string()
    } else {
        format!("{source_name}.csv")
    }
}

/// Indent every line of `block` by one level.
pub fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Terminate each statement with `;` and a newline, separating them with a
/// blank line.
pub fn join_statements(statements: &[String]) -> String {
    statements
        .iter()
        .map(|s| format!("{s};\n"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_only_when_needed() {
        assert_eq!(escape_identifier("first_name"), "first_name");
        assert_eq!(escape_identifier("first name"), "`first name`");
        assert_eq!(escape_identifier("2nd"), "`2nd`");
        assert_eq!(escape_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn property_map_and_set_clause() {
        let pairs = [("name", "first_name"), ("zip", "zip code")];
        assert_eq!(property_map(pairs), "{name: row.first_name, zip: row.`zip code`}");
        assert_eq!(
            set_clause("n", pairs),
            "SET n.name = row.first_name, n.zip = row.`zip code`"
        );
        assert_eq!(set_clause("n", std::iter::empty()), "");
    }

    #[test]
    fn csv_file_names() {
        assert_eq!(csv_file_name("file"), "file.csv");
        assert_eq!(csv_file_name("orders.csv"), "orders.csv");
        assert_eq!(csv_file_name("dump.tsv"), "dump.tsv");
    }

    #[test]
    fn joins_statements_with_terminators() {
        let text = join_statements(&["A".to_string(), "B".to_string()]);
        assert_eq!(text, "A;\n\nB;\n");
    }
}
