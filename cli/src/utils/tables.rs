//! Header-addressed access to the TSV and CSV files the commands take as input.

use anyhow::{Context, Result};
use std::{
    io::Read,
    path::{Path, PathBuf},
};

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    fn byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }
}

/// A delimited file with a header row. Cells are trimmed and short rows are padded with empty
/// cells.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(path: impl AsRef<Path>, delimiter: Delimiter) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Could not open `{}`", path.display()))?;
        Self::from_reader(path, file, delimiter)
    }

    /// Parse a table from `reader`, `path` is only used in error messages.
    pub fn from_reader(path: impl Into<PathBuf>, reader: impl Read, delimiter: Delimiter) -> Result<Self> {
        let path = path.into();
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(delimiter.byte())
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All);
        if delimiter == Delimiter::Tab {
            // TSV cells are taken literally, quotes included.
            builder.quoting(false);
        }
        let mut reader = builder.from_reader(reader);

        let headers = reader
            .headers()
            .with_context(|| format!("Could not read header of `{}`", path.display()))?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record
                .with_context(|| format!("Could not read row {} of `{}`", index + 1, path.display()))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let mut row = record.iter().map(str::to_owned).collect::<Vec<_>>();
            row.resize(headers.len().max(row.len()), String::new());
            rows.push(row);
        }

        Ok(Self {
            path,
            headers,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Fail unless every one of `columns` is in the header.
    pub fn require(&self, columns: &[&str]) -> Result<(), ValidationError> {
        let missing = columns
            .iter()
            .filter(|column| !self.has_column(column))
            .map(|column| column.to_string())
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingColumns {
                path: self.path.clone(),
                columns: missing,
            })
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { table: self, cells })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// The cell under `column`, empty if the table has no such column.
    pub fn get(&self, column: &str) -> &'a str {
        self.table
            .column(column)
            .and_then(|index| self.cells.get(index))
            .map_or("", String::as_str)
    }

    /// Header and value of every cell, in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.table
            .headers
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_tab_separated_rows() {
        let table = Table::from_reader(
            "options.tsv",
            Cursor::new("sample_name\tinput_bam\tnotes\nS1\tfile.bam\t\"as is\"\n\nS2\tother.bam\n"),
            Delimiter::Tab,
        )
        .unwrap();

        assert_eq!(table.headers(), ["sample_name", "input_bam", "notes"]);
        assert_eq!(table.len(), 2);
        let rows = table.rows().collect::<Vec<_>>();
        assert_eq!(rows[0].get("input_bam"), "file.bam");
        assert_eq!(rows[0].get("notes"), "\"as is\"");
        assert_eq!(rows[1].get("notes"), "");
        assert_eq!(rows[1].get("missing"), "");
    }

    #[test]
    fn test_require_lists_missing_columns() {
        let table = Table::from_reader(
            "manifest.csv",
            Cursor::new("name,project\nS1.bam,alice/test\n"),
            Delimiter::Comma,
        )
        .unwrap();

        assert!(table.require(&["name", "project"]).is_ok());
        let error = table.require(&["id", "name", "volume"]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "`manifest.csv` is missing required column(s): id, volume"
        );
    }
}
