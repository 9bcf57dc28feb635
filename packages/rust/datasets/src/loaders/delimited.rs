//! CSV / TSV loader.

use std::path::Path;

use thesisbuild_shared::{Result, ThesisBuildError};

use super::DatasetLoader;
use crate::{Dataset, Table};

/// Delimited text with a header row.
pub struct DelimitedLoader {
    name: &'static str,
    delimiter: u8,
    extensions: &'static [&'static str],
}

impl DelimitedLoader {
    /// Comma-separated, `.csv`.
    pub fn csv() -> Self {
        Self {
            name: "csv",
            delimiter: b',',
            extensions: &["csv"],
        }
    }

    /// Tab-separated, `.tsv` / `.tab`.
    pub fn tsv() -> Self {
        Self {
            name: "tsv",
            delimiter: b'\t',
            extensions: &["tsv", "tab"],
        }
    }
}

impl DatasetLoader for DelimitedLoader {
    fn extensions(&self) -> &[&'static str] {
        self.extensions
    }

    fn load(&self, path: &Path) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_path(path)
            .map_err(|e| ThesisBuildError::parse(path, e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| ThesisBuildError::parse(path, e.to_string()))?
            .iter()
            .map(String::from)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ThesisBuildError::parse(path, e.to_string()))?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(Dataset::Table(Table { headers, rows }))
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tb-delimited-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_csv_with_quotes() {
        let path = write_temp(
            "survey.csv",
            "id,answer\n1,\"yes, mostly\"\n2,no\n",
        );
        let Dataset::Table(table) = DelimitedLoader::csv().load(&path).unwrap() else {
            panic!("expected table");
        };
        assert_eq!(table.headers, vec!["id", "answer"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "yes, mostly");
    }

    #[test]
    fn reads_tsv() {
        let path = write_temp("trials.tsv", "site\tn\nA\t12\nB\t7\n");
        let Dataset::Table(table) = DelimitedLoader::tsv().load(&path).unwrap() else {
            panic!("expected table");
        };
        assert_eq!(table.headers, vec!["site", "n"]);
        assert_eq!(table.rows[1], vec!["B", "7"]);
    }

    #[test]
    fn ragged_rows_are_parse_errors() {
        let path = write_temp("bad.csv", "a,b\n1,2,3\n");
        let err = DelimitedLoader::csv().load(&path).unwrap_err();
        assert!(matches!(err, ThesisBuildError::Parse { .. }));
        assert!(err.to_string().contains("bad.csv"));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let path = write_temp("empty.csv", "a,b\n");
        let Dataset::Table(table) = DelimitedLoader::csv().load(&path).unwrap() else {
            panic!("expected table");
        };
        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
    }
}
