use std::path::PathBuf;

use csv::{ReaderBuilder, Trim};
use tracing::info;

use cinedb_core::RawRecord;

use crate::error::IngestError;

/// Streams a movies CSV into raw records keyed by header name.
pub struct MovieCsvReader {
    path: PathBuf,
}

impl MovieCsvReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every row. Any I/O or structural error aborts the read.
    pub fn read(&self) -> Result<Vec<RawRecord>, IngestError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_path(&self.path)
            .map_err(|e| self.read_error(e))?;

        let headers = reader.headers().map_err(|e| self.read_error(e))?.clone();

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(|e| self.read_error(e))?;
            records.push(
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(column, value)| (column.to_string(), value.to_string()))
                    .collect::<RawRecord>(),
            );
        }

        info!(rows = records.len(), path = %self.path.display(), "CSV read");
        Ok(records)
    }

    fn read_error(&self, source: csv::Error) -> IngestError {
        IngestError::CsvRead {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_rows_by_header() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            "id,title,genres\n\
             27205,Inception,\"[{{'id': 28, 'name': 'Action'}}]\"\n\
             157336,\"Interstellar, Extended\",\n"
        )
        .unwrap();

        let records = MovieCsvReader::new(temp_file.path()).read().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].get("id"), "27205");
        assert_eq!(records[0].get("genres"), "[{'id': 28, 'name': 'Action'}]");
        assert_eq!(records[1].get("title"), "Interstellar, Extended");
        assert_eq!(records[1].get("genres"), "");
    }

    #[test]
    fn test_short_rows_leave_columns_missing() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, " id , title ,adult\n1,Short").unwrap();

        let records = MovieCsvReader::new(temp_file.path()).read().unwrap();
        assert_eq!(records[0].get("title"), "Short");
        assert_eq!(records[0].get("adult"), "");
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "id,title").unwrap();

        let records = MovieCsvReader::new(temp_file.path()).read().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = MovieCsvReader::new("/no/such/dir/movies.csv")
            .read()
            .unwrap_err();
        assert!(matches!(err, IngestError::CsvRead { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_read_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"id,title\n1,\xff\xfe\n").unwrap();

        let err = MovieCsvReader::new(temp_file.path()).read().unwrap_err();
        assert!(matches!(err, IngestError::CsvRead { .. }));
    }
}
