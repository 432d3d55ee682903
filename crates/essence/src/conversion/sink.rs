//! Destinations for finished records.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{EssenceError, Result};
use crate::record::ProductRecord;

/// Column headers written by [`DelimitedSink`].
pub const RECORD_COLUMNS: [&str; 12] = [
    "row_number",
    "code",
    "name",
    "brand_id",
    "concentration",
    "dispenser_type",
    "gender",
    "size",
    "unit",
    "country_of_origin",
    "li_free",
    "original_source_text",
];

/// Accepts finished records.
pub trait RecordSink {
    fn accept(&mut self, record: &ProductRecord) -> Result<()>;

    /// Flush anything buffered.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Accept every record, then finish.
    fn accept_all(&mut self, records: &[ProductRecord]) -> Result<()> {
        for record in records {
            self.accept(record)?;
        }
        self.finish()
    }
}

impl RecordSink for Vec<ProductRecord> {
    fn accept(&mut self, record: &ProductRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes records as CSV or TSV, one row per record, unset fields empty.
pub struct DelimitedSink<W: Write> {
    writer: csv::Writer<W>,
    wrote_header: bool,
}

impl DelimitedSink<File> {
    /// Create (or truncate) a file.
    pub fn create(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| EssenceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::new(file, delimiter))
    }
}

impl<W: Write> DelimitedSink<W> {
    pub fn new(writer: W, delimiter: u8) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(writer),
            wrote_header: false,
        }
    }

    /// Flush and return the inner writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| EssenceError::Csv(csv::Error::from(e.into_error())))
    }
}

fn cell<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

impl<W: Write> RecordSink for DelimitedSink<W> {
    fn accept(&mut self, record: &ProductRecord) -> Result<()> {
        if !self.wrote_header {
            self.writer.write_record(RECORD_COLUMNS)?;
            self.wrote_header = true;
        }

        self.writer.write_record([
            record.row_number.to_string(),
            cell(&record.code),
            cell(&record.name),
            cell(&record.brand_id),
            cell(&record.concentration),
            cell(&record.dispenser_type),
            cell(&record.gender),
            cell(&record.size),
            cell(&record.unit),
            cell(&record.country_of_origin),
            cell(&record.li_free),
            record.original_source_text.clone(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| EssenceError::Csv(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Concentration, SizeUnit};

    #[test]
    fn test_tsv_output() {
        let mut record = ProductRecord::new(2, "A1\tBLU 30ML EDT");
        record.code = Some("A1".to_string());
        record.name = Some("BLU".to_string());
        record.concentration = Some(Concentration::Parfum);
        record.size = Some("30".to_string());
        record.unit = Some(SizeUnit::Ml);

        let mut sink = DelimitedSink::new(Vec::new(), b'\t');
        sink.accept_all(&[record]).unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0].split('\t').count(), RECORD_COLUMNS.len());
        assert!(lines[1].starts_with("2\tA1\tBLU\t\tParfum\t\t\t30\tml\t\t\t"));
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<ProductRecord> = Vec::new();
        sink.accept(&ProductRecord::new(3, "x")).unwrap();
        assert_eq!(sink.len(), 1);
    }
}
