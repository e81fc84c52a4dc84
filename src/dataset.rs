// Dataset loading
// CSV → validated SalesRecords, loaded once and read-only afterwards

use crate::dimension::Dimension;
use crate::error::DatasetLoadError;
use crate::record::{RawSalesRow, SalesRecord, REQUIRED_COLUMNS};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Distinct values of each filterable dimension, in first-appearance order.
/// These are the sidebar option lists; the default selection is all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub branches: Vec<String>,
    pub cities: Vec<String>,
    pub customer_types: Vec<String>,
    pub genders: Vec<String>,
}

impl FilterOptions {
    fn from_records(records: &[SalesRecord]) -> Self {
        FilterOptions {
            branches: distinct_values(records, Dimension::Branch),
            cities: distinct_values(records, Dimension::City),
            customer_types: distinct_values(records, Dimension::CustomerType),
            genders: distinct_values(records, Dimension::Gender),
        }
    }
}

/// Distinct values of `dimension` in the order they first appear
pub fn distinct_values(records: &[SalesRecord], dimension: Dimension) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for record in records {
        let value = dimension.value(record);
        if seen.insert(value) {
            values.push(value.to_string());
        }
    }
    values
}

#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<SalesRecord>,
    options: FilterOptions,
}

impl Dataset {
    /// Load and validate the dataset file
    pub fn load(path: &Path) -> Result<Self, DatasetLoadError> {
        if !path.exists() {
            return Err(DatasetLoadError::Missing(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|source| DatasetLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let dataset = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            records = dataset.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetLoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|source| DatasetLoadError::MalformedRow { line: 1, source })?
            .clone();

        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(DatasetLoadError::MissingColumn(column.to_string()));
            }
        }

        let mut records = Vec::new();
        let mut invoice_ids = HashSet::new();

        for result in rdr.records() {
            let row = result.map_err(|source| DatasetLoadError::MalformedRow {
                line: source.position().map(|p| p.line()).unwrap_or(0),
                source,
            })?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);

            let raw: RawSalesRow = row
                .deserialize(Some(&headers))
                .map_err(|source| DatasetLoadError::MalformedRow { line, source })?;
            let record = SalesRecord::from_raw(raw, line)?;

            if !invoice_ids.insert(record.invoice_id.clone()) {
                return Err(DatasetLoadError::DuplicateInvoice {
                    line,
                    invoice_id: record.invoice_id,
                });
            }

            records.push(record);
        }

        Ok(Self::from_validated(records))
    }

    /// Build a dataset from already-constructed records, applying the same checks as the loader.
    /// Line numbers in errors are 1-based record positions.
    pub fn from_records(records: Vec<SalesRecord>) -> Result<Self, DatasetLoadError> {
        let mut invoice_ids = HashSet::new();
        for (i, record) in records.iter().enumerate() {
            let line = i as u64 + 1;
            record
                .check_invariants()
                .map_err(|message| DatasetLoadError::Invariant { line, message })?;
            if !invoice_ids.insert(record.invoice_id.as_str()) {
                return Err(DatasetLoadError::DuplicateInvoice {
                    line,
                    invoice_id: record.invoice_id.clone(),
                });
            }
        }
        Ok(Self::from_validated(records))
    }

    fn from_validated(records: Vec<SalesRecord>) -> Self {
        let options = FilterOptions::from_records(&records);
        Dataset { records, options }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    /// Every record, as an unfiltered subset
    pub fn all(&self) -> Vec<&SalesRecord> {
        self.records.iter().collect()
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, sample_csv, CSV_HEADER, SAMPLE_ROWS};
    use std::io::Write;

    #[test]
    fn test_load_sample_rows() {
        let dataset = Dataset::from_reader(sample_csv().as_bytes()).unwrap();

        assert_eq!(dataset.len(), SAMPLE_ROWS.len());
        assert_eq!(dataset.records()[0].invoice_id, "750-67-8428");
        assert_eq!(dataset.options().branches, vec!["A", "C"]);
        assert_eq!(dataset.options().cities, vec!["Yangon", "Naypyitaw"]);
        assert_eq!(dataset.options().customer_types, vec!["Member", "Normal"]);
        assert_eq!(dataset.options().genders, vec!["Female", "Male"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_csv().as_bytes()).unwrap();

        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.len(), 8);
    }

    #[test]
    fn test_missing_file() {
        let err = Dataset::load(Path::new("/nonexistent/supermarket_sales.csv")).unwrap_err();
        assert!(matches!(err, DatasetLoadError::Missing(_)));
    }

    #[test]
    fn test_missing_column() {
        let header = CSV_HEADER.replace(",Rating", "");
        let csv = format!("{}\n", header);

        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetLoadError::MissingColumn(ref c) if c == "Rating"));
    }

    #[test]
    fn test_unparsable_number_is_malformed_row() {
        let bad = SAMPLE_ROWS[0].replace("74.69", "seventy");
        let csv = format!("{}\n{}\n", CSV_HEADER, bad);

        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetLoadError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_bad_date_fails_load() {
        let bad = SAMPLE_ROWS[1].replace("3/8/2019", "not-a-date");
        let csv = format!("{}\n{}\n{}\n", CSV_HEADER, SAMPLE_ROWS[0], bad);

        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetLoadError::BadDate { line: 3, .. }));
    }

    #[test]
    fn test_nan_and_infinite_fields_fail_load() {
        let nan_income = SAMPLE_ROWS[0].replace(",26.1415,9.1", ",NaN,9.1");
        let csv = format!("{}\n{}\n", CSV_HEADER, nan_income);
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetLoadError::Invariant { line: 2, .. }));

        let inf_total = SAMPLE_ROWS[0].replace("548.9715", "inf");
        let csv = format!("{}\n{}\n", CSV_HEADER, inf_total);
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetLoadError::Invariant { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_invoice_fails_load() {
        let csv = format!("{}\n{}\n{}\n", CSV_HEADER, SAMPLE_ROWS[0], SAMPLE_ROWS[0]);

        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetLoadError::DuplicateInvoice { line: 3, .. }));
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let csv = format!("{}\n", CSV_HEADER);

        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.options().branches.is_empty());
    }

    #[test]
    fn test_bundled_dataset_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/supermarket_sales.csv");
        let dataset = Dataset::load(&path).unwrap();

        assert_eq!(dataset.len(), 60);
        assert_eq!(dataset.options().branches.len(), 3);
        assert!(dataset.records().iter().all(|r| r.total >= r.cogs));
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let records = vec![
            record("1", "A", 10.0, (2019, 1, 5)),
            record("1", "B", 7.0, (2019, 1, 6)),
        ];

        let err = Dataset::from_records(records).unwrap_err();
        assert!(matches!(err, DatasetLoadError::DuplicateInvoice { line: 2, .. }));
    }
}
