use crate::error::DatasetLoadError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Header columns every dataset file must carry
pub const REQUIRED_COLUMNS: [&str; 17] = [
    "Invoice ID",
    "Branch",
    "City",
    "Customer type",
    "Gender",
    "Product line",
    "Unit price",
    "Quantity",
    "Tax 5%",
    "Total",
    "Date",
    "Time",
    "Payment",
    "cogs",
    "gross margin percentage",
    "gross income",
    "Rating",
];

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// One row exactly as it appears in the CSV file.
/// Date and time stay as text until `SalesRecord::from_raw` validates them.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSalesRow {
    #[serde(rename = "Invoice ID")]
    pub invoice_id: String,

    #[serde(rename = "Branch")]
    pub branch: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "Customer type")]
    pub customer_type: String,

    #[serde(rename = "Gender")]
    pub gender: String,

    #[serde(rename = "Product line")]
    pub product_line: String,

    #[serde(rename = "Unit price")]
    pub unit_price: f64,

    #[serde(rename = "Quantity")]
    pub quantity: u32,

    #[serde(rename = "Tax 5%")]
    pub tax: f64,

    #[serde(rename = "Total")]
    pub total: f64,

    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Time")]
    pub time: String,

    #[serde(rename = "Payment")]
    pub payment: String,

    #[serde(rename = "cogs")]
    pub cogs: f64,

    #[serde(rename = "gross margin percentage")]
    pub gross_margin_percentage: f64,

    #[serde(rename = "gross income")]
    pub gross_income: f64,

    #[serde(rename = "Rating")]
    pub rating: f64,
}

/// A single sales transaction. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub invoice_id: String,
    pub branch: String,
    pub city: String,
    pub customer_type: String,
    pub gender: String,
    pub product_line: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub tax: f64,
    pub total: f64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub payment: String,
    pub cogs: f64,
    pub gross_margin_percentage: f64,
    pub gross_income: f64,
    pub rating: f64,
}

impl SalesRecord {
    /// Validate a raw row and convert it. `line` is only used for error reporting.
    pub fn from_raw(raw: RawSalesRow, line: u64) -> Result<Self, DatasetLoadError> {
        let date = parse_date(&raw.date).ok_or_else(|| DatasetLoadError::BadDate {
            line,
            value: raw.date.clone(),
        })?;
        let time = parse_time(&raw.time).ok_or_else(|| DatasetLoadError::BadTime {
            line,
            value: raw.time.clone(),
        })?;

        let record = SalesRecord {
            invoice_id: raw.invoice_id,
            branch: raw.branch,
            city: raw.city,
            customer_type: raw.customer_type,
            gender: raw.gender,
            product_line: raw.product_line,
            unit_price: raw.unit_price,
            quantity: raw.quantity,
            tax: raw.tax,
            total: raw.total,
            date,
            time,
            payment: raw.payment,
            cogs: raw.cogs,
            gross_margin_percentage: raw.gross_margin_percentage,
            gross_income: raw.gross_income,
            rating: raw.rating,
        };

        record
            .check_invariants()
            .map_err(|message| DatasetLoadError::Invariant { line, message })?;

        Ok(record)
    }

    /// Field-level invariants. Uniqueness of the invoice id is a dataset concern.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.invoice_id.trim().is_empty() {
            return Err("empty invoice id".to_string());
        }
        for (name, value) in [
            ("unit price", self.unit_price),
            ("tax", self.tax),
            ("total", self.total),
            ("cogs", self.cogs),
            ("gross margin percentage", self.gross_margin_percentage),
            ("gross income", self.gross_income),
            ("rating", self.rating),
        ] {
            if !value.is_finite() {
                return Err(format!("{} must be a finite number, got {}", name, value));
            }
        }
        if !(self.unit_price > 0.0) {
            return Err(format!("unit price must be positive, got {}", self.unit_price));
        }
        if self.quantity == 0 {
            return Err("quantity must be positive".to_string());
        }
        if !(self.cogs >= 0.0) {
            return Err(format!("cogs must be non-negative, got {}", self.cogs));
        }
        if !(self.total >= self.cogs) {
            return Err(format!(
                "total {} is below cogs {}",
                self.total, self.cogs
            ));
        }
        if !(RATING_MIN..=RATING_MAX).contains(&self.rating) {
            return Err(format!(
                "rating {} outside [{}, {}]",
                self.rating, RATING_MIN, RATING_MAX
            ));
        }
        Ok(())
    }
}

/// Accepts the published dataset's M/D/YYYY as well as ISO dates
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row() -> RawSalesRow {
        RawSalesRow {
            invoice_id: "750-67-8428".to_string(),
            branch: "A".to_string(),
            city: "Yangon".to_string(),
            customer_type: "Member".to_string(),
            gender: "Female".to_string(),
            product_line: "Health and beauty".to_string(),
            unit_price: 74.69,
            quantity: 7,
            tax: 26.1415,
            total: 548.9715,
            date: "1/5/2019".to_string(),
            time: "13:08".to_string(),
            payment: "Ewallet".to_string(),
            cogs: 522.83,
            gross_margin_percentage: 4.761904762,
            gross_income: 26.1415,
            rating: 9.1,
        }
    }

    #[test]
    fn test_from_raw_parses_dataset_formats() {
        let record = SalesRecord::from_raw(raw_row(), 2).unwrap();

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2019, 1, 5).unwrap());
        assert_eq!(record.time, NaiveTime::from_hms_opt(13, 8, 0).unwrap());
        assert_eq!(record.quantity, 7);
    }

    #[test]
    fn test_parse_date_accepts_iso() {
        assert_eq!(
            parse_date("2019-03-08"),
            NaiveDate::from_ymd_opt(2019, 3, 8)
        );
        assert_eq!(parse_date("13/45/2019"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_bad_date_reports_line() {
        let mut raw = raw_row();
        raw.date = "2019/31/31".to_string();

        let err = SalesRecord::from_raw(raw, 14).unwrap_err();

        assert!(matches!(err, DatasetLoadError::BadDate { line: 14, .. }));
        assert_eq!(err.line(), Some(14));
    }

    #[test]
    fn test_bad_time_rejected() {
        let mut raw = raw_row();
        raw.time = "25:99".to_string();

        let err = SalesRecord::from_raw(raw, 3).unwrap_err();
        assert!(matches!(err, DatasetLoadError::BadTime { .. }));
    }

    #[test]
    fn test_cogs_above_total_rejected() {
        let mut raw = raw_row();
        raw.cogs = 600.0;

        let err = SalesRecord::from_raw(raw, 5).unwrap_err();
        assert!(matches!(err, DatasetLoadError::Invariant { line: 5, .. }));
    }

    #[test]
    fn test_rating_out_of_bounds_rejected() {
        let mut raw = raw_row();
        raw.rating = 11.5;

        assert!(SalesRecord::from_raw(raw, 2).is_err());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut raw = raw_row();
        raw.quantity = 0;

        assert!(SalesRecord::from_raw(raw, 2).is_err());
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let mut raw = raw_row();
        raw.gross_income = f64::NAN;
        let err = SalesRecord::from_raw(raw, 2).unwrap_err();
        assert!(matches!(err, DatasetLoadError::Invariant { line: 2, ref message } if message.contains("gross income")));

        let mut raw = raw_row();
        raw.total = f64::INFINITY;
        let err = SalesRecord::from_raw(raw, 3).unwrap_err();
        assert!(matches!(err, DatasetLoadError::Invariant { line: 3, ref message } if message.contains("total")));

        let mut raw = raw_row();
        raw.tax = f64::NEG_INFINITY;
        assert!(SalesRecord::from_raw(raw, 4).is_err());
    }
}
