// Group keys and value keys over SalesRecord

use crate::record::SalesRecord;
use serde::{Deserialize, Serialize};

/// Categorical column usable as a group key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Branch,
    City,
    CustomerType,
    Gender,
    ProductLine,
    Payment,
}

impl Dimension {
    pub fn value<'a>(&self, record: &'a SalesRecord) -> &'a str {
        match self {
            Dimension::Branch => &record.branch,
            Dimension::City => &record.city,
            Dimension::CustomerType => &record.customer_type,
            Dimension::Gender => &record.gender,
            Dimension::ProductLine => &record.product_line,
            Dimension::Payment => &record.payment,
        }
    }

    /// Column name as it appears in the dataset header
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Branch => "Branch",
            Dimension::City => "City",
            Dimension::CustomerType => "Customer type",
            Dimension::Gender => "Gender",
            Dimension::ProductLine => "Product line",
            Dimension::Payment => "Payment",
        }
    }
}

/// Numeric column usable as an aggregation value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    UnitPrice,
    Quantity,
    Tax,
    Total,
    Cogs,
    GrossIncome,
    Rating,
}

impl Measure {
    pub fn value(&self, record: &SalesRecord) -> f64 {
        match self {
            Measure::UnitPrice => record.unit_price,
            Measure::Quantity => f64::from(record.quantity),
            Measure::Tax => record.tax,
            Measure::Total => record.total,
            Measure::Cogs => record.cogs,
            Measure::GrossIncome => record.gross_income,
            Measure::Rating => record.rating,
        }
    }
}
