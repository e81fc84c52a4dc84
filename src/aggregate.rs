// Aggregation Engine
// Group-by, pivot and resampling over a filtered subset.
//
// Every function here is pure: same subset in, same table out.
// An empty subset always produces an empty (or zero) table, never an error.

use crate::dimension::{Dimension, Measure};
use crate::record::SalesRecord;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

// ============================================================================
// GROUPED TABLES
// ============================================================================

/// Reduction applied to each group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agg {
    Sum,
    Mean,
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    /// One value per group key, in the order the keys were given
    pub key: Vec<String>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedTable {
    pub keys: Vec<Dimension>,
    pub agg: Agg,
    pub rows: Vec<GroupRow>,
}

impl GroupedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value for a key combination, `None` when no record had it
    pub fn get(&self, key: &[&str]) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.key.iter().map(String::as_str).eq(key.iter().copied()))
            .map(|row| row.value)
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|row| row.value).sum()
    }

    /// Reorder by descending value; ties keep ascending key order
    pub fn ranked(mut self) -> Self {
        // rows arrive key-sorted, and sort_by is stable
        self.rows.sort_by(|a, b| b.value.total_cmp(&a.value));
        self
    }

    /// Each row's value as a percentage of the table total
    pub fn shares(&self) -> Vec<ShareRow> {
        let total = self.total();
        self.rows
            .iter()
            .map(|row| ShareRow {
                label: row.key.join(" / "),
                value: row.value,
                percent: if total > 0.0 { row.value / total * 100.0 } else { 0.0 },
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRow {
    pub label: String,
    pub value: f64,
    pub percent: f64,
}

/// Running sum and count for one group
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn finish(&self, agg: Agg) -> f64 {
        match agg {
            Agg::Sum => self.sum,
            Agg::Count => self.count as f64,
            Agg::Mean => {
                if self.count == 0 {
                    0.0
                } else {
                    self.sum / self.count as f64
                }
            }
        }
    }
}

/// Partition by `keys` and reduce each partition. Rows come out in ascending key order.
pub fn group_by(
    subset: &[&SalesRecord],
    keys: &[Dimension],
    measure: Measure,
    agg: Agg,
) -> GroupedTable {
    let mut groups: BTreeMap<Vec<&str>, Accumulator> = BTreeMap::new();

    for record in subset {
        let key: Vec<&str> = keys.iter().map(|k| k.value(record)).collect();
        groups.entry(key).or_default().push(measure.value(record));
    }

    let rows = groups
        .into_iter()
        .map(|(key, acc)| GroupRow {
            key: key.into_iter().map(str::to_string).collect(),
            value: acc.finish(agg),
        })
        .collect();

    GroupedTable {
        keys: keys.to_vec(),
        agg,
        rows,
    }
}

pub fn sum_by(subset: &[&SalesRecord], keys: &[Dimension], measure: Measure) -> GroupedTable {
    group_by(subset, keys, measure, Agg::Sum)
}

pub fn mean_by(subset: &[&SalesRecord], keys: &[Dimension], measure: Measure) -> GroupedTable {
    group_by(subset, keys, measure, Agg::Mean)
}

/// Number of records per key combination
pub fn count_by(subset: &[&SalesRecord], keys: &[Dimension]) -> GroupedTable {
    group_by(subset, keys, Measure::Total, Agg::Count)
}

// ============================================================================
// PIVOT
// ============================================================================

/// Two-axis cross-tabulation. `cells[r][c]` aggregates records matching `rows[r]` and `columns[c]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub row_key: Dimension,
    pub col_key: Dimension,
    pub measure: Measure,
    pub agg: Agg,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<f64>>,
}

impl PivotTable {
    /// Cell value; combinations absent from the input read as 0
    pub fn cell(&self, row: &str, column: &str) -> f64 {
        let r = self.rows.iter().position(|v| v == row);
        let c = self.columns.iter().position(|v| v == column);
        match (r, c) {
            (Some(r), Some(c)) => self.cells[r][c],
            _ => 0.0,
        }
    }

    pub fn row_totals(&self) -> Vec<f64> {
        self.cells.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn column_totals(&self) -> Vec<f64> {
        (0..self.columns.len())
            .map(|c| self.cells.iter().map(|row| row[c]).sum())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn pivot(
    subset: &[&SalesRecord],
    row_key: Dimension,
    col_key: Dimension,
    measure: Measure,
    agg: Agg,
) -> PivotTable {
    let mut rows = BTreeSet::new();
    let mut columns = BTreeSet::new();
    let mut groups: BTreeMap<(&str, &str), Accumulator> = BTreeMap::new();

    for record in subset {
        let r = row_key.value(record);
        let c = col_key.value(record);
        rows.insert(r);
        columns.insert(c);
        groups.entry((r, c)).or_default().push(measure.value(record));
    }

    let cells = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| {
                    groups
                        .get(&(*r, *c))
                        .map(|acc| acc.finish(agg))
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect();

    PivotTable {
        row_key,
        col_key,
        measure,
        agg,
        rows: rows.into_iter().map(str::to_string).collect(),
        columns: columns.into_iter().map(str::to_string).collect(),
        cells,
    }
}

// ============================================================================
// TIME RESAMPLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    /// `YYYY-MM`
    pub label: String,
    pub value: f64,
}

/// Sum `measure` per calendar month of the record date.
/// Months between the first and last observed month with no records appear as 0.
pub fn resample_monthly(subset: &[&SalesRecord], measure: Measure) -> Vec<MonthBucket> {
    let mut sums: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in subset {
        *sums
            .entry((record.date.year(), record.date.month()))
            .or_insert(0.0) += measure.value(record);
    }

    let (first, last) = match (sums.keys().next(), sums.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };

    let mut buckets = Vec::new();
    let (mut year, mut month) = first;
    while (year, month) <= last {
        buckets.push(MonthBucket {
            year,
            month,
            label: format!("{:04}-{:02}", year, month),
            value: sums.get(&(year, month)).copied().unwrap_or(0.0),
        });
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    buckets
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Sum `measure` per date that has records, ascending
pub fn resample_daily(subset: &[&SalesRecord], measure: Measure) -> Vec<DayPoint> {
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in subset {
        *sums.entry(record.date).or_insert(0.0) += measure.value(record);
    }
    sums.into_iter()
        .map(|(date, value)| DayPoint { date, value })
        .collect()
}

// ============================================================================
// DISTRIBUTIONS
// ============================================================================

/// Five-number summary of one group, as a box plot draws it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub key: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

/// Quantile of pre-sorted values with linear interpolation between ranks
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Per-group distribution of `measure`, groups in ascending key order
pub fn box_stats(subset: &[&SalesRecord], key: Dimension, measure: Measure) -> Vec<BoxStats> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in subset {
        groups
            .entry(key.value(record))
            .or_default()
            .push(measure.value(record));
    }

    groups
        .into_iter()
        .filter_map(|(k, mut values)| {
            values.sort_by(f64::total_cmp);
            let count = values.len();
            Some(BoxStats {
                key: k.to_string(),
                count,
                min: *values.first()?,
                q1: quantile(&values, 0.25)?,
                median: quantile(&values, 0.5)?,
                q3: quantile(&values, 0.75)?,
                max: *values.last()?,
                mean: values.iter().sum::<f64>() / count as f64,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub colour: String,
    pub facet: String,
}

/// One point per record, in subset order
pub fn scatter(
    subset: &[&SalesRecord],
    x: Measure,
    y: Measure,
    colour: Dimension,
    facet: Dimension,
) -> Vec<ScatterPoint> {
    subset
        .iter()
        .map(|record| ScatterPoint {
            x: x.value(record),
            y: y.value(record),
            colour: colour.value(record).to_string(),
            facet: facet.value(record).to_string(),
        })
        .collect()
}

// ============================================================================
// SUMMARIES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyMetrics {
    /// Distinct invoice ids
    pub customers: usize,
    pub total_sales: f64,
    pub total_cogs: f64,
    pub gross_income: f64,
}

pub fn key_metrics(subset: &[&SalesRecord]) -> KeyMetrics {
    let customers = subset
        .iter()
        .map(|r| r.invoice_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    KeyMetrics {
        customers,
        total_sales: subset.iter().map(|r| r.total).sum(),
        total_cogs: subset.iter().map(|r| r.cogs).sum(),
        gross_income: subset.iter().map(|r| r.gross_income).sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductLineSummary {
    pub product_line: String,
    pub total_revenue: f64,
    pub average_quantity: f64,
    pub average_unit_price: f64,
}

/// Revenue, mean quantity and mean unit price per product line, highest revenue first
pub fn product_line_summary(subset: &[&SalesRecord]) -> Vec<ProductLineSummary> {
    let keys = [Dimension::ProductLine];
    let revenue = sum_by(subset, &keys, Measure::Total).ranked();
    let quantity = mean_by(subset, &keys, Measure::Quantity);
    let price = mean_by(subset, &keys, Measure::UnitPrice);

    revenue
        .rows
        .into_iter()
        .map(|row| {
            let key = [row.key[0].as_str()];
            ProductLineSummary {
                average_quantity: quantity.get(&key).unwrap_or(0.0),
                average_unit_price: price.get(&key).unwrap_or(0.0),
                total_revenue: row.value,
                product_line: row.key[0].clone(),
            }
        })
        .collect()
}
