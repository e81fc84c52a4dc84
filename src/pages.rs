// Page router
// Seven fixed dashboard pages. Each page filters once and computes only its own aggregates.

use crate::aggregate::{
    box_stats, count_by, key_metrics, pivot, product_line_summary, resample_daily,
    resample_monthly, scatter, sum_by, Agg, BoxStats, DayPoint, GroupedTable, KeyMetrics,
    MonthBucket, PivotTable, ProductLineSummary, ScatterPoint, ShareRow,
};
use crate::dataset::Dataset;
use crate::dimension::{Dimension, Measure};
use crate::filter::{filter, FilterSelection};
use crate::record::SalesRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rows shown in the overview sample table
pub const SAMPLE_ROW_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Page {
    #[serde(rename = "overview")]
    Overview,
    #[serde(rename = "q1")]
    SalesTrends,
    #[serde(rename = "q2")]
    Demographics,
    #[serde(rename = "q3")]
    ProductLines,
    #[serde(rename = "q4")]
    BranchesAndCities,
    #[serde(rename = "q5")]
    Satisfaction,
    #[serde(rename = "q6")]
    PaymentMethods,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Overview,
        Page::SalesTrends,
        Page::Demographics,
        Page::ProductLines,
        Page::BranchesAndCities,
        Page::Satisfaction,
        Page::PaymentMethods,
    ];

    /// Stable identifier used on the command line and in URLs
    pub fn id(&self) -> &'static str {
        match self {
            Page::Overview => "overview",
            Page::SalesTrends => "q1",
            Page::Demographics => "q2",
            Page::ProductLines => "q3",
            Page::BranchesAndCities => "q4",
            Page::Satisfaction => "q5",
            Page::PaymentMethods => "q6",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::SalesTrends => "Research Question 1",
            Page::Demographics => "Research Question 2",
            Page::ProductLines => "Research Question 3",
            Page::BranchesAndCities => "Research Question 4",
            Page::Satisfaction => "Research Question 5",
            Page::PaymentMethods => "Research Question 6",
        }
    }

    pub fn question(&self) -> &'static str {
        match self {
            Page::Overview => "Superstore Sales Dashboard",
            Page::SalesTrends => {
                "What are the key sales trends and seasonal patterns in supermarket sales data?"
            }
            Page::Demographics => {
                "How do customer demographics (e.g., gender, membership status) influence purchasing behavior and sales volume?"
            }
            Page::ProductLines => {
                "Which product lines contribute the most to overall revenue, and which ones are underperforming?"
            }
            Page::BranchesAndCities => {
                "How do sales performance and product preferences vary across different branches and cities?"
            }
            Page::Satisfaction => {
                "What is the relationship between customer satisfaction ratings and sales volume across different product categories?"
            }
            Page::PaymentMethods => {
                "How do different payment methods (e.g., cash, credit card, mobile payment) impact sales volume and customer satisfaction?"
            }
        }
    }

    /// Closing remarks shown under each research question; the overview has none
    pub fn conclusion(&self) -> Option<&'static str> {
        match self {
            Page::Overview => None,
            Page::SalesTrends => Some(
                "Total sales dip from mid to late February and rebound in March. \
                 Promotions during the slow February period can soften the drop, \
                 and the March recovery is worth reinforcing.",
            ),
            Page::Demographics => Some(
                "Both genders contribute heavily to total sales, with female customers slightly ahead. \
                 Female customers lean towards home and lifestyle and fashion accessories, \
                 male customers towards sports and travel and health and beauty.",
            ),
            Page::ProductLines => Some(
                "Food and beverages, electronic accessories and fashion accessories lead revenue. \
                 Health and beauty contributes the least, with home and lifestyle slightly behind the leaders.",
            ),
            Page::BranchesAndCities => Some(
                "Sales are fairly balanced across branches, but product preferences differ by city: \
                 Naypyitaw leads in food and fashion, Yangon in home goods, \
                 and Mandalay in health and travel products.",
            ),
            Page::Satisfaction => Some(
                "Ratings are similar across product lines, and the scatter shows no strong link \
                 between satisfaction and sales volume.",
            ),
            Page::PaymentMethods => Some(
                "Cash drives the highest sales, followed closely by ewallets and then credit cards. \
                 Ewallet users report the highest average satisfaction.",
            ),
        }
    }

    pub fn next(&self) -> Self {
        let i = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let i = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPage(pub String);

impl fmt::Display for UnknownPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown page '{}' (expected overview, q1..q6)", self.0)
    }
}

impl std::error::Error for UnknownPage {}

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Page::ALL
            .iter()
            .copied()
            .find(|p| p.id() == needle)
            .ok_or_else(|| UnknownPage(s.to_string()))
    }
}

// ============================================================================
// PAGE REPORTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub metrics: KeyMetrics,
    pub sample_rows: Vec<SalesRecord>,
    pub product_lines: Vec<ProductLineSummary>,
    /// Branch x City revenue
    pub branch_city: PivotTable,
    /// Same revenue in long form, one row per (branch, city)
    pub branch_city_sales: GroupedTable,
    pub product_line_shares: Vec<ShareRow>,
    /// Customer type x Gender counts
    pub customer_gender: GroupedTable,
    pub daily_sales: Vec<DayPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesTrendsReport {
    pub monthly_sales: Vec<MonthBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicsReport {
    pub sales_by_gender: GroupedTable,
    /// Product line x Gender purchase counts
    pub product_line_gender: PivotTable,
    /// Product line x Customer type purchase counts
    pub product_line_customer_type: PivotTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductLinesReport {
    pub sales_by_product_line: GroupedTable,
    pub revenue_shares: Vec<ShareRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchesReport {
    pub sales_by_branch: GroupedTable,
    /// Product line x City revenue
    pub product_city_sales: PivotTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatisfactionReport {
    /// Rating vs Total, coloured by gender, faceted by product line
    pub rating_vs_sales: Vec<ScatterPoint>,
    pub rating_by_product_line: Vec<BoxStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReport {
    pub sales_by_payment: GroupedTable,
    pub rating_by_payment: Vec<BoxStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PageData {
    Overview(OverviewReport),
    SalesTrends(SalesTrendsReport),
    Demographics(DemographicsReport),
    ProductLines(ProductLinesReport),
    BranchesAndCities(BranchesReport),
    Satisfaction(SatisfactionReport),
    PaymentMethods(PaymentReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub page: Page,
    pub title: &'static str,
    pub question: &'static str,
    pub conclusion: Option<&'static str>,
    /// Records left after filtering
    pub record_count: usize,
    pub data: PageData,
}

impl PageReport {
    /// True when the selection matched nothing; every table is then empty
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

/// Filter the dataset and compute everything `page` displays
pub fn build_report(dataset: &Dataset, selection: &FilterSelection, page: Page) -> PageReport {
    let subset = filter(dataset.records(), selection);
    report_for_subset(&subset, page)
}

/// Page report over a subset the caller has already filtered
pub fn report_for_subset(subset: &[&SalesRecord], page: Page) -> PageReport {
    tracing::debug!(page = %page, records = subset.len(), "building page report");

    PageReport {
        page,
        title: page.title(),
        question: page.question(),
        conclusion: page.conclusion(),
        record_count: subset.len(),
        data: page_data(subset, page),
    }
}

/// Aggregates for one page over an already-filtered subset
pub fn page_data(subset: &[&SalesRecord], page: Page) -> PageData {
    match page {
        Page::Overview => PageData::Overview(OverviewReport {
            metrics: key_metrics(subset),
            sample_rows: subset
                .iter()
                .take(SAMPLE_ROW_COUNT)
                .map(|r| (*r).clone())
                .collect(),
            product_lines: product_line_summary(subset),
            branch_city: pivot(
                subset,
                Dimension::Branch,
                Dimension::City,
                Measure::Total,
                Agg::Sum,
            ),
            branch_city_sales: sum_by(subset, &[Dimension::Branch, Dimension::City], Measure::Total),
            product_line_shares: sum_by(subset, &[Dimension::ProductLine], Measure::Total)
                .shares(),
            customer_gender: count_by(subset, &[Dimension::CustomerType, Dimension::Gender]),
            daily_sales: resample_daily(subset, Measure::Total),
        }),
        Page::SalesTrends => PageData::SalesTrends(SalesTrendsReport {
            monthly_sales: resample_monthly(subset, Measure::Total),
        }),
        Page::Demographics => PageData::Demographics(DemographicsReport {
            sales_by_gender: sum_by(subset, &[Dimension::Gender], Measure::Total),
            product_line_gender: pivot(
                subset,
                Dimension::ProductLine,
                Dimension::Gender,
                Measure::Total,
                Agg::Count,
            ),
            product_line_customer_type: pivot(
                subset,
                Dimension::ProductLine,
                Dimension::CustomerType,
                Measure::Total,
                Agg::Count,
            ),
        }),
        Page::ProductLines => {
            let sales = sum_by(subset, &[Dimension::ProductLine], Measure::Total).ranked();
            PageData::ProductLines(ProductLinesReport {
                revenue_shares: sales.shares(),
                sales_by_product_line: sales,
            })
        }
        Page::BranchesAndCities => PageData::BranchesAndCities(BranchesReport {
            sales_by_branch: sum_by(subset, &[Dimension::Branch], Measure::Total),
            product_city_sales: pivot(
                subset,
                Dimension::ProductLine,
                Dimension::City,
                Measure::Total,
                Agg::Sum,
            ),
        }),
        Page::Satisfaction => PageData::Satisfaction(SatisfactionReport {
            rating_vs_sales: scatter(
                subset,
                Measure::Rating,
                Measure::Total,
                Dimension::Gender,
                Dimension::ProductLine,
            ),
            rating_by_product_line: box_stats(subset, Dimension::ProductLine, Measure::Rating),
        }),
        Page::PaymentMethods => PageData::PaymentMethods(PaymentReport {
            sales_by_payment: sum_by(subset, &[Dimension::Payment], Measure::Total),
            rating_by_payment: box_stats(subset, Dimension::Payment, Measure::Rating),
        }),
    }
}
