// Shared fixtures for unit tests

use crate::record::SalesRecord;
use chrono::{NaiveDate, NaiveTime};

pub const CSV_HEADER: &str = "Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating";

/// Rows taken from the published supermarket sales dataset
pub const SAMPLE_ROWS: [&str; 8] = [
    "750-67-8428,A,Yangon,Member,Female,Health and beauty,74.69,7,26.1415,548.9715,1/5/2019,13:08,Ewallet,522.83,4.761904762,26.1415,9.1",
    "226-31-3081,C,Naypyitaw,Normal,Female,Electronic accessories,15.28,5,3.82,80.22,3/8/2019,10:29,Cash,76.4,4.761904762,3.82,9.6",
    "631-41-3108,A,Yangon,Normal,Male,Home and lifestyle,46.33,7,16.2155,340.5255,3/3/2019,13:23,Credit card,324.31,4.761904762,16.2155,7.4",
    "123-19-1176,A,Yangon,Member,Male,Health and beauty,58.22,8,23.288,489.048,1/27/2019,20:33,Ewallet,465.76,4.761904762,23.288,8.4",
    "373-73-7910,A,Yangon,Normal,Male,Sports and travel,86.31,7,30.2085,634.3785,2/8/2019,10:37,Ewallet,604.17,4.761904762,30.2085,5.3",
    "699-14-3026,C,Naypyitaw,Normal,Male,Electronic accessories,85.39,7,29.8865,627.6165,3/25/2019,18:30,Ewallet,597.73,4.761904762,29.8865,4.1",
    "355-53-5943,A,Yangon,Member,Female,Electronic accessories,68.84,6,20.652,433.692,2/25/2019,14:36,Ewallet,413.04,4.761904762,20.652,5.8",
    "315-22-5665,C,Naypyitaw,Normal,Female,Home and lifestyle,73.56,10,36.78,772.38,2/24/2019,11:38,Ewallet,735.6,4.761904762,36.78,8.0",
];

pub fn sample_csv() -> String {
    let mut csv = String::from(CSV_HEADER);
    for row in SAMPLE_ROWS {
        csv.push('\n');
        csv.push_str(row);
    }
    csv.push('\n');
    csv
}

/// Minimal record with the fields aggregation tests care about
pub fn record(invoice_id: &str, branch: &str, total: f64, date: (i32, u32, u32)) -> SalesRecord {
    let (y, m, d) = date;
    SalesRecord {
        invoice_id: invoice_id.to_string(),
        branch: branch.to_string(),
        city: "Yangon".to_string(),
        customer_type: "Member".to_string(),
        gender: "Female".to_string(),
        product_line: "Food and beverages".to_string(),
        unit_price: total,
        quantity: 1,
        tax: 0.0,
        total,
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        payment: "Cash".to_string(),
        cogs: total,
        gross_margin_percentage: 0.0,
        gross_income: 0.0,
        rating: 7.0,
    }
}
