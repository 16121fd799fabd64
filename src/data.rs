//! Transaction loading and per-customer RFV metric derivation

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::error::RfvError;
use crate::score::Metric;

/// Date-time layouts accepted for the purchase date column, tried in order
/// after RFC 3339
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// A single purchase
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub customer_id: String,
    pub purchase_code: String,
    pub purchase_date: NaiveDateTime,
    pub total_value: f64,
}

impl Transaction {
    pub fn new(
        customer_id: impl Into<String>,
        purchase_code: impl Into<String>,
        purchase_date: NaiveDateTime,
        total_value: f64,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            purchase_code: purchase_code.into(),
            purchase_date,
            total_value,
        }
    }
}

/// Required columns with their legacy header names
const REQUIRED_COLUMNS: [(&str, &str); 4] = [
    ("customer_id", "ID_cliente"),
    ("purchase_code", "CodigoCompra"),
    ("purchase_date", "DiaCompra"),
    ("total_value", "ValorTotal"),
];

/// CSV row before type conversion. Accepts both the snake_case column names
/// and the legacy export headers.
#[derive(Debug, Deserialize)]
struct RawTransaction {
    #[serde(alias = "ID_cliente")]
    customer_id: String,
    #[serde(alias = "CodigoCompra")]
    purchase_code: String,
    #[serde(alias = "DiaCompra")]
    purchase_date: String,
    #[serde(alias = "ValorTotal")]
    total_value: String,
}

impl RawTransaction {
    fn into_transaction(self, row: usize) -> Result<Transaction, RfvError> {
        if self.customer_id.is_empty() {
            return Err(RfvError::invalid_row(row, "customer_id", "is missing"));
        }

        let purchase_date = parse_purchase_date(&self.purchase_date).ok_or_else(|| {
            RfvError::invalid_row(
                row,
                "purchase_date",
                format!("could not be parsed: '{}'", self.purchase_date),
            )
        })?;

        let total_value: f64 = self.total_value.parse().map_err(|_| {
            RfvError::invalid_row(
                row,
                "total_value",
                format!("is not numeric: '{}'", self.total_value),
            )
        })?;

        Ok(Transaction {
            customer_id: self.customer_id,
            purchase_code: self.purchase_code,
            purchase_date,
            total_value,
        })
    }
}

/// Parse a purchase date, accepting plain dates, common date-time layouts
/// and RFC 3339 timestamps (converted to UTC)
pub fn parse_purchase_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Read transactions from CSV data with a header row
///
/// Row numbers in errors are 0-based data rows (the header is not counted).
pub fn read_transactions<R: Read>(reader: R) -> crate::Result<Vec<Transaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().context("Failed to read CSV header")?;
    for (column, legacy) in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column || h == legacy) {
            return Err(RfvError::MissingColumn { column }.into());
        }
    }

    let mut transactions = Vec::new();
    for (row, result) in csv_reader.deserialize::<RawTransaction>().enumerate() {
        let raw = result.map_err(|e| RfvError::invalid_row(row, "record", e.to_string()))?;
        transactions.push(raw.into_transaction(row)?);
    }

    debug!(rows = transactions.len(), "loaded transactions");
    Ok(transactions)
}

/// Load transactions from a CSV file
///
/// # Arguments
/// * `file_path` - Path to the CSV file
///
/// # Returns
/// * Parsed transactions in file order
pub fn load_transactions(file_path: impl AsRef<Path>) -> crate::Result<Vec<Transaction>> {
    let file_path = file_path.as_ref();
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open '{}'", file_path.display()))?;

    read_transactions(file).with_context(|| format!("Failed to load '{}'", file_path.display()))
}

/// Recency, frequency and monetary values of one customer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerMetrics {
    /// Whole days between the latest purchase in the dataset and this
    /// customer's latest purchase
    pub recency_days: i64,
    /// Number of transaction rows for the customer
    pub frequency_count: usize,
    /// Sum of the customer's transaction values
    pub monetary_sum: f64,
}

impl CustomerMetrics {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Recency => self.recency_days as f64,
            Metric::Frequency => self.frequency_count as f64,
            Metric::Monetary => self.monetary_sum,
        }
    }
}

/// A transaction together with its customer's metrics
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub transaction: Transaction,
    pub metrics: CustomerMetrics,
}

#[derive(Debug)]
struct CustomerAccumulator {
    latest_purchase: NaiveDateTime,
    count: usize,
    total: f64,
}

/// Compute RFV metrics for every transaction
///
/// The output keeps one row per input transaction, in input order; the
/// customer-level metrics are repeated on each of a customer's rows.
/// Customer ids are compared after trimming surrounding whitespace.
pub fn derive_metrics(transactions: &[Transaction]) -> Result<Vec<MetricRow>, RfvError> {
    validate_transactions(transactions)?;

    // Reference date: the most recent purchase anywhere in the dataset
    let max_date = transactions
        .iter()
        .map(|t| t.purchase_date)
        .max()
        .ok_or(RfvError::EmptyDataset)?;

    let mut customers: HashMap<&str, CustomerAccumulator> = HashMap::new();
    for t in transactions {
        let acc = customers
            .entry(t.customer_id.trim())
            .or_insert(CustomerAccumulator {
                latest_purchase: t.purchase_date,
                count: 0,
                total: 0.0,
            });
        acc.latest_purchase = acc.latest_purchase.max(t.purchase_date);
        acc.count += 1;
        acc.total += t.total_value;
    }

    debug!(
        rows = transactions.len(),
        customers = customers.len(),
        %max_date,
        "derived customer metrics"
    );

    let rows = transactions
        .iter()
        .map(|t| {
            let acc = &customers[t.customer_id.trim()];
            MetricRow {
                transaction: t.clone(),
                metrics: CustomerMetrics {
                    recency_days: (max_date - acc.latest_purchase).num_days(),
                    frequency_count: acc.count,
                    monetary_sum: acc.total,
                },
            }
        })
        .collect();

    Ok(rows)
}

fn validate_transactions(transactions: &[Transaction]) -> Result<(), RfvError> {
    if transactions.is_empty() {
        return Err(RfvError::EmptyDataset);
    }

    for (row, t) in transactions.iter().enumerate() {
        if t.customer_id.trim().is_empty() {
            return Err(RfvError::invalid_row(row, "customer_id", "is missing"));
        }
        if !t.total_value.is_finite() {
            return Err(RfvError::invalid_row(
                row,
                "total_value",
                format!("is not finite: {}", t.total_value),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn date(s: &str) -> NaiveDateTime {
        parse_purchase_date(s).unwrap()
    }

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            Transaction::new("C1", "T1", date("2024-01-01"), 100.0),
            Transaction::new("C1", "T2", date("2024-01-10"), 50.0),
            Transaction::new("C2", "T3", date("2024-01-10"), 500.0),
        ]
    }

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ID_cliente,CodigoCompra,DiaCompra,ValorTotal").unwrap();
        writeln!(file, "1,A100,2021-06-12,777.00").unwrap();
        writeln!(file, "1,A101,2021-06-20, 120.50").unwrap();
        writeln!(file, "2,A102,2021-07-01 14:30:00,-30.00").unwrap();
        file
    }

    #[test]
    fn test_parse_purchase_date_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_purchase_date("2024-03-05"), Some(midnight));
        assert_eq!(parse_purchase_date(" 2024-03-05 "), Some(midnight));
        assert_eq!(parse_purchase_date("2024-03-05 00:00:00"), Some(midnight));
        assert_eq!(parse_purchase_date("2024-03-05T00:00:00"), Some(midnight));
        assert_eq!(parse_purchase_date("2024-03-05T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_purchase_date("05/03/2024"), None);
        assert_eq!(parse_purchase_date("2024-02-30"), None);
    }

    #[test]
    fn test_derive_metrics_scenario() {
        let rows = derive_metrics(&sample_transactions()).unwrap();
        assert_eq!(rows.len(), 3);

        for row in &rows[..2] {
            assert_eq!(row.transaction.customer_id, "C1");
            assert_eq!(row.metrics.recency_days, 0);
            assert_eq!(row.metrics.frequency_count, 2);
            assert_eq!(row.metrics.monetary_sum, 150.0);
        }

        assert_eq!(rows[2].transaction.customer_id, "C2");
        assert_eq!(
            rows[2].metrics,
            CustomerMetrics {
                recency_days: 0,
                frequency_count: 1,
                monetary_sum: 500.0,
            }
        );
    }

    #[test]
    fn test_recency_counts_whole_days() {
        let transactions = vec![
            Transaction::new("old", "T1", date("2024-01-01 23:00:00"), 10.0),
            Transaction::new("new", "T2", date("2024-01-11 08:00:00"), 10.0),
        ];
        let rows = derive_metrics(&transactions).unwrap();

        // 9 days and 9 hours
        assert_eq!(rows[0].metrics.recency_days, 9);
        assert_eq!(rows[1].metrics.recency_days, 0);
        assert!(rows.iter().all(|r| r.metrics.recency_days >= 0));
    }

    #[test]
    fn test_metric_values() {
        let metrics = CustomerMetrics {
            recency_days: 12,
            frequency_count: 3,
            monetary_sum: 99.5,
        };
        assert_eq!(metrics.value(Metric::Recency), 12.0);
        assert_eq!(metrics.value(Metric::Frequency), 3.0);
        assert_eq!(metrics.value(Metric::Monetary), 99.5);
    }

    #[test]
    fn test_derive_metrics_rejects_bad_rows() {
        assert_eq!(derive_metrics(&[]).unwrap_err(), RfvError::EmptyDataset);

        let mut transactions = sample_transactions();
        transactions[1].total_value = f64::NAN;
        let err = derive_metrics(&transactions).unwrap_err();
        assert!(matches!(err, RfvError::InvalidRow { row: 1, field: "total_value", .. }));

        let mut transactions = sample_transactions();
        transactions[2].customer_id = "  ".to_string();
        let err = derive_metrics(&transactions).unwrap_err();
        assert!(matches!(err, RfvError::InvalidRow { row: 2, field: "customer_id", .. }));
    }

    #[test]
    fn test_load_transactions_with_legacy_headers() {
        let test_file = create_test_csv();
        let transactions = load_transactions(test_file.path()).unwrap();

        assert_eq!(transactions.len(), 3);
        assert_eq!(transactions[0].customer_id, "1");
        assert_eq!(transactions[0].purchase_code, "A100");
        assert_eq!(transactions[1].total_value, 120.5);
        assert_eq!(transactions[2].purchase_date, date("2021-07-01 14:30:00"));
        assert_eq!(transactions[2].total_value, -30.0);
    }

    #[test]
    fn test_read_transactions_snake_case_headers() {
        let data = "customer_id,purchase_code,purchase_date,total_value\nC9,X1,2023-12-31,10\n";
        let transactions = read_transactions(data.as_bytes()).unwrap();
        assert_eq!(
            transactions,
            vec![Transaction::new("C9", "X1", date("2023-12-31"), 10.0)]
        );
    }

    #[test]
    fn test_read_transactions_reports_bad_row() {
        let data = "\
customer_id,purchase_code,purchase_date,total_value
C1,T1,2024-01-01,10
C2,T2,not-a-date,20
";
        let err = read_transactions(data.as_bytes()).unwrap_err();
        let rfv_err = err.downcast_ref::<RfvError>().unwrap();
        assert!(matches!(rfv_err, RfvError::InvalidRow { row: 1, field: "purchase_date", .. }));

        let data = "customer_id,purchase_code,purchase_date,total_value\nC1,T1,2024-01-01,ten\n";
        let err = read_transactions(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("total_value"));
    }

    #[test]
    fn test_read_transactions_short_record() {
        let data = "\
customer_id,purchase_code,purchase_date,total_value
C1,T1,2024-01-01,10
C2,T2,2024-01-02
";
        let err = read_transactions(data.as_bytes()).unwrap_err();
        let rfv_err = err.downcast_ref::<RfvError>().unwrap();
        assert_eq!(rfv_err.kind(), ErrorKind::DataValidation);
        assert!(matches!(rfv_err, RfvError::InvalidRow { row: 1, field: "record", .. }));
    }

    #[test]
    fn test_read_transactions_missing_column() {
        let data = "customer_id,purchase_code,purchase_date\nC1,T1,2024-01-01\n";
        let err = read_transactions(data.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RfvError>(),
            Some(&RfvError::MissingColumn { column: "total_value" })
        );

        // Header only, no data rows
        let data = "ID_cliente,CodigoCompra,ValorTotal\n";
        let err = read_transactions(data.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RfvError>(),
            Some(&RfvError::MissingColumn { column: "purchase_date" })
        );
    }

    #[test]
    fn test_customer_ids_grouped_after_trimming() {
        let transactions = vec![
            Transaction::new("C1", "T1", date("2024-01-01"), 10.0),
            Transaction::new("C1 ", "T2", date("2024-01-05"), 15.0),
            Transaction::new(" C2", "T3", date("2024-01-05"), 7.0),
        ];
        let rows = derive_metrics(&transactions).unwrap();

        assert_eq!(rows[0].metrics, rows[1].metrics);
        assert_eq!(rows[0].metrics.frequency_count, 2);
        assert_eq!(rows[0].metrics.monetary_sum, 25.0);
        assert_eq!(rows[0].metrics.recency_days, 0);
        assert_eq!(rows[2].metrics.frequency_count, 1);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_transactions("/definitely/not/here.csv");
        assert!(result.is_err());
    }
}
