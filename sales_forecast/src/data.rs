//! Sales records and the daily series derived from them

use crate::error::{ForecastError, Result};
use crate::utils::date_parser;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One line item of a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl SaleItem {
    pub fn revenue(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// A single transaction as supplied by the transaction store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSaleRecord {
    pub timestamp: DateTime<Utc>,
    pub total: f64,
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

impl RawSaleRecord {
    pub fn new(timestamp: DateTime<Utc>, total: f64) -> Self {
        Self {
            timestamp,
            total,
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<SaleItem>) -> Self {
        self.items = items;
        self
    }

    /// UTC calendar day the sale belongs to
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Check the record against the input contract
    pub fn validate(&self) -> Result<()> {
        if !self.total.is_finite() || self.total < 0.0 {
            return Err(ForecastError::InvalidRecord(format!(
                "sale at {} has invalid total {}",
                self.timestamp, self.total
            )));
        }
        for item in &self.items {
            if !item.quantity.is_finite() || !item.unit_price.is_finite() {
                return Err(ForecastError::InvalidRecord(format!(
                    "item '{}' at {} has a non-finite quantity or price",
                    item.product_id, self.timestamp
                )));
            }
        }
        Ok(())
    }
}

/// Aggregated sales for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailySeriesPoint {
    pub date: NaiveDate,
    pub total_sales: f64,
    pub transaction_count: u64,
}

impl DailySeriesPoint {
    pub fn new(date: NaiveDate, total_sales: f64, transaction_count: u64) -> Self {
        Self {
            date,
            total_sales,
            transaction_count,
        }
    }

    pub fn empty(date: NaiveDate) -> Self {
        Self::new(date, 0.0, 0)
    }
}

/// Sales values of a daily series, in date order
pub fn sales_values(series: &[DailySeriesPoint]) -> Vec<f64> {
    series.iter().map(|p| p.total_sales).collect()
}

/// Transaction counts of a daily series as floats
pub fn transaction_values(series: &[DailySeriesPoint]) -> Vec<f64> {
    series.iter().map(|p| p.transaction_count as f64).collect()
}

#[derive(Debug, Deserialize)]
struct CsvSaleRow {
    timestamp: String,
    total: f64,
    #[serde(default)]
    items: Option<String>,
}

/// Loader for raw sales records
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load records from a file, choosing the format by extension (`.json` or `.csv`)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawSaleRecord>> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(path),
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::from_csv(path),
            _ => Err(ForecastError::InvalidParameter(format!(
                "Unsupported input format: {}",
                path.display()
            ))),
        }
    }

    /// Load a JSON array of records
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Vec<RawSaleRecord>> {
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Vec<RawSaleRecord>> {
        let records: Vec<RawSaleRecord> = serde_json::from_str(contents)?;
        for record in &records {
            record.validate()?;
        }
        Ok(records)
    }

    /// Load records from CSV with a `timestamp,total[,items]` header
    ///
    /// `items` is optional and encodes line items as
    /// `product:quantity:unit_price` separated by `|`.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawSaleRecord>> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Vec<RawSaleRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for row in csv_reader.deserialize::<CsvSaleRow>() {
            let row = row?;
            let items = match row.items.as_deref() {
                Some(encoded) if !encoded.is_empty() => parse_items(encoded)?,
                _ => Vec::new(),
            };
            let record = RawSaleRecord {
                timestamp: date_parser::parse_timestamp(&row.timestamp)?,
                total: row.total,
                items,
            };
            record.validate()?;
            records.push(record);
        }

        Ok(records)
    }
}

fn parse_items(encoded: &str) -> Result<Vec<SaleItem>> {
    encoded
        .split('|')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let fields: Vec<&str> = part.trim().split(':').collect();
            if fields.len() != 3 {
                return Err(ForecastError::Parse(format!(
                    "item '{}' must look like product:quantity:unit_price",
                    part
                )));
            }
            let quantity = fields[1]
                .parse::<f64>()
                .map_err(|e| ForecastError::Parse(format!("quantity in '{}': {}", part, e)))?;
            let unit_price = fields[2]
                .parse::<f64>()
                .map_err(|e| ForecastError::Parse(format!("unit price in '{}': {}", part, e)))?;
            Ok(SaleItem {
                product_id: fields[0].to_string(),
                quantity,
                unit_price,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items() {
        let items = parse_items("coffee:2:3.5|bagel:1:2").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_id, "coffee");
        assert_eq!(items[0].revenue(), 7.0);
        assert!(parse_items("coffee:2").is_err());
    }

    #[test]
    fn test_negative_total_is_invalid() {
        let record = RawSaleRecord::new(Utc::now(), -5.0);
        assert!(matches!(
            record.validate(),
            Err(ForecastError::InvalidRecord(_))
        ));
    }
}
