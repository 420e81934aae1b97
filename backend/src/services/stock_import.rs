//! Bulk stock import pipeline
//!
//! Turns an uploaded CSV into encrypted stock items merged into the
//! right pools. The import is a best-effort batch: rows without a
//! payload are skipped, a row that fails encryption goes to the error
//! list, and one broken product group never aborts the others. The
//! caller gets a report, not an all-or-nothing result.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{normalize_identifier, StockItem, StockItemRecord, StockType};
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::EncryptionPort;
use crate::services::StockPoolService;

/// One failed row or group from a best-effort import
#[derive(Debug, Clone, Serialize)]
pub struct ImportError {
    /// Product bucket or row context the failure belongs to
    pub scope: String,
    pub message: String,
}

/// Summary of a bulk import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub total_imported: usize,
    pub pools_updated: usize,
    /// Rows dropped for a missing payload column/value
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Bulk import service
#[derive(Clone)]
pub struct StockImportService {
    stock: StockPoolService,
    crypto: Arc<dyn EncryptionPort>,
    /// Bucket for rows with no product column and no caller default
    default_product_key: String,
}

impl StockImportService {
    pub fn new(
        stock: StockPoolService,
        crypto: Arc<dyn EncryptionPort>,
        default_product_key: impl Into<String>,
    ) -> Self {
        Self {
            stock,
            crypto,
            default_product_key: default_product_key.into(),
        }
    }

    /// Import a PIN CSV upload. Recognized columns (case-insensitive,
    /// underscores ignored): pin | pinNumber, serial_number |
    /// serialNumber, productId, notes, price, type.
    pub async fn import_pin_csv(
        &self,
        data: &[u8],
        fallback_product_key: Option<&str>,
        actor: Option<Uuid>,
    ) -> AppResult<ImportReport> {
        let (records, skipped) = parse_rows(data, &["pin", "pinnumber"])?;
        let mut report = self
            .merge(records, StockType::Pin, fallback_product_key, actor)
            .await;
        report.skipped = skipped;
        Ok(report)
    }

    /// Import an eSIM CSV upload. Recognized columns: iccid,
    /// serialNumber, activationUrl, qrCodeUrl, qrCodeImage, productId.
    pub async fn import_esim_csv(
        &self,
        data: &[u8],
        fallback_product_key: Option<&str>,
        actor: Option<Uuid>,
    ) -> AppResult<ImportReport> {
        let (records, skipped) = parse_rows(data, &["iccid"])?;
        let mut report = self
            .merge(records, StockType::Esim, fallback_product_key, actor)
            .await;
        report.skipped = skipped;
        Ok(report)
    }

    /// Group records by product, encrypt payloads, and merge each group
    /// into its pool. Failures are collected per row/group.
    async fn merge(
        &self,
        records: Vec<StockItemRecord>,
        stock_type: StockType,
        fallback_product_key: Option<&str>,
        actor: Option<Uuid>,
    ) -> ImportReport {
        let mut report = ImportReport::default();

        // BTreeMap keeps group processing order deterministic
        let mut groups: BTreeMap<String, Vec<StockItemRecord>> = BTreeMap::new();
        for record in records {
            let key = record
                .product_key
                .clone()
                .filter(|k| !k.is_empty())
                .or_else(|| fallback_product_key.map(str::to_string))
                .unwrap_or_else(|| self.default_product_key.clone());
            groups.entry(key).or_default().push(record);
        }

        for (product_key, rows) in groups {
            let mut items = Vec::with_capacity(rows.len());
            for row in rows {
                match self.crypto.encrypt(&row.payload) {
                    Ok(payload) => {
                        let mut item = StockItem::new(payload);
                        item.serial_number = row.serial_number;
                        item.notes = row.notes;
                        item.face_value = row.face_value;
                        item.activation_url = row.activation_url;
                        item.qr_code_url = row.qr_code_url;
                        item.qr_code_image = row.qr_code_image;
                        items.push(item);
                    }
                    Err(err) => report.errors.push(ImportError {
                        scope: product_key.clone(),
                        message: format!("encryption failed: {err}"),
                    }),
                }
            }

            if items.is_empty() {
                continue;
            }

            let count = items.len();
            match self
                .stock
                .add_items(&product_key, stock_type, items, actor)
                .await
            {
                Ok(_) => {
                    report.total_imported += count;
                    report.pools_updated += 1;
                }
                Err(err) => report.errors.push(ImportError {
                    scope: product_key.clone(),
                    message: err.to_string(),
                }),
            }
        }

        if !report.errors.is_empty() {
            tracing::warn!(
                errors = report.errors.len(),
                imported = report.total_imported,
                "stock import finished with errors"
            );
        }
        report
    }
}

/// Parse CSV rows into records, keyed by normalized header names.
/// Headers match case-insensitively with underscores ignored, so
/// `serial_number`, `serialNumber`, and `SERIALNUMBER` are the same
/// column. Rows with no payload in any of `payload_columns` are
/// skipped and counted.
fn parse_rows(data: &[u8], payload_columns: &[&str]) -> AppResult<(Vec<StockItemRecord>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let field = |row: &csv::StringRecord, name: &str| -> Option<String> {
        column(name)
            .and_then(|idx| row.get(idx))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = row?;

        let payload = payload_columns.iter().find_map(|name| field(&row, name));
        let payload = match payload {
            Some(value) => normalize_identifier(&value),
            None => {
                skipped += 1;
                continue;
            }
        };

        records.push(StockItemRecord {
            payload,
            serial_number: field(&row, "serialnumber").map(|s| normalize_identifier(&s)),
            product_key: field(&row, "productid"),
            notes: field(&row, "notes"),
            face_value: field(&row, "price").and_then(|p| p.parse::<Decimal>().ok()),
            stock_type: field(&row, "type").and_then(|t| match t.to_lowercase().as_str() {
                "pin" => Some(StockType::Pin),
                "esim" => Some(StockType::Esim),
                _ => None,
            }),
            activation_url: field(&row, "activationurl"),
            qr_code_url: field(&row, "qrcodeurl"),
            qr_code_image: field(&row, "qrcodeimage"),
        });
    }

    Ok((records, skipped))
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("serial_number"), "serialnumber");
        assert_eq!(normalize_header("serialNumber"), "serialnumber");
        assert_eq!(normalize_header("PIN"), "pin");
    }

    #[test]
    fn test_parse_rows_skips_missing_payload() {
        let csv = b"pin,serial_number\n1234,S1\n,S2\n5678,S3\n";
        let (records, skipped) = parse_rows(csv, &["pin", "pinnumber"]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_parse_rows_scientific_notation() {
        let csv = b"PIN,serialNumber\n1.23E+10,SER01\n";
        let (records, _) = parse_rows(csv, &["pin", "pinnumber"]).unwrap();
        assert_eq!(records[0].payload, "12300000000");
    }

    #[test]
    fn test_parse_rows_optional_columns_default() {
        let csv = b"iccid\n891004234814455936\n";
        let (records, skipped) = parse_rows(csv, &["iccid"]).unwrap();
        assert_eq!(skipped, 0);
        let record = &records[0];
        assert!(record.serial_number.is_none());
        assert!(record.product_key.is_none());
        assert!(record.activation_url.is_none());
    }
}
