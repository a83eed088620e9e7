//! JSON and CSV writers for a run's records.
//!
//! Every run overwrites its output files; nothing is appended across runs.

use std::fs;
use std::io::Write;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::info;

use crate::error::Result;
use crate::models::receipt::ReceiptRecord;

/// Column set of the per-receipt CSV.
pub const CSV_HEADER: [&str; 12] = [
    "file",
    "vendor",
    "date",
    "subtotal",
    "tax",
    "tip",
    "discount",
    "total",
    "validation_status",
    "item_count",
    "vendor_source",
    "error",
];

/// Column set of the optional per-item CSV.
pub const ITEMS_CSV_HEADER: [&str; 5] = ["file", "index", "description", "quantity", "amount"];

/// Write the records as a pretty-printed JSON array.
pub fn write_json_log(path: &Path, records: &[ReceiptRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut file = fs::File::create(path)?;
    serde_json::to_writer_pretty(&mut file, records)?;
    file.write_all(b"\n")?;
    info!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Read a JSON log written by [`write_json_log`].
pub fn read_json_log(path: &Path) -> Result<Vec<ReceiptRecord>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write one CSV row per receipt, with items summarized as a count.
pub fn write_csv_summary(path: &Path, records: &[ReceiptRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    write_summary_rows(&mut wtr, records)?;
    wtr.flush()?;
    info!("Wrote CSV summary to {}", path.display());
    Ok(())
}

/// Render the per-receipt CSV into a string.
pub fn format_csv_summary(records: &[ReceiptRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    write_summary_rows(&mut wtr, records)?;
    let data = wtr
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn write_summary_rows<W: Write>(wtr: &mut csv::Writer<W>, records: &[ReceiptRecord]) -> Result<()> {
    wtr.write_record(CSV_HEADER)?;

    for record in records {
        wtr.write_record([
            record.file_name(),
            record.vendor.as_deref().unwrap_or(""),
            record.date.as_deref().unwrap_or(""),
            &amount(record.subtotal),
            &amount(record.tax),
            &amount(record.tip),
            &amount(record.discount),
            &amount(record.total),
            record.validation_status.as_str(),
            &record.items.len().to_string(),
            record.vendor_source.as_str(),
            record.error.as_deref().unwrap_or(""),
        ])?;
    }

    Ok(())
}

/// Write one CSV row per line item.
pub fn write_items_csv(path: &Path, records: &[ReceiptRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(ITEMS_CSV_HEADER)?;

    let mut rows = 0usize;
    for record in records {
        for (index, item) in record.items.iter().enumerate() {
            wtr.write_record([
                record.file_name(),
                &(index + 1).to_string(),
                item.description.as_deref().unwrap_or(""),
                &amount(item.quantity),
                &amount(item.amount),
            ])?;
            rows += 1;
        }
    }

    wtr.flush()?;
    info!("Wrote {} item row(s) to {}", rows, path.display());
    Ok(())
}

fn amount(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
