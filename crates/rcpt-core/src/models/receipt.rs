//! Receipt record produced for every processed input file.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Finalized structured representation of one processed receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Path of the source file as it was enumerated.
    pub file_path: String,

    /// Merchant name, from the service or the fallback heuristic.
    pub vendor: Option<String>,

    /// Transaction date (ISO `YYYY-MM-DD` when it could be normalized).
    pub date: Option<String>,

    /// Transaction time (`HH:MM:SS` when it could be normalized).
    #[serde(default)]
    pub time: Option<String>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub subtotal: Option<Decimal>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub tax: Option<Decimal>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub tip: Option<Decimal>,

    /// Sum of discount lines detected among the items.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,

    /// Line items in the order the service returned them.
    #[serde(default)]
    pub items: Vec<ReceiptItem>,

    /// Result of the totals arithmetic check.
    pub validation_status: ValidationStatus,

    /// `subtotal + tax + tip - discount`, when it could be computed.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub calculated_total: Option<Decimal>,

    /// Where the vendor name came from.
    pub vendor_source: VendorSource,

    /// Set when the file could not be processed.
    #[serde(default)]
    pub error: Option<String>,
}

/// A single line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub description: Option<String>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub quantity: Option<Decimal>,

    /// Line total (negative for discounts on some receipts).
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
}

/// Outcome of the totals arithmetic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    /// Totals agree within tolerance.
    Ok,
    /// Totals disagree by more than the tolerance.
    Mismatch,
    /// Subtotal or total is missing.
    InsufficientData,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Ok => "OK",
            ValidationStatus::Mismatch => "MISMATCH",
            ValidationStatus::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of the vendor name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorSource {
    /// Returned by the document analysis service.
    Service,
    /// Guessed from the raw text lines.
    Heuristic,
    /// No vendor could be determined.
    None,
}

impl VendorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorSource::Service => "SERVICE",
            VendorSource::Heuristic => "HEURISTIC",
            VendorSource::None => "NONE",
        }
    }
}

impl std::fmt::Display for VendorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ReceiptRecord {
    /// Record for a file that could not be processed.
    pub fn failed(file_path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            vendor: None,
            date: None,
            time: None,
            subtotal: None,
            tax: None,
            tip: None,
            discount: None,
            total: None,
            items: Vec::new(),
            validation_status: ValidationStatus::InsufficientData,
            calculated_total: None,
            vendor_source: VendorSource::None,
            error: Some(error.into()),
        }
    }

    /// Whether the file went through extraction successfully.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// File name component of `file_path`, for display and CSV output.
    pub fn file_name(&self) -> &str {
        std::path::Path::new(&self.file_path)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_path)
    }
}
