//! Receipt assembly: service fields to a finalized [`ReceiptRecord`].

pub mod normalize;
pub mod patterns;
pub mod validate;
pub mod vendor;

pub use normalize::{normalize_date, normalize_time};
pub use validate::{validate_totals, Totals, Validation};
pub use vendor::{guess_vendor, VendorGuess, VendorHeuristic};

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::ScanConfig;
use crate::models::receipt::{ReceiptItem, ReceiptRecord, VendorSource};
use crate::service::{AnalyzedDocument, ExtractedItem};

use patterns::DISCOUNT_KEYWORD;

/// Turns an [`AnalyzedDocument`] into a validated [`ReceiptRecord`].
#[derive(Debug, Clone)]
pub struct ReceiptAssembler {
    /// Absolute tolerance for the totals check.
    tolerance: Decimal,
    /// Whether to guess the vendor when the service returns none.
    vendor_fallback: bool,
    /// Non-empty head lines inspected by the leading-line heuristic.
    head_lines: usize,
}

impl ReceiptAssembler {
    /// Create an assembler with default settings.
    pub fn new() -> Self {
        Self {
            tolerance: Decimal::new(2, 2),
            vendor_fallback: true,
            head_lines: 5,
        }
    }

    /// Build an assembler from the run configuration.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new()
            .with_tolerance(config.validation.tolerance)
            .with_vendor_fallback(config.vendor.enable_fallback)
            .with_head_lines(config.vendor.head_lines)
    }

    /// Set the totals tolerance.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable or disable the vendor fallback.
    pub fn with_vendor_fallback(mut self, enabled: bool) -> Self {
        self.vendor_fallback = enabled;
        self
    }

    /// Set the leading-line window.
    pub fn with_head_lines(mut self, head_lines: usize) -> Self {
        self.head_lines = head_lines;
        self
    }

    /// Finalize a record for `file_path` from the service output.
    pub fn assemble(&self, file_path: &str, doc: &AnalyzedDocument) -> ReceiptRecord {
        let fields = &doc.fields;

        let (vendor, vendor_source) = self.resolve_vendor(file_path, fields.vendor.as_deref(), &doc.lines);

        let items: Vec<ReceiptItem> = fields.items.iter().map(to_record_item).collect();
        let discount = detect_discount(&fields.items);

        let validation = validate_totals(
            &Totals {
                subtotal: fields.subtotal,
                tax: fields.tax,
                tip: fields.tip,
                discount,
                total: fields.total,
            },
            self.tolerance,
        );

        debug!(
            file = file_path,
            status = %validation.status,
            vendor_source = %vendor_source,
            items = items.len(),
            "Assembled receipt"
        );

        ReceiptRecord {
            file_path: file_path.to_string(),
            vendor,
            date: fields.date.as_deref().map(normalize_date),
            time: fields.time.as_deref().map(normalize_time),
            subtotal: fields.subtotal,
            tax: fields.tax,
            tip: fields.tip,
            discount,
            total: fields.total,
            items,
            validation_status: validation.status,
            calculated_total: validation.calculated_total,
            vendor_source,
            error: None,
        }
    }

    fn resolve_vendor(
        &self,
        file_path: &str,
        service_vendor: Option<&str>,
        lines: &[String],
    ) -> (Option<String>, VendorSource) {
        if let Some(name) = service_vendor.map(str::trim).filter(|s| !s.is_empty()) {
            return (Some(name.to_string()), VendorSource::Service);
        }

        if !self.vendor_fallback {
            return (None, VendorSource::None);
        }

        match guess_vendor(lines, self.head_lines) {
            Some(guess) => {
                debug!(
                    file = file_path,
                    vendor = %guess.name,
                    heuristic = ?guess.heuristic,
                    "Service returned no vendor, using heuristic guess"
                );
                (Some(guess.name), VendorSource::Heuristic)
            }
            None => (None, VendorSource::None),
        }
    }
}

impl Default for ReceiptAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn to_record_item(item: &ExtractedItem) -> ReceiptItem {
    ReceiptItem {
        description: item.description.clone(),
        quantity: item.quantity,
        amount: item.amount,
    }
}

fn is_discount_item(item: &ExtractedItem) -> bool {
    let negative = item.amount.is_some_and(|a| a.is_sign_negative() && !a.is_zero());
    let keyword = item
        .description
        .as_deref()
        .is_some_and(|d| DISCOUNT_KEYWORD.is_match(d));
    negative || keyword
}

/// Sum of absolute amounts over discount lines; `None` when there are none.
pub fn detect_discount(items: &[ExtractedItem]) -> Option<Decimal> {
    let discounts: Vec<Decimal> = items
        .iter()
        .filter(|item| is_discount_item(item))
        .map(|item| item.amount.unwrap_or_default().abs())
        .collect();

    if discounts.is_empty() {
        None
    } else {
        Some(discounts.into_iter().sum())
    }
}
