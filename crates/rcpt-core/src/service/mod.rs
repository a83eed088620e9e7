//! Document analysis service abstraction.

mod azure;
pub mod response;

pub use azure::AzureReceiptClient;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::ServiceError;
use crate::input::DocumentUpload;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Named fields predicted by the service for one receipt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub vendor: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub tip: Option<Decimal>,
    pub total: Option<Decimal>,
    pub items: Vec<ExtractedItem>,
}

/// A predicted line item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedItem {
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub amount: Option<Decimal>,
}

/// What the pipeline consumes from one analysis: fields plus raw lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzedDocument {
    pub fields: ExtractedFields,
    /// Raw text lines in reading order.
    pub lines: Vec<String>,
}

impl AnalyzedDocument {
    /// Document with raw lines only, as when no receipt was recognized.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: ExtractedFields::default(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// Trait for document analysis backends.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Analyze one document and return its predicted fields and text lines.
    async fn analyze(&self, upload: &DocumentUpload) -> Result<AnalyzedDocument>;
}
