//! Wire types for the Document Intelligence analyze operation.
//!
//! Only the parts of the payload the receipt pipeline reads are modelled;
//! everything else is ignored by serde.

use std::collections::HashMap;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{AnalyzedDocument, ExtractedFields, ExtractedItem};

/// Body returned when polling `Operation-Location`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOperation {
    pub status: OperationStatus,
    #[serde(default)]
    pub analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// Error envelope used by both failed operations and error responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorBody {
    pub fn describe(&self) -> String {
        match (self.code.is_empty(), self.message.is_empty()) {
            (true, true) => "unknown error".to_string(),
            (true, false) => self.message.clone(),
            (false, true) => self.code.clone(),
            (false, false) => format!("{}: {}", self.code, self.message),
        }
    }
}

/// Top-level error response (`{"error": {...}}`).
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub lines: Vec<Line>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Line {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub fields: HashMap<String, DocumentField>,
}

/// A typed field value. Exactly one `value*` member is normally present.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentField {
    pub value_string: Option<String>,
    pub value_date: Option<String>,
    pub value_time: Option<String>,
    pub value_number: Option<f64>,
    pub value_integer: Option<i64>,
    pub value_currency: Option<CurrencyValue>,
    pub value_array: Option<Vec<DocumentField>>,
    pub value_object: Option<HashMap<String, DocumentField>>,
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyValue {
    pub amount: Option<f64>,
}

impl DocumentField {
    /// Text value, preferring the typed value over raw content.
    pub fn text(&self) -> Option<String> {
        self.value_string
            .as_deref()
            .or(self.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn date(&self) -> Option<String> {
        self.value_date
            .as_deref()
            .or(self.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn time(&self) -> Option<String> {
        self.value_time
            .as_deref()
            .or(self.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Monetary or numeric value as a decimal.
    pub fn amount(&self) -> Option<Decimal> {
        if let Some(amount) = self.value_currency.as_ref().and_then(|c| c.amount) {
            return to_decimal(amount);
        }
        if let Some(number) = self.value_number {
            return to_decimal(number);
        }
        self.value_integer.map(Decimal::from)
    }
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.normalize())
}

fn field<'a>(fields: &'a HashMap<String, DocumentField>, names: &[&str]) -> Option<&'a DocumentField> {
    names.iter().find_map(|name| fields.get(*name))
}

impl AnalyzeResult {
    /// Ordered raw lines: page lines when present, otherwise `content` split on newlines.
    pub fn lines(&self) -> Vec<String> {
        let from_pages: Vec<String> = self
            .pages
            .iter()
            .flat_map(|page| page.lines.iter())
            .map(|line| line.content.clone())
            .collect();

        if !from_pages.is_empty() {
            return from_pages;
        }

        self.content.lines().map(str::to_string).collect()
    }

    /// Map the first recognized receipt onto [`AnalyzedDocument`].
    pub fn into_document(self) -> AnalyzedDocument {
        let lines = self.lines();

        let Some(doc) = self.documents.into_iter().next() else {
            return AnalyzedDocument::from_lines(lines);
        };

        let fields = &doc.fields;
        let extracted = ExtractedFields {
            vendor: field(fields, &["MerchantName", "VendorName"]).and_then(DocumentField::text),
            date: field(fields, &["TransactionDate"]).and_then(DocumentField::date),
            time: field(fields, &["TransactionTime"]).and_then(DocumentField::time),
            subtotal: field(fields, &["Subtotal"]).and_then(DocumentField::amount),
            tax: field(fields, &["TotalTax", "Tax"]).and_then(DocumentField::amount),
            tip: field(fields, &["Tip"]).and_then(DocumentField::amount),
            total: field(fields, &["Total"]).and_then(DocumentField::amount),
            items: field(fields, &["Items"])
                .and_then(|f| f.value_array.as_ref())
                .map(|items| items.iter().filter_map(extract_item).collect())
                .unwrap_or_default(),
        };

        AnalyzedDocument {
            fields: extracted,
            lines,
        }
    }
}

fn extract_item(item: &DocumentField) -> Option<ExtractedItem> {
    let object = item.value_object.as_ref()?;
    Some(ExtractedItem {
        description: field(object, &["Description", "Name"]).and_then(DocumentField::text),
        quantity: field(object, &["Quantity"]).and_then(DocumentField::amount),
        amount: field(object, &["TotalPrice", "Price"]).and_then(DocumentField::amount),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    const SUCCEEDED: &str = r#"{
        "status": "succeeded",
        "createdDateTime": "2024-01-01T10:00:00Z",
        "analyzeResult": {
            "apiVersion": "2024-11-30",
            "modelId": "prebuilt-receipt",
            "content": "CONTOSO\n123 Main St\n2024-01-01\nTotal $14.50",
            "pages": [
                {"pageNumber": 1, "lines": [
                    {"content": "CONTOSO", "polygon": []},
                    {"content": "123 Main St"}
                ]},
                {"pageNumber": 2, "lines": [
                    {"content": "2024-01-01"},
                    {"content": "Total $14.50"}
                ]}
            ],
            "documents": [{
                "docType": "receipt.retailMeal",
                "confidence": 0.98,
                "fields": {
                    "MerchantName": {"type": "string", "valueString": "Contoso", "content": "CONTOSO", "confidence": 0.97},
                    "TransactionDate": {"type": "date", "valueDate": "2024-01-01", "content": "01/01/2024"},
                    "TransactionTime": {"type": "time", "valueTime": "13:59:00"},
                    "Subtotal": {"type": "currency", "valueCurrency": {"amount": 12.5, "currencyCode": "USD"}},
                    "TotalTax": {"type": "currency", "valueCurrency": {"amount": 1.0}},
                    "Tip": {"type": "number", "valueNumber": 1.0},
                    "Total": {"type": "currency", "valueCurrency": {"amount": 14.5}},
                    "Items": {"type": "array", "valueArray": [
                        {"type": "object", "valueObject": {
                            "Description": {"type": "string", "valueString": "Coffee"},
                            "Quantity": {"type": "number", "valueNumber": 2},
                            "TotalPrice": {"type": "currency", "valueCurrency": {"amount": 7.5}}
                        }},
                        {"type": "object", "valueObject": {
                            "Description": {"type": "string", "valueString": "Bagel"},
                            "Price": {"type": "currency", "valueCurrency": {"amount": 5.0}}
                        }}
                    ]}
                }
            }]
        }
    }"#;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_succeeded_operation() {
        let op: AnalyzeOperation = serde_json::from_str(SUCCEEDED).unwrap();
        assert_eq!(op.status, OperationStatus::Succeeded);

        let doc = op.analyze_result.unwrap().into_document();
        assert_eq!(doc.lines, vec!["CONTOSO", "123 Main St", "2024-01-01", "Total $14.50"]);
        assert_eq!(doc.fields.vendor.as_deref(), Some("Contoso"));
        assert_eq!(doc.fields.date.as_deref(), Some("2024-01-01"));
        assert_eq!(doc.fields.time.as_deref(), Some("13:59:00"));
        assert_eq!(doc.fields.subtotal, Some(dec("12.5")));
        assert_eq!(doc.fields.tax, Some(dec("1")));
        assert_eq!(doc.fields.tip, Some(dec("1")));
        assert_eq!(doc.fields.total, Some(dec("14.5")));
        assert_eq!(
            doc.fields.items,
            vec![
                ExtractedItem {
                    description: Some("Coffee".into()),
                    quantity: Some(dec("2")),
                    amount: Some(dec("7.5")),
                },
                ExtractedItem {
                    description: Some("Bagel".into()),
                    quantity: None,
                    amount: Some(dec("5")),
                },
            ]
        );
    }

    #[test]
    fn test_no_documents_keeps_lines() {
        let result: AnalyzeResult =
            serde_json::from_str(r#"{"content": "SUPER MART\n$45.00", "documents": []}"#).unwrap();
        let doc = result.into_document();
        assert_eq!(doc.fields, ExtractedFields::default());
        assert_eq!(doc.lines, vec!["SUPER MART", "$45.00"]);
    }

    #[test]
    fn test_vendor_name_fallback_field() {
        let result: AnalyzeResult = serde_json::from_str(
            r#"{"documents": [{"fields": {"VendorName": {"type": "string", "content": " ACME "}}}]}"#,
        )
        .unwrap();
        assert_eq!(result.into_document().fields.vendor.as_deref(), Some("ACME"));
    }

    #[test]
    fn test_failed_operation() {
        let op: AnalyzeOperation = serde_json::from_str(
            r#"{"status": "failed", "error": {"code": "InvalidContent", "message": "corrupt"}}"#,
        )
        .unwrap();
        assert_eq!(op.status, OperationStatus::Failed);
        assert_eq!(op.error.unwrap().describe(), "InvalidContent: corrupt");
    }

    #[test]
    fn test_unknown_status() {
        let op: AnalyzeOperation = serde_json::from_str(r#"{"status": "paused"}"#).unwrap();
        assert_eq!(op.status, OperationStatus::Unknown);
    }
}
