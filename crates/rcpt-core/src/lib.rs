//! Core library for receipt extraction.
//!
//! This crate provides:
//! - Input enumeration and pre-upload document checks
//! - An Azure Document Intelligence client for the `prebuilt-receipt` model
//! - Receipt assembly: totals validation, discount detection, vendor fallback
//! - A bounded concurrent batch pipeline with deterministic output order
//! - JSON and CSV writers

pub mod error;
pub mod input;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod receipt;
pub mod service;

pub use error::{DocumentError, Result, ScanError, ServiceError};
pub use input::{enumerate_inputs, load_document, DocumentUpload};
pub use models::config::{Credentials, ScanConfig};
pub use models::receipt::{ReceiptItem, ReceiptRecord, ValidationStatus, VendorSource};
pub use pipeline::{BatchReport, BatchRunner};
pub use receipt::{ReceiptAssembler, validate_totals, guess_vendor};
pub use service::{AnalyzedDocument, AzureReceiptClient, DocumentAnalyzer, ExtractedFields, ExtractedItem};
