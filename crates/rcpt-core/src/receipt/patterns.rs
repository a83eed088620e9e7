//! Common regex patterns for receipt line heuristics.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Numeric dates: 2024-01-01, 01/02/2024, 1.2.24
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(?:\d{4}[./\-]\d{1,2}[./\-]\d{1,2}|\d{1,2}[./\-]\d{1,2}[./\-](?:\d{4}|\d{2}))\b"
    ).unwrap();

    // Written dates: 12 Jan 2024, January 12, 2024
    pub static ref DATE_WRITTEN: Regex = Regex::new(
        r"(?i)\b(?:\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{2,4}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4})\b"
    ).unwrap();

    pub static ref CURRENCY_SYMBOL: Regex = Regex::new(
        r"[$€£¥₹₩₽]"
    ).unwrap();

    // Item descriptions that mark a discount line
    pub static ref DISCOUNT_KEYWORD: Regex = Regex::new(
        r"(?i)discount|coupon|saving"
    ).unwrap();
}

/// Header words that never name a merchant.
pub const JUNK_LINES: &[&str] = &[
    "RECEIPT",
    "SALES RECEIPT",
    "INVOICE",
    "TAX INVOICE",
    "BILL",
    "CASH MEMO",
    "THANK YOU",
    "WELCOME",
    "CUSTOMER COPY",
    "MERCHANT COPY",
];

/// Whether a line carries a date.
pub fn has_date(line: &str) -> bool {
    DATE_NUMERIC.is_match(line) || DATE_WRITTEN.is_match(line)
}

/// Whether a line carries a currency symbol.
pub fn has_currency(line: &str) -> bool {
    CURRENCY_SYMBOL.is_match(line)
}
