//! Vendor name fallback over raw text lines.

use super::patterns::{has_currency, has_date, JUNK_LINES};

/// Line-shape limits for a plausible merchant name.
const MIN_VENDOR_LEN: usize = 3;
const MAX_VENDOR_LEN: usize = 64;

/// Heuristics tried in order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorHeuristic {
    /// First qualifying line among the first few non-empty head lines.
    LeadingLine,
    /// Longest all-caps qualifying line anywhere in the head region.
    CapitalizedLine,
}

pub const VENDOR_HEURISTICS: &[VendorHeuristic] =
    &[VendorHeuristic::LeadingLine, VendorHeuristic::CapitalizedLine];

/// Vendor picked by [`guess_vendor`] and the heuristic that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorGuess {
    pub name: String,
    pub heuristic: VendorHeuristic,
}

/// Guess a vendor name from ordered raw lines.
///
/// Only the head region is considered: the non-empty lines above the first
/// line containing a date or a currency symbol. `head_lines` bounds the
/// leading-line heuristic.
pub fn guess_vendor<S: AsRef<str>>(lines: &[S], head_lines: usize) -> Option<VendorGuess> {
    let head = head_region(lines);

    VENDOR_HEURISTICS.iter().find_map(|heuristic| {
        let name = match heuristic {
            VendorHeuristic::LeadingLine => leading_line(&head, head_lines),
            VendorHeuristic::CapitalizedLine => capitalized_line(&head),
        }?;
        Some(VendorGuess {
            name: name.to_string(),
            heuristic: *heuristic,
        })
    })
}

fn head_region<S: AsRef<str>>(lines: &[S]) -> Vec<&str> {
    lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .take_while(|l| !has_date(l) && !has_currency(l))
        .collect()
}

fn leading_line<'a>(head: &[&'a str], limit: usize) -> Option<&'a str> {
    head.iter().take(limit).copied().find(|l| is_vendor_shaped(l))
}

fn capitalized_line<'a>(head: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<&str> = None;
    for line in head.iter().copied().filter(|l| is_vendor_shaped(l) && is_all_caps(l)) {
        if best.is_none_or(|b| line.chars().count() > b.chars().count()) {
            best = Some(line);
        }
    }
    best
}

/// Trimmed line with a sane length, more letters than digits, and no junk header text.
pub fn is_vendor_shaped(line: &str) -> bool {
    let line = line.trim();
    let len = line.chars().count();
    if !(MIN_VENDOR_LEN..=MAX_VENDOR_LEN).contains(&len) {
        return false;
    }

    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    let digits = line.chars().filter(|c| c.is_ascii_digit()).count();
    if letters == 0 || digits >= letters {
        return false;
    }

    let upper = line.to_uppercase();
    !JUNK_LINES.contains(&upper.as_str())
}

fn is_all_caps(line: &str) -> bool {
    line.chars()
        .filter(|c| c.is_alphabetic())
        .all(|c| !c.is_lowercase())
}
