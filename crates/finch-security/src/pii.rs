// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Masking of personal data in free text.
//!
//! Detectors run in a fixed order (cards, SSNs, emails, phones) so that a
//! long card number is never half-consumed by the phone pattern.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a detected value is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskStrategy {
    /// Replace with a typed tag, e.g. `[REDACTED:EMAIL]`.
    Full,
    /// Keep the last four characters when they are digits, star the rest.
    Last4,
}

/// Kinds of personal data recognised by [`mask_pii`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiiKind {
    Card,
    Ssn,
    Email,
    Phone,
}

impl PiiKind {
    /// Upper-case tag used in full redactions.
    pub fn tag(&self) -> &'static str {
        match self {
            PiiKind::Card => "CARD",
            PiiKind::Ssn => "SSN",
            PiiKind::Email => "EMAIL",
            PiiKind::Phone => "PHONE",
        }
    }
}

/// Output of [`mask_pii`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Masked {
    pub text: String,
    /// Kinds found, in detector order, without repeats.
    pub found: Vec<PiiKind>,
}

static DETECTORS: LazyLock<Vec<(PiiKind, Regex)>> = LazyLock::new(|| {
    vec![
        (
            PiiKind::Card,
            Regex::new(r"\b(?:\d[ -]?){12,18}\d\b").unwrap(),
        ),
        (PiiKind::Ssn, Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
        (
            PiiKind::Email,
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
        ),
        (
            PiiKind::Phone,
            Regex::new(r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b")
                .unwrap(),
        ),
    ]
});

/// Mask every recognised value in `text`.
pub fn mask_pii(text: &str, strategy: MaskStrategy) -> Masked {
    let mut result = text.to_string();
    let mut found = Vec::new();

    for (kind, pattern) in DETECTORS.iter() {
        if pattern.is_match(&result) {
            found.push(*kind);
            result = pattern
                .replace_all(&result, |caps: &regex::Captures<'_>| {
                    mask_value(*kind, &caps[0], strategy)
                })
                .into_owned();
        }
    }

    Masked {
        text: result,
        found,
    }
}

/// Mask a single value already known to be of `kind`.
pub fn mask_value(kind: PiiKind, value: &str, strategy: MaskStrategy) -> String {
    match strategy {
        MaskStrategy::Full => format!("[REDACTED:{}]", kind.tag()),
        MaskStrategy::Last4 => last4(value),
    }
}

fn last4(value: &str) -> String {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let len = value.chars().count();
    if digits < 4 || len <= 4 {
        return "*".repeat(len);
    }
    let tail: String = value.chars().skip(len - 4).collect();
    format!("{}{}", "*".repeat(len - 4), tail)
}
