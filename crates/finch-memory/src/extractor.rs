// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic fact extraction from conversation text.
//!
//! Pulls vendors, amounts, dates, domains, emails and phone numbers out of
//! message content. Emails and phone numbers are fully masked before they
//! leave this module; only the fact that one was mentioned is kept.

use std::collections::HashSet;
use std::sync::LazyLock;

use finch_core::ChatMessage;
use finch_security::{MaskStrategy, PiiKind, mask_value};
use regex::Regex;

use crate::types::{ExtractedFact, FactKind};

static VENDOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(?i:vendor|merchant|store|shop|from|at)\s+["']?([A-Z][A-Za-z&']+(?:\s+[A-Z][A-Za-z&']+)*)"#,
    )
    .unwrap()
});

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\$\s?(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)|\b(\d+(?:\.\d{1,2})?)\s*(?:dollars?|usd|cad)\b",
    )
    .unwrap()
});

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4})\b").unwrap());

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?\b((?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,})\b")
        .unwrap()
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap()
});

/// Extract facts from a batch of messages.
///
/// Results are deduplicated by kind and normalized value across the whole
/// batch and keep first-seen order.
pub fn extract_facts(messages: &[ChatMessage]) -> Vec<ExtractedFact> {
    let mut facts = Vec::new();
    let mut seen = HashSet::new();

    let mut push = |kind: FactKind, key: String, value: String| {
        if seen.insert((kind, key)) {
            facts.push(ExtractedFact::new(kind, value));
        }
    };

    for message in messages {
        let content = message.content.as_str();

        for caps in VENDOR.captures_iter(content) {
            let vendor = caps[1].trim().to_string();
            push(FactKind::Vendor, vendor.to_lowercase(), vendor);
        }

        for caps in AMOUNT.captures_iter(content) {
            if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
                let amount = m.as_str().replace(',', "");
                push(FactKind::Amount, amount.clone(), amount);
            }
        }

        for caps in DATE.captures_iter(content) {
            let date = caps[1].to_string();
            push(FactKind::Date, date.clone(), date);
        }

        // Domains are looked for after emails are cut out, so `jo@bank.com`
        // does not also report `bank.com`.
        let without_emails = EMAIL.replace_all(content, " ");
        for caps in DOMAIN.captures_iter(&without_emails) {
            let domain = caps[1].to_string();
            push(FactKind::Domain, domain.to_lowercase(), domain);
        }

        for m in EMAIL.find_iter(content) {
            push(
                FactKind::Email,
                m.as_str().to_lowercase(),
                mask_value(PiiKind::Email, m.as_str(), MaskStrategy::Full),
            );
        }

        for m in PHONE.find_iter(&without_emails) {
            let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
            push(
                FactKind::Phone,
                digits,
                mask_value(PiiKind::Phone, m.as_str(), MaskStrategy::Full),
            );
        }
    }

    facts
}
