// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data protection for the Finch memory pipeline: PII masking of user text
//! before it is persisted, and secret scrubbing for logs and error bodies.

pub mod pii;
pub mod redact;

pub use pii::{MaskStrategy, Masked, PiiKind, mask_pii, mask_value};
pub use redact::{RedactingWriter, redact, register_secret};
