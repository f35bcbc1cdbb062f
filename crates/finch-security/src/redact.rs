// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret scrubbing for log output and provider error bodies.
//!
//! Known key formats are caught by pattern; secrets loaded at runtime (the
//! configured API key) are caught by exact match.

use std::io::Write;
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;

static SECRET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // OpenAI project and service keys: sk-proj-..., sk-svcacct-...
        Regex::new(r"sk-(?:proj|svcacct)-[A-Za-z0-9_\-]{20,}").unwrap(),
        // Legacy OpenAI-style keys
        Regex::new(r"sk-[A-Za-z0-9]{20,}").unwrap(),
        Regex::new(r"Bearer\s+[A-Za-z0-9._\-]{10,}").unwrap(),
        // "api_key": "..." in echoed request bodies
        Regex::new(r#""api_key"\s*:\s*"[^"]+""#).unwrap(),
    ]
});

const REDACTED: &str = "[REDACTED]";

/// Replace secrets in `input` with `[REDACTED]`.
///
/// `known_secrets` are matched verbatim, longest first.
pub fn redact(input: &str, known_secrets: &[String]) -> String {
    let mut result = input.to_string();

    for pattern in SECRET_PATTERNS.iter() {
        result = pattern.replace_all(&result, REDACTED).into_owned();
    }

    let mut secrets: Vec<&String> = known_secrets.iter().filter(|s| !s.is_empty()).collect();
    secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
    for secret in secrets {
        result = result.replace(secret.as_str(), REDACTED);
    }

    result
}

/// `Write` adapter that scrubs everything passing through it.
///
/// Used as the log writer so secrets never reach stderr.
pub struct RedactingWriter<W> {
    inner: W,
    known_secrets: Arc<RwLock<Vec<String>>>,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W, known_secrets: Arc<RwLock<Vec<String>>>) -> Self {
        Self {
            inner,
            known_secrets,
        }
    }
}

/// Register a runtime secret for exact-match scrubbing. Repeats are ignored.
pub fn register_secret(known_secrets: &Arc<RwLock<Vec<String>>>, secret: String) {
    if secret.is_empty() {
        return;
    }
    if let Ok(mut secrets) = known_secrets.write()
        && !secrets.contains(&secret)
    {
        secrets.push(secret);
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let input = String::from_utf8_lossy(buf);
        let secrets = self
            .known_secrets
            .read()
            .map(|s| s.clone())
            .unwrap_or_default();
        self.inner.write_all(redact(&input, &secrets).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_keys_are_scrubbed() {
        let out = redact("using sk-proj-AbCdEfGhIjKlMnOpQrStUvWx_yz", &[]);
        assert_eq!(out, "using [REDACTED]");
    }

    #[test]
    fn bearer_header_is_scrubbed() {
        let out = redact("Authorization: Bearer abc.def.ghi-jkl", &[]);
        assert!(!out.contains("abc.def"));
    }

    #[test]
    fn echoed_api_key_field_is_scrubbed() {
        let out = redact(r#"{"error":"bad","api_key":"hunter2"}"#, &[]);
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn known_secret_is_matched_longest_first() {
        let secrets = vec!["tok".to_string(), "tok-extended".to_string()];
        assert_eq!(redact("x tok-extended y", &secrets), "x [REDACTED] y");
    }

    #[test]
    fn ordinary_text_passes_through() {
        let text = "rate limit window incremented user_id=u1 count=3";
        assert_eq!(redact(text, &[]), text);
    }

    #[test]
    fn writer_scrubs_registered_secret() {
        let secrets = Arc::new(RwLock::new(Vec::new()));
        register_secret(&secrets, "local-secret-value".to_string());
        register_secret(&secrets, "local-secret-value".to_string());
        assert_eq!(secrets.read().unwrap().len(), 1);

        let mut buf = Vec::new();
        {
            let mut writer = RedactingWriter::new(&mut buf, secrets);
            write!(writer, "key=local-secret-value done").unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "key=[REDACTED] done");
    }
}
