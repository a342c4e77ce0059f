// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scrubbing of free-text fields before they are interpolated into
//! notification content.
//!
//! This is not an HTML sanitizer. It strips angle brackets, `javascript:`
//! scheme markers and inline `on*=` handler attributes, which is enough for
//! text that ends up inside a fixed mail template.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript\s*:").expect("valid regex"));

static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bon[a-z]+\s*=").expect("valid regex"));

/// Remove markup-injection vectors from a free-text value and trim it.
pub fn sanitize_text(input: &str) -> String {
    let mut s: String = input.chars().filter(|c| !matches!(c, '<' | '>')).collect();

    // Removing one match can splice a new one together ("javajavascript:script:").
    loop {
        let next = EVENT_HANDLER
            .replace_all(&SCRIPT_SCHEME.replace_all(&s, ""), "")
            .into_owned();
        if next == s {
            break;
        }
        s = next;
    }

    s.trim().to_string()
}
