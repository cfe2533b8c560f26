// src/utils/log.rs

//! Logging helpers on top of the `log` facade.
//!
//! The library only emits records; the binary chooses the backend.

use crate::pipeline::PassSummary;

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
}

/// Log the counters of one finished pass.
pub fn pass_summary(title: &str, pass: &PassSummary) {
    let cursor = pass
        .cursor
        .map(|c| c.to_rfc3339())
        .unwrap_or_else(|| "unset".to_string());

    summary(
        title,
        &[
            ("Window", format!("({}, {}]", pass.min_commit_timestamp.to_rfc3339(), pass.max_commit_timestamp.to_rfc3339())),
            ("Pages", format!("{}/{}", pass.pages_processed, pass.pages_selected)),
            ("Details", pass.details_processed.to_string()),
            ("Deletes", pass.deletes_processed.to_string()),
            ("Cursor", cursor),
        ],
    );
}
