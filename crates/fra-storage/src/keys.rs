//! Storage key generation.
//!
//! Key format: `{stem}-{unix millis}-{sequence}-{random hex}{extension}`. The process-wide
//! sequence makes keys unique within a process; time plus randomness keeps keys from separate
//! processes sharing a storage root apart. Nothing here touches the filesystem.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

const MAX_STEM_LEN: usize = 100;
const MAX_EXTENSION_LEN: usize = 16;
const FALLBACK_STEM: &str = "file";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a storage key for a file accepted at `accepted_at`.
pub fn generate_storage_key(original_name: &str, accepted_at: DateTime<Utc>) -> String {
    let (stem, extension) = split_name(original_name);
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let nonce: u32 = rand::random();

    format!(
        "{}-{}-{}-{:08x}{}",
        sanitize_stem(stem),
        accepted_at.timestamp_millis(),
        sequence,
        nonce,
        sanitize_extension(extension)
    )
}

/// Split the last path component of `name` into stem and extension (with its dot).
/// Both `/` and `\` count as separators since browsers on either platform may send full paths.
fn split_name(name: &str) -> (&str, &str) {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(idx) if idx > 0 => (&base[..idx], &base[idx..]),
        _ => (base, ""),
    }
}

fn sanitize_stem(stem: &str) -> String {
    let mut cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", ".");
    }

    let trimmed = cleaned.trim_start_matches(['.', '-']);
    let capped: String = trimmed.chars().take(MAX_STEM_LEN).collect();

    if capped.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        capped
    }
}

fn sanitize_extension(extension: &str) -> String {
    let body: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXTENSION_LEN)
        .collect();

    if body.is_empty() {
        String::new()
    } else {
        format!(".{}", body)
    }
}
