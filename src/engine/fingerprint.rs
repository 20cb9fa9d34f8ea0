// * Signal fingerprinting
// * A 64-bit hash over the SEO-relevant signals, compared between scheduled runs.

use xxhash_rust::xxh64::xxh64;

use crate::refinery::signals::PageSignals;

// * Social keys that belong in the fingerprint; the rest are cosmetic.
const FINGERPRINT_SOCIAL_KEYS: [&str; 4] = ["og:title", "og:description", "og:image", "twitter:card"];

// * Canonical string: stable field order, explicit separators.
fn to_canonical_string(signals: &PageSignals) -> String {
    let h1s = signals
        .headings
        .get("h1")
        .map(|h| h.join("|"))
        .unwrap_or_default();
    let social = FINGERPRINT_SOCIAL_KEYS
        .iter()
        .map(|k| signals.social_meta.get(*k).map(String::as_str).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("|");

    format!(
        "t:{};d:{};h1:{};c:{};s:{};ld:{}",
        signals.title,
        signals.meta_description,
        h1s,
        signals.canonical_url.as_deref().unwrap_or(""),
        social,
        signals.structured_data_blocks.len()
    )
}

pub fn compute_signal_fingerprint(signals: &PageSignals) -> u64 {
    xxh64(to_canonical_string(signals).as_bytes(), 0)
}

// * Checks whether signals changed between runs
pub fn has_signals_changed(new_fingerprint: u64, previous_fingerprint: u64) -> bool {
    new_fingerprint != previous_fingerprint
}
