//! Deterministic rendering of a release list for the model prompt.
//!
//! Pure computation, no I/O. Releases are numbered 1-based in their original
//! payload order; the model answers with one of these numbers, so the
//! numbering here and the engine's indexing must never diverge.

use crate::models::Release;

/// Rendered when the formatter is handed zero releases. The decision policy
/// short-circuits on an empty list before reaching this module.
pub const NO_RELEASES_SENTINEL: &str = "No releases available.";

/// Marker line appended to releases the manager flagged as its own pick.
pub const DEFAULT_MARKER: &str = "MANAGER PREFERRED";

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Size in gigabytes (bytes / 1024^3).
pub fn size_gb(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// Size rendered with two-decimal precision, e.g. `10.00`.
pub fn format_size_gb(bytes: u64) -> String {
    format!("{:.2}", size_gb(bytes))
}

/// Age bucketed as minutes, hours or days, always integer-truncated:
/// `59m`, `1h`, `23h`, `1d`.
pub fn format_age(age_minutes: f64) -> String {
    let minutes = age_minutes.max(0.0);
    if minutes < 60.0 {
        format!("{}m", minutes as u64)
    } else if minutes < 1440.0 {
        format!("{}h", (minutes / 60.0) as u64)
    } else {
        format!("{}d", (minutes / 1440.0) as u64)
    }
}

fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

/// Render the release list plus media title into the prompt body.
///
/// One paragraph per release: title, size, quality, indexer, seeders,
/// custom-format score with explicit sign, bucketed age, languages
/// (`Unknown` when empty), custom formats (`None` when empty), indexer
/// flags as a bracketed list only when present, and the default marker on
/// every release the manager flagged.
pub fn format_releases(releases: &[Release], media_title: &str) -> String {
    if releases.is_empty() {
        return NO_RELEASES_SENTINEL.to_string();
    }

    let mut out = format!(
        "Available releases for '{}' ({} total):\n",
        media_title,
        releases.len()
    );

    for (i, release) in releases.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("{}. {}\n", i + 1, release.title));
        out.push_str(&format!(
            "   Size: {} GB | Quality: {} | Indexer: {}\n",
            format_size_gb(release.size),
            release.quality,
            release.indexer
        ));
        out.push_str(&format!(
            "   Seeders: {} | CF Score: {:+} | Age: {}\n",
            release.seeders,
            release.custom_format_score,
            format_age(release.age_minutes)
        ));
        out.push_str(&format!(
            "   Languages: {}\n",
            join_or(&release.languages, "Unknown")
        ));
        out.push_str(&format!(
            "   Custom Formats: {}",
            join_or(&release.custom_formats, "None")
        ));
        if !release.indexer_flags.is_empty() {
            out.push_str(&format!(" Flags: [{}]", release.indexer_flags.join(", ")));
        }
        out.push('\n');
        if release.is_selected {
            out.push_str(&format!("   {}\n", DEFAULT_MARKER));
        }
    }

    out
}
