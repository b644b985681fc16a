//! Metadata filename resolution
//!
//! Derives, from a batch job's filename pattern, the one container file
//! the batch run fetches. This is deliberately not a general pattern
//! matcher: a pattern of the form `<jobId>-metadata-<digits>.<ext>`
//! always resolves to the first metadata file,
//! `<jobId>-metadata-1.<ext>`, and a pattern without the `metadata-`
//! marker is ineligible for remote batch execution. Multi-file metadata
//! sets are therefore only ever partially processed; dependents rely on
//! this narrow contract.

/// Marker a pattern must contain to be eligible for batch resolution
const METADATA_MARKER: &str = "metadata-";

/// Extension used when a pattern carries none
const DEFAULT_EXTENSION: &str = "warc";

/// Resolves a filename pattern to the canonical first metadata file
///
/// Returns `None` when the pattern does not name metadata files.
///
/// The canonical extension is the pattern text after its last `.` with
/// regex optional groups `(x)?` removed, so `7-metadata-[0-9]+.(w)?arc`
/// resolves to `7-metadata-1.arc`. No other regex construct is
/// interpreted.
pub fn resolve_metadata_name(pattern: &str) -> Option<String> {
    if !pattern.contains(METADATA_MARKER) {
        return None;
    }
    // With `22-metadata-[0-9]+.(w)?arc` the leading token is the job id, `22`.
    let job_id = pattern.split('-').next().unwrap_or_default();
    let extension = canonical_extension(pattern);
    Some(format!("{job_id}-metadata-1.{extension}"))
}

fn canonical_extension(pattern: &str) -> String {
    match pattern.rsplit_once('.') {
        Some((_, tail)) => strip_optional_groups(tail),
        None => DEFAULT_EXTENSION.to_string(),
    }
}

/// Removes `(x)?` optional groups, the one regex construct metadata
/// patterns use in their extension part
fn strip_optional_groups(extension: &str) -> String {
    let mut out = String::with_capacity(extension.len());
    let mut rest = extension;
    while let Some(open) = rest.find('(') {
        let group_is_optional = rest[open..]
            .find(')')
            .map(|close_rel| open + close_rel)
            .filter(|close| rest[close + 1..].starts_with('?'));
        match group_is_optional {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[close + 2..];
            }
            None => {
                // A '(' without a matching ')?' is kept verbatim
                out.push_str(&rest[..=open]);
                rest = &rest[open + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
