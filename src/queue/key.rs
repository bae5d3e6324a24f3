//! Queue key derivation

use tracing::debug;

use crate::options::CallOptions;

/// Key used when `type` is "fetch" but no URL is given
pub const FETCH_FALLBACK_KEY: &str = "url";

/// Key used when nothing else identifies the destination
pub const DEFAULT_KEY: &str = "default";

/// Derive the queue key for a call
///
/// Priority: `name`, then `url` when `type` is "fetch", then `type`, then
/// `url`, then "default". An explicitly empty field yields an empty key,
/// which the queue rejects.
pub fn job_key(options: &CallOptions) -> String {
    let key = if let Some(name) = &options.name {
        name.clone()
    } else if let Some(kind) = &options.kind {
        if kind.eq_ignore_ascii_case("fetch") {
            match options.url.as_deref() {
                Some(url) if !url.is_empty() => url.to_string(),
                _ => FETCH_FALLBACK_KEY.to_string(),
            }
        } else {
            kind.clone()
        }
    } else if let Some(url) = &options.url {
        url.clone()
    } else {
        DEFAULT_KEY.to_string()
    };

    debug!(%key, "job_key: derived");
    key
}
