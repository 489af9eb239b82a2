/// Storage path generation for uploaded documents
///
/// Every uploaded file gets a fresh relative path under `documents/`, built from
/// the upload instant, a short random token and the (sanitized) original name:
///
/// ```text
/// documents/2025/01/03/20250103142501_9f3a01c2_report.pdf
/// documents/2025/01/03/20250103142501_5be07d19          (extension-less upload)
/// ```
///
/// Paths are never derived from anything the client controls beyond the final
/// filename component, so an upload cannot escape the `documents/` tree.
///
/// # Example
///
/// ```
/// use folio_shared::files::path::generate_storage_path;
///
/// let path = generate_storage_path("report.pdf");
/// assert!(path.starts_with("documents/"));
/// assert!(path.ends_with("_report.pdf"));
/// ```

use chrono::{DateTime, Utc};
use rand::Rng;

/// Root directory for all document uploads
pub const DOCUMENTS_ROOT: &str = "documents";

/// Number of random bytes in the path token (rendered as 8 hex chars)
const TOKEN_BYTES: usize = 4;

/// Longest filename component most filesystems accept
const MAX_COMPONENT_BYTES: usize = 255;

/// Room left for the sanitized name after `<14-digit timestamp>_<8 hex>_`
pub const MAX_SANITIZED_NAME_BYTES: usize = MAX_COMPONENT_BYTES - (14 + 1 + TOKEN_BYTES * 2 + 1);

/// Generates a storage path for an upload using the current time and thread RNG
pub fn generate_storage_path(original_file_name: &str) -> String {
    generate_storage_path_at(original_file_name, Utc::now(), &mut rand::thread_rng())
}

/// Generates a storage path for an explicit instant and random source
///
/// Calling this twice with the same inputs and a reseeded RNG yields the same
/// path; the public entry point feeds it the clock and thread RNG.
pub fn generate_storage_path_at<R: Rng>(
    original_file_name: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> String {
    let token: [u8; TOKEN_BYTES] = rng.gen();
    let timestamp = now.format("%Y%m%d%H%M%S");
    let directory = now.format("%Y/%m/%d");

    let safe_name = sanitize_file_name(original_file_name);
    let file_name = match extension(&safe_name) {
        Some(_) => format!("{}_{}_{}", timestamp, hex::encode(token), safe_name),
        None => format!("{}_{}", timestamp, hex::encode(token)),
    };

    format!("{}/{}/{}", DOCUMENTS_ROOT, directory, file_name)
}

/// Returns the extension after the last `.`, if there is a non-empty one
///
/// Dotfiles such as `.env` have no extension.
pub fn extension(file_name: &str) -> Option<&str> {
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == file_name.len() => None,
        Some(idx) => Some(&file_name[idx + 1..]),
    }
}

/// Reduces a client-supplied filename to a safe single path component
///
/// Keeps only the last component after any `/` or `\`, replaces characters
/// outside `[A-Za-z0-9._-]` with `_` and collapses leading dots. Long names
/// lose the end of their stem so the generated component fits the filesystem;
/// the extension is kept.
pub fn sanitize_file_name(original: &str) -> String {
    let last = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    let safe = if trimmed.is_empty() {
        "upload".to_string()
    } else if trimmed.len() < cleaned.len() {
        // `..hidden.txt` and friends keep a single leading underscore marker
        format!("_{}", trimmed)
    } else {
        cleaned
    };

    shorten(safe, MAX_SANITIZED_NAME_BYTES)
}

/// Cuts the stem of an ASCII name so the whole name fits in `limit` bytes
fn shorten(mut name: String, limit: usize) -> String {
    if name.len() <= limit {
        return name;
    }

    match extension(&name).map(str::len) {
        // Keep at least one stem character in front of `.ext`
        Some(ext_len) if ext_len + 2 <= limit => {
            let ext_start = name.len() - ext_len - 1;
            let stem_len = limit - ext_len - 1;
            name.replace_range(stem_len..ext_start, "");
            name
        }
        _ => {
            name.truncate(limit);
            name
        }
    }
}
