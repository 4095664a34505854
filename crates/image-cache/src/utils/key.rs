//! Storage key derivation for source URLs.

use sha2::{Digest, Sha256};

/// Longest image key a record column holds.
pub const MAX_IMAGE_KEY_LEN: usize = 512;

/// Hex SHA-256 digest plus its `-` separator
const DIGEST_SUFFIX_LEN: usize = 65;

/// Turn an arbitrary string into a storage-safe key.
///
/// Keeps ASCII letters, digits, `.`, spaces and `-`. Every run of spaces and
/// hyphens becomes a single `-`, and leading or trailing hyphens are dropped.
/// Other characters are removed without acting as separators, so
/// `"My Image!!.png"` becomes `"My-Image.png"`.
///
/// The result is used verbatim as a record key; an empty result is a valid key.
pub fn normalize(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.chars() {
        match c {
            ' ' | '-' => pending_separator = true,
            c if c.is_ascii_alphanumeric() || c == '.' => {
                if pending_separator && !key.is_empty() {
                    key.push('-');
                }
                pending_separator = false;
                key.push(c);
            }
            _ => {}
        }
    }

    key
}

/// Record key for a source URL: [`normalize`] bounded to
/// [`MAX_IMAGE_KEY_LEN`].
///
/// Keys that fit are the normalized URL itself. Longer keys keep their first
/// `MAX_IMAGE_KEY_LEN - 65` characters followed by `-` and the hex SHA-256 of
/// the whole normalized key, so two long URLs sharing a prefix stay distinct.
pub fn record_key(source_url: &str) -> String {
    let key = normalize(source_url);
    if key.len() <= MAX_IMAGE_KEY_LEN {
        return key;
    }

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();

    // normalized keys are ASCII, so any byte offset is a char boundary
    let prefix = key[..MAX_IMAGE_KEY_LEN - DIGEST_SUFFIX_LEN].trim_end_matches('-');
    format!("{prefix}-{digest:x}")
}
