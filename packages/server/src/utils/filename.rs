use chrono::Utc;
use common::storage::MAX_NAME_LEN;
use rand::Rng;
use rand::distr::Alphanumeric;

const SALT_LEN: usize = 6;

/// Longest prefix an upload can receive: 13 millisecond digits, the salt and
/// two dashes.
const MAX_PREFIX_LEN: usize = 13 + 1 + SALT_LEN + 1;

/// Longest original filename that still fits in a blob name once prefixed.
pub const MAX_ORIGINAL_LEN: usize = MAX_NAME_LEN - MAX_PREFIX_LEN;

/// Blob name for a fresh upload: `{unix_millis}-{original}`.
pub fn upload_blob_name(original: &str) -> String {
    timestamped_name(original, Utc::now().timestamp_millis())
}

pub fn timestamped_name(original: &str, millis: i64) -> String {
    format!("{millis}-{original}")
}

/// Fallback used when the plain timestamped name is already taken:
/// `{unix_millis}-{6 random alphanumerics}-{original}`.
pub fn salted_blob_name(original: &str) -> String {
    let salt: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect();
    format!("{}-{salt}-{original}", Utc::now().timestamp_millis())
}

/// Build a safe `Content-Disposition: attachment` header value.
pub fn attachment_disposition(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
