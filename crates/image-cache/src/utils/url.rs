//! URL helpers

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Query parameters whose values never reach a log line
const SENSITIVE_PARAMS: [&str; 11] = [
    "username", "password", "user", "pass", "pwd", "token", "api_key", "apikey", "key",
    "signature", "sig",
];

static SENSITIVE_PARAM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SENSITIVE_PARAMS
        .iter()
        .filter_map(|param| {
            Regex::new(&format!(r"(?i)([?&]{}=)[^&]*", regex::escape(param))).ok()
        })
        .collect()
});

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Obfuscate credentials in a URL before it reaches a log line.
    ///
    /// Masks `user:pass@` authority credentials and the values of common
    /// secret query parameters.
    ///
    /// ```rust
    /// use image_cache::utils::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::obfuscate_credentials("https://cdn.example.com/a.png?token=abc&w=10"),
    ///     "https://cdn.example.com/a.png?token=****&w=10"
    /// );
    /// ```
    pub fn obfuscate_credentials(url: &str) -> String {
        let mut obfuscated = url.to_string();

        if let Ok(parsed) = Url::parse(url)
            && (!parsed.username().is_empty() || parsed.password().is_some())
        {
            let mut masked = parsed.clone();
            let _ = masked.set_username("****");
            let _ = masked.set_password(Some("****"));
            obfuscated = masked.to_string();
        }

        for re in SENSITIVE_PARAM_PATTERNS.iter() {
            obfuscated = re.replace_all(&obfuscated, "${1}****").into_owned();
        }

        obfuscated
    }

    /// Join an endpoint base with a relative path, tolerating a missing or
    /// extra trailing slash on the base.
    pub fn join(base: &str, path: &str) -> Result<Url, url::ParseError> {
        let mut base_url = Url::parse(base)?;
        if !base_url.path().ends_with('/') {
            let with_slash = format!("{}/", base_url.path());
            base_url.set_path(&with_slash);
        }
        base_url.join(path.trim_start_matches('/'))
    }

    /// `file://` URL for an absolute filesystem path.
    pub fn file_url(path: &std::path::Path) -> Option<String> {
        Url::from_file_path(path).ok().map(|u| u.to_string())
    }
}
