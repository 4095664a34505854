use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::key::record_key;

/// Longest site identifier a record column holds.
pub const MAX_SITE_ID_LEN: usize = 128;

/// Identity of a record: the site partition plus the normalized source URL,
/// bounded by [`record_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageRecordKey {
    pub site_id: String,
    pub image_key: String,
}

impl ImageRecordKey {
    /// Derive the key a source URL is stored under for a site.
    pub fn for_source(site_id: &str, source_url: &str) -> Self {
        Self {
            site_id: site_id.to_string(),
            image_key: record_key(source_url),
        }
    }
}

impl fmt::Display for ImageRecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.site_id, self.image_key)
    }
}

/// Metadata linking a source URL to its raw and optimized artifacts.
///
/// Written once, after both artifacts exist, and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub site_id: String,
    pub image_key: String,
    pub source_url: String,
    /// Logical name, may contain `/` separated segments
    pub image_name: String,
    pub raw_location: String,
    pub optimized_location: String,
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn new(
        site_id: &str,
        source_url: &str,
        image_name: &str,
        raw_location: String,
        optimized_location: String,
    ) -> Self {
        Self {
            site_id: site_id.to_string(),
            image_key: record_key(source_url),
            source_url: source_url.to_string(),
            image_name: image_name.to_string(),
            raw_location,
            optimized_location,
            // Microsecond precision survives every supported database column type
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    pub fn key(&self) -> ImageRecordKey {
        ImageRecordKey {
            site_id: self.site_id.clone(),
            image_key: self.image_key.clone(),
        }
    }
}

/// One `get_or_save` invocation, used by the batch API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub site_id: String,
    pub source_url: String,
    pub image_name: String,
}

impl ImageRequest {
    pub fn new<S, U, N>(site_id: S, source_url: U, image_name: N) -> Self
    where
        S: Into<String>,
        U: Into<String>,
        N: Into<String>,
    {
        Self {
            site_id: site_id.into(),
            source_url: source_url.into(),
            image_name: image_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_uses_normalized_source() {
        let record = ImageRecord::new(
            "site-1",
            "My Image!!.png",
            "products/my-image.png",
            "memory://site-1/original/products/my-image.png".to_string(),
            "memory://site-1/aaopt/products/my-image.png".to_string(),
        );

        assert_eq!(record.image_key, "My-Image.png");
        assert_eq!(record.key(), ImageRecordKey::for_source("site-1", "My Image!!.png"));
        assert_eq!(record.key().to_string(), "site-1/My-Image.png");
        assert_eq!(record.created_at.timestamp_subsec_nanos() % 1_000, 0);
    }
}
