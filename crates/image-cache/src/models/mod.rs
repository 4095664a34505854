//! Domain value types

pub mod image_record;

pub use image_record::{ImageRecord, ImageRecordKey, ImageRequest, MAX_SITE_ID_LEN};
