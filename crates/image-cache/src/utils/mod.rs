pub mod http_client;
pub mod key;
pub mod url;

pub use http_client::{HttpDownloader, StandardHttpClient};
pub use key::{MAX_IMAGE_KEY_LEN, normalize, record_key};
pub use url::UrlUtils;
