//! Utility modules shared by the probes and services

pub mod http_client;
pub mod status_code_matcher;
pub mod url;

pub use http_client::StandardHttpClient;
pub use status_code_matcher::{is_status_acceptable, is_transient_status};
pub use url::UrlUtils;
