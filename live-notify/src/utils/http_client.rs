use std::{sync::OnceLock, time::Duration};

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::{Error, Result};

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Build the shared `reqwest::Client` used for status queries and sends.
///
/// Every request made through the client is bounded by `request_timeout`,
/// which must be non-zero.
pub fn build_client(request_timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    install_rustls_provider();

    if request_timeout.is_zero() {
        return Err(Error::config("HTTP request timeout must be greater than 0"));
    }

    let mut builder = reqwest::Client::builder().timeout(request_timeout);

    match HeaderValue::from_str(user_agent) {
        Ok(value) => builder = builder.user_agent(value),
        Err(error) => warn!(error = %error, "Invalid user agent; using reqwest default"),
    }

    builder
        .build()
        .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))
}

/// Convert `(name, value)` pairs into a `HeaderMap`, skipping invalid entries.
pub fn header_map(pairs: &[(&'static str, &str)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(*name, value);
            }
            Err(e) => debug!(header = %name, error = %e, "Invalid header value; skipping"),
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(5), "live-notify/test").is_ok());
        assert!(matches!(
            build_client(Duration::ZERO, "live-notify/test"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_header_map_skips_invalid_values() {
        let headers = header_map(&[("referer", "https://live.bilibili.com/"), ("x-bad", "a\nb")]);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["referer"], "https://live.bilibili.com/");
    }
}
