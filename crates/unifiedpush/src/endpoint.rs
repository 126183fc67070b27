//! Endpoint validation.
//!
//! Some distributors hand out a loopback URL as a placeholder before they
//! have a real endpoint. Those are treated like a failed registration.

use url::{Host, Url};

use crate::PushError;

/// Validate an endpoint received from a distributor.
pub fn validate_endpoint(endpoint: &str) -> Result<Url, PushError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(PushError::InvalidEndpoint("empty endpoint".into()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| PushError::InvalidEndpoint(format!("{trimmed}: {e}")))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(PushError::InvalidEndpoint(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }

    if is_placeholder_host(url.host()) {
        return Err(PushError::InvalidEndpoint(format!(
            "placeholder endpoint: {trimmed}"
        )));
    }

    Ok(url)
}

pub fn is_valid_endpoint(endpoint: &str) -> bool {
    validate_endpoint(endpoint).is_ok()
}

fn is_placeholder_host(host: Option<Host<&str>>) -> bool {
    match host {
        None => true,
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.');
            domain.eq_ignore_ascii_case("localhost")
                || domain.to_ascii_lowercase().ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => ip.is_loopback() || ip.is_unspecified(),
        Some(Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_real_endpoints() {
        assert!(is_valid_endpoint("https://ntfy.sh/upAbCdEf?up=1"));
        assert!(is_valid_endpoint(
            "https://push.example.org/_matrix/push/v1/notify"
        ));
        assert!(is_valid_endpoint("http://192.168.1.20:8080/up/xyz"));
    }

    #[test]
    fn rejects_blank() {
        assert!(!is_valid_endpoint(""));
        assert!(!is_valid_endpoint("   "));
    }

    #[test]
    fn rejects_loopback_placeholders() {
        assert!(!is_valid_endpoint("http://127.0.0.1/"));
        assert!(!is_valid_endpoint("http://127.0.0.53:2586/x"));
        assert!(!is_valid_endpoint("http://localhost"));
        assert!(!is_valid_endpoint("http://LOCALHOST:8080/"));
        assert!(!is_valid_endpoint("http://[::1]/"));
        assert!(!is_valid_endpoint("http://0.0.0.0/"));
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(!is_valid_endpoint("mailto:someone@example.org"));
        assert!(!is_valid_endpoint("ftp://example.org/push"));
        assert!(!is_valid_endpoint("not a url"));
    }
}
