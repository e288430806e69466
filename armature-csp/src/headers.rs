//! Response header integration

use crate::error::{CspError, CspResult};
use crate::policy::ContentSecurityPolicy;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use tracing::debug;

/// Destination for an outgoing header.
pub trait HeaderSink {
    /// Set (replace) a header
    fn set_header(&mut self, name: &str, value: &str) -> CspResult<()>;
}

impl HeaderSink for HeaderMap {
    fn set_header(&mut self, name: &str, value: &str) -> CspResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CspError::invalid_argument(format!("header name `{}`: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CspError::invalid_argument(format!("header value: {}", e)))?;
        self.insert(name, value);
        Ok(())
    }
}

impl HeaderSink for HashMap<String, String> {
    fn set_header(&mut self, name: &str, value: &str) -> CspResult<()> {
        self.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

impl ContentSecurityPolicy {
    /// Write the header into `sink`.
    ///
    /// Fails with [`CspError::HeadersAlreadySent`] once headers are
    /// committed. An empty policy writes nothing.
    pub fn send<S: HeaderSink + ?Sized>(&self, sink: &mut S) -> CspResult<()> {
        if self.headers_sent() {
            return Err(CspError::HeadersAlreadySent);
        }
        let value = self.header_value();
        if value.is_empty() {
            return Ok(());
        }
        debug!(header = %self.header_name(), "Sending CSP header");
        sink.set_header(self.header_name(), &value)
    }

    /// Merge the CSP header already present in an `http::HeaderMap`.
    ///
    /// Multiple values under the header name are joined the way a single
    /// combined field would read; the merge is skipped when that combined
    /// line equals the one merged last.
    pub fn merge_header_map(&mut self, headers: &HeaderMap) -> &mut Self {
        let values: Vec<&str> = headers
            .get_all(self.header_name())
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        if values.is_empty() {
            return self;
        }
        let line = format!("{}: {}", self.header_name(), values.join("; "));
        self.merge_sent_headers([line])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::DirectiveSet;
    use crate::guard::CommitFlag;

    #[test]
    fn test_send_to_header_map() {
        let mut csp = ContentSecurityPolicy::new();
        csp.allow_self(DirectiveSet::DEFAULT_SRC).unwrap();

        let mut headers = HeaderMap::new();
        csp.send(&mut headers).unwrap();
        assert_eq!(
            headers.get("content-security-policy").unwrap(),
            "default-src 'self'"
        );
    }

    #[test]
    fn test_send_to_hash_map() {
        let mut csp = ContentSecurityPolicy::new().report_only(true);
        csp.disallow_directive(DirectiveSet::OBJECT_SRC).unwrap();

        let mut headers = HashMap::new();
        csp.send(&mut headers).unwrap();
        assert_eq!(
            headers.get("Content-Security-Policy-Report-Only"),
            Some(&"object-src 'none'".to_string())
        );
    }

    #[test]
    fn test_send_empty_policy_writes_nothing() {
        let mut headers = HashMap::new();
        ContentSecurityPolicy::new().send(&mut headers).unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_send_after_commit_fails() {
        let flag = CommitFlag::new();
        let mut csp = ContentSecurityPolicy::new().with_guard(flag.clone());
        csp.allow_self(DirectiveSet::DEFAULT_SRC).unwrap();
        flag.commit();

        let mut headers = HashMap::new();
        assert!(csp.send(&mut headers).unwrap_err().is_headers_already_sent());
        assert!(headers.is_empty());
    }

    #[test]
    fn test_invalid_header_name() {
        let csp = ContentSecurityPolicy::new().with_header_name("bad header");
        let mut headers = HeaderMap::new();
        assert!(headers.set_header(csp.header_name(), "x").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_merge_header_map() {
        let mut headers = HeaderMap::new();
        headers.append(
            "content-security-policy",
            HeaderValue::from_static("script-src https://a.com"),
        );
        headers.append(
            "content-security-policy",
            HeaderValue::from_static("img-src data:"),
        );

        let mut csp = ContentSecurityPolicy::new();
        csp.merge_header_map(&headers);
        assert_eq!(csp.header_value(), "script-src https://a.com; img-src data:");

        csp.disallow_scheme(DirectiveSet::IMG_SRC, "data:").unwrap();
        csp.merge_header_map(&headers);
        assert_eq!(csp.header_value(), "script-src https://a.com");
    }
}
