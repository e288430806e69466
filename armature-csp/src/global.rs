//! Process-wide default policy
//!
//! The default is installed once at startup, before requests are served, and
//! is read-only afterwards. Each response starts from its own copy through
//! [`ContentSecurityPolicy::for_response`], so per-request mutations and
//! nonces never leak between requests.

use crate::directive::Directive;
use crate::error::{CspError, CspResult};
use crate::policy::{ContentSecurityPolicy, DirectiveState};
use once_cell::sync::OnceCell;
use tracing::debug;

struct DefaultPolicy {
    header_name: String,
    directives: Vec<(Directive, DirectiveState)>,
}

static DEFAULT_POLICY: OnceCell<DefaultPolicy> = OnceCell::new();

/// Install the process-wide default policy.
///
/// Only the header name and directives are kept; the nonce and guard stay
/// with each response. Fails if a default is already installed.
pub fn install_default(policy: &ContentSecurityPolicy) -> CspResult<()> {
    let snapshot = DefaultPolicy {
        header_name: policy.header_name().to_string(),
        directives: policy
            .directives()
            .map(|(directive, state)| (directive, state.clone()))
            .collect(),
    };
    DEFAULT_POLICY
        .set(snapshot)
        .map_err(|_| CspError::config("Default CSP is already installed"))?;
    debug!(header = %policy.header_value(), "Installed default CSP");
    Ok(())
}

/// Header value of the installed default policy, if any
pub fn default_header_value() -> Option<String> {
    DEFAULT_POLICY.get().map(|default| {
        crate::codec::render(
            default
                .directives
                .iter()
                .map(|(directive, state)| (*directive, state)),
        )
    })
}

impl ContentSecurityPolicy {
    /// Policy for a new response: a copy of the installed default (or an
    /// empty policy), with its own nonce and a never-sent guard.
    pub fn for_response() -> Self {
        let Some(default) = DEFAULT_POLICY.get() else {
            return Self::new();
        };
        let mut policy = Self::new().with_header_name(default.header_name.clone());
        for (directive, state) in &default.directives {
            policy.restore_state(*directive, state.clone());
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::DirectiveSet;

    // The default is process-wide, so everything touching it lives in one test.
    #[test]
    fn test_default_policy_lifecycle() {
        let mut base = ContentSecurityPolicy::new();
        base.allow_self(DirectiveSet::DEFAULT_SRC)
            .unwrap()
            .disallow_directive(DirectiveSet::OBJECT_SRC)
            .unwrap();

        install_default(&base).unwrap();
        assert!(install_default(&ContentSecurityPolicy::new()).is_err());
        assert_eq!(
            default_header_value().as_deref(),
            Some("default-src 'self'; object-src 'none'")
        );

        let mut first = ContentSecurityPolicy::for_response();
        let second = ContentSecurityPolicy::for_response();
        first.allow_nonce(DirectiveSet::SCRIPT_SRC).unwrap();

        assert_ne!(first.nonce(), second.nonce());
        assert_eq!(second.header_value(), "default-src 'self'; object-src 'none'");
        assert!(first.header_value().starts_with("default-src 'self'; object-src 'none'; script-src 'nonce-"));
    }
}
