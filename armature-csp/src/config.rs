//! CSP configuration
//!
//! Policies assembled at startup can be declared in JSON:
//!
//! ```json
//! {
//!   "report_only": false,
//!   "directives": [
//!     { "name": "default-src", "sources": ["'self'"] },
//!     { "name": "object-src", "sources": ["'none'"] }
//!   ]
//! }
//! ```

use crate::directive::Directive;
use crate::error::{CspError, CspResult};
use crate::policy::{ContentSecurityPolicy, HEADER_NAME, REPORT_ONLY_HEADER_NAME};
use crate::source::NONE;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sources configured for one directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveConfig {
    /// Directive wire name, e.g. `script-src`
    pub name: String,
    /// Source expressions; `["'none'"]` blocks the directive
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Content Security Policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CspConfig {
    /// Header name used when `report_only` is off
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// Report violations only (doesn't enforce)
    #[serde(default)]
    pub report_only: bool,

    /// Directives, in header order
    #[serde(default)]
    pub directives: Vec<DirectiveConfig>,
}

fn default_header_name() -> String {
    HEADER_NAME.to_string()
}

impl CspConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self {
            header_name: default_header_name(),
            report_only: false,
            directives: Vec::new(),
        }
    }

    /// Load a configuration from JSON
    pub fn from_json_str(json: &str) -> CspResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add a directive
    pub fn with_directive<I, S>(mut self, name: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directives.push(DirectiveConfig {
            name: name.into(),
            sources: sources.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Set the header name
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Enable report-only mode
    pub fn with_report_only(mut self, enabled: bool) -> Self {
        self.report_only = enabled;
        self
    }

    /// Effective header name
    pub fn effective_header_name(&self) -> &str {
        if self.report_only {
            REPORT_ONLY_HEADER_NAME
        } else {
            &self.header_name
        }
    }

    /// Build a policy from this configuration.
    ///
    /// Unlike parsed headers, configuration is authored locally, so unknown
    /// directive names are reported instead of skipped.
    pub fn build(&self) -> CspResult<ContentSecurityPolicy> {
        let mut policy =
            ContentSecurityPolicy::new().with_header_name(self.effective_header_name());

        for entry in &self.directives {
            let directive = Directive::from_name(&entry.name).ok_or_else(|| {
                CspError::config(format!("Unknown CSP directive: `{}`", entry.name))
            })?;
            if entry.sources.iter().any(|source| source == NONE) {
                policy.disallow_directive(directive.selector())?;
            } else {
                policy.allow_hosts(directive.selector(), &entry.sources)?;
            }
        }

        debug!(
            header = %policy.header_name(),
            directives = self.directives.len(),
            "Built CSP from configuration"
        );
        Ok(policy)
    }
}

impl Default for CspConfig {
    fn default() -> Self {
        Self::new()
            .with_directive("default-src", ["'self'"])
            .with_directive("script-src", ["'self'"])
            .with_directive("style-src", ["'self'", "'unsafe-inline'"])
            .with_directive("img-src", ["'self'", "data:", "https:"])
            .with_directive("font-src", ["'self'"])
            .with_directive("connect-src", ["'self'"])
            .with_directive("object-src", ["'none'"])
    }
}
