//! Content-Security-Policy builder
//!
//! A [`ContentSecurityPolicy`] belongs to one HTTP response: it is created
//! fresh, mutated while the request is handled and rendered once when the
//! headers go out. It is not `Sync` and is not meant to be shared between
//! in-flight requests; see [`crate::global`] for a process-wide template.

use crate::codec::{self, ParsedSources};
use crate::directive::{Directive, DirectiveSet};
use crate::error::{CspError, CspResult};
use crate::guard::{HeadersSentGuard, NeverSent};
use crate::nonce::generate_nonce;
use crate::source::{
    self, HashAlgorithm, NONE, SELF, STRICT_DYNAMIC, UNSAFE_EVAL, UNSAFE_HASHES, UNSAFE_INLINE,
};
use indexmap::{IndexMap, IndexSet};
use once_cell::unsync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Default header name
pub const HEADER_NAME: &str = "Content-Security-Policy";

/// Header name for report-only policies
pub const REPORT_ONLY_HEADER_NAME: &str = "Content-Security-Policy-Report-Only";

static UNSET: DirectiveState = DirectiveState::Unset;

/// Configured state of one directive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DirectiveState {
    /// Not configured; omitted from the header
    #[default]
    Unset,
    /// Explicit `'none'`
    None,
    /// Allowed sources, unique, in the order first added
    Allow(IndexSet<String>),
}

impl DirectiveState {
    /// Whether the directive is omitted from the header
    pub fn is_unset(&self) -> bool {
        matches!(self, DirectiveState::Unset)
    }

    /// Whether the directive is explicitly `'none'`
    pub fn is_none(&self) -> bool {
        matches!(self, DirectiveState::None)
    }

    /// Whether `token` is among the allowed sources
    pub fn allows(&self, token: &str) -> bool {
        match self {
            DirectiveState::Allow(tokens) => tokens.contains(token),
            _ => false,
        }
    }

    /// Allowed sources in insertion order (empty unless `Allow`)
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        let tokens = match self {
            DirectiveState::Allow(tokens) => Some(tokens),
            _ => None,
        };
        tokens.into_iter().flatten().map(String::as_str)
    }
}

/// Builder for a `Content-Security-Policy` header.
///
/// # Example
///
/// ```
/// use armature_csp::{ContentSecurityPolicy, DirectiveSet};
///
/// let mut csp = ContentSecurityPolicy::new();
/// csp.allow_self(DirectiveSet::SCRIPT_SRC)?
///     .allow_hosts(DirectiveSet::SCRIPT_SRC, ["https://cdn.example.com"])?;
///
/// assert_eq!(csp.header_value(), "script-src 'self' https://cdn.example.com");
/// # Ok::<(), armature_csp::CspError>(())
/// ```
#[derive(Clone)]
pub struct ContentSecurityPolicy {
    /// Configured directives in the order they became set; never holds `Unset`
    directives: IndexMap<Directive, DirectiveState>,
    nonce: OnceCell<String>,
    header_name: String,
    last_parsed_header: Option<String>,
    guard: Arc<dyn HeadersSentGuard>,
}

impl ContentSecurityPolicy {
    /// Create an empty policy whose headers are never considered sent
    pub fn new() -> Self {
        Self {
            directives: IndexMap::new(),
            nonce: OnceCell::new(),
            header_name: HEADER_NAME.to_string(),
            last_parsed_header: None,
            guard: Arc::new(NeverSent),
        }
    }

    /// Create a policy from an existing header value
    pub fn parse(header_value: &str) -> Self {
        let mut policy = Self::new();
        policy.merge_header_value(header_value);
        policy
    }

    /// Set the headers-sent guard
    pub fn with_guard(mut self, guard: impl HeadersSentGuard + 'static) -> Self {
        self.guard = Arc::new(guard);
        self
    }

    /// Set the header name
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Switch between enforcing and report-only header names
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.header_name = if enabled {
            REPORT_ONLY_HEADER_NAME
        } else {
            HEADER_NAME
        }
        .to_string();
        self
    }

    /// State of one directive
    pub fn state(&self, directive: Directive) -> &DirectiveState {
        self.directives.get(&directive).unwrap_or(&UNSET)
    }

    /// Configured directives in rendering order
    pub fn directives(&self) -> impl Iterator<Item = (Directive, &DirectiveState)> {
        self.directives.iter().map(|(directive, state)| (*directive, state))
    }

    /// Whether no directive is configured
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Whether the guard reports headers as sent
    pub fn headers_sent(&self) -> bool {
        self.guard.headers_sent()
    }

    fn check_headers_sent(&self) -> CspResult<()> {
        if self.guard.headers_sent() {
            warn!(header = %self.header_name, "Policy change rejected: headers already sent");
            return Err(CspError::HeadersAlreadySent);
        }
        Ok(())
    }

    /// Allow `token` for every selected directive.
    ///
    /// `'none'` moves the directives to the explicit empty state, as
    /// [`disallow_directive`](Self::disallow_directive) does. Blank tokens are
    /// ignored.
    pub fn allow_token(
        &mut self,
        flags: DirectiveSet,
        token: impl AsRef<str>,
    ) -> CspResult<&mut Self> {
        self.check_headers_sent()?;
        self.insert_token(flags, token.as_ref());
        Ok(self)
    }

    /// Remove a previously allowed `token` from every selected directive
    pub fn disallow_token(
        &mut self,
        flags: DirectiveSet,
        token: impl AsRef<str>,
    ) -> CspResult<&mut Self> {
        self.check_headers_sent()?;
        self.remove_token(flags, token.as_ref());
        Ok(self)
    }

    /// Whether `token` is allowed by the selected directive(s).
    ///
    /// With several directives selected, `match_all` requires every one of
    /// them to allow the token, otherwise any one suffices. A selector that
    /// addresses no known directive allows nothing, so the result is `false`
    /// for both values of `match_all`.
    pub fn is_allowed(&self, flags: DirectiveSet, token: &str, match_all: bool) -> bool {
        let mut selected = flags.directives().peekable();
        if selected.peek().is_none() {
            return false;
        }
        if match_all {
            selected.all(|directive| self.state(directive).allows(token))
        } else {
            selected.any(|directive| self.state(directive).allows(token))
        }
    }

    /// Force every selected directive to `'none'`, dropping its sources
    pub fn disallow_directive(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.check_headers_sent()?;
        for directive in flags.directives() {
            debug!(directive = %directive, "Directive set to 'none'");
            self.directives.insert(directive, DirectiveState::None);
        }
        Ok(self)
    }

    fn insert_token(&mut self, flags: DirectiveSet, token: &str) {
        if token.trim().is_empty() {
            trace!("Ignoring empty source");
            return;
        }
        if token == NONE {
            for directive in flags.directives() {
                self.directives.insert(directive, DirectiveState::None);
            }
            return;
        }
        for directive in flags.directives() {
            trace!(directive = %directive, token = %token, "Allowing source");
            match self.directives.get_mut(&directive) {
                Some(DirectiveState::Allow(tokens)) => {
                    tokens.insert(token.to_string());
                }
                Some(state) => {
                    *state = DirectiveState::Allow(IndexSet::from([token.to_string()]));
                }
                None => {
                    self.directives.insert(
                        directive,
                        DirectiveState::Allow(IndexSet::from([token.to_string()])),
                    );
                }
            }
        }
    }

    pub(crate) fn restore_state(&mut self, directive: Directive, state: DirectiveState) {
        if !state.is_unset() {
            self.directives.insert(directive, state);
        }
    }

    fn remove_token(&mut self, flags: DirectiveSet, token: &str) {
        for directive in flags.directives() {
            let emptied = match self.directives.get_mut(&directive) {
                Some(DirectiveState::Allow(tokens)) => {
                    tokens.shift_remove(token);
                    tokens.is_empty()
                }
                _ => false,
            };
            if emptied {
                trace!(directive = %directive, "Last source removed, directive unset");
                self.directives.shift_remove(&directive);
            }
        }
    }

    /// Allow hosts or URLs such as `example.com`, `*.example.com` or
    /// `https://*.example.com:12/path/to/file.js`. Not validated.
    pub fn allow_hosts<I, S>(&mut self, flags: DirectiveSet, hosts: I) -> CspResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.check_headers_sent()?;
        for host in hosts {
            self.insert_token(flags, host.as_ref());
        }
        Ok(self)
    }

    /// Remove previously allowed hosts or URLs
    pub fn disallow_hosts<I, S>(&mut self, flags: DirectiveSet, hosts: I) -> CspResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.check_headers_sent()?;
        for host in hosts {
            self.remove_token(flags, host.as_ref());
        }
        Ok(self)
    }

    /// Whether a host or URL is allowed
    pub fn is_allowed_host(&self, flags: DirectiveSet, host: &str, match_all: bool) -> bool {
        self.is_allowed(flags, host, match_all)
    }

    /// Allow a scheme such as `https:` or `data:`.
    ///
    /// Fails with [`CspError::InvalidArgument`] unless the scheme matches
    /// `^[a-z][a-z0-9]+:$`.
    pub fn allow_scheme(&mut self, flags: DirectiveSet, scheme: &str) -> CspResult<&mut Self> {
        self.check_headers_sent()?;
        let scheme = self.checked_scheme(scheme)?;
        self.insert_token(flags, scheme);
        Ok(self)
    }

    /// Remove a previously allowed scheme
    pub fn disallow_scheme(&mut self, flags: DirectiveSet, scheme: &str) -> CspResult<&mut Self> {
        self.check_headers_sent()?;
        let scheme = self.checked_scheme(scheme)?;
        self.remove_token(flags, scheme);
        Ok(self)
    }

    /// Whether a scheme is allowed; the scheme is validated first
    pub fn is_allowed_scheme(
        &self,
        flags: DirectiveSet,
        scheme: &str,
        match_all: bool,
    ) -> CspResult<bool> {
        let scheme = source::validate_scheme(scheme)?;
        Ok(self.is_allowed(flags, scheme, match_all))
    }

    fn checked_scheme<'s>(&self, scheme: &'s str) -> CspResult<&'s str> {
        source::validate_scheme(scheme).inspect_err(|_| {
            warn!(scheme = %scheme, "Rejected invalid scheme source");
        })
    }

    /// Allow same-origin resources (`'self'`)
    pub fn allow_self(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.allow_token(flags, SELF)
    }

    /// Disallow previously allowed same-origin resources
    pub fn disallow_self(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.disallow_token(flags, SELF)
    }

    /// Whether `'self'` is allowed
    pub fn is_allowed_self(&self, flags: DirectiveSet, match_all: bool) -> bool {
        self.is_allowed(flags, SELF, match_all)
    }

    /// Allow inline `<script>`, `<style>` and `javascript:` URLs.
    ///
    /// Prefer nonces or hashes; this defeats most of what CSP protects against.
    pub fn allow_unsafe_inline(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.allow_token(flags, UNSAFE_INLINE)
    }

    /// Disallow inline resources
    pub fn disallow_unsafe_inline(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.disallow_token(flags, UNSAFE_INLINE)
    }

    /// Whether `'unsafe-inline'` is allowed
    pub fn is_allowed_unsafe_inline(&self, flags: DirectiveSet, match_all: bool) -> bool {
        self.is_allowed(flags, UNSAFE_INLINE, match_all)
    }

    /// Allow `eval()`, `new Function()` and string timers
    pub fn allow_unsafe_eval(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.allow_token(flags, UNSAFE_EVAL)
    }

    /// Disallow dynamic code evaluation
    pub fn disallow_unsafe_eval(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.disallow_token(flags, UNSAFE_EVAL)
    }

    /// Whether `'unsafe-eval'` is allowed
    pub fn is_allowed_unsafe_eval(&self, flags: DirectiveSet, match_all: bool) -> bool {
        self.is_allowed(flags, UNSAFE_EVAL, match_all)
    }

    /// Allow hashed inline event handlers and style attributes (CSP Level 3)
    pub fn allow_unsafe_hashes(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.allow_token(flags, UNSAFE_HASHES)
    }

    /// Disallow hashed inline event handlers
    pub fn disallow_unsafe_hashes(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.disallow_token(flags, UNSAFE_HASHES)
    }

    /// Whether `'unsafe-hashes'` is allowed
    pub fn is_allowed_unsafe_hashes(&self, flags: DirectiveSet, match_all: bool) -> bool {
        self.is_allowed(flags, UNSAFE_HASHES, match_all)
    }

    /// Trust scripts loaded by nonce- or hash-marked scripts (CSP Level 3).
    ///
    /// Browsers then ignore host and keyword sources such as `'self'`, so
    /// every script tag needs a nonce or hash.
    pub fn allow_strict_dynamic(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.allow_token(flags, STRICT_DYNAMIC)
    }

    /// Disallow `'strict-dynamic'`
    pub fn disallow_strict_dynamic(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.disallow_token(flags, STRICT_DYNAMIC)
    }

    /// Whether `'strict-dynamic'` is allowed
    pub fn is_allowed_strict_dynamic(&self, flags: DirectiveSet, match_all: bool) -> bool {
        self.is_allowed(flags, STRICT_DYNAMIC, match_all)
    }

    /// Nonce attribute value for this response.
    ///
    /// Generated on first call; every later call returns the same value, so
    /// all `<script nonce=...>` tags of a response share it.
    pub fn nonce(&self) -> &str {
        self.nonce.get_or_init(generate_nonce)
    }

    /// Allow elements carrying this response's nonce
    pub fn allow_nonce(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.check_headers_sent()?;
        let token = source::nonce_source(self.nonce());
        self.insert_token(flags, &token);
        Ok(self)
    }

    /// Disallow elements carrying this response's nonce
    pub fn disallow_nonce(&mut self, flags: DirectiveSet) -> CspResult<&mut Self> {
        self.check_headers_sent()?;
        let token = source::nonce_source(self.nonce());
        self.remove_token(flags, &token);
        Ok(self)
    }

    /// Whether this response's nonce is allowed
    pub fn is_allowed_nonce(&self, flags: DirectiveSet, match_all: bool) -> bool {
        self.is_allowed(flags, &source::nonce_source(self.nonce()), match_all)
    }

    /// Allow inline code by digest. `source_code` is the element content
    /// exactly as served, whitespace included, without the enclosing tags.
    pub fn allow_hashed_source(
        &mut self,
        flags: DirectiveSet,
        source_code: impl AsRef<[u8]>,
        algorithm: HashAlgorithm,
    ) -> CspResult<&mut Self> {
        self.check_headers_sent()?;
        self.insert_token(flags, &source::hash_source(source_code, algorithm));
        Ok(self)
    }

    /// Disallow previously allowed inline code by digest
    pub fn disallow_hashed_source(
        &mut self,
        flags: DirectiveSet,
        source_code: impl AsRef<[u8]>,
        algorithm: HashAlgorithm,
    ) -> CspResult<&mut Self> {
        self.check_headers_sent()?;
        self.remove_token(flags, &source::hash_source(source_code, algorithm));
        Ok(self)
    }

    /// Whether inline code with this digest is allowed
    pub fn is_allowed_hashed_source(
        &self,
        flags: DirectiveSet,
        source_code: impl AsRef<[u8]>,
        algorithm: HashAlgorithm,
        match_all: bool,
    ) -> bool {
        self.is_allowed(flags, &source::hash_source(source_code, algorithm), match_all)
    }

    /// Header name, without colon
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// Header value; empty when nothing is configured
    pub fn header_value(&self) -> String {
        codec::render(self.directives())
    }

    /// Full header line: `"<name>: <value>"`
    pub fn header(&self) -> String {
        format!("{}: {}", self.header_name, self.header_value())
    }

    /// Merge a header value into this policy.
    ///
    /// Sources are added to those already configured; a `'none'` section
    /// replaces them. Unknown directives are skipped. Parsing never consults
    /// the headers-sent guard and never fails.
    pub fn merge_header_value(&mut self, header_value: &str) {
        let sections = codec::parse(header_value);
        debug!(sections = sections.len(), "Merging CSP header value");
        for section in sections {
            let flags = section.directive.selector();
            match section.sources {
                ParsedSources::None => {
                    self.directives.insert(section.directive, DirectiveState::None);
                }
                ParsedSources::Tokens(tokens) => {
                    for token in tokens {
                        self.insert_token(flags, token);
                    }
                }
            }
        }
    }

    /// Merge the CSP header found among already-set response header lines.
    ///
    /// Lines look like `"Content-Security-Policy: default-src 'self'"`; the
    /// name comparison is case-insensitive. Only the first matching line is
    /// used, and it is skipped when identical to the line merged by the
    /// previous call, so repeated scans do not merge the same header twice.
    pub fn merge_sent_headers<I, S>(&mut self, header_lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in header_lines {
            let line = line.as_ref();
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if !name.trim().eq_ignore_ascii_case(&self.header_name) {
                continue;
            }
            if self.last_parsed_header.as_deref() == Some(line) {
                trace!("CSP header unchanged since last merge");
                break;
            }
            self.last_parsed_header = Some(line.to_string());
            self.merge_header_value(value);
            break;
        }
        self
    }
}

impl Default for ContentSecurityPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContentSecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSecurityPolicy")
            .field("header_name", &self.header_name)
            .field("directives", &self.directives)
            .field("nonce_generated", &self.nonce.get().is_some())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ContentSecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}
