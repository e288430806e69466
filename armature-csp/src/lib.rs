//! Content-Security-Policy header builder for Armature
//!
//! Builds the `Content-Security-Policy` response header from typed calls and
//! parses existing header values back into the same structure, so a policy
//! contributed by another component can be merged with one assembled locally.
//!
//! # Example
//!
//! ```
//! use armature_csp::{ContentSecurityPolicy, DirectiveSet, HashAlgorithm};
//!
//! let mut csp = ContentSecurityPolicy::new();
//! csp.disallow_directive(DirectiveSet::DEFAULT_SRC | DirectiveSet::OBJECT_SRC)?
//!     .allow_self(DirectiveSet::SCRIPT_SRC | DirectiveSet::STYLE_SRC | DirectiveSet::IMG_SRC)?
//!     .allow_scheme(DirectiveSet::IMG_SRC, "data:")?
//!     .allow_nonce(DirectiveSet::SCRIPT_SRC)?
//!     .allow_hashed_source(DirectiveSet::STYLE_SRC, "body{margin:0}", HashAlgorithm::Sha256)?
//!     .allow_google_fonts()?;
//!
//! // Same value for every <script nonce="..."> of this response
//! let nonce = csp.nonce().to_string();
//!
//! let header = csp.header_value();
//! assert!(header.starts_with("default-src 'none'; object-src 'none'; img-src 'self' data:"));
//! assert!(header.contains(&format!("'nonce-{}'", nonce)));
//! # Ok::<(), armature_csp::CspError>(())
//! ```
//!
//! # Parsing
//!
//! ```
//! use armature_csp::{ContentSecurityPolicy, Directive};
//!
//! let csp = ContentSecurityPolicy::parse("default-src 'none'; img-src https://a.com https://b.com");
//! assert!(csp.state(Directive::DefaultSrc).is_none());
//! assert_eq!(
//!     csp.state(Directive::ImgSrc).tokens().collect::<Vec<_>>(),
//!     ["https://a.com", "https://b.com"]
//! );
//! ```
//!
//! # Requests and headers
//!
//! A policy belongs to one response. Mutations fail with
//! [`CspError::HeadersAlreadySent`] once the [`HeadersSentGuard`] reports the
//! headers as committed; plug in the server's own signal with
//! [`ContentSecurityPolicy::with_guard`]. A startup-time default can be
//! installed with [`install_default`] and copied per response with
//! [`ContentSecurityPolicy::for_response`].

pub mod bundles;
pub mod codec;
pub mod config;
pub mod directive;
pub mod error;
pub mod global;
pub mod guard;
pub mod headers;
pub mod nonce;
pub mod policy;
pub mod source;

pub use bundles::SourceBundle;
pub use config::{CspConfig, DirectiveConfig};
pub use directive::{all_directives, lookup_name, lookup_selector, Directive, DirectiveSet};
pub use error::{CspError, CspResult};
pub use global::{default_header_value, install_default};
pub use guard::{CommitFlag, HeadersSentGuard, NeverSent};
pub use headers::HeaderSink;
pub use policy::{ContentSecurityPolicy, DirectiveState, HEADER_NAME, REPORT_ONLY_HEADER_NAME};
pub use source::HashAlgorithm;
