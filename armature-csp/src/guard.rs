//! Headers-sent guard
//!
//! Once a response has committed its headers, a policy change can no longer
//! reach the client. Every mutating policy call consults a guard first and
//! fails with [`CspError::HeadersAlreadySent`](crate::CspError) when it
//! reports `true`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reports whether response headers have been committed to the transport.
pub trait HeadersSentGuard: Send + Sync {
    /// `true` once headers are sent
    fn headers_sent(&self) -> bool;
}

impl<F> HeadersSentGuard for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn headers_sent(&self) -> bool {
        self()
    }
}

/// Guard that never reports headers as sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSent;

impl HeadersSentGuard for NeverSent {
    fn headers_sent(&self) -> bool {
        false
    }
}

/// Shared commit flag, set by whoever writes the response headers.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CommitFlag(Arc<AtomicBool>);

impl CommitFlag {
    /// Create an uncommitted flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark headers as committed
    pub fn commit(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether headers are committed
    pub fn is_committed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl HeadersSentGuard for CommitFlag {
    fn headers_sent(&self) -> bool {
        self.is_committed()
    }
}
