use async_trait::async_trait;
use http::HeaderMap;

use crate::session::config::SessionConfig;
use crate::session::types::ExecutionMode;

/// Callbacks a [`SessionContext`](super::SessionContext) drives for its active
/// session.
///
/// Every operation reports success as a plain `bool`: backend failures are
/// logged by the implementation and never abort the request.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    fn config(&self) -> &SessionConfig;

    /// Prepare the backend. A `false` aborts the start before any cookie is set.
    async fn open(&self) -> bool {
        true
    }

    async fn close(&self) -> bool {
        true
    }

    /// Encoded payload for `session_id`, empty when there is none.
    async fn read(&self, session_id: &str) -> String;

    async fn write(&self, mode: ExecutionMode, session_id: &str, data: &str) -> bool;

    /// Clear the session cookie in `response` and drop the stored payload.
    async fn destroy(&self, response: &mut HeaderMap, session_id: &str) -> bool;

    async fn gc(&self, max_lifetime: u64) -> bool;
}
