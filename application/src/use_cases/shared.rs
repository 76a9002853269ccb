//! Shared utilities for use cases.
//!
//! Contains cancellation checking and the session-scoped exchange helper
//! used by decomposition, the dispatch loop and the direct bypass.

use crate::ports::endpoint_client::{EndpointClient, EndpointError};
use crate::sessions::SessionStore;
use taskforce_domain::{AgentIdentity, PromptTemplate, Turn};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Check if cancellation has been requested.
///
/// Returns `Err(EndpointError::Cancelled)` if the token exists and is
/// cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), EndpointError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(EndpointError::Cancelled);
    }
    Ok(())
}

/// Send one message to an agent through its session.
///
/// Holds the session guard across snapshot → send → append, which keeps
/// at most one request in flight per session. Turns are appended only on
/// success; a failed call leaves the session untouched.
///
/// An empty reply triggers exactly one follow-up request asking the agent
/// for a concise self-summary; the nudge is persisted as a turn so the
/// session replays exactly what the backend saw.
pub(crate) async fn exchange(
    client: &dyn EndpointClient,
    sessions: &SessionStore,
    identity: AgentIdentity,
    message: &str,
    cancel: &Option<CancellationToken>,
) -> Result<String, EndpointError> {
    check_cancelled(cancel)?;

    let handle = sessions.get_or_create(identity);
    let mut session = handle.lock().await;

    let reply = client
        .send(identity, session.turns(), message, cancel.as_ref())
        .await?;
    session.append(Turn::user(message));

    if let Some(usage) = reply.usage {
        debug!(
            agent = %identity,
            total_tokens = usage.total_tokens,
            "Endpoint reply received"
        );
    }

    let mut text = reply.text;
    if text.trim().is_empty() {
        warn!(agent = %identity, "Empty reply. Requesting self-summary.");
        let nudge = PromptTemplate::empty_reply_nudge();
        let second = client
            .send(identity, session.turns(), nudge, cancel.as_ref())
            .await?;
        session.append(Turn::user(nudge));
        text = second.text;
    }

    session.append(Turn::assistant(text.clone()));
    Ok(text)
}
