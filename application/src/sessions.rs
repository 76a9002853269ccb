//! Per-agent session store.
//!
//! Maps each [`AgentIdentity`] to its isolated conversation session.
//! Sessions are created lazily on first use (seeded with that agent's
//! configured system prompt) and cleared only by explicit [`reset`].
//!
//! Each entry is an `Arc<tokio::sync::Mutex<Session>>`: holding the guard
//! across snapshot → send → append is what enforces both the
//! single-writer-at-a-time discipline and the at-most-one-in-flight-
//! request-per-session invariant. Two tasks that both need worker A
//! serialize on A's mutex; tasks touching disjoint agents proceed
//! independently.
//!
//! [`reset`]: SessionStore::reset

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use taskforce_domain::{AgentIdentity, Session, Turn};
use tokio::sync::Mutex;

/// Store of per-agent conversation sessions.
pub struct SessionStore {
    system_prompts: HashMap<AgentIdentity, String>,
    sessions: StdMutex<HashMap<AgentIdentity, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    /// Create an empty store. `system_prompts` seeds each agent's session
    /// on first use; agents without an entry start with no system turn.
    pub fn new(system_prompts: HashMap<AgentIdentity, String>) -> Self {
        Self {
            system_prompts,
            sessions: StdMutex::new(HashMap::new()),
        }
    }

    /// Get the session handle for `identity`, creating it on first use.
    pub fn get_or_create(&self, identity: AgentIdentity) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        sessions
            .entry(identity)
            .or_insert_with(|| {
                let session = match self.system_prompts.get(&identity) {
                    Some(prompt) => Session::with_system_prompt(prompt.clone()),
                    None => Session::new(),
                };
                Arc::new(Mutex::new(session))
            })
            .clone()
    }

    /// Append one turn to `identity`'s session.
    ///
    /// Convenience for callers outside the dispatch path; the exchange
    /// helper appends through the held guard instead so the snapshot,
    /// send and append stay atomic.
    pub async fn append(&self, identity: AgentIdentity, turn: Turn) {
        let handle = self.get_or_create(identity);
        handle.lock().await.append(turn);
    }

    /// Clear `identity`'s history. Explicit operator action only — the
    /// dispatch loop never resets sessions. Waits for any in-flight
    /// exchange on that session to finish first.
    pub async fn reset(&self, identity: AgentIdentity) {
        let handle = {
            let sessions = self.sessions.lock().expect("session map poisoned");
            sessions.get(&identity).cloned()
        };
        if let Some(handle) = handle {
            handle.lock().await.reset();
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}
