//! Session state shared by every component of the client.
//!
//! `Session` owns a `SessionState` behind a `watch` channel. Each mutation
//! publishes the new state, so any layer that needs to react (the terminal,
//! tests) subscribes instead of polling.

use serde::Serialize;
use tokio::sync::watch;

use crate::profile::ProfileDraft;

/// Interim advice shown while an exchange is outstanding.
pub const THINKING_PLACEHOLDER: &str = "Thinking...";

/// Whether the third-party fitness account has been linked this session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    #[default]
    NotLinked,
    Linked,
}

impl AuthorizationState {
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Linked)
    }
}

impl std::fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotLinked => "not_linked",
            Self::Linked => "linked",
        };
        write!(f, "{s}")
    }
}

/// Snapshot of everything the user-facing layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Mirror of the identity store's current value.
    pub identity: String,
    pub authorization: AuthorizationState,
    pub draft: ProfileDraft,
    /// The next outgoing message. Not a history.
    pub transcript: String,
    /// Latest advice, placeholder, or error text.
    pub advice: String,
    /// True while a coach exchange is outstanding.
    pub in_flight: bool,
}

/// Explicit session object, created at startup and passed by reference.
#[derive(Debug)]
pub struct Session {
    state: watch::Sender<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { state }
    }

    /// Subscribe to state changes. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> String {
        self.state.borrow().identity.clone()
    }

    pub fn authorization(&self) -> AuthorizationState {
        self.state.borrow().authorization
    }

    pub fn draft(&self) -> ProfileDraft {
        self.state.borrow().draft.clone()
    }

    pub fn transcript(&self) -> String {
        self.state.borrow().transcript.clone()
    }

    pub fn advice(&self) -> String {
        self.state.borrow().advice.clone()
    }

    pub fn in_flight(&self) -> bool {
        self.state.borrow().in_flight
    }

    pub(crate) fn set_identity(&self, identity: &str) {
        self.update(|s| replace_string(&mut s.identity, identity));
    }

    /// Mark the account linked. Returns `true` only on the first transition.
    pub(crate) fn mark_linked(&self) -> bool {
        self.update(|s| {
            if s.authorization.is_linked() {
                return false;
            }
            s.authorization = AuthorizationState::Linked;
            true
        })
    }

    pub fn set_weight(&self, weight: Option<String>) {
        self.update(|s| replace(&mut s.draft.weight, weight));
    }

    pub fn set_ftp(&self, ftp: Option<String>) {
        self.update(|s| replace(&mut s.draft.ftp, ftp));
    }

    pub fn set_transcript(&self, transcript: impl Into<String>) {
        let transcript = transcript.into();
        self.update(|s| replace(&mut s.transcript, transcript));
    }

    pub(crate) fn clear_transcript(&self) {
        self.update(|s| replace_string(&mut s.transcript, ""));
    }

    pub(crate) fn set_advice(&self, advice: impl Into<String>) {
        let advice = advice.into();
        self.update(|s| replace(&mut s.advice, advice));
    }

    /// Raise the in-flight flag and show the placeholder.
    pub(crate) fn begin_exchange(&self) {
        self.update(|s| {
            s.in_flight = true;
            s.advice = THINKING_PLACEHOLDER.to_string();
            true
        });
    }

    pub(crate) fn finish_exchange(&self) {
        self.update(|s| replace(&mut s.in_flight, false));
    }

    /// Apply `f` and notify subscribers when it reports a change.
    fn update(&self, f: impl FnOnce(&mut SessionState) -> bool) -> bool {
        self.state.send_if_modified(f)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn replace_string(slot: &mut String, value: &str) -> bool {
    if slot == value {
        return false;
    }
    slot.clear();
    slot.push_str(value);
    true
}
