//! Interaction orchestrator — composes identity, linking, profile, and coach
//! exchanges into the user-facing flow.
//!
//! Profile and chat sends are only reachable with an identity and a linked
//! account. At most one exchange runs at a time: a send attempted while the
//! session is in flight is rejected rather than queued.

use std::sync::Arc;

use url::Url;

use crate::coach::{CoachBackend, CoachClient, ExchangeOutcome};
use crate::config::ClientConfig;
use crate::error::{Error, SessionError, ValidationError};
use crate::identity::IdentityStore;
use crate::linker::{AuthorizationLinker, Navigator};
use crate::profile::compose;
use crate::session::{Session, SessionState};
use crate::store::KeyValueStore;

/// Confirmation text shown after a profile update is dispatched.
pub const PROFILE_SENT_NOTICE: &str = "Profile updated! Your coach has your latest stats.";

/// Non-blocking notices returned to the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A profile update was sent. Says nothing about the exchange outcome.
    ProfileSent,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProfileSent => write!(f, "{PROFILE_SENT_NOTICE}"),
        }
    }
}

/// Owns the session and every component acting on it.
pub struct Orchestrator {
    session: Session,
    identity: IdentityStore,
    linker: AuthorizationLinker,
    coach: CoachClient,
    navigator: Box<dyn Navigator>,
}

impl Orchestrator {
    /// Create the session: restore the identity, then check once whether the
    /// current location carries the authorization success signal.
    pub async fn start(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn CoachBackend>,
        mut navigator: Box<dyn Navigator>,
    ) -> Self {
        let session = Session::new();
        let identity = IdentityStore::load(store).await;
        session.set_identity(identity.get());

        let linker = AuthorizationLinker::new(
            config.strava_client_id.clone(),
            config.backend_url.clone(),
        );
        linker.detect_return(navigator.as_mut(), &session);

        Self {
            session,
            identity,
            linker,
            coach: CoachClient::new(backend),
            navigator,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> SessionState {
        self.session.snapshot()
    }

    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    pub fn identity(&self) -> &str {
        self.identity.get()
    }

    /// Replace the identity and persist it.
    pub async fn set_identity(&mut self, value: impl Into<String>) {
        self.identity.set(value).await;
        self.session.set_identity(self.identity.get());
    }

    /// Start the Strava handshake, navigating away on success.
    pub fn begin_linking(&mut self) -> Result<Url, Error> {
        let url = self
            .linker
            .begin_authorization(self.identity.get(), self.navigator.as_mut())?;
        Ok(url)
    }

    /// Whether the profile and chat surfaces are reachable.
    pub fn chat_available(&self) -> bool {
        self.identity.is_set() && self.session.authorization().is_linked()
    }

    pub fn set_weight(&self, weight: Option<String>) {
        self.session.set_weight(weight);
    }

    pub fn set_ftp(&self, ftp: Option<String>) {
        self.session.set_ftp(ftp);
    }

    pub fn set_transcript(&self, transcript: impl Into<String>) {
        self.session.set_transcript(transcript);
    }

    /// Compose the profile draft into a transcript and send it.
    ///
    /// The transcript is left in place afterwards, and the confirmation is
    /// returned whether or not the coach answered.
    pub async fn update_profile(&self) -> Result<Notice, Error> {
        self.ensure_surface()?;
        let transcript = self.session.draft().compose()?;
        self.ensure_idle()?;

        self.session.set_transcript(transcript.clone());
        self.coach
            .exchange(&self.session, self.identity.get(), &transcript)
            .await?;
        Ok(Notice::ProfileSent)
    }

    /// Send the current transcript as a free-text message, then clear it.
    pub async fn send_chat(&self) -> Result<ExchangeOutcome, Error> {
        self.ensure_surface()?;
        let transcript = self.session.transcript();
        if transcript.trim().is_empty() {
            return Err(ValidationError::EmptyTranscript.into());
        }
        self.ensure_idle()?;

        let outcome = self
            .coach
            .exchange(&self.session, self.identity.get(), &transcript)
            .await?;
        self.session.clear_transcript();
        Ok(outcome)
    }

    /// Ask the backend whether it is running.
    pub async fn health(&self) -> Result<String, Error> {
        let health = self.coach.backend().health().await?;
        Ok(health.status)
    }

    fn ensure_surface(&self) -> Result<(), Error> {
        if !self.identity.is_set() {
            return Err(Error::MissingIdentity);
        }
        if !self.session.authorization().is_linked() {
            return Err(SessionError::NotLinked.into());
        }
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), Error> {
        if self.session.in_flight() {
            return Err(SessionError::ExchangeInFlight.into());
        }
        Ok(())
    }
}
