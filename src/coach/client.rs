//! Single-flight exchange with the coaching backend.
//!
//! The client does not refuse overlapping calls itself; callers gate on
//! `Session::in_flight`. If two exchanges overlap anyway, whichever resolves
//! last owns the advice text.

use std::sync::Arc;

use crate::coach::backend::{CoachBackend, CoachRequest};
use crate::error::{Error, ExchangeError};
use crate::session::Session;

/// Advice text shown when an exchange fails for any reason.
pub const COACH_ERROR_MESSAGE: &str = "Error connecting to coach. Please try again later.";

/// How a dispatched exchange ended.
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// The backend answered; the advice is now in the session.
    Advised(String),
    /// The exchange was abandoned; the session shows the fixed error text.
    Failed(ExchangeError),
}

impl ExchangeOutcome {
    pub fn is_advised(&self) -> bool {
        matches!(self, Self::Advised(_))
    }
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct InFlightGuard<'a> {
    session: &'a Session,
}

impl<'a> InFlightGuard<'a> {
    fn begin(session: &'a Session) -> Self {
        session.begin_exchange();
        Self { session }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.session.finish_exchange();
    }
}

/// Sends transcripts to the coach and records the advice.
#[derive(Clone)]
pub struct CoachClient {
    backend: Arc<dyn CoachBackend>,
}

impl CoachClient {
    pub fn new(backend: Arc<dyn CoachBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn CoachBackend> {
        &self.backend
    }

    /// Run one exchange.
    ///
    /// Fails only when `identity` is empty, in which case no request is made
    /// and the session is untouched. Transport and parse failures are handled
    /// here: the session shows `COACH_ERROR_MESSAGE` and the cause is returned
    /// inside `ExchangeOutcome::Failed`.
    pub async fn exchange(
        &self,
        session: &Session,
        identity: &str,
        transcript: &str,
    ) -> Result<ExchangeOutcome, Error> {
        if identity.is_empty() {
            return Err(Error::MissingIdentity);
        }

        let _guard = InFlightGuard::begin(session);
        let request = CoachRequest {
            user_id: identity.to_string(),
            voice_transcript: transcript.to_string(),
        };
        tracing::info!(user_id = %identity, chars = transcript.len(), "Coach exchange started");

        let outcome = match self.backend.advise(&request).await {
            Ok(reply) => {
                session.set_advice(reply.advice.clone());
                tracing::info!(user_id = %identity, "Coach exchange completed");
                ExchangeOutcome::Advised(reply.advice)
            }
            Err(e) => {
                session.set_advice(COACH_ERROR_MESSAGE);
                tracing::warn!(user_id = %identity, error = %e, "Coach exchange failed");
                ExchangeOutcome::Failed(e)
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use super::*;
    use crate::coach::backend::{CoachReply, HealthStatus};
    use crate::session::THINKING_PLACEHOLDER;

    /// Backend that records requests and returns a canned result.
    struct StubBackend {
        reply: Result<CoachReply, ExchangeError>,
        requests: Mutex<Vec<CoachRequest>>,
    }

    impl StubBackend {
        fn answering(advice: &str) -> Self {
            Self {
                reply: Ok(CoachReply {
                    advice: advice.to_string(),
                }),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(ExchangeError::Transport {
                    url: "http://127.0.0.1:8000/coach".into(),
                    reason: "connection refused".into(),
                }),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CoachBackend for StubBackend {
        async fn advise(&self, request: &CoachRequest) -> Result<CoachReply, ExchangeError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone()
        }

        async fn health(&self) -> Result<HealthStatus, ExchangeError> {
            Ok(HealthStatus {
                status: "Running".into(),
            })
        }
    }

    /// Backend that holds its answer until released.
    struct GatedBackend {
        release: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl CoachBackend for GatedBackend {
        async fn advise(&self, _request: &CoachRequest) -> Result<CoachReply, ExchangeError> {
            let rx = self.release.lock().await.take();
            if let Some(rx) = rx {
                let _ = rx.await;
            }
            Ok(CoachReply {
                advice: "Ride easy tomorrow.".into(),
            })
        }

        async fn health(&self) -> Result<HealthStatus, ExchangeError> {
            unimplemented!("not used in exchange tests")
        }
    }

    #[tokio::test]
    async fn success_sets_advice_verbatim() {
        let backend = Arc::new(StubBackend::answering("  Great, noted.\n"));
        let client = CoachClient::new(backend.clone());
        let session = Session::new();

        let outcome = client
            .exchange(&session, "alice", "How am I doing?")
            .await
            .unwrap();

        assert!(outcome.is_advised());
        assert_eq!(session.advice(), "  Great, noted.\n");
        assert!(!session.in_flight());

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_id, "alice");
        assert_eq!(requests[0].voice_transcript, "How am I doing?");
    }

    #[tokio::test]
    async fn failure_shows_fixed_message() {
        let client = CoachClient::new(Arc::new(StubBackend::failing()));
        let session = Session::new();

        let outcome = client.exchange(&session, "alice", "hi").await.unwrap();

        assert!(matches!(outcome, ExchangeOutcome::Failed(ExchangeError::Transport { .. })));
        assert_eq!(session.advice(), COACH_ERROR_MESSAGE);
        assert!(!session.in_flight());
    }

    #[tokio::test]
    async fn missing_identity_makes_no_request() {
        let backend = Arc::new(StubBackend::answering("unused"));
        let client = CoachClient::new(backend.clone());
        let session = Session::new();
        session.set_advice("previous advice");

        let err = client.exchange(&session, "", "hi").await.unwrap_err();

        assert!(matches!(err, Error::MissingIdentity));
        assert!(backend.requests.lock().unwrap().is_empty());
        assert_eq!(session.advice(), "previous advice");
        assert!(!session.in_flight());
    }

    #[tokio::test]
    async fn in_flight_only_while_outstanding() {
        let (release_tx, release_rx) = oneshot::channel();
        let client = CoachClient::new(Arc::new(GatedBackend {
            release: tokio::sync::Mutex::new(Some(release_rx)),
        }));
        let session = Session::new();
        let mut rx = session.subscribe();
        assert!(!session.in_flight());

        let exchange = client.exchange(&session, "alice", "hi");
        tokio::pin!(exchange);

        // Drive the exchange up to the network boundary.
        tokio::select! {
            _ = &mut exchange => panic!("exchange finished before release"),
            _ = rx.changed() => {}
        }
        assert!(session.in_flight());
        assert_eq!(session.advice(), THINKING_PLACEHOLDER);

        release_tx.send(()).unwrap();
        let outcome = exchange.await.unwrap();
        assert!(outcome.is_advised());
        assert!(!session.in_flight());
        assert_eq!(session.advice(), "Ride easy tomorrow.");
    }

    #[tokio::test]
    async fn dropping_the_exchange_clears_the_flag() {
        let (_release_tx, release_rx) = oneshot::channel::<()>();
        let client = CoachClient::new(Arc::new(GatedBackend {
            release: tokio::sync::Mutex::new(Some(release_rx)),
        }));
        let session = Session::new();
        let mut rx = session.subscribe();

        {
            let exchange = client.exchange(&session, "alice", "hi");
            tokio::pin!(exchange);
            tokio::select! {
                _ = &mut exchange => panic!("exchange finished before release"),
                _ = rx.changed() => {}
            }
            assert!(session.in_flight());
        }

        assert!(!session.in_flight());
    }
}
