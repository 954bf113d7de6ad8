//! Authorization linker — the redirect-based Strava OAuth handshake.
//!
//! The handshake is two independent steps correlated only by the `state`
//! query parameter: `begin_authorization` sends the user to the provider,
//! and `detect_return` inspects the location the backend redirected back to.
//! Nothing is kept in memory between the two.

use url::Url;

use crate::error::ConfigError;
use crate::session::{AuthorizationState, Session};

/// Strava's authorization endpoint.
pub const STRAVA_AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";

/// Backend route that completes the code exchange.
pub const CALLBACK_ROUTE: &str = "strava/callback";

/// Read-only activity scope requested from Strava.
pub const READ_SCOPE: &str = "read,activity:read_all";

/// Query pair the backend appends when it redirects back after linking.
pub const SUCCESS_KEY: &str = "strava_auth_success";
pub const SUCCESS_VALUE: &str = "true";

/// Location and history of the surface the client runs in.
pub trait Navigator: Send {
    /// Current location.
    fn location(&self) -> &Url;

    /// Leave for `url`, pushing a new history entry.
    fn navigate(&mut self, url: Url);

    /// Rewrite the current entry without adding one.
    fn replace(&mut self, url: Url);

    /// Number of history entries.
    fn history_len(&self) -> usize;
}

/// In-memory navigation history. The last entry is the current location.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Url>,
}

impl History {
    pub fn new(start: Url) -> Self {
        Self {
            entries: vec![start],
        }
    }

    pub fn entries(&self) -> &[Url] {
        &self.entries
    }
}

impl Navigator for History {
    fn location(&self) -> &Url {
        // `new` seeds one entry and nothing removes entries.
        &self.entries[self.entries.len() - 1]
    }

    fn navigate(&mut self, url: Url) {
        self.entries.push(url);
    }

    fn replace(&mut self, url: Url) {
        if let Some(current) = self.entries.last_mut() {
            *current = url;
        }
    }

    fn history_len(&self) -> usize {
        self.entries.len()
    }
}

/// Build the provider authorization URL for `identity`.
///
/// The identity travels as the opaque `state` token so the backend can tie
/// the callback to this user without a cookie.
pub fn authorization_url(
    identity: &str,
    client_id: Option<&str>,
    callback_base: &Url,
) -> Result<Url, ConfigError> {
    if identity.is_empty() {
        return Err(ConfigError::MissingIdentity);
    }
    let client_id = client_id
        .filter(|id| !id.is_empty())
        .ok_or(ConfigError::MissingClientId)?;

    let redirect_uri = format!(
        "{}/{}",
        callback_base.as_str().trim_end_matches('/'),
        CALLBACK_ROUTE
    );

    let mut url = Url::parse(STRAVA_AUTHORIZE_URL).map_err(|e| ConfigError::InvalidValue {
        key: "authorize_url".to_string(),
        message: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &redirect_uri)
        .append_pair("scope", READ_SCOPE)
        .append_pair("state", identity);
    Ok(url)
}

/// Drives the authorization handshake for one client.
#[derive(Debug, Clone)]
pub struct AuthorizationLinker {
    client_id: Option<String>,
    callback_base: Url,
}

impl AuthorizationLinker {
    pub fn new(client_id: Option<String>, callback_base: Url) -> Self {
        Self {
            client_id,
            callback_base,
        }
    }

    /// Navigate away to the provider. Nothing happens when a precondition fails.
    pub fn begin_authorization(
        &self,
        identity: &str,
        navigator: &mut dyn Navigator,
    ) -> Result<Url, ConfigError> {
        let url = authorization_url(identity, self.client_id.as_deref(), &self.callback_base)?;
        tracing::info!(user_id = %identity, "Redirecting to Strava authorization");
        navigator.navigate(url.clone());
        Ok(url)
    }

    /// Look for the success signal in the current location.
    ///
    /// When present, the session becomes linked and the signal is stripped
    /// from the location by replacing the current history entry. When absent
    /// the session keeps its current state.
    pub fn detect_return(
        &self,
        navigator: &mut dyn Navigator,
        session: &Session,
    ) -> AuthorizationState {
        let location = navigator.location();
        let signalled = location
            .query_pairs()
            .any(|(k, v)| k == SUCCESS_KEY && v == SUCCESS_VALUE);
        if !signalled {
            return session.authorization();
        }

        let stripped = strip_success_signal(location);
        navigator.replace(stripped);
        if session.mark_linked() {
            tracing::info!("Strava account linked");
        }
        session.authorization()
    }
}

/// Drop the success pair from the query, keeping every other segment as
/// written.
fn strip_success_signal(location: &Url) -> Url {
    let kept: Vec<&str> = location
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|segment| !segment.is_empty() && !is_success_segment(segment))
        .collect();

    let mut url = location.clone();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&kept.join("&")));
    }
    url
}

fn is_success_segment(segment: &str) -> bool {
    url::form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(k, v)| k == SUCCESS_KEY && v == SUCCESS_VALUE)
}
