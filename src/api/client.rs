// Game server HTTP client.
// Builds endpoint URLs, sends JSON requests and classifies responses into outcomes.

use reqwest::{
    Client, Method, StatusCode, Url,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;

use crate::error::{PanelError, Result};

use super::types::ServerMessage;

/// Result of a request that reached the server.
///
/// A rejected request is not an error: the server answered, just not with the
/// status the action expects. Transport failures are reported as `Err` by the
/// client instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Success(T),
    Rejected {
        status: StatusCode,
        /// `Message` from the JSON error body, `None` if the body did not parse.
        message: Option<String>,
    },
}

impl<T> ApiOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiOutcome<U> {
        match self {
            ApiOutcome::Success(value) => ApiOutcome::Success(f(value)),
            ApiOutcome::Rejected { status, message } => ApiOutcome::Rejected { status, message },
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> std::result::Result<U, E>) -> Result<ApiOutcome<U>>
    where
        PanelError: From<E>,
    {
        match self {
            ApiOutcome::Success(value) => Ok(ApiOutcome::Success(f(value)?)),
            ApiOutcome::Rejected { status, message } => Ok(ApiOutcome::Rejected { status, message }),
        }
    }

    /// Message to show for a rejection, or `fallback` if the server sent none.
    pub fn rejection_message(&self, fallback: &str) -> Option<String> {
        match self {
            ApiOutcome::Success(_) => None,
            ApiOutcome::Rejected { message, .. } => {
                Some(message.clone().unwrap_or_else(|| fallback.to_string()))
            }
        }
    }
}

/// Client for one game server.
#[derive(Debug, Clone)]
pub struct GameClient {
    client: Client,
    base: Url,
}

impl GameClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:5000`).
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| PanelError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(PanelError::InvalidUrl(base_url.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("schockpanel/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(PanelError::Http)?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build `<base>/api/<segments...>`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PanelError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// Send a request and compare the status against `expected`.
    ///
    /// On success the raw body text is returned; on any other status the body
    /// is parsed for a `{Message}` error.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
        expected: StatusCode,
    ) -> Result<ApiOutcome<String>> {
        let url = self.endpoint(segments)?;
        log::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await.map_err(PanelError::Http)?;
        let status = response.status();
        let text = response.text().await.map_err(PanelError::Http)?;

        if status == expected {
            Ok(ApiOutcome::Success(text))
        } else {
            let message = ServerMessage::parse(&text);
            log::info!(
                "{} {} rejected with {}: {}",
                method,
                url,
                status,
                message.as_deref().unwrap_or("<no message>")
            );
            Ok(ApiOutcome::Rejected { status, message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        let client = GameClient::new("http://localhost:5000").unwrap();
        let url = client.endpoint(&["game", "abc", "user", "7"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/game/abc/user/7");

        let prefixed = GameClient::new("http://localhost:5000/schocken/").unwrap();
        let url = prefixed.endpoint(&["game", "abc", "back"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/schocken/api/game/abc/back");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = GameClient::new("http://localhost:5000").unwrap();
        let url = client.endpoint(&["game", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/game/a%20b%2Fc");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            GameClient::new("not a url"),
            Err(PanelError::InvalidUrl(_))
        ));
        assert!(matches!(
            GameClient::new("mailto:admin@example.com"),
            Err(PanelError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejection_message_fallback() {
        let rejected: ApiOutcome<()> = ApiOutcome::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: None,
        };
        assert_eq!(rejected.rejection_message("Fehler"), Some("Fehler".to_string()));

        let explained: ApiOutcome<()> = ApiOutcome::Rejected {
            status: StatusCode::FORBIDDEN,
            message: Some("Nur Admins".to_string()),
        };
        assert_eq!(
            explained.rejection_message("Fehler"),
            Some("Nur Admins".to_string())
        );

        assert_eq!(ApiOutcome::Success(()).rejection_message("Fehler"), None);
    }
}
