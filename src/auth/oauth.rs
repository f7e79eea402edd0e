//! OAuth authorization-code flow with a loopback redirect listener.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::process::Command;
use tokio::sync::oneshot;
use url::Url;

use crate::auth::token::{Token, TokenResponse};
use crate::error::{AppError, Result};
use crate::models::AuthConfig;
use crate::utils::http::ensure_success;

/// Browsers tried in order when opening the authorization page.
const BROWSERS: [&str; 3] = ["xdg-open", "google-chrome", "open"];

const COMPLETED: &str = "Authorization completed, close browser and return to console";

const STATE_LEN: usize = 32;

/// How long open connections may drain once the flow has an outcome.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Query parameters of a redirect request.
#[derive(Debug, Default, Deserialize)]
struct RedirectParams {
    state: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

/// What a request to the redirect listener carried.
#[derive(Debug, PartialEq, Eq)]
enum Callback {
    Code(String),
    Denied(String),
    Invalid(&'static str),
}

/// One run of the browser authorization flow.
#[derive(Clone)]
pub struct OAuthFlow {
    config: AuthConfig,
    http: reqwest::Client,
    state: String,
}

/// Shared by the redirect handlers of one `serve` call.
struct Redirect {
    flow: OAuthFlow,
    outcome: Mutex<Option<oneshot::Sender<Result<Token>>>>,
}

impl Redirect {
    /// Hand the first outcome back to `serve`; later ones are dropped.
    fn finish(&self, result: Result<Token>) {
        let sender = self
            .outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(sender) => {
                let _ = sender.send(result);
            }
            None => log::debug!("Authorization already finished, ignoring redirect"),
        }
    }
}

impl OAuthFlow {
    pub fn new(config: AuthConfig) -> Result<Self> {
        if config.client_id.trim().is_empty() || config.client_secret.trim().is_empty() {
            return Err(AppError::auth(
                "auth.client_id and auth.client_secret are required for OAuth \
                 (or set auth.access_key to use a static key)",
            ));
        }

        Ok(Self {
            config,
            http: reqwest::Client::new(),
            state: random_state(),
        })
    }

    /// Page the user is sent to.
    pub fn authorize_url(&self) -> Result<Url> {
        let scope = self.config.scopes.join(" ");
        let redirect_uri = self.config.redirect_uri();
        Ok(Url::parse_with_params(
            &self.config.authorize_url,
            [
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", self.state.as_str()),
            ],
        )?)
    }

    /// Run the whole flow: listen, open the browser, wait for the redirect.
    pub async fn authorize(&self) -> Result<Token> {
        let listener = TcpListener::bind(&self.config.redirect_bind).await?;
        let url = self.authorize_url()?;
        open_browser(url.as_str()).await;
        self.serve(listener).await
    }

    /// Answer redirect requests on `listener` until one yields a token or
    /// a denial.
    ///
    /// Connections are served concurrently, so an idle socket cannot hold
    /// up the real redirect.
    pub async fn serve(&self, listener: TcpListener) -> Result<Token> {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let redirect = Arc::new(Redirect {
            flow: self.clone(),
            outcome: Mutex::new(Some(outcome_tx)),
        });
        let app = Router::new()
            .route("/", get(handle_redirect))
            .with_state(redirect);

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let outcome = outcome_rx.await;
        let _ = shutdown_tx.send(());
        match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => log::debug!("Redirect listener failed: {e}"),
            Ok(Err(e)) => log::debug!("Redirect listener task failed: {e}"),
            Err(_) => log::debug!("Redirect listener still draining, leaving it behind"),
        }

        outcome.map_err(|_| AppError::auth("redirect listener stopped before authorization"))?
    }

    fn check_callback(&self, params: &RedirectParams) -> Callback {
        if params.state.as_deref() != Some(self.state.as_str()) {
            return Callback::Invalid("Invalid oauth state");
        }
        match (&params.code, &params.error) {
            (Some(code), _) if !code.is_empty() => Callback::Code(code.clone()),
            (_, Some(error)) => Callback::Denied(error.clone()),
            _ => Callback::Invalid("Missing authorization code"),
        }
    }

    /// Trade an authorization code for a token.
    async fn exchange(&self, code: &str) -> Result<Token> {
        let redirect_uri = self.config.redirect_uri();
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        let body = ensure_success(response).await?.bytes().await?;
        let token: TokenResponse = serde_json::from_slice(&body)?;
        Ok(token.into())
    }
}

async fn handle_redirect(
    State(redirect): State<Arc<Redirect>>,
    Query(params): Query<RedirectParams>,
) -> (StatusCode, String) {
    match redirect.flow.check_callback(&params) {
        Callback::Invalid(reason) => {
            log::debug!("Rejected redirect request: {reason}");
            (StatusCode::BAD_REQUEST, reason.to_string())
        }
        Callback::Denied(reason) => {
            redirect.finish(Err(AppError::auth(format!(
                "authorization denied: {reason}"
            ))));
            (StatusCode::BAD_REQUEST, reason)
        }
        Callback::Code(code) => match redirect.flow.exchange(&code).await {
            Ok(token) => {
                redirect.finish(Ok(token));
                (StatusCode::OK, COMPLETED.to_string())
            }
            Err(e) => {
                let message = format!("OAuth exchange failed with {e}");
                redirect.finish(Err(AppError::auth(&message)));
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        },
    }
}

/// Unguessable value tying the redirect to this flow.
fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

async fn open_browser(url: &str) {
    for browser in BROWSERS {
        match Command::new(browser).arg(url).status().await {
            Ok(status) if status.success() => return,
            Ok(status) => log::debug!("{browser} exited with {status}"),
            Err(e) => log::debug!("Could not run {browser}: {e}"),
        }
    }
    log::warn!("Could not open a browser. Visit this URL to authorize: {url}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(token_url: String) -> AuthConfig {
        AuthConfig {
            client_id: "app-id".into(),
            client_secret: "app-secret".into(),
            token_url,
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_requires_client_credentials() {
        assert!(OAuthFlow::new(AuthConfig::default()).is_err());
    }

    #[test]
    fn test_authorize_url() {
        let flow = OAuthFlow::new(config("http://unused".into())).unwrap();
        let url = flow.authorize_url().unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(url.as_str().starts_with("https://unsplash.com/oauth/authorize?"));
        assert!(pairs.contains(&("client_id".into(), "app-id".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://localhost:9900".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "scope".into(),
            "public read_photos read_collections".into()
        )));
        assert!(pairs.contains(&("state".into(), flow.state.clone())));
    }

    fn params(state: &str, code: Option<&str>, error: Option<&str>) -> RedirectParams {
        RedirectParams {
            state: Some(state.to_string()),
            code: code.map(String::from),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_check_callback() {
        let flow = OAuthFlow::new(config("http://unused".into())).unwrap();
        let state = flow.state.clone();

        assert_eq!(
            flow.check_callback(&params(&state, Some("abc"), None)),
            Callback::Code("abc".into())
        );
        assert_eq!(
            flow.check_callback(&params("forged", Some("abc"), None)),
            Callback::Invalid("Invalid oauth state")
        );
        assert_eq!(
            flow.check_callback(&RedirectParams::default()),
            Callback::Invalid("Invalid oauth state")
        );
        assert_eq!(
            flow.check_callback(&params(&state, None, Some("access_denied"))),
            Callback::Denied("access_denied".into())
        );
        assert_eq!(
            flow.check_callback(&params(&state, Some(""), None)),
            Callback::Invalid("Missing authorization code")
        );
    }

    #[test]
    fn test_state_is_random() {
        let first = OAuthFlow::new(config("http://unused".into())).unwrap();
        let second = OAuthFlow::new(config("http://unused".into())).unwrap();

        assert_eq!(first.state.len(), STATE_LEN);
        assert!(first.state.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first.state, second.state);
    }

    #[tokio::test]
    async fn test_serve_exchanges_code_for_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"access_token":"granted","token_type":"bearer","scope":"public"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let flow = OAuthFlow::new(config(format!("{}/oauth/token", server.uri()))).unwrap();
        let state = flow.state.clone();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let browser = tokio::spawn(async move {
            let client = reqwest::Client::new();
            let forged = client
                .get(format!("http://{addr}/?code=x&state=forged"))
                .send()
                .await
                .unwrap();
            assert_eq!(forged.status().as_u16(), 400);

            client
                .get(format!("http://{addr}/?code=the-code&state={state}"))
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap()
        });

        let token = flow.serve(listener).await.unwrap();
        assert_eq!(token.access_token, "granted");
        assert_eq!(browser.await.unwrap(), COMPLETED);
    }

    #[tokio::test]
    async fn test_serve_reports_denied_authorization() {
        let flow = OAuthFlow::new(config("http://unused".into())).unwrap();
        let state = flow.state.clone();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let _ = reqwest::get(format!("http://{addr}/?error=access_denied&state={state}")).await;
        });

        let err = flow.serve(listener).await.unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[tokio::test]
    async fn test_idle_connection_does_not_block_redirect() {
        let flow = OAuthFlow::new(config("http://unused".into())).unwrap();
        let state = flow.state.clone();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // opened and never written to, like a browser preconnect
        let _idle = tokio::net::TcpStream::connect(addr).await.unwrap();
        tokio::spawn(async move {
            let _ = reqwest::get(format!("http://{addr}/?error=access_denied&state={state}")).await;
        });

        let result = tokio::time::timeout(Duration::from_secs(5), flow.serve(listener))
            .await
            .expect("redirect was answered despite the idle connection");
        assert!(result.unwrap_err().to_string().contains("access_denied"));
    }

    #[tokio::test]
    async fn test_unknown_paths_are_not_redirects() {
        let flow = OAuthFlow::new(config("http://unused".into())).unwrap();
        let state = flow.state.clone();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let browser = tokio::spawn(async move {
            let favicon = reqwest::get(format!("http://{addr}/favicon.ico")).await.unwrap();
            let _ = reqwest::get(format!("http://{addr}/?error=access_denied&state={state}")).await;
            favicon.status().as_u16()
        });

        assert!(flow.serve(listener).await.is_err());
        assert_eq!(browser.await.unwrap(), 404);
    }
}
