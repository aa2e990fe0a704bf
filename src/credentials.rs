use std::io::ErrorKind;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret as OAuthClientSecret, CsrfToken,
    PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

use crate::error::AuthError;

pub const PHOTOS_LIBRARY_SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary";
pub const API_NAME: &str = "photoslibrary";
pub const API_VERSION: &str = "v1";

const EXPIRY_SKEW_SECS: i64 = 60;
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Bearer token for the library API, plus what is needed to renew it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn is_valid(&self) -> bool {
        let deadline = Utc::now() + TimeDelta::seconds(EXPIRY_SKEW_SECS);
        !self.access_token.is_empty() && self.expires_at.is_none_or(|expiry| deadline < expiry)
    }

    fn from_token_response(token: &BasicTokenResponse, refresh_token: Option<String>) -> Credential {
        Credential {
            access_token: token.access_token().secret().clone(),
            refresh_token: token
                .refresh_token()
                .map(|t| t.secret().clone())
                .or(refresh_token),
            expires_at: token
                .expires_in()
                .and_then(|d| TimeDelta::from_std(d).ok())
                .map(|d| Utc::now() + d),
        }
    }
}

pub trait CredentialStore {
    fn load(&self) -> Result<Option<Credential>, AuthError>;
    fn save(&self, credential: &Credential) -> Result<(), AuthError>;
    fn delete(&self) -> Result<(), AuthError>;
}

/// Credential cache kept as JSON in `token_{api}_{version}.json`.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(directory: impl AsRef<Path>, api_name: &str, api_version: &str) -> FileCredentialStore {
        let path = directory
            .as_ref()
            .join(format!("token_{api_name}_{api_version}.json"));
        FileCredentialStore { path }
    }

    fn storage_error(&self, error: std::io::Error) -> AuthError {
        AuthError::Storage {
            path: self.path.clone(),
            error,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, AuthError> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error(e)),
        };

        match serde_json::from_slice(&contents) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                warn!("Discarding unreadable credential cache {}: {e}", self.path.display());
                if let Err(e) = std::fs::remove_file(&self.path) {
                    warn!("Unable to remove {}: {e}", self.path.display());
                }
                Err(AuthError::CorruptCredential {
                    path: self.path.clone(),
                })
            }
        }
    }

    fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
        }
        let contents = serde_json::to_string_pretty(credential).map_err(|e| {
            self.storage_error(std::io::Error::new(ErrorKind::InvalidData, e))
        })?;
        std::fs::write(&self.path, contents).map_err(|e| self.storage_error(e))
    }

    fn delete(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error(e)),
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Runs the interactive consent flow for a brand new credential.
    async fn consent(&self) -> Result<Credential, AuthError>;
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;
}

pub struct CredentialProvider<S, A> {
    store: S,
    authenticator: A,
}

impl<S: CredentialStore, A: Authenticator> CredentialProvider<S, A> {
    pub fn new(store: S, authenticator: A) -> CredentialProvider<S, A> {
        CredentialProvider {
            store,
            authenticator,
        }
    }

    /// Returns a usable credential, refreshing or re-authorising as needed.
    /// Whatever comes back is written to the cache.
    pub async fn obtain(&self) -> Result<Credential, AuthError> {
        let credential = match self.store.load()? {
            Some(cached) if cached.is_valid() => {
                debug!("Using cached credential");
                return Ok(cached);
            }
            Some(cached) if cached.refresh_token.is_some() => {
                info!("Cached credential expired, refreshing");
                self.authenticator.refresh(&cached).await?
            }
            _ => {
                info!("No usable cached credential, starting authorisation");
                self.authenticator.consent().await?
            }
        };

        self.store.save(&credential)?;
        Ok(credential)
    }

    pub fn release(&self) {
        match self.store.delete() {
            Ok(()) => info!("Deleted the credential cache."),
            Err(e) => warn!("{e}"),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ClientSecret {
    /// Reads a Google client-secret download, either the `installed` or the
    /// `web` flavour.
    pub fn read(path: impl AsRef<Path>) -> Result<ClientSecret, AuthError> {
        #[derive(Deserialize)]
        struct ClientSecretFile {
            installed: Option<ClientSecret>,
            web: Option<ClientSecret>,
        }

        let path = path.as_ref();
        let err = |msg: String| AuthError::ClientSecret {
            path: path.to_path_buf(),
            msg,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        let file: ClientSecretFile =
            serde_json::from_str(&contents).map_err(|e| err(e.to_string()))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| err("no \"installed\" or \"web\" client section".to_string()))
    }
}

pub struct GoogleAuthenticator {
    secret: ClientSecret,
    scopes: Vec<String>,
}

impl GoogleAuthenticator {
    pub fn new(secret: ClientSecret) -> GoogleAuthenticator {
        GoogleAuthenticator {
            secret,
            scopes: vec![PHOTOS_LIBRARY_SCOPE.to_string()],
        }
    }

    fn oauth_client(&self) -> Result<BasicClient, AuthError> {
        let auth_url = AuthUrl::new(self.secret.auth_uri.clone()).map_err(|e| {
            AuthError::ClientSecret {
                path: PathBuf::new(),
                msg: format!("invalid auth_uri: {e}"),
            }
        })?;
        let token_url = TokenUrl::new(self.secret.token_uri.clone()).map_err(|e| {
            AuthError::ClientSecret {
                path: PathBuf::new(),
                msg: format!("invalid token_uri: {e}"),
            }
        })?;

        Ok(BasicClient::new(
            ClientId::new(self.secret.client_id.clone()),
            self.secret.client_secret.clone().map(OAuthClientSecret::new),
            auth_url,
            Some(token_url),
        ))
    }
}

#[async_trait]
impl Authenticator for GoogleAuthenticator {
    async fn consent(&self) -> Result<Credential, AuthError> {
        let callback_err = |e: std::io::Error| AuthError::Callback { msg: e.to_string() };

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(callback_err)?;
        let port = listener.local_addr().map_err(callback_err)?.port();
        let redirect_url = RedirectUrl::new(format!("http://localhost:{port}/"))
            .map_err(|e| AuthError::Callback { msg: e.to_string() })?;
        let client = self.oauth_client()?.set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge);
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (auth_url, csrf_token) = request.url();

        println!("Please visit this URL to authorise this application: {auth_url}");
        if let Err(e) = webbrowser::open(auth_url.as_str()) {
            warn!("Unable to open a browser: {e}");
        }

        let code = tokio::time::timeout(
            CONSENT_TIMEOUT,
            wait_for_code(&listener, csrf_token.secret()),
        )
        .await
        .map_err(|_| AuthError::ConsentDenied {
            reason: "timed out waiting for the authorisation redirect".to_string(),
        })??;

        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::TokenExchange { msg: e.to_string() })?;

        Ok(Credential::from_token_response(&token, None))
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::Refresh {
                msg: "credential has no refresh token".to_string(),
            })?;

        let token = self
            .oauth_client()?
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Refresh { msg: e.to_string() })?;

        Ok(Credential::from_token_response(&token, Some(refresh_token)))
    }
}

async fn wait_for_code(listener: &TcpListener, expected_state: &str) -> Result<String, AuthError> {
    loop {
        let mut stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                debug!("Ignoring failed connection on redirect listener: {e}");
                continue;
            }
        };
        let request_line = {
            let mut reader = BufReader::new(&mut stream);
            let mut line = String::new();
            if let Err(e) = reader.read_line(&mut line).await {
                debug!("Ignoring unreadable request on redirect listener: {e}");
                continue;
            }
            line
        };

        let outcome = parse_callback(&request_line, expected_state);
        let (status, body) = match &outcome {
            Ok(Some(_)) => ("200 OK", "Authorisation complete. You may close this window."),
            Ok(None) => ("404 Not Found", ""),
            Err(_) => ("400 Bad Request", "Authorisation failed."),
        };
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body>{body}</body></html>"
        );
        if let Err(e) = stream.write_all(response.as_bytes()).await {
            debug!("Unable to answer authorisation redirect: {e}");
        }

        if let Some(code) = outcome? {
            return Ok(code);
        }
    }
}

/// Pulls the authorisation code out of the redirect's request line.
/// Anything that is not the redirect (a favicon request, a preconnect that
/// sent nothing, garbage) gives `None`.
fn parse_callback(request_line: &str, expected_state: &str) -> Result<Option<String>, AuthError> {
    let Some(target) = request_line.split_whitespace().nth(1) else {
        return Ok(None);
    };
    let Ok(url) = Url::parse(&format!("http://localhost{target}")) else {
        return Ok(None);
    };

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(reason) = param("error") {
        return Err(AuthError::ConsentDenied { reason });
    }

    let (code, state) = (param("code"), param("state"));
    if code.is_none() && state.is_none() {
        return Ok(None);
    }
    if state.as_deref() != Some(expected_state) {
        return Err(AuthError::Callback {
            msg: "state parameter does not match".to_string(),
        });
    }
    code.map(Some).ok_or_else(|| AuthError::Callback {
        msg: "redirect carried no authorisation code".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        credential: Mutex<Option<Credential>>,
        saves: AtomicUsize,
    }

    impl CredentialStore for MemoryStore {
        fn load(&self) -> Result<Option<Credential>, AuthError> {
            Ok(self.credential.lock().unwrap().clone())
        }

        fn save(&self, credential: &Credential) -> Result<(), AuthError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.credential.lock().unwrap() = Some(credential.clone());
            Ok(())
        }

        fn delete(&self) -> Result<(), AuthError> {
            *self.credential.lock().unwrap() = None;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeAuthenticator {
        consents: AtomicUsize,
        refreshes: AtomicUsize,
    }

    #[async_trait]
    impl Authenticator for FakeAuthenticator {
        async fn consent(&self) -> Result<Credential, AuthError> {
            self.consents.fetch_add(1, Ordering::SeqCst);
            Ok(credential("consented", Some("refresh"), TimeDelta::hours(1)))
        }

        async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(Credential {
                access_token: "refreshed".to_string(),
                refresh_token: credential.refresh_token.clone(),
                expires_at: Some(Utc::now() + TimeDelta::hours(1)),
            })
        }
    }

    fn credential(token: &str, refresh: Option<&str>, expires_in: TimeDelta) -> Credential {
        Credential {
            access_token: token.to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_at: Some(Utc::now() + expires_in),
        }
    }

    fn provider_with(cached: Option<Credential>) -> CredentialProvider<MemoryStore, FakeAuthenticator> {
        let store = MemoryStore::default();
        *store.credential.lock().unwrap() = cached;
        CredentialProvider::new(store, FakeAuthenticator::default())
    }

    #[tokio::test]
    async fn valid_cached_credential_is_reused() {
        let cached = credential("cached", Some("refresh"), TimeDelta::hours(1));
        let provider = provider_with(Some(cached.clone()));

        assert_eq!(provider.obtain().await.unwrap(), cached);
        assert_eq!(provider.authenticator.consents.load(Ordering::SeqCst), 0);
        assert_eq!(provider.authenticator.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(provider.store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_credential_is_refreshed_and_saved() {
        let provider = provider_with(Some(credential(
            "stale",
            Some("refresh"),
            TimeDelta::hours(-1),
        )));

        let obtained = provider.obtain().await.unwrap();

        assert_eq!(obtained.access_token, "refreshed");
        assert_eq!(obtained.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(provider.authenticator.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(provider.store.load().unwrap(), Some(obtained));
    }

    #[tokio::test]
    async fn expired_credential_without_refresh_token_needs_consent() {
        let provider = provider_with(Some(credential("stale", None, TimeDelta::hours(-1))));

        let obtained = provider.obtain().await.unwrap();

        assert_eq!(obtained.access_token, "consented");
        assert_eq!(provider.authenticator.consents.load(Ordering::SeqCst), 1);
        assert_eq!(provider.authenticator.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_credential_needs_consent() {
        let provider = provider_with(None);

        let obtained = provider.obtain().await.unwrap();

        assert_eq!(obtained.access_token, "consented");
        assert_eq!(provider.store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn release_clears_cache() {
        let provider = provider_with(Some(credential("cached", None, TimeDelta::hours(1))));
        provider.release();
        assert!(provider.store.load().unwrap().is_none());
        provider.release();
    }

    #[test]
    fn credential_without_expiry_is_valid() {
        let credential = Credential {
            access_token: "token".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        assert!(credential.is_valid());
    }

    #[test]
    fn credential_about_to_expire_is_invalid() {
        assert!(!credential("token", None, TimeDelta::seconds(10)).is_valid());
    }

    #[test]
    fn file_store_round_trip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("credentials");
        let store = FileCredentialStore::new(&cache_dir, API_NAME, API_VERSION);
        assert!(store.load().unwrap().is_none());

        let saved = credential("cached", Some("refresh"), TimeDelta::hours(1));
        store.save(&saved).unwrap();
        assert_eq!(store.load().unwrap(), Some(saved));

        assert!(cache_dir.join("token_photoslibrary_v1.json").exists());

        store.delete().unwrap();
        assert!(!cache_dir.join("token_photoslibrary_v1.json").exists());
        store.delete().unwrap();
    }

    #[test]
    fn corrupt_cache_is_removed_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path(), API_NAME, API_VERSION);
        let cache = dir.path().join("token_photoslibrary_v1.json");
        std::fs::write(&cache, b"\x80\x04\x95not json").unwrap();

        assert!(matches!(
            store.load(),
            Err(AuthError::CorruptCredential { .. })
        ));
        assert!(!cache.exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn unparseable_utf8_cache_is_removed_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path(), API_NAME, API_VERSION);
        let cache = dir.path().join("token_photoslibrary_v1.json");
        std::fs::write(&cache, "{\"access_token\": ").unwrap();

        assert!(matches!(
            store.load(),
            Err(AuthError::CorruptCredential { .. })
        ));
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn leftover_binary_cache_leads_to_fresh_consent_on_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("token_photoslibrary_v1.json");
        std::fs::write(&cache, b"\x80\x04\x95pickle").unwrap();
        let provider = CredentialProvider::new(
            FileCredentialStore::new(dir.path(), API_NAME, API_VERSION),
            FakeAuthenticator::default(),
        );

        assert!(matches!(
            provider.obtain().await,
            Err(AuthError::CorruptCredential { .. })
        ));
        assert_eq!(provider.obtain().await.unwrap().access_token, "consented");
        assert_eq!(provider.authenticator.consents.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reads_installed_client_secret() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("client_secret.json");
        std::fs::write(
            &file,
            r#"{"installed":{"client_id":"id.apps.googleusercontent.com","project_id":"p","auth_uri":"https://accounts.google.com/o/oauth2/auth","token_uri":"https://oauth2.googleapis.com/token","client_secret":"shh","redirect_uris":["http://localhost"]}}"#,
        )
        .unwrap();

        let secret = ClientSecret::read(&file).unwrap();
        assert_eq!(secret.client_id, "id.apps.googleusercontent.com");
        assert_eq!(secret.client_secret.as_deref(), Some("shh"));
    }

    #[test]
    fn client_secret_without_client_section_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("client_secret.json");
        std::fs::write(&file, r#"{"other":{}}"#).unwrap();

        assert!(matches!(
            ClientSecret::read(&file),
            Err(AuthError::ClientSecret { .. })
        ));
    }

    #[test]
    fn callback_yields_code_for_matching_state() {
        let line = "GET /?state=abc&code=4%2F0Axyz&scope=photoslibrary HTTP/1.1\r\n";
        assert_eq!(
            parse_callback(line, "abc").unwrap(),
            Some("4/0Axyz".to_string())
        );
    }

    #[test]
    fn callback_rejects_wrong_state() {
        let line = "GET /?state=evil&code=123 HTTP/1.1\r\n";
        assert!(matches!(
            parse_callback(line, "abc"),
            Err(AuthError::Callback { .. })
        ));
    }

    #[test]
    fn callback_reports_denied_consent() {
        let line = "GET /?error=access_denied&state=abc HTTP/1.1\r\n";
        match parse_callback(line, "abc") {
            Err(AuthError::ConsentDenied { reason }) => assert_eq!(reason, "access_denied"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unrelated_request_is_ignored() {
        assert_eq!(parse_callback("GET /favicon.ico HTTP/1.1\r\n", "abc").unwrap(), None);
    }

    #[test]
    fn empty_or_garbled_request_is_ignored() {
        assert_eq!(parse_callback("", "abc").unwrap(), None);
        assert_eq!(parse_callback("\r\n", "abc").unwrap(), None);
        assert_eq!(parse_callback("\x16\x03\x01", "abc").unwrap(), None);
    }

    #[tokio::test]
    async fn preconnect_does_not_end_consent_wait() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let browser = tokio::spawn(async move {
            // opened and closed without a request
            drop(tokio::net::TcpStream::connect(addr).await.unwrap());

            let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET /?state=abc&code=the-code HTTP/1.1\r\n")
                .await
                .unwrap();
            let mut response = String::new();
            tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
                .await
                .unwrap();
            response
        });

        let code = wait_for_code(&listener, "abc").await.unwrap();

        assert_eq!(code, "the-code");
        assert!(browser.await.unwrap().starts_with("HTTP/1.1 200 OK"));
    }

    #[tokio::test]
    async fn refresh_keeps_refresh_token() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "token_type": "Bearer",
                "expires_in": 3599,
                "scope": PHOTOS_LIBRARY_SCOPE
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let authenticator = GoogleAuthenticator::new(ClientSecret {
            client_id: "id".to_string(),
            client_secret: Some("secret".to_string()),
            auth_uri: format!("{}/auth", mock_server.uri()),
            token_uri: format!("{}/token", mock_server.uri()),
        });
        let stale = credential("stale", Some("keep-me"), TimeDelta::hours(-1));

        let refreshed = authenticator.refresh(&stale).await.unwrap();

        assert_eq!(refreshed.access_token, "fresh");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("keep-me"));
        assert!(refreshed.is_valid());
    }

    #[tokio::test]
    async fn failed_refresh_is_an_auth_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&mock_server)
            .await;

        let authenticator = GoogleAuthenticator::new(ClientSecret {
            client_id: "id".to_string(),
            client_secret: None,
            auth_uri: format!("{}/auth", mock_server.uri()),
            token_uri: format!("{}/token", mock_server.uri()),
        });
        let stale = credential("stale", Some("revoked"), TimeDelta::hours(-1));

        assert!(matches!(
            authenticator.refresh(&stale).await,
            Err(AuthError::Refresh { .. })
        ));
    }
}
