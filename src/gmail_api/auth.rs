use async_trait::async_trait;
use chrono::Utc;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    Scope, TokenResponse, TokenUrl,
};
use std::io::{BufRead, Write};
use std::time::Duration;

use crate::error::{ExportError, Result};
use crate::token_store::{Credentials, TokenStore};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

// Google usually grants an hour; only used when the response omits expires_in.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// An authenticated Gmail session: the bearer token every API call carries.
#[derive(Debug)]
pub struct Session {
    pub access_token: String,
}

/// Tokens returned by a single exchange. The refresh grant routinely omits
/// the refresh token, in which case the stored one is carried forward.
#[derive(Debug)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<Duration>,
}

impl TokenSet {
    fn into_credentials(self, previous_refresh: Option<String>) -> Result<Credentials> {
        let refresh_token = self.refresh_token.or(previous_refresh).ok_or_else(|| {
            ExportError::TokenExchange("authorization server returned no refresh token".to_string())
        })?;
        let lifetime = self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        Ok(Credentials {
            access_token: self.access_token,
            refresh_token,
            expiry_date: Utc::now().timestamp_millis() + lifetime.as_millis() as i64,
        })
    }
}

// Define a trait for the OAuth exchanges to allow mocking
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenExchange: Send + Sync {
    fn authorization_url(&self) -> String;
    async fn exchange_code(&self, code: &str) -> Result<TokenSet>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet>;
}

// Define a trait for the consent prompt so the flow is testable without a
// real terminal
#[cfg_attr(test, mockall::automock)]
pub trait CodeProvider: Send + Sync {
    fn obtain_code(&self, auth_url: &str) -> Result<String>;
}

/// Blocking stdin prompt used during first-time (or failed-refresh)
/// authorization.
pub struct StdinCodeProvider;

impl CodeProvider for StdinCodeProvider {
    fn obtain_code(&self, auth_url: &str) -> Result<String> {
        println!("Authorize this app by visiting this url: {}", auth_url);
        println!("After authorization, you will be redirected. Copy the code from the URL and paste it here.");
        print!("Enter the code from that page here: ");
        std::io::stdout().flush().map_err(ExportError::CodePrompt)?;

        let mut code = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut code)
            .map_err(ExportError::CodePrompt)?;
        Ok(code.trim().to_string())
    }
}

/// Real exchanges against Google's OAuth2 endpoints.
pub struct GoogleTokenExchange {
    client: BasicClient,
}

impl GoogleTokenExchange {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Result<Self> {
        let client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string())
                .map_err(|e| ExportError::TokenExchange(e.to_string()))?,
            Some(
                TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
                    .map_err(|e| ExportError::TokenExchange(e.to_string()))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(redirect_uri.to_string())
                .map_err(|e| ExportError::TokenExchange(e.to_string()))?,
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl TokenExchange for GoogleTokenExchange {
    fn authorization_url(&self) -> String {
        // access_type=offline is what gets us a refresh token back
        let (url, _csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(GMAIL_READONLY_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .url();
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| ExportError::TokenExchange(e.to_string()))?;
        Ok(token_set(&token))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        let token = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| ExportError::TokenExchange(e.to_string()))?;
        Ok(token_set(&token))
    }
}

fn token_set(token: &BasicTokenResponse) -> TokenSet {
    TokenSet {
        access_token: token.access_token().secret().to_string(),
        refresh_token: token.refresh_token().map(|r| r.secret().to_string()),
        expires_in: token.expires_in(),
    }
}

/// Obtain a valid session: reuse the stored token, refresh it, or fall back
/// to interactive consent, in that order.
pub async fn authorize(
    store: &TokenStore,
    exchange: &dyn TokenExchange,
    codes: &dyn CodeProvider,
) -> Result<Session> {
    let credentials = match store.load() {
        Ok(credentials) => credentials,
        // Token file doesn't exist or is invalid, get a new one
        Err(_) => return consent_flow(store, exchange, codes).await,
    };

    if credentials.is_expired() {
        tracing::info!("stored access token expired, refreshing");
        match exchange.refresh(&credentials.refresh_token).await {
            Ok(tokens) => {
                let refreshed = tokens.into_credentials(Some(credentials.refresh_token))?;
                store.save(&refreshed)?;
                tracing::info!("token refreshed and saved to {}", store.path().display());
                return Ok(Session {
                    access_token: refreshed.access_token,
                });
            }
            Err(e) => {
                // The refresh error stays local; re-consent recovers from it.
                tracing::warn!("failed to refresh token: {}", e);
                tracing::info!("getting a new token interactively");
                return consent_flow(store, exchange, codes).await;
            }
        }
    }

    Ok(Session {
        access_token: credentials.access_token,
    })
}

async fn consent_flow(
    store: &TokenStore,
    exchange: &dyn TokenExchange,
    codes: &dyn CodeProvider,
) -> Result<Session> {
    let auth_url = exchange.authorization_url();
    let code = codes.obtain_code(&auth_url)?;
    let tokens = exchange.exchange_code(&code).await?;
    let credentials = tokens.into_credentials(None)?;
    store.save(&credentials)?;
    tracing::info!("token stored to {}", store.path().display());
    Ok(Session {
        access_token: credentials.access_token,
    })
}
