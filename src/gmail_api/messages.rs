use async_trait::async_trait;
use reqwest::StatusCode;
use std::future::Future;

use crate::error::{ExportError, Result};
use crate::types::{Message, MessagesResponse};

const BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail's list endpoint is paged by at most this many ids per request.
pub const PAGE_SIZE: usize = 100;

/// The two Gmail calls the exporter needs, behind a trait so the
/// orchestrator can be driven by fakes in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailApi: Send + Sync {
    /// Ids of messages in the Sent folder, newest first, never more than
    /// `limit` of them.
    async fn list_sent_message_ids(&self, limit: usize) -> Result<Vec<String>>;

    /// The full representation (headers plus MIME part tree) of one message.
    async fn fetch_full(&self, id: &str) -> Result<Message>;
}

/// Thin Gmail REST client carrying the session token; owned by the
/// orchestrator and used for every call in the run.
pub struct GmailClient {
    client: reqwest::Client,
    access_token: String,
}

impl GmailClient {
    pub fn new(client: reqwest::Client, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }

    async fn list_page(
        &self,
        max_results: usize,
        page_token: Option<String>,
    ) -> Result<MessagesResponse> {
        let mut url = format!(
            "{}/messages?labelIds=SENT&maxResults={}",
            BASE_URL, max_results
        );
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&token);
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        check_status(response.status(), "listing sent messages")?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MailApi for GmailClient {
    async fn list_sent_message_ids(&self, limit: usize) -> Result<Vec<String>> {
        collect_pages(limit, |max_results, page_token| {
            self.list_page(max_results, page_token)
        })
        .await
    }

    async fn fetch_full(&self, id: &str) -> Result<Message> {
        let url = format!("{}/messages/{}?format=full", BASE_URL, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        check_status(response.status(), &format!("fetching message {}", id))?;
        Ok(response.json().await?)
    }
}

/// Maps 401/403 to the distinct re-authentication error (with operator
/// guidance logged) and every other non-success status to an API error.
fn check_status(status: StatusCode, context: &str) -> Result<()> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::error!(
            "authentication error (HTTP {}) while {}; please delete the stored token file and re-run to re-authenticate",
            status.as_u16(),
            context
        );
        return Err(ExportError::AuthRequired {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(ExportError::Api {
            status: status.as_u16(),
            context: context.to_string(),
        });
    }
    Ok(())
}

/// How many ids to ask for on the next page: never more than the endpoint's
/// page size, never more than what is still needed to reach the cap.
fn next_page_size(limit: usize, collected: usize) -> usize {
    PAGE_SIZE.min(limit - collected)
}

/// Follows next-page tokens until they run out or `limit` ids are collected,
/// truncating the final page so the total never exceeds the cap. Any page
/// error aborts the whole listing; there is no partial result.
async fn collect_pages<F, Fut>(limit: usize, mut fetch_page: F) -> Result<Vec<String>>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = Result<MessagesResponse>>,
{
    let mut ids: Vec<String> = Vec::new();
    if limit == 0 {
        return Ok(ids);
    }

    let mut page_token: Option<String> = None;
    loop {
        let page = fetch_page(next_page_size(limit, ids.len()), page_token.take()).await?;

        if let Some(refs) = page.messages {
            let remaining = limit - ids.len();
            ids.extend(refs.into_iter().filter_map(|m| m.id).take(remaining));
        }

        page_token = if ids.len() < limit {
            page.next_page_token
        } else {
            None
        };
        if page_token.is_none() {
            break;
        }
    }

    Ok(ids)
}
