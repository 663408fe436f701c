use std::path::Path;

use crate::csv_export;
use crate::email_content::{extract_body, extract_subject};
use crate::error::Result;
use crate::gmail_api::MailApi;
use crate::types::EmailRecord;

/// How often a progress line is logged while fetching.
const PROGRESS_INTERVAL: usize = 10;

/// List sent-message ids up to `max_messages`, fetch and parse each one, and
/// write the CSV. Listing and output-write failures are fatal; per-message
/// failures are warnings and the run continues. Returns the number of rows
/// written.
pub async fn run_export(
    api: &dyn MailApi,
    max_messages: usize,
    output: &Path,
) -> Result<usize> {
    tracing::info!("fetching message ids from the Sent folder");
    let mut ids = api.list_sent_message_ids(max_messages).await?;
    // The lister already caps, but never trust it to: an over-returning
    // implementation must not push us past the ceiling.
    ids.truncate(max_messages);
    tracing::info!(
        "found {} sent messages (capped at {})",
        ids.len(),
        max_messages
    );

    let records = collect_records(api, &ids).await;

    csv_export::write_csv(output, &records)?;
    tracing::info!(
        "successfully saved {} sent emails to {}",
        records.len(),
        output.display()
    );
    Ok(records.len())
}

/// Fetch each message in listing order and extract one record per parsable
/// message. Output order equals input order; failures only cost the one
/// message they hit.
pub async fn collect_records(api: &dyn MailApi, ids: &[String]) -> Vec<EmailRecord> {
    let total = ids.len();
    let mut records = Vec::new();

    for (index, id) in ids.iter().enumerate() {
        if (index + 1) % PROGRESS_INTERVAL == 0 {
            tracing::info!("processing message {} of {}", index + 1, total);
        }

        let message = match api.fetch_full(id).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("failed to fetch or parse message {}: {}", id, e);
                continue;
            }
        };

        let Some(payload) = message.payload else {
            tracing::warn!("message {} has missing payload or headers", id);
            continue;
        };
        let Some(headers) = payload.headers.as_deref() else {
            tracing::warn!("message {} has missing payload or headers", id);
            continue;
        };

        records.push(EmailRecord {
            subject: extract_subject(headers),
            body: extract_body(&payload),
        });
    }

    records
}
