use base64::engine::general_purpose::URL_SAFE;
use base64::engine::Engine;

use crate::types::{Header, MessagePart};

/// Case-insensitive lookup of the Subject header. Absent means empty; this
/// never fails.
pub fn extract_subject(headers: &[Header]) -> String {
    headers
        .iter()
        .find(|h| {
            h.name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case("subject"))
        })
        .and_then(|h| h.value.clone())
        .unwrap_or_default()
}

/// Depth-first search of the part tree for the first text content. Plain
/// text and HTML are treated alike; whichever appears first in document
/// order wins. Yields an empty string when the whole tree has nothing.
pub fn extract_body(payload: &MessagePart) -> String {
    find_text_body(payload).unwrap_or_default()
}

fn find_text_body(part: &MessagePart) -> Option<String> {
    // Containers first: recurse into sub-parts in order and take the first
    // non-empty hit.
    if let Some(parts) = &part.parts {
        for subpart in parts {
            if let Some(text) = find_text_body(subpart) {
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }

    let mime_type = part.mime_type.as_deref()?;
    if mime_type != "text/plain" && mime_type != "text/html" {
        return None;
    }
    let data = part.body.as_ref()?.data.as_ref()?;
    decode_body_data(data)
}

/// Decode failures are treated as an absent body for this branch, never as a
/// fatal error for the whole message.
fn decode_body_data(data: &str) -> Option<String> {
    let bytes = match URL_SAFE.decode(data) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("failed to decode email body: {}", e);
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("email body is not valid utf-8: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessagePartBody;

    fn create_message_part(
        mime_type: &str,
        data: Option<&str>,
        parts: Option<Vec<MessagePart>>,
    ) -> MessagePart {
        MessagePart {
            mime_type: Some(mime_type.to_string()),
            headers: None,
            body: data.map(|d| MessagePartBody {
                data: Some(URL_SAFE.encode(d)),
            }),
            parts,
        }
    }

    fn header(name: &str, value: &str) -> Header {
        Header {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
        }
    }

    #[test]
    fn test_extract_subject_matches_case_insensitively() {
        let headers = vec![header("From", "a@example.com"), header("Subject", "Hello")];
        assert_eq!(extract_subject(&headers), "Hello");

        let lowercase = vec![header("subject", "also found")];
        assert_eq!(extract_subject(&lowercase), "also found");
    }

    #[test]
    fn test_extract_subject_missing_header_is_empty() {
        let headers = vec![header("From", "a@example.com")];
        assert_eq!(extract_subject(&headers), "");
        assert_eq!(extract_subject(&[]), "");
    }

    #[test]
    fn test_extract_body_simple_plain_text() {
        let payload = create_message_part("text/plain", Some("Hello, world!"), None);
        assert_eq!(extract_body(&payload), "Hello, world!");
    }

    #[test]
    fn test_extract_body_html_leaf_under_container() {
        let inner_html = create_message_part("text/html", Some("<b>hi</b>"), None);
        let root = create_message_part("multipart/alternative", None, Some(vec![inner_html]));
        assert_eq!(extract_body(&root), "<b>hi</b>");
    }

    #[test]
    fn test_extract_body_first_match_in_document_order_wins() {
        let inner_html = create_message_part("text/html", Some("<b>Inner HTML</b>"), None);
        let inner_plain = create_message_part("text/plain", Some("Inner plain text."), None);
        let multipart = create_message_part(
            "multipart/alternative",
            None,
            Some(vec![inner_html, inner_plain]),
        );
        // No type priority: HTML comes first here, so HTML it is.
        assert_eq!(extract_body(&multipart), "<b>Inner HTML</b>");
    }

    #[test]
    fn test_extract_body_skips_non_text_leaves() {
        let attachment = create_message_part("application/pdf", Some("%PDF-1.4"), None);
        let plain = create_message_part("text/plain", Some("the text"), None);
        let multipart =
            create_message_part("multipart/mixed", None, Some(vec![attachment, plain]));
        assert_eq!(extract_body(&multipart), "the text");
    }

    #[test]
    fn test_extract_body_no_matching_leaf_is_empty() {
        let attachment = create_message_part("image/png", Some("bytes"), None);
        let multipart = create_message_part("multipart/mixed", None, Some(vec![attachment]));
        assert_eq!(extract_body(&multipart), "");
    }

    #[test]
    fn test_extract_body_deeply_nested_parts() {
        let leaf = create_message_part("text/plain", Some("deep"), None);
        let inner = create_message_part("multipart/alternative", None, Some(vec![leaf]));
        let root = create_message_part("multipart/mixed", None, Some(vec![inner]));
        assert_eq!(extract_body(&root), "deep");
    }

    #[test]
    fn test_extract_body_decode_failure_falls_through() {
        let broken = MessagePart {
            mime_type: Some("text/plain".to_string()),
            headers: None,
            body: Some(MessagePartBody {
                data: Some("!!! not base64 !!!".to_string()),
            }),
            parts: None,
        };
        let plain = create_message_part("text/plain", Some("fallback"), None);
        let multipart = create_message_part("multipart/mixed", None, Some(vec![broken, plain]));
        // The undecodable part is skipped, not fatal.
        assert_eq!(extract_body(&multipart), "fallback");
    }

    #[test]
    fn test_extract_body_part_without_data_is_empty() {
        let payload = MessagePart {
            mime_type: Some("text/plain".to_string()),
            headers: None,
            body: Some(MessagePartBody { data: None }),
            parts: None,
        };
        assert_eq!(extract_body(&payload), "");
    }
}
