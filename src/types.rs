use serde::Deserialize;

/// One page of `users/me/messages`.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRef {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Message {
    pub id: Option<String>,
    pub payload: Option<MessagePart>,
}

/// A node in the MIME tree: either a container of sub-parts or a leaf
/// carrying base64-encoded content of a given type.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MessagePart {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    pub headers: Option<Vec<Header>>,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Header {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessagePartBody {
    pub data: Option<String>,
}

/// What actually lands in the CSV: one row per successfully parsed message,
/// in fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRecord {
    pub subject: String,
    pub body: String,
}
