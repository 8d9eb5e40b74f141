//! Received message types.
//!
//! [`Message`] is the summary row returned by the inbox listing;
//! [`MessageDetail`] adds the bodies and is fetched one message at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::MessageId;

/// Subject shown for messages that have none.
pub const NO_SUBJECT: &str = "(No Subject)";

/// Sender of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Email address.
    pub address: String,
    /// Display name, may be empty.
    #[serde(default)]
    pub name: String,
}

impl Sender {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    /// Name if present, otherwise the address.
    pub fn display(&self) -> &str {
        if self.name.is_empty() {
            &self.address
        } else {
            &self.name
        }
    }
}

/// Summary of a message in the inbox listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub from: Sender,
    #[serde(default)]
    pub subject: String,
    /// Short preview of the body.
    #[serde(default)]
    pub intro: String,
    /// Arrival time; the Unix epoch when the provider sent none or garbage.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Whether the message has been viewed.
    #[serde(default)]
    pub seen: bool,
}

impl Message {
    /// Subject for display, substituting a placeholder when empty.
    pub fn display_subject(&self) -> &str {
        if self.subject.is_empty() {
            NO_SUBJECT
        } else {
            &self.subject
        }
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    Ok(parsed.unwrap_or_default())
}

/// Body chosen for rendering a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body<'a> {
    Html(&'a str),
    Text(&'a str),
}

/// A message with its full content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetail {
    #[serde(flatten)]
    pub message: Message,
    /// Plain-text body.
    #[serde(default)]
    pub text: String,
    /// HTML body variants, in provider order.
    #[serde(default)]
    pub html: Vec<String>,
}

impl MessageDetail {
    /// First HTML variant if any, otherwise the text body.
    pub fn body(&self) -> Body<'_> {
        match self.html.first() {
            Some(html) => Body::Html(html),
            None => Body::Text(&self.text),
        }
    }
}
