//! Data models for the DeepSeek web chat API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Proof-of-work challenge issued by `/chat/create_pow_challenge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub algorithm: String,
    /// Hex digest the winning candidate must hash to
    pub challenge: String,
    pub salt: String,
    pub signature: String,
    /// Upper bound (exclusive) of the nonce search space
    pub difficulty: u64,
    /// Expiry as unix milliseconds
    pub expire_at: i64,
    #[serde(default)]
    pub expire_after: Option<i64>,
    pub target_path: String,
}

impl Challenge {
    /// Whether the server-declared expiry has already passed.
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp_millis() > self.expire_at
    }
}

/// Solved challenge, ready to be sent as the `x-ds-pow-response` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeAnswer(pub(crate) String);

impl ChallengeAnswer {
    /// Wrap an already-encoded answer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ChallengeAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// JSON document that gets base64-encoded into a [`ChallengeAnswer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AnswerPayload {
    pub algorithm: String,
    pub challenge: String,
    pub salt: String,
    pub answer: u64,
    pub signature: String,
    pub target_path: String,
}

/// One normalized event from the completion stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamEvent {
    pub content: String,
    /// Delta type reported by the server (e.g. `text`, `thinking`)
    pub kind: String,
    /// Set on the terminal event of a completion
    pub stop: bool,
}

/// Per-request knobs for [`crate::DeepSeek::chat_completion`].
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub parent_message_id: Option<String>,
    pub thinking_enabled: bool,
    pub search_enabled: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            parent_message_id: None,
            thinking_enabled: true,
            search_enabled: false,
        }
    }
}

/// Outer envelope shared by every non-streaming endpoint.
///
/// `biz_data` is kept as raw JSON so a missing field can be reported as a
/// malformed response rather than a decode failure.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<BizData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BizData {
    #[serde(default)]
    pub biz_code: Option<i64>,
    #[serde(default)]
    pub biz_msg: Option<String>,
    #[serde(default)]
    pub biz_data: Option<Value>,
}

impl Envelope {
    /// Extract `data.biz_data` as `T`, describing whatever the server sent instead.
    pub fn into_biz_data<T: DeserializeOwned>(self, what: &str) -> crate::Result<T> {
        let upstream = self.msg.filter(|m| !m.is_empty());
        let biz = match self.data {
            Some(BizData {
                biz_data: Some(value),
                ..
            }) => value,
            Some(BizData {
                biz_code, biz_msg, ..
            }) => {
                return Err(crate::DskError::api(format!(
                    "Missing required fields in {} response (biz_code={:?}, biz_msg={})",
                    what,
                    biz_code,
                    biz_msg.or(upstream).unwrap_or_default()
                )))
            }
            None => {
                return Err(crate::DskError::api(format!(
                    "Missing required fields in {} response (code={:?}, msg={})",
                    what,
                    self.code,
                    upstream.unwrap_or_default()
                )))
            }
        };

        serde_json::from_value(biz).map_err(|e| {
            crate::DskError::api(format!("Missing required fields in {} response: {}", what, e))
        })
    }
}

/// `biz_data` of `/chat_session/create`.
#[derive(Debug, Deserialize)]
pub(crate) struct SessionData {
    pub id: String,
}

/// `biz_data` of `/chat/create_pow_challenge`.
#[derive(Debug, Deserialize)]
pub(crate) struct ChallengeData {
    pub challenge: Challenge,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateSessionRequest {
    pub character_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChallengeRequest<'a> {
    pub target_path: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletionRequest<'a> {
    pub chat_session_id: &'a str,
    pub parent_message_id: Option<&'a str>,
    pub prompt: &'a str,
    pub ref_file_ids: Vec<String>,
    pub thinking_enabled: bool,
    pub search_enabled: bool,
}
