//! JSON bodies exchanged over `/api`. Every reply carries a `success` flag;
//! business failures are reported through it rather than the status code.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::models::Message;

/// Body of `POST /api/messages` as sent by well-behaved clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
pub struct NewMessage {
    pub nickname: String,
    pub content: String,
}

/// Body of `POST /api/like` as sent by well-behaved clients.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LikeMessage {
    #[ts(type = "number")]
    pub message_id: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
pub struct PostedMessage {
    #[ts(type = "number")]
    pub id: i64,
    pub nickname: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
pub struct ListReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Message>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
pub struct SubmitReply {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PostedMessage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LikeReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub new_like_count: Option<i64>,
}

impl ListReply {
    pub fn ok(data: Vec<Message>) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl SubmitReply {
    pub fn ok(message: impl Into<String>, data: PostedMessage) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl LikeReply {
    pub fn ok(new_like_count: i64) -> Self {
        Self {
            success: true,
            message: None,
            new_like_count: Some(new_like_count),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            new_like_count: None,
        }
    }
}

/// What the server accepts on `POST /api/messages`. Fields stay untyped so a
/// wrong type is a validation failure instead of a parse error.
#[derive(Deserialize, Default, Debug)]
pub(crate) struct SubmitBody {
    #[serde(default)]
    pub(crate) nickname: Option<Value>,
    #[serde(default)]
    pub(crate) content: Option<Value>,
}

/// What the server accepts on `POST /api/like`.
#[derive(Deserialize, Default, Debug)]
pub(crate) struct LikeBody {
    #[serde(default, rename = "messageId")]
    pub(crate) message_id: Option<Value>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum MessageIdArg {
    /// Absent or falsy (`null`, `false`, `0`, `""`).
    Missing,
    Id(i64),
    /// Truthy but not an integer, so it cannot address any row.
    Unmatched,
}

impl LikeBody {
    pub(crate) fn message_id(&self) -> MessageIdArg {
        match &self.message_id {
            None | Some(Value::Null) | Some(Value::Bool(false)) => MessageIdArg::Missing,
            // sqlite binds `true` as the integer 1
            Some(Value::Bool(true)) => MessageIdArg::Id(1),
            Some(Value::String(s)) if s.is_empty() => MessageIdArg::Missing,
            Some(Value::String(s)) => s
                .parse()
                .map(MessageIdArg::Id)
                .unwrap_or(MessageIdArg::Unmatched),
            Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
                (Some(0), _) => MessageIdArg::Missing,
                (Some(id), _) => MessageIdArg::Id(id),
                (None, Some(f)) if f == 0.0 => MessageIdArg::Missing,
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    MessageIdArg::Id(f as i64)
                }
                _ => MessageIdArg::Unmatched,
            },
            Some(_) => MessageIdArg::Unmatched,
        }
    }
}
