use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
/// The model of the `messages` table.
pub struct Message {
    #[ts(type = "number")]
    pub id: i64,
    pub nickname: String,
    pub content: String,
    #[ts(type = "string")]
    pub create_time: DateTime<Utc>,
    #[ts(type = "number")]
    pub like_count: i64,
}
