use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 远端保存的成绩：答对数 / 已作答题数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u32,
    pub total: u32,
}

impl ScoreRecord {
    pub fn new(score: u32, total: u32) -> Self {
        Self { score, total }
    }
}

/// 管理员成绩列表中的一行（`GET /scores`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub user_name: String,
    pub score: u32,
    pub total: u32,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}
