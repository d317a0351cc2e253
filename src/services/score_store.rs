//! 成绩存储 - 业务能力层
//!
//! 远端成绩是跨设备、跨刷新的唯一可信来源。
//! 重复提交按 upsert 处理：同一载荷提交两次与提交一次结果相同。

use crate::clients::QuizApiClient;
use crate::error::AppResult;
use crate::models::ScoreRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 成绩存储接口
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// 查询用户已有成绩，`None` 表示尚未作答
    async fn fetch_score(&self, user: &str) -> AppResult<Option<ScoreRecord>>;

    /// 按用户写入（插入或覆盖）成绩
    async fn upsert_score(&self, user: &str, record: ScoreRecord) -> AppResult<()>;
}

/// 基于 REST 接口的成绩存储
///
/// 用户身份由客户端携带的令牌决定，`user` 参数只用于日志
pub struct HttpScoreStore {
    client: QuizApiClient,
}

impl HttpScoreStore {
    pub fn new(client: QuizApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScoreStore for HttpScoreStore {
    async fn fetch_score(&self, user: &str) -> AppResult<Option<ScoreRecord>> {
        tracing::debug!("查询成绩: {}", user);
        self.client.fetch_my_score().await
    }

    async fn upsert_score(&self, user: &str, record: ScoreRecord) -> AppResult<()> {
        tracing::debug!("提交成绩: {} -> {}/{}", user, record.score, record.total);
        self.client.submit_score(&record).await
    }
}

/// 内存成绩存储
///
/// 离线运行和测试使用；记录 upsert 调用次数便于观察
#[derive(Clone, Default)]
pub struct InMemoryScoreStore {
    inner: Arc<Mutex<InMemoryState>>,
}

#[derive(Default)]
struct InMemoryState {
    records: HashMap<String, ScoreRecord>,
    upserts: usize,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置某个用户的成绩
    pub fn with_record(self, user: impl Into<String>, record: ScoreRecord) -> Self {
        self.lock().records.insert(user.into(), record);
        self
    }

    /// 读取存储中的成绩（不经过 trait）
    pub fn get(&self, user: &str) -> Option<ScoreRecord> {
        self.lock().records.get(user).copied()
    }

    /// 累计 upsert 次数
    pub fn upsert_count(&self) -> usize {
        self.lock().upserts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        // 锁内没有会 panic 的代码
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn fetch_score(&self, user: &str) -> AppResult<Option<ScoreRecord>> {
        Ok(self.get(user))
    }

    async fn upsert_score(&self, user: &str, record: ScoreRecord) -> AppResult<()> {
        let mut state = self.lock();
        state.upserts += 1;
        state.records.insert(user.to_string(), record);
        Ok(())
    }
}
