//! 答题会话控制器 - 流程层
//!
//! 驱动 [`QuizSession`]，负责与成绩存储和本地缓存交互：
//! 1. 加载题目
//! 2. 恢复进度：远端成绩 → 本地缓存（可选）→ 新会话
//! 3. 作答：状态机判定，必要时写本地缓存
//! 4. 答完：后台提交成绩，不阻塞作答和展示

use crate::config::Config;
use crate::models::{Question, ScoreRecord};
use crate::services::{LocalProgressCache, ScoreStore, SessionContext};
use crate::workflow::quiz_session::{
    AnswerOutcome, QuizSession, RestoreOutcome, SessionPhase, SessionState,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 成绩投递策略
///
/// 默认 `retries = 0`：至多一次，失败只记日志。
/// `retries > 0` 时依赖服务端 upsert 的幂等性做有限次重试。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub retries: usize,
    pub retry_delay: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl DeliveryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retries: config.submit_retries,
            retry_delay: Duration::from_millis(config.submit_retry_delay_ms),
        }
    }
}

/// 答题会话控制器
///
/// 会话状态放在同步锁里，锁从不跨越 `.await`，
/// 因此并发到达的两次作答总是串行判定，先记录的生效。
pub struct QuizController {
    session: Mutex<QuizSession>,
    store: Arc<dyn ScoreStore>,
    cache: Option<LocalProgressCache>,
    context: SessionContext,
    policy: DeliveryPolicy,
    /// 串行化本地缓存的写入与清理；值为 `true` 表示成绩已送达、缓存已清理，之后不再写入
    cache_write: Arc<tokio::sync::Mutex<bool>>,
    submission: Mutex<Option<JoinHandle<bool>>>,
}

impl QuizController {
    pub fn new(context: SessionContext, store: Arc<dyn ScoreStore>) -> Self {
        Self {
            session: Mutex::new(QuizSession::new()),
            store,
            cache: None,
            context,
            policy: DeliveryPolicy::default(),
            cache_write: Arc::new(tokio::sync::Mutex::new(false)),
            submission: Mutex::new(None),
        }
    }

    /// 启用本地进度缓存
    pub fn with_cache(mut self, cache: LocalProgressCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// 加载题目；空列表进入 `Empty`，不算错误
    pub fn load_questions(&self, questions: Vec<Question>) -> SessionPhase {
        let count = questions.len();
        let phase = self.lock().load_questions(questions);
        match phase {
            SessionPhase::Empty => warn!("⚠️ 暂无题目"),
            _ => info!("✓ 已加载 {} 道题目", count),
        }
        phase
    }

    /// 恢复进度
    ///
    /// 远端查询失败与"没有记录"同样处理，不会阻塞答题。
    /// 查询期间用户已经作答时，迟到的结果被忽略。
    pub async fn restore_progress(&self) -> RestoreOutcome {
        let user = self.context.name().to_string();

        let remote = match self.store.fetch_score(&user).await {
            Ok(record) => record,
            Err(e) => {
                warn!("⚠️ 恢复进度失败，按新会话处理: {}", e);
                None
            }
        };

        let outcome = self.lock().apply_restore(remote);
        match outcome {
            RestoreOutcome::Applied { locked, submitted } => {
                info!(
                    "✓ 已恢复远端进度: 锁定 {} 题{}",
                    locked,
                    if submitted { "，本套题已完成" } else { "" }
                );
                return outcome;
            }
            RestoreOutcome::Ignored => return outcome,
            RestoreOutcome::Fresh => {}
        }

        let Some(cache) = &self.cache else {
            return RestoreOutcome::Fresh;
        };
        let snapshot = match cache.load(&user).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return RestoreOutcome::Fresh,
            Err(e) => {
                warn!("⚠️ 读取本地进度失败: {}", e);
                return RestoreOutcome::Fresh;
            }
        };

        let (restored, submission) = {
            let mut session = self.lock();
            let restored = session.apply_snapshot(&snapshot);
            (restored, session.check_completion())
        };
        if restored > 0 {
            info!("✓ 已从本地缓存恢复 {} 题作答", restored);
        }
        if let Some(record) = submission {
            // 上次答完但成绩没送达
            self.spawn_submission(record);
        }
        RestoreOutcome::Fresh
    }

    /// 选择答案
    ///
    /// 被拒绝的作答只记 debug 日志，返回 `Rejected`
    pub async fn select_answer(&self, question_id: &str, option: &str) -> AnswerOutcome {
        let outcome = self.lock().select_answer(question_id, option);

        if let AnswerOutcome::Recorded {
            correct,
            submission,
            ..
        } = &outcome
        {
            info!(
                "{} 题目 {} 作答: {}",
                if *correct { "✅" } else { "❌" },
                question_id,
                option
            );
            // 先落盘再提交：投递失败时下次恢复仍能补交
            self.persist_progress().await;
            if let Some(record) = submission {
                self.spawn_submission(*record);
            }
        }

        outcome
    }

    /// 检查是否答完；已提交后再调用不会重复提交
    pub async fn check_completion(&self) -> bool {
        let submission = self.lock().check_completion();
        match submission {
            Some(record) => {
                self.spawn_submission(record);
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    /// 当前题目及锁定情况
    pub fn questions(&self) -> Vec<(Question, bool)> {
        let session = self.lock();
        session
            .questions()
            .iter()
            .map(|q| (q.clone(), session.is_locked(&q.id)))
            .collect()
    }

    /// 等待后台提交结束
    ///
    /// 没有提交时返回 `None`，否则返回是否送达
    pub async fn wait_for_submission(&self) -> Option<bool> {
        let handle = self
            .submission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()?;
        match handle.await {
            Ok(delivered) => Some(delivered),
            Err(e) => {
                error!("成绩提交任务异常结束: {}", e);
                Some(false)
            }
        }
    }

    /// 登出
    ///
    /// 清空会话状态和本地缓存，凭证随控制器一起销毁；远端成绩不受影响。
    /// 已经发出的成绩提交继续在后台完成。
    pub async fn logout(self) {
        self.lock().reset();
        if let Some(cache) = &self.cache {
            let mut cleared = self.cache_write.lock().await;
            *cleared = true;
            if let Err(e) = cache.clear(self.context.name()).await {
                warn!("⚠️ 清理本地进度失败: {}", e);
            }
        }
        info!("👋 已登出 {}", self.context);
    }

    // ========== 内部方法 ==========

    fn lock(&self) -> MutexGuard<'_, QuizSession> {
        // 状态机内部不会 panic，中毒时沿用原状态
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn persist_progress(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let cleared = self.cache_write.lock().await;
        if *cleared {
            return;
        }
        let snapshot = self.lock().snapshot();
        if let Err(e) = cache.save(self.context.name(), &snapshot).await {
            warn!("⚠️ 写入本地进度失败: {}", e);
        }
    }

    /// 后台提交成绩，每个会话只会走到这里一次
    fn spawn_submission(&self, record: ScoreRecord) {
        info!("📤 提交成绩 {}/{}", record.score, record.total);

        let store = Arc::clone(&self.store);
        let cache = self.cache.clone();
        let user = self.context.name().to_string();
        let policy = self.policy;
        let cache_write = Arc::clone(&self.cache_write);

        let handle = tokio::spawn(async move {
            let delivered = deliver(store.as_ref(), &user, record, policy).await;
            if delivered {
                if let Some(cache) = cache {
                    let mut cleared = cache_write.lock().await;
                    *cleared = true;
                    if let Err(e) = cache.clear(&user).await {
                        warn!("⚠️ 清理本地进度失败: {}", e);
                    }
                }
            }
            delivered
        });

        *self
            .submission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
    }
}

/// 按策略投递成绩；失败不回滚本地状态
async fn deliver(
    store: &dyn ScoreStore,
    user: &str,
    record: ScoreRecord,
    policy: DeliveryPolicy,
) -> bool {
    let attempts = policy.retries + 1;
    for attempt in 1..=attempts {
        match store.upsert_score(user, record).await {
            Ok(()) => {
                info!("✓ 成绩已保存: {}/{}", record.score, record.total);
                return true;
            }
            Err(e) if attempt < attempts => {
                warn!(
                    "成绩提交失败 (尝试 {}/{}), {}ms 后重试: {}",
                    attempt,
                    attempts,
                    policy.retry_delay.as_millis(),
                    e
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            Err(e) => {
                error!("❌ 成绩提交失败，不再重试: {}", e);
            }
        }
    }
    false
}
