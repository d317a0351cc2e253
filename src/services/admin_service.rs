//! 管理员服务 - 业务能力层
//!
//! 题库增删和成绩汇总，只是 REST 接口的薄封装

use crate::clients::QuizApiClient;
use crate::error::{AppError, AppResult, BusinessError};
use crate::models::{Question, QuestionDraft, ScoreEntry};
use crate::services::SessionContext;
use tracing::info;

/// 管理员服务
///
/// 只能由管理员会话创建
pub struct AdminService {
    client: QuizApiClient,
}

impl AdminService {
    pub fn new(client: &QuizApiClient, session: &SessionContext) -> AppResult<Self> {
        if !session.is_admin() {
            return Err(BusinessError::NotAdmin.into());
        }
        Ok(Self {
            client: client.with_session(session),
        })
    }

    pub async fn list_questions(&self) -> AppResult<Vec<Question>> {
        self.client.fetch_questions().await
    }

    /// 校验后新建题目
    pub async fn add_question(&self, draft: QuestionDraft) -> AppResult<Question> {
        let draft = draft.validate().map_err(AppError::invalid_question)?;
        let created = self.client.create_question(&draft).await?;
        info!("✓ 题目已新建: {}", created.id);
        Ok(created)
    }

    pub async fn delete_question(&self, id: &str) -> AppResult<()> {
        self.client.delete_question(id).await?;
        info!("✓ 题目已删除: {}", id);
        Ok(())
    }

    /// 所有用户的成绩
    pub async fn list_scores(&self) -> AppResult<Vec<ScoreEntry>> {
        self.client.list_scores().await
    }
}
