//! 认证服务 - 业务能力层

use crate::clients::QuizApiClient;
use crate::error::AppResult;
use crate::services::SessionContext;
use tracing::info;

/// 登录 / 注册
pub struct AuthService {
    client: QuizApiClient,
}

impl AuthService {
    pub fn new(client: QuizApiClient) -> Self {
        Self { client }
    }

    /// 登录成功后返回新的会话上下文
    pub async fn login(&self, email: &str, password: &str) -> AppResult<SessionContext> {
        let resp = self.client.login(email, password).await?;
        let session = SessionContext::from(resp);
        info!("✓ 登录成功 {}", session);
        Ok(session)
    }

    /// 注册成功后需要重新登录
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<()> {
        self.client.register(name, email, password).await?;
        info!("✓ 注册成功: {}", name);
        Ok(())
    }
}
