/// 答题 API 客户端
///
/// 封装所有与 REST 接口相关的调用逻辑
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{
    ApiMessage, AuthResponse, LoginRequest, Question, QuestionDraft, RegisterRequest, ScoreEntry,
    ScoreRecord,
};
use crate::services::SessionContext;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// 答题 API 客户端
///
/// 令牌来自 [`SessionContext`]，不从全局状态读取。
#[derive(Clone)]
pub struct QuizApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl QuizApiClient {
    /// 创建未登录的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// 绑定会话令牌后的客户端
    pub fn with_session(&self, session: &SessionContext) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: Some(session.token().to_string()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========== 认证 ==========

    /// `POST /auth/login`
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self.send("/auth/login", self.post("/auth/login").json(&body)).await?;
        Self::parse_json("/auth/login", resp).await
    }

    /// `POST /auth/register`
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<()> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send("/auth/register", self.post("/auth/register").json(&body))
            .await?;
        Ok(())
    }

    // ========== 题目 ==========

    /// `GET /questions`
    pub async fn fetch_questions(&self) -> AppResult<Vec<Question>> {
        let resp = self.send("/questions", self.get("/questions")).await?;
        Self::parse_json("/questions", resp).await
    }

    /// `POST /questions`
    pub async fn create_question(&self, draft: &QuestionDraft) -> AppResult<Question> {
        debug!("新建题目 Payload: {:?}", draft);
        let resp = self
            .send("/questions", self.post("/questions").json(draft))
            .await?;
        Self::parse_json("/questions", resp).await
    }

    /// `DELETE /questions/:id`
    pub async fn delete_question(&self, id: &str) -> AppResult<()> {
        let endpoint = format!("/questions/{}", id);
        let req = self.authorize(self.http.delete(self.url(&endpoint)));
        self.send(&endpoint, req).await?;
        Ok(())
    }

    // ========== 成绩 ==========

    /// `GET /scores/me`，404 视为尚未作答
    pub async fn fetch_my_score(&self) -> AppResult<Option<ScoreRecord>> {
        match self.send("/scores/me", self.get("/scores/me")).await {
            Ok(resp) => Self::parse_json("/scores/me", resp).await.map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `POST /scores`，服务端按用户 upsert
    pub async fn submit_score(&self, record: &ScoreRecord) -> AppResult<()> {
        debug!("提交成绩 Payload: {:?}", record);
        self.send("/scores", self.post("/scores").json(record)).await?;
        Ok(())
    }

    /// `GET /scores`（管理员）
    pub async fn list_scores(&self) -> AppResult<Vec<ScoreEntry>> {
        let resp = self.send("/scores", self.get("/scores")).await?;
        Self::parse_json("/scores", resp).await
    }

    // ========== 辅助方法 ==========

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.authorize(self.http.get(self.url(endpoint)))
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.authorize(self.http.post(self.url(endpoint)))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// 发送请求并把非 2xx 状态映射为 [`ApiError`]
    async fn send(&self, endpoint: &str, req: RequestBuilder) -> AppResult<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = resp.status();
        debug!("{} -> {}", endpoint, status);
        if status.is_success() {
            return Ok(resp);
        }

        let err = match status {
            StatusCode::NOT_FOUND => ApiError::NotFound {
                endpoint: endpoint.to_string(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized {
                endpoint: endpoint.to_string(),
            },
            _ => {
                let message = resp
                    .json::<ApiMessage>()
                    .await
                    .ok()
                    .and_then(|m| m.message);
                ApiError::BadResponse {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    message,
                }
            }
        };
        Err(err.into())
    }

    async fn parse_json<T: DeserializeOwned>(endpoint: &str, resp: Response) -> AppResult<T> {
        let text = resp
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}
