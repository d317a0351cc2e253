//! # Quiz Session
//!
//! 单页答题应用的客户端核心：登录、作答、成绩与远端同步
//!
//! ## 架构设计
//!
//! ### ① 接口层（Clients）
//! - `clients/` - 只负责 HTTP 调用，不做业务判断
//! - `QuizApiClient` - `/auth`、`/questions`、`/scores` 接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ScoreStore` - 远端成绩读写（upsert）
//! - `LocalProgressCache` - 按用户缓存进度（可选兜底）
//! - `SessionContext` - 登录凭证，登录时创建、登出时销毁
//! - `AuthService` / `AdminService` - 登录注册、题库管理
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次答题"的完整流程
//! - `QuizSession` - 纯状态机（锁题、计分、判定完成）
//! - `QuizController` - 驱动状态机（恢复进度、后台提交）
//!
//! ### ④ 应用层
//! - `app` - 终端答题界面
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::QuizApiClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Question, ScoreRecord};
pub use services::{InMemoryScoreStore, ScoreStore, SessionContext};
pub use workflow::{AnswerOutcome, QuizController, QuizSession, SessionPhase};
