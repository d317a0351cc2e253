pub mod admin_service;
pub mod auth_service;
pub mod local_cache;
pub mod score_store;
pub mod session_context;

pub use admin_service::AdminService;
pub use auth_service::AuthService;
pub use local_cache::{LocalProgressCache, ProgressSnapshot};
pub use score_store::{HttpScoreStore, InMemoryScoreStore, ScoreStore};
pub use session_context::SessionContext;
