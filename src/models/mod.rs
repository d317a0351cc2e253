pub mod auth;
pub mod loaders;
pub mod question;
pub mod score;

pub use auth::{ApiMessage, AuthResponse, LoginRequest, RegisterRequest, Role};
pub use loaders::{load_question_set, QuestionSet};
pub use question::{Question, QuestionDraft};
pub use score::{ScoreEntry, ScoreRecord};
