pub mod quiz_controller;
pub mod quiz_session;

pub use quiz_controller::{DeliveryPolicy, QuizController};
pub use quiz_session::{
    AnswerOutcome, QuizSession, RejectReason, RestoreOutcome, SessionPhase, SessionState,
};
