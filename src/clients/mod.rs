pub mod quiz_api_client;

pub use quiz_api_client::QuizApiClient;
