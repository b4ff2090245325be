pub mod analysis;
pub mod config;
pub mod http;
pub mod inference;
pub mod session;

pub use analysis::{normalize, AnalysisResult, DrowsinessLevel};
pub use config::Config;
pub use http::{create_router, AppState};
pub use inference::{InferenceClient, InferenceError, InferenceHandle, OpenAiVisionClient};
pub use session::{
    BusyPolicy, Inbound, ServerMessage, SessionConfig, SessionController, SessionRegistry,
    SessionState, SessionStats,
};
