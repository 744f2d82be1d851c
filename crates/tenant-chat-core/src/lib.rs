pub mod backend;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use backend::{ChatBackend, HealthResponse, HttpBackend};
pub use config::Config;
pub use error::BackendError;
pub use session::{Session, SessionStatus, APOLOGY};
pub use state::{ChatMessage, ChatRole};
