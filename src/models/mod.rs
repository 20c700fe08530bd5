pub mod app;
pub mod requests;

pub use app::{AppConfig, DisplayConfig, ServerConfig};
pub use requests::{
    LogoutRequest, MessageResponse, SessionListResponse, SessionResponse, StatusQuery,
    UpdateRequest,
};
