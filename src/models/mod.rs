//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains all records and request/response structures used by the API.

pub mod home;
pub mod user;

// Re-export commonly used types
pub use home::*;
pub use user::*;

use serde::Serialize;

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl SuccessResponse<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}
