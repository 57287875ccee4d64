use thiserror::Error;

/// Everything that can go wrong while serving a page
#[derive(Debug, Error)]
pub enum AppError {
    #[error("You are not logged in. Please log in to continue.")]
    MissingCredential,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status used when the error is rendered as a page
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingCredential => 401,
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Transport(_) | Self::Status { .. } | Self::Decode(_) => 502,
            Self::Export(_) | Self::Template(_) | Self::Mail(_) | Self::Config(_) => 500,
        }
    }
}

#[cfg(feature = "web")]
mod web {
    use axum::{
        http::StatusCode,
        response::{Html, IntoResponse, Response},
    };
    use serde_json::json;

    use super::AppError;
    use crate::templates;

    impl From<rust_xlsxwriter::XlsxError> for AppError {
        fn from(e: rust_xlsxwriter::XlsxError) -> Self {
            AppError::Export(e.to_string())
        }
    }

    impl From<handlebars::RenderError> for AppError {
        fn from(e: handlebars::RenderError) -> Self {
            AppError::Template(e.to_string())
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status =
                StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            match &self {
                AppError::Template(_) | AppError::Config(_) => {
                    log::error!("{}", self);
                }
                _ => log::warn!("{}", self),
            }

            let context = json!({
                "title": "Something went wrong",
                "status": status.as_u16(),
                "needs_login": matches!(self, AppError::MissingCredential),
                "banner": { "loading": false, "error": self.to_string() },
            });
            match templates::render("error", &context) {
                Ok(body) => (status, Html(body)).into_response(),
                Err(_) => (status, self.to_string()).into_response(),
            }
        }
    }
}
