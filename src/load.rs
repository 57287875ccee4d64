use serde::Serialize;

use crate::error::AppError;

/// Outcome of a remote read as every view consumes it
///
/// Pages are rendered once the read has settled, so only the two settled
/// states exist here; the usage lookup tracks its own in-flight state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn from_result(result: Result<T, AppError>) -> Self {
        match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Failed(e.to_string()),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            LoadState::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            LoadState::Loaded(_) => None,
        }
    }

    /// The banner fields rendered by the shared `status` partial
    pub fn banner(&self) -> Banner {
        Banner {
            loading: false,
            error: self.error().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Banner {
    pub loading: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_message() {
        let state: LoadState<Vec<u8>> =
            LoadState::from_result(Err(AppError::Transport("connection refused".into())));
        assert_eq!(state.error(), Some("Network error: connection refused"));
        assert!(state.loaded().is_none());
        assert!(!state.banner().loading);
    }

    #[test]
    fn loaded_has_no_banner_error() {
        let state = LoadState::from_result(Ok(vec![1u8, 2]));
        assert_eq!(state.loaded(), Some(&vec![1, 2]));
        assert!(state.banner().error.is_none());
    }
}
