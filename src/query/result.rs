use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Loading,
    Success,
    Error,
}

/// What a view renders for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<V> {
    pub status: QueryStatus,
    pub data: Option<V>,
    pub error: Option<ApiError>,
    /// A request for this key is in flight.
    pub is_fetching: bool,
    /// Data is shown but will be refetched on next access.
    pub is_stale: bool,
}

impl<V> QueryResult<V> {
    pub fn loading(data: Option<V>, is_fetching: bool) -> Self {
        Self {
            status: QueryStatus::Loading,
            data,
            error: None,
            is_fetching,
            is_stale: false,
        }
    }

    pub fn success(data: V, is_stale: bool, is_fetching: bool) -> Self {
        Self {
            status: QueryStatus::Success,
            data: Some(data),
            error: None,
            is_fetching,
            is_stale,
        }
    }

    pub fn error(error: ApiError, previous: Option<V>) -> Self {
        Self {
            status: QueryStatus::Error,
            data: previous,
            error: Some(error),
            is_fetching: false,
            is_stale: true,
        }
    }

    pub fn from_outcome(outcome: Result<V, ApiError>) -> Self {
        match outcome {
            Ok(data) => Self::success(data, false, false),
            Err(error) => Self::error(error, None),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}
