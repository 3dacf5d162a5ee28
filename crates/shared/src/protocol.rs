use serde::{Deserialize, Serialize};

use crate::{domain::RecordId, error::ApiError};

/// Body of a successful `POST /submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub id: RecordId,
}

impl SubmitResponse {
    pub fn new(id: RecordId) -> Self {
        Self { success: true, id }
    }
}

/// Body of a successful `POST /submittodoitem`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoResponse {
    pub success: bool,
    pub inserted_id: RecordId,
}

impl TodoResponse {
    pub fn new(inserted_id: RecordId) -> Self {
        Self {
            success: true,
            inserted_id,
        }
    }
}

/// Body of any rejected submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

impl From<ApiError> for FailureResponse {
    fn from(value: ApiError) -> Self {
        Self {
            success: false,
            error: value.message,
        }
    }
}

/// Body of a failed feed read. The feed endpoint carries no success flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedErrorResponse {
    pub error: String,
}

impl From<ApiError> for FeedErrorResponse {
    fn from(value: ApiError) -> Self {
        Self {
            error: value.message,
        }
    }
}
