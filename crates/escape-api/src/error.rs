//! API errors and their HTTP mapping
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use escape_core::EscapeError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("unknown room {0}")]
    RoomNotFound(String),

    #[error("room {room} has no stage {stage}")]
    StageNotFound { room: String, stage: u32 },

    #[error("unknown team {0}")]
    TeamNotFound(String),

    #[error("user {user} is not on team {team}")]
    NotOnTeam { user: String, team: String },

    #[error("stage {requested} is locked; team is on stage {current}")]
    StageLocked { requested: u32, current: u32 },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("too many concurrent writes for {0}; retry")]
    WriteContention(String),

    #[error(transparent)]
    Core(#[from] EscapeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RoomNotFound(_) | Self::StageNotFound { .. } | Self::TeamNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::NotOnTeam { .. } | Self::StageLocked { .. } => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::WriteContention(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "ROOM_NOT_FOUND",
            Self::StageNotFound { .. } => "STAGE_NOT_FOUND",
            Self::TeamNotFound(_) => "TEAM_NOT_FOUND",
            Self::NotOnTeam { .. } => "NOT_ON_TEAM",
            Self::StageLocked { .. } => "STAGE_LOCKED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::WriteContention(_) => "WRITE_CONTENTION",
            Self::Core(_) => "INTERNAL",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string(), "code": self.code() }))).into_response()
    }
}
