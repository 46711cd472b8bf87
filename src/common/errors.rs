use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;

/// Everything a handler can fail with. The wire shape is always
/// `{"error": "..."}` plus the mapped status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("missing required field: {0}")]
  MissingField(&'static str),
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Forbidden(String),
  #[error("unknown action: {0}")]
  UnknownAction(String),
  /// Non-2xx from the Spotify API, passed through with its original status.
  #[error("{message}")]
  Upstream { status: u16, message: String },
  #[error("session store error: {0}")]
  Storage(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::MissingField(_) | Self::BadRequest(_) | Self::UnknownAction(_) => {
        StatusCode::BAD_REQUEST
      }
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::Upstream { status, .. } => {
        StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
      }
      Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn session_not_found(code: &str) -> Self {
    Self::NotFound(format!("session not found: {}", code))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    Self::Upstream {
      status: 502,
      message: format!("upstream request failed: {}", err),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_mapping() {
    assert_eq!(ApiError::MissingField("code").status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::session_not_found("ABC234").status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::Forbidden("nope".into()).status(), StatusCode::FORBIDDEN);
    assert_eq!(ApiError::Storage("down".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    let up = ApiError::Upstream { status: 429, message: "rate limited".into() };
    assert_eq!(up.status(), StatusCode::TOO_MANY_REQUESTS);
  }

  #[test]
  fn missing_field_names_the_field() {
    assert_eq!(
      ApiError::MissingField("hostToken").to_string(),
      "missing required field: hostToken"
    );
  }
}
