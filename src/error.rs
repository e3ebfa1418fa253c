use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use blogs_models::UnknownCode;
use colored::Colorize;
use database::DatabaseError;
use database::document_store::PingError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::result::Result as StdResult;
use tracing::debug;
use tracing::error;
use utoipa::ToSchema;

pub type Result<T, E = InternalError> = StdResult<T, E>;

/// Message sent in place of the one of a server error
const OPAQUE_MESSAGE: &str = "internal server error";

/// Trait for all errors that can be returned by a handler
pub trait BlogsError: Error + Send + Sync {
    fn get_status(&self) -> StatusCode;

    fn get_type(&self) -> &str;

    fn context(&self) -> HashMap<String, Value> {
        Default::default()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "StatusCode")]
pub(crate) struct StatusCodeRemoteDef(#[serde(getter = "StatusCode::as_u16")] u16);

impl From<StatusCodeRemoteDef> for StatusCode {
    fn from(def: StatusCodeRemoteDef) -> Self {
        StatusCode::from_u16(def.0).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub(crate) fn default_status_code() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct InternalError {
    #[serde(with = "StatusCodeRemoteDef", default = "default_status_code")]
    #[schema(value_type = u16, minimum = 100, maximum = 599)]
    pub status: StatusCode,
    #[serde(rename = "type")]
    pub error_type: String,
    pub context: HashMap<String, Value>,
    pub message: String,
}

impl InternalError {
    pub fn get_type(&self) -> &str {
        &self.error_type
    }

    pub fn get_status(&self) -> StatusCode {
        self.status
    }

    /// Logs the error, and hides the details of server errors from the caller
    fn into_public(self) -> Self {
        if self.status.is_server_error() {
            error!(
                context = ?self.context,
                "[{}] {}",
                self.error_type.bold(),
                self.message
            );
            Self {
                context: HashMap::new(),
                message: OPAQUE_MESSAGE.to_owned(),
                ..self
            }
        } else {
            debug!("[{}] {}", self.error_type, self.message);
            self
        }
    }
}

impl Error for InternalError {}

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl<T: BlogsError> From<T> for InternalError {
    fn from(err: T) -> Self {
        InternalError {
            status: err.get_status(),
            error_type: err.get_type().to_owned(),
            context: err.context(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for InternalError {
    fn into_response(self) -> Response {
        let error = self.into_public();
        (error.status, Json(error)).into_response()
    }
}

impl From<InternalError> for tonic::Status {
    fn from(error: InternalError) -> Self {
        let error = error.into_public();
        let code = match error.status {
            StatusCode::BAD_REQUEST => tonic::Code::InvalidArgument,
            StatusCode::NOT_FOUND => tonic::Code::NotFound,
            StatusCode::GATEWAY_TIMEOUT => tonic::Code::DeadlineExceeded,
            status if status.is_server_error() => tonic::Code::Internal,
            _ => tonic::Code::Unknown,
        };
        tonic::Status::new(code, error.message)
    }
}

impl BlogsError for blogs_models::Error {
    fn get_status(&self) -> StatusCode {
        match self {
            Self::InvalidId { .. } => StatusCode::BAD_REQUEST,
            Self::BlogNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Database(_) | Self::Encoding(_) | Self::Decoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn get_type(&self) -> &str {
        match self {
            Self::InvalidId { .. } => "blogs:model:InvalidId",
            Self::BlogNotFound { .. } => "blogs:model:BlogNotFound",
            Self::Timeout { .. } => "blogs:model:Timeout",
            Self::Database(_) => "blogs:model:Database",
            Self::Encoding(_) | Self::Decoding(_) => "blogs:model:Serialization",
        }
    }

    fn context(&self) -> HashMap<String, Value> {
        match self {
            Self::InvalidId { id, .. } => [("id".to_owned(), json!(id))].into(),
            Self::BlogNotFound { blog_id } => [("blog_id".to_owned(), json!(blog_id))].into(),
            Self::Timeout { operation, timeout } => [
                ("operation".to_owned(), json!(operation)),
                ("timeout_ms".to_owned(), json!(timeout.as_millis() as u64)),
            ]
            .into(),
            _ => Default::default(),
        }
    }
}

impl BlogsError for UnknownCode {
    fn get_status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn get_type(&self) -> &str {
        "blogs:UnknownCode"
    }

    fn context(&self) -> HashMap<String, Value> {
        [
            ("kind".to_owned(), json!(self.kind)),
            ("value".to_owned(), json!(self.value)),
        ]
        .into()
    }
}

impl BlogsError for DatabaseError {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        "blogs:DatabaseAccessError"
    }
}

impl BlogsError for PingError {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        "blogs:DatabaseAccessError"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn not_found() -> blogs_models::Error {
        blogs_models::Error::BlogNotFound {
            blog_id: "65f1c0a2e4b0a1b2c3d4e5f6".to_owned(),
        }
    }

    fn timeout() -> blogs_models::Error {
        blogs_models::Error::Timeout {
            operation: "get",
            timeout: Duration::from_secs(5),
        }
    }

    fn invalid_id() -> blogs_models::Error {
        let source = database::bson::oid::ObjectId::parse_str("nope").unwrap_err();
        blogs_models::Error::InvalidId {
            id: "nope".to_owned(),
            source,
        }
    }

    #[test]
    fn model_error_keeps_its_context() {
        let error = InternalError::from(not_found());
        assert_eq!(error.get_status(), StatusCode::NOT_FOUND);
        assert_eq!(error.get_type(), "blogs:model:BlogNotFound");
        assert_eq!(
            error.context.get("blog_id"),
            Some(&json!("65f1c0a2e4b0a1b2c3d4e5f6"))
        );
        assert_eq!(
            error.message,
            "blog '65f1c0a2e4b0a1b2c3d4e5f6' could not be found"
        );
    }

    #[rstest]
    #[case::invalid_id(invalid_id().into(), tonic::Code::InvalidArgument)]
    #[case::not_found(not_found().into(), tonic::Code::NotFound)]
    #[case::timeout(timeout().into(), tonic::Code::DeadlineExceeded)]
    #[case::unknown_code(
        UnknownCode { kind: "status", value: 9 }.into(),
        tonic::Code::InvalidArgument
    )]
    fn grpc_codes(#[case] error: InternalError, #[case] expected: tonic::Code) {
        let status = tonic::Status::from(error);
        assert_eq!(status.code(), expected);
    }

    #[test]
    fn server_errors_are_opaque() {
        let status = tonic::Status::from(InternalError::from(timeout()));
        assert_eq!(status.message(), OPAQUE_MESSAGE);

        let error = InternalError::from(DatabaseError::UnsupportedOperator("$inc".to_owned()));
        let status = tonic::Status::from(error);
        assert_eq!(status.code(), tonic::Code::Internal);
        assert_eq!(status.message(), OPAQUE_MESSAGE);
    }

    #[test]
    fn client_errors_keep_their_message() {
        let status = tonic::Status::from(InternalError::from(not_found()));
        assert_eq!(
            status.message(),
            "blog '65f1c0a2e4b0a1b2c3d4e5f6' could not be found"
        );
    }

    #[test]
    fn status_code_round_trip() {
        let error = InternalError::from(not_found());
        let encoded = serde_json::to_value(&error).unwrap();
        assert_eq!(encoded["status"], json!(404));
        assert_eq!(encoded["type"], json!("blogs:model:BlogNotFound"));
        let decoded: InternalError = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, error);
    }
}
