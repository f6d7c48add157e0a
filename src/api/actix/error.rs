use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::SessionError;

impl ResponseError for SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SessionError::BadSignature => StatusCode::UNAUTHORIZED,
            SessionError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            SessionError::Serialization(_)
            | SessionError::Configuration(_)
            | SessionError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        log::error!(target: "shared_session::actix", "msg=\"session error\" error=\"{self}\"");

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}
