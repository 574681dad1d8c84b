use crate::errors::ServerError;
use crate::responses::json::json_error;
use astra::Response;

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into a proper JSON response
pub fn error_to_response(err: ServerError) -> Response {
    match err {
        ServerError::NotFound => json_error(404, "Not Found"),
        ServerError::BadRequest(msg) => json_error(400, &msg),
        ServerError::DbError(msg) => json_error(500, &msg),
        ServerError::Upstream(msg) => json_error(502, &msg),
        ServerError::InternalError => json_error(500, "Internal Server Error"),
    }
}
