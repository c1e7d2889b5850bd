use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request, Response,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::election::{ElectionError, ErrorKind};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Election(#[from] ElectionError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: String) -> Self {
        Self::Status(Status::NotFound, format!("Not found: {what}"))
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Election(err) => match err.kind() {
                ErrorKind::Authorization => Status::Forbidden,
                ErrorKind::Existence => Status::NotFound,
                ErrorKind::State | ErrorKind::Eligibility => Status::Conflict,
                ErrorKind::Validation => Status::BadRequest,
            },
            Self::Db(_) => Status::InternalServerError,
            Self::Status(status, _) => *status,
        }
    }
}

/// The JSON body sent alongside an error status.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            debug!("Rejected: {self}");
        }

        // Don't leak database internals to clients.
        let body = match &self {
            Self::Db(_) => ErrorBody {
                error: "Internal database error".to_string(),
                kind: None,
            },
            Self::Election(err) => ErrorBody {
                error: err.to_string(),
                kind: Some(err.kind()),
            },
            Self::Status(_, message) => ErrorBody {
                error: message.clone(),
                kind: None,
            },
        };
        Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}
