use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};

use crate::config::Config;
use crate::error::Error;
use crate::model::common::identity::Identity;

/// The authenticated identity making a request.
///
/// Authentication itself happens upstream; this only trusts the identity header
/// named by [`Config::caller_header`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Identity);

impl Caller {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.guard::<&State<Config>>().await {
            Outcome::Success(config) => config,
            _ => {
                return Outcome::Failure((
                    Status::InternalServerError,
                    Error::Status(
                        Status::InternalServerError,
                        "Application config is not managed".to_string(),
                    ),
                ))
            }
        };

        match req.headers().get_one(config.caller_header()) {
            Some(value) if !value.trim().is_empty() => {
                Outcome::Success(Caller(Identity::new(value.trim())))
            }
            _ => Outcome::Failure((
                Status::Unauthorized,
                Error::Status(
                    Status::Unauthorized,
                    format!("Missing caller identity header `{}`", config.caller_header()),
                ),
            )),
        }
    }
}
