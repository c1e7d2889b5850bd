use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    Data, Orbit, Request, Response, Rocket,
};

use crate::config::Config;
use crate::model::common::{election::ElectionId, identity::Identity};

/// A unique identifier for a particular request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Atomically get the next ID. This wraps around back to zero if you somehow exceed a usize.
    pub fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// What the request and response log lines say about a request: who made it
/// and which election it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub id: RequestId,
    pub caller: Option<Identity>,
    pub election: Option<ElectionId>,
}

impl RequestContext {
    /// Work out the context of `req`. Computed once per request.
    fn of(req: &Request<'_>) -> Self {
        let caller = req
            .rocket()
            .state::<Config>()
            .and_then(|config| req.headers().get_one(config.caller_header()))
            .map(str::trim)
            .filter(|caller| !caller.is_empty())
            .map(Identity::new);
        Self {
            id: RequestId::next(),
            caller,
            election: election_in_path(req.uri().path().as_str()),
        }
    }

    fn cached<'r>(req: &'r Request<'_>) -> &'r Self {
        req.local_cache(|| Self::of(req))
    }
}

impl Display for RequestContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(election) = self.election {
            write!(f, " on election {election}")?;
        }
        match &self.caller {
            Some(caller) => write!(f, " as {caller}"),
            None => write!(f, " as <anonymous>"),
        }
    }
}

/// The election a request path refers to, if any: `/elections/<id>/...`.
fn election_in_path(path: &str) -> Option<ElectionId> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some("elections"), Some(id)) => id.parse().ok(),
        _ => None,
    }
}

/// A rocket fairing that does global logging, e.g. logging every request and response.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let protocol = if rocket.config().tls_enabled() {
            "https"
        } else {
            "http"
        };
        let ip = &rocket.config().address;
        let port = &rocket.config().port;
        info!("Election manager listening on {protocol}://{ip}:{port}");
        match rocket.state::<Config>() {
            Some(config) => info!(
                "Elections are stored in {:?}, registry owner is {}",
                config.storage(),
                config.owner()
            ),
            None => warn!("No application config, requests will be rejected"),
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let req: &Request<'_> = req;
        let context = RequestContext::cached(req);
        info!("->req{} {} {}{context}", context.id, req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let context = RequestContext::cached(req);
        let code = res.status();
        // Name the operation by its route where one matched.
        let operation = match req.route() {
            Some(r) => match r.name {
                Some(ref name) => format!("{name} ({})", r.uri),
                None => r.uri.to_string(),
            },
            None => "UNKNOWN ROUTE".to_string(),
        };
        let log_msg = format!("<-rsp{} {code} {operation}{context}", context.id);
        match code.class() {
            StatusClass::ServerError => error!("{log_msg}"),
            StatusClass::ClientError => warn!("{log_msg}"),
            _ => info!("{log_msg}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, stopping gracefully...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elections_are_found_in_paths() {
        assert_eq!(election_in_path("/elections/3/vote"), Some(3));
        assert_eq!(election_in_path("/elections/12"), Some(12));
        assert_eq!(election_in_path("/elections/count"), None);
        assert_eq!(election_in_path("/elections"), None);
        assert_eq!(election_in_path("/"), None);
        assert_eq!(election_in_path("/other/3"), None);
    }

    #[test]
    fn context_display() {
        let context = RequestContext {
            id: RequestId(4),
            caller: Some(Identity::new("alice")),
            election: Some(2),
        };
        assert_eq!(context.to_string(), " on election 2 as alice");

        let anonymous = RequestContext {
            id: RequestId(5),
            caller: None,
            election: None,
        };
        assert_eq!(anonymous.to_string(), " as <anonymous>");
    }
}
