use std::future::Future;
use std::pin::Pin;

use convo_http::HttpClient;

use crate::error::Error;
use crate::types::{
    PingRequest, StartAgentData, StartAgentRequest, StopAgentRequest, parse_ack, parse_response,
};

const SERVICE_VERSION: &str = "v3";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe view of the control plane, for holders that need dynamic
/// dispatch (`Arc<dyn AgentControl>`). [`ControlClient`] implements it.
pub trait AgentControl: Send + Sync {
    fn start_agent<'a>(
        &'a self,
        req: &'a StartAgentRequest,
    ) -> BoxFuture<'a, Result<StartAgentData, Error>>;

    fn stop_agent<'a>(&'a self, req: &'a StopAgentRequest) -> BoxFuture<'a, Result<(), Error>>;

    fn ping<'a>(&'a self, req: &'a PingRequest) -> BoxFuture<'a, Result<(), Error>>;
}

/// REST client for the agent control plane: start/stop a remote agent on a
/// channel and keep it alive with pings.
pub struct ControlClient<C> {
    http: C,
}

impl<C: HttpClient> ControlClient<C> {
    pub fn new(http: C) -> Self {
        Self { http }
    }

    pub async fn start_agent(&self, req: &StartAgentRequest) -> Result<StartAgentData, Error> {
        let body = serde_json::to_vec(req)?;
        let bytes = self
            .http
            .post(
                &format!("/{SERVICE_VERSION}/convoai/start"),
                body,
                "application/json",
            )
            .await
            .map_err(Error::Http)?;
        parse_response(&bytes)
    }

    pub async fn stop_agent(&self, req: &StopAgentRequest) -> Result<(), Error> {
        let body = serde_json::to_vec(req)?;
        let bytes = self
            .http
            .post(
                &format!("/{SERVICE_VERSION}/convoai/stop"),
                body,
                "application/json",
            )
            .await
            .map_err(Error::Http)?;
        parse_ack(&bytes)
    }

    /// Best-effort liveness signal. Callers are expected to log failures and
    /// carry on; a missed ping is never fatal to the session.
    pub async fn ping(&self, req: &PingRequest) -> Result<(), Error> {
        let body = serde_json::to_vec(req)?;
        let bytes = self
            .http
            .post(
                &format!("/{SERVICE_VERSION}/convoai/ping"),
                body,
                "application/json",
            )
            .await
            .map_err(Error::Http)?;
        parse_ack(&bytes)
    }
}

impl<C: HttpClient> AgentControl for ControlClient<C> {
    fn start_agent<'a>(
        &'a self,
        req: &'a StartAgentRequest,
    ) -> BoxFuture<'a, Result<StartAgentData, Error>> {
        Box::pin(ControlClient::start_agent(self, req))
    }

    fn stop_agent<'a>(&'a self, req: &'a StopAgentRequest) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(ControlClient::stop_agent(self, req))
    }

    fn ping<'a>(&'a self, req: &'a PingRequest) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(ControlClient::ping(self, req))
    }
}
