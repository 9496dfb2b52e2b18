use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::models::STATUS_BUSY;
use crate::session::DeviceSession;
use crate::settings::SETTINGS;
use crate::transport::{OutgoingRequest, Transport};
use crate::ZidooError;

/// Which timeout a call gets. Status probes must stay snappy so a slow
/// search never starves polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallClass {
    Status,
    Default,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub status: Duration,
    pub default: Duration,
    pub search: Duration,
}

impl Timeouts {
    pub fn for_class(&self, class: CallClass) -> Duration {
        match class {
            CallClass::Status => self.status,
            CallClass::Default => self.default,
            CallClass::Search => self.search,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            status: SETTINGS.status_timeout,
            default: SETTINGS.request_timeout,
            search: SETTINGS.search_timeout,
        }
    }
}

/// Re-issue budgets. `transport_retries` covers calls that produced no usable
/// response; `busy_retries` covers status probes answered with 804. A value
/// of N allows N re-issues after the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub transport_retries: u32,
    pub busy_retries: u32,
}

impl RetryPolicy {
    pub fn new(transport_retries: u32, busy_retries: u32) -> Self {
        Self {
            transport_retries,
            busy_retries,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(SETTINGS.retries, SETTINGS.busy_retries)
    }
}

/// One logical call against the device: relative endpoint plus query pairs.
/// Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    endpoint: String,
    query: Vec<(String, String)>,
    class: CallClass,
    retries: Option<u32>,
    status_probe: bool,
    log_errors: bool,
    optional: bool,
}

impl DeviceRequest {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_start_matches('/').to_string(),
            query: Vec::new(),
            class: CallClass::Default,
            retries: None,
            status_probe: false,
            log_errors: true,
            optional: false,
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn class(mut self, class: CallClass) -> Self {
        self.class = class;
        self
    }

    /// Overrides the transport retry budget for this call.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Marks a now-playing status call: a 200 envelope carrying 804 means
    /// "switching media" and is re-issued instead of returned.
    pub fn status_probe(mut self) -> Self {
        self.status_probe = true;
        self.class = CallClass::Status;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.log_errors = false;
        self
    }

    /// Capability probe that older firmware may not answer. Running out of
    /// retries on it leaves the session token alone.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn is_status_probe(&self) -> bool {
        self.status_probe
    }
}

/// True when a well-formed response is the in-band "switching media" signal.
pub fn is_busy_response(value: &Value) -> bool {
    value.get("status").and_then(Value::as_i64) == Some(STATUS_BUSY)
}

/// Issues device calls with bounded retries and keeps the session token in
/// step with what the device answers.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    timeouts: Timeouts,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, timeouts: Timeouts) -> Self {
        Self {
            transport,
            policy,
            timeouts,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RetryPolicy) {
        self.policy = policy;
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.timeouts = timeouts;
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Assembles the absolute request with auth headers for the current session.
    pub fn build(&self, session: &DeviceSession, request: &DeviceRequest) -> OutgoingRequest {
        let mut headers: Vec<(&'static str, String)> = Vec::with_capacity(3);
        if let Some(psk) = session.psk() {
            headers.push(("X-Auth-PSK", psk.to_string()));
        }
        if let Some(cookie) = session.cookie_header() {
            headers.push(("Cookie", cookie.to_string()));
        }
        headers.push(("Cache-Control", "no-cache".to_string()));

        OutgoingRequest {
            url: format!("http://{}/{}", session.authority(), request.endpoint),
            endpoint: request.endpoint.clone(),
            query: request.query.clone(),
            headers,
            timeout: self.timeouts.for_class(request.class),
        }
    }

    /// Runs `request` until a usable response arrives or a budget runs out.
    ///
    /// Any well-formed JSON object is returned on first receipt regardless of
    /// its own `status` field, except the 804 busy code on status probes.
    /// Exhausting either budget clears the session token unless the request
    /// is [`optional`](DeviceRequest::optional).
    pub async fn execute(
        &self,
        session: &mut DeviceSession,
        request: &DeviceRequest,
    ) -> Result<Value, ZidooError> {
        let mut transport_budget = request.retries.unwrap_or(self.policy.transport_retries);
        let mut busy_budget = self.policy.busy_retries;
        let mut attempts: u32 = 0;

        let failure = loop {
            attempts += 1;
            trace!(endpoint = %request.endpoint, attempt = attempts, "Sending request");

            match self.attempt(session, request).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_busy() => {
                    if busy_budget == 0 {
                        warn!(endpoint = %request.endpoint, attempts, "Player still switching media, giving up");
                        break e;
                    }
                    warn!("[W] Busy retry {}: url:{}", busy_budget, request.endpoint);
                    busy_budget -= 1;
                }
                Err(e) if e.is_transport() => {
                    if request.log_errors && session.power_observed() {
                        info!(endpoint = %request.endpoint, error = %e, "Request failed");
                    } else {
                        trace!(endpoint = %request.endpoint, error = %e, "Request failed");
                    }
                    if transport_budget == 0 {
                        break ZidooError::DeviceOffline {
                            endpoint: request.endpoint.clone(),
                            attempts,
                        };
                    }
                    warn!("[W] Retry {}: url:{}", transport_budget, request.endpoint);
                    transport_budget -= 1;
                }
                Err(e) => return Err(e),
            }
        };

        if request.optional {
            debug!(endpoint = %request.endpoint, error = %failure, "Optional endpoint unavailable");
        } else if session.clear_token() {
            info!("No response from player! Showing not connected");
        }
        Err(failure)
    }

    /// Like [`execute`](Self::execute), then decodes into the endpoint's response struct.
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        session: &mut DeviceSession,
        request: &DeviceRequest,
    ) -> Result<T, ZidooError> {
        let value = self.execute(session, request).await?;
        serde_json::from_value(value).map_err(|e| {
            debug!(endpoint = %request.endpoint, error = %e, "Response did not match expected shape");
            ZidooError::MalformedResponse(format!("{}: {}", request.endpoint, e))
        })
    }

    async fn attempt(
        &self,
        session: &mut DeviceSession,
        request: &DeviceRequest,
    ) -> Result<Value, ZidooError> {
        let outgoing = self.build(session, request);
        let response = self.transport.send(outgoing).await?;

        if response.status != 200 {
            return Err(ZidooError::HttpStatus(response.status));
        }
        session.store_cookies(&response.set_cookies);

        let value: Value = serde_json::from_slice(&response.body)?;
        match value.as_object() {
            Some(_) if request.status_probe && is_busy_response(&value) => {
                Err(ZidooError::DeviceBusy)
            }
            Some(object) if !object.is_empty() => Ok(value),
            _ => Err(ZidooError::MalformedResponse(format!(
                "{}: expected a JSON object",
                request.endpoint
            ))),
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("policy", &self.policy)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}
