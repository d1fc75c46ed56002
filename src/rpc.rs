use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::activity::{ActivityLog, CallId, NoopActivityLog, TracingActivityLog};
use crate::call::{log_settled, CallFuture};
use crate::client::Config;
use crate::credentials::Credentials;
use crate::envelope::{decode_response, form_fields, RequestEnvelope};
use crate::error::{Result, SellsyError};
use crate::signer::build_auth_header;
use crate::transport::{AsyncReqwestTransport, AsyncTransport, PostRequest, ReqwestTransport, Transport};

/// Client for the Sellsy RPC API.
///
/// Cloning is cheap: every clone shares the same credentials, configuration,
/// transports and activity log, none of which change after construction.
#[derive(Clone)]
pub struct SellsyClient {
    credentials: Arc<Credentials>,
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    async_transport: Arc<dyn AsyncTransport>,
    activity: Arc<dyn ActivityLog>,
}

impl SellsyClient {
    /// Create a new client for the default endpoint
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(credentials, Config::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(credentials: Credentials, config: Config) -> Self {
        SellsyClient {
            credentials: Arc::new(credentials),
            transport: Arc::new(ReqwestTransport::new(config.clone())),
            async_transport: Arc::new(AsyncReqwestTransport::new(config.clone())),
            config: Arc::new(config),
            activity: Arc::new(TracingActivityLog),
        }
    }

    /// Replace the blocking transport
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Replace the async transport
    pub fn with_async_transport(mut self, transport: impl AsyncTransport + 'static) -> Self {
        self.async_transport = Arc::new(transport);
        self
    }

    /// Replace the activity log
    pub fn with_activity_log(mut self, activity: Arc<dyn ActivityLog>) -> Self {
        self.activity = activity;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Call an API method and block until it settles
    ///
    /// # Arguments
    /// * `method` - API method, e.g. `Client.getOne`
    /// * `params` - Method parameters, any serializable value
    ///
    /// # Returns
    /// The untyped `response` payload
    pub fn call<P>(&self, method: &str, params: P) -> Result<Value>
    where
        P: Serialize,
    {
        let call_id = CallId::generate();
        let request = self.prepare_call(&call_id, method, params)?;

        let start = Instant::now();
        let result = self
            .transport
            .post(&request)
            .map_err(SellsyError::from)
            .and_then(|body| decode_response(&body));

        if self.config.debug {
            tracing::debug!(call_id = %call_id, method, duration = ?start.elapsed(), "call settled");
        }

        log_settled(&*self.activity, &call_id, &result);
        result
    }

    /// Call an API method and unmarshal the payload into the target type
    pub fn call_as<T, P>(&self, method: &str, params: P) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        P: Serialize,
    {
        let payload = self.call(method, params)?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Start an API call without blocking.
    ///
    /// The request is signed, encoded and logged before this returns; the
    /// returned future drives the transport and can be cancelled at any time.
    pub fn call_async<P>(&self, method: &str, params: P) -> CallFuture
    where
        P: Serialize,
    {
        let call_id = CallId::generate();
        let request = match self.prepare_call(&call_id, method, params) {
            Ok(request) => request,
            Err(e) => return CallFuture::failed(call_id, Arc::new(NoopActivityLog), e),
        };

        let transport = Arc::clone(&self.async_transport);
        let debug = self.config.debug;
        let method = method.to_string();
        let span_id = call_id.clone();

        CallFuture::new(call_id, Arc::clone(&self.activity), move |_| async move {
            let start = Instant::now();
            let result = match transport.post(&request).await {
                Ok(body) => decode_response(&body),
                Err(e) => Err(SellsyError::from(e)),
            };

            if debug {
                tracing::debug!(call_id = %span_id, method = %method, duration = ?start.elapsed(), "call settled");
            }
            result
        })
    }

    /// Sign and encode a call, then record it in the activity log
    fn prepare_call<P>(&self, call_id: &CallId, method: &str, params: P) -> Result<PostRequest>
    where
        P: Serialize,
    {
        let params = serde_json::to_value(params)?;
        let do_in = RequestEnvelope::new(method, &params).to_json()?;

        let request = PostRequest {
            url: self.config.endpoint.clone(),
            headers: build_auth_header(&self.credentials).to_pairs(),
            fields: form_fields(do_in.clone()),
            verify_tls: self.config.verify_tls(),
        };

        self.activity.log_outbound(call_id, &do_in);
        Ok(request)
    }
}

impl std::fmt::Debug for SellsyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SellsyClient")
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .finish()
    }
}
