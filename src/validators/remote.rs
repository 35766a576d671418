use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures_timer::Delay;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::form::{ValidationContext, Validator, ValidatorFault, ValidatorOutcome, ValidatorResult};

#[derive(Clone, Debug, PartialEq)]
pub struct RemoteRequest {
    pub url: String,
    pub body: Map<String, Value>,
}

pub type RemoteFuture = BoxFuture<'static, Result<Value, ValidatorFault>>;

/// Posts a validation request and resolves to the decoded JSON response.
pub trait RemoteTransport: Send + Sync + 'static {
    fn post(&self, request: RemoteRequest) -> RemoteFuture;
}

impl<F> RemoteTransport for F
where
    F: Fn(RemoteRequest) -> RemoteFuture + Send + Sync + 'static,
{
    fn post(&self, request: RemoteRequest) -> RemoteFuture {
        self(request)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RemoteOptions {
    pub url: String,
    /// Request key for the value; the field name when absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Milliseconds to wait before sending. A newer check supersedes a
    /// waiting one without ever reaching the transport.
    #[serde(default)]
    pub delay: u64,
}

pub struct Remote {
    transport: Arc<dyn RemoteTransport>,
}

impl Remote {
    pub fn new(transport: impl RemoteTransport) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }
}

impl Validator for Remote {
    type Options = RemoteOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &RemoteOptions) -> ValidatorResult {
        if ctx.value().is_empty() {
            return Ok(true.into());
        }

        let mut body = options.data.clone();
        let key = options
            .name
            .clone()
            .unwrap_or_else(|| ctx.field().to_string());
        body.insert(key, Value::String(ctx.value().to_owned()));
        let request = RemoteRequest {
            url: options.url.clone(),
            body,
        };
        let transport = self.transport.clone();
        let delay = Duration::from_millis(options.delay);

        Ok(ValidatorOutcome::pending(async move {
            if !delay.is_zero() {
                Delay::new(delay).await;
            }
            tracing::debug!(url = %request.url, "sending remote validation request");
            let response = transport.post(request).await?;
            read_verdict(&response)
        }))
    }
}

fn read_verdict(response: &Value) -> Result<bool, ValidatorFault> {
    match response.get("valid") {
        Some(Value::Bool(valid)) => Ok(*valid),
        Some(Value::String(valid)) => Ok(valid == "true"),
        Some(_) => Ok(false),
        None => Err(ValidatorFault::Malformed(format!(
            "response has no `valid` key: {response}"
        ))),
    }
}
