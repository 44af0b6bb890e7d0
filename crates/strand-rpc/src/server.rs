// crates/strand-rpc/src/server.rs
//
// RPC server setup: StrandRpcServer and RpcConfig.
//
// JSON-RPC over tonic: a single service registered under RPC_SERVICE_NAME
// accepts JSON-encoded requests with a method field, dispatches to the
// matching handler, and returns a JSON-encoded envelope. No proto codegen;
// tonic provides the HTTP server, interceptors and graceful shutdown.
//
// Peers reach the same endpoint as local clients, so every method is scoped:
// peer methods answer anyone, control methods only loopback callers unless
// `allow_remote_control` is set.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tonic::transport::Server;
use tonic::Status;

use strand_core::error::StrandError;
use strand_core::wire::{JsonRpcRequest, JsonRpcResponse, RPC_SERVICE_NAME};

use crate::handlers;
use crate::middleware;
use crate::services::NodeServices;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Accept control methods (share, probe, pools, pull) from non-loopback
    /// callers. Peer methods are always served.
    pub allow_remote_control: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
            allow_remote_control: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Method scope
// ---------------------------------------------------------------------------

/// Where a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// In-process or loopback.
    Local,
    /// Any other network peer, or a connection with unknown origin.
    Remote,
}

impl Caller {
    /// Classify a connection by its remote address.
    pub fn from_remote_addr(addr: Option<SocketAddr>) -> Self {
        match addr {
            Some(addr) if addr.ip().is_loopback() => Caller::Local,
            _ => Caller::Remote,
        }
    }
}

/// Who may invoke a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodScope {
    /// Part of the peer protocol: served to any caller.
    Peer,
    /// Mutates or drives this node: local callers only.
    Control,
}

/// Scope of an RPC method. Unknown methods are control-scoped.
pub fn method_scope(method: &str) -> MethodScope {
    match method {
        "content/fetch" | "node/health" => MethodScope::Peer,
        _ => MethodScope::Control,
    }
}

// ---------------------------------------------------------------------------
// StrandRpcServer
// ---------------------------------------------------------------------------

/// The node's RPC server.
///
/// Serves local clients and peers from the same endpoint.
#[derive(Clone)]
pub struct StrandRpcServer {
    config: RpcConfig,
    inner: StrandServiceImpl,
}

impl std::fmt::Debug for StrandRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrandRpcServer")
            .field("config", &self.config)
            .field("services", &self.inner.services)
            .finish()
    }
}

impl StrandRpcServer {
    pub fn new(config: RpcConfig, services: NodeServices) -> Self {
        Self {
            inner: StrandServiceImpl {
                allow_remote_control: config.allow_remote_control,
                services,
                lifecycle: None,
                start_time: None,
            },
            config,
        }
    }

    /// Report the daemon's lifecycle state in node/info and node/health.
    pub fn with_lifecycle(mut self, lifecycle: watch::Receiver<String>) -> Self {
        self.inner.lifecycle = Some(lifecycle);
        self
    }

    /// Set the daemon start time for uptime calculation.
    pub fn with_start_time(mut self, start_time: Instant) -> Self {
        self.inner.start_time = Some(start_time);
        self
    }

    /// Dispatch a request in-process, bypassing HTTP. The caller is local.
    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.inner.dispatch(request, Caller::Local).await
    }

    /// Dispatch a request as if it arrived from `caller`.
    pub async fn handle_from(&self, request: JsonRpcRequest, caller: Caller) -> JsonRpcResponse {
        self.inner.dispatch(request, caller).await
    }

    /// Serve until the process is terminated.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    pub async fn start_with_shutdown<F>(&self, signal: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("Strand RPC server starting on {}", addr);

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                StrandJsonRpcServer::new(self.inner.clone()),
                middleware::logging_interceptor,
            ))
            .serve_with_shutdown(addr, signal)
            .await?;

        tracing::info!("Strand RPC server stopped");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Shared state behind the tonic service, cloned per request.
#[derive(Clone)]
struct StrandServiceImpl {
    services: NodeServices,
    allow_remote_control: bool,
    lifecycle: Option<watch::Receiver<String>>,
    start_time: Option<Instant>,
}

impl StrandServiceImpl {
    fn state(&self) -> String {
        match &self.lifecycle {
            Some(rx) => rx.borrow().clone(),
            None => "Running".to_string(),
        }
    }

    /// Dispatch a JSON-RPC request to the appropriate handler based on the method name.
    async fn dispatch(&self, request: JsonRpcRequest, caller: Caller) -> JsonRpcResponse {
        let services = &self.services;
        let method = request.method.clone();
        tracing::debug!("RPC {} from {:?}", method, caller);

        if caller == Caller::Remote
            && !self.allow_remote_control
            && method_scope(&method) == MethodScope::Control
        {
            tracing::warn!("Refused remote call to control method {}", method);
            return JsonRpcResponse::from_error(&StrandError::Forbidden(format!(
                "{} is only served to local callers",
                method
            )));
        }

        let result = match request.method.as_str() {
            // Content
            "content/share" => {
                dispatch_handler(request.params, |r| handlers::content::handle_share(services, r))
                    .await
            }
            "content/fetch" => {
                dispatch_handler(request.params, |r| handlers::content::handle_fetch(services, r))
                    .await
            }
            "content/list" => {
                dispatch_handler(request.params, |r| handlers::content::handle_list(services, r))
                    .await
            }
            "content/pull" => {
                dispatch_handler(request.params, |r| handlers::content::handle_pull(services, r))
                    .await
            }

            // Probe
            "probe/run" => {
                dispatch_handler(request.params, |r| handlers::probe::handle_probe(services, r))
                    .await
            }

            // Query
            "query/holders" => {
                dispatch_handler(request.params, |r| handlers::query::handle_holders(services, r))
                    .await
            }

            // Pools
            "pool/create" => {
                dispatch_handler(request.params, |r| {
                    handlers::pool::handle_create_pool(services, r)
                })
                .await
            }
            "pool/list" => {
                dispatch_handler(request.params, |r| handlers::pool::handle_list_pools(services, r))
                    .await
            }
            "pool/refresh" => {
                dispatch_handler(request.params, |r| {
                    handlers::pool::handle_refresh_pool(services, r)
                })
                .await
            }

            // Node
            "node/info" => {
                let state = self.state();
                let start_time = self.start_time;
                dispatch_handler(request.params, |r| {
                    handlers::node::handle_get_node_info(services, r, start_time, state)
                })
                .await
            }
            "node/health" => {
                let state = self.state();
                dispatch_handler(request.params, |r| {
                    handlers::node::handle_get_health(services, r, state)
                })
                .await
            }

            _ => Err(StrandError::InvalidInput(format!(
                "Unknown method: {}",
                request.method
            ))),
        };

        match result {
            Ok(value) => JsonRpcResponse::ok(value),
            Err(err) => {
                tracing::warn!("RPC {} failed: {}", method, err);
                JsonRpcResponse::from_error(&err)
            }
        }
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
///
/// Missing params are treated as an empty object so parameterless methods
/// accept `{}`, `null`, or nothing at all.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, StrandError>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Resp, StrandError>>,
{
    let params = if params.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        params
    };
    let request: Req = serde_json::from_value(params)
        .map_err(|e| StrandError::InvalidInput(format!("Failed to deserialize request: {}", e)))?;
    let response = handler(request).await?;
    serde_json::to_value(response)
        .map_err(|e| StrandError::Serialization(format!("Failed to serialize response: {}", e)))
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------
// One service, one route: `/<RPC_SERVICE_NAME>/call`. Request and response
// bodies are raw JSON bytes.

#[derive(Clone)]
pub struct StrandJsonRpcServer {
    inner: StrandServiceImpl,
}

impl std::fmt::Debug for StrandJsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrandJsonRpcServer").finish()
    }
}

impl StrandJsonRpcServer {
    fn new(inner: StrandServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for StrandJsonRpcServer {
    const NAME: &'static str = RPC_SERVICE_NAME;
}

impl<B> tower_service::Service<http::Request<B>> for StrandJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let caller = Caller::from_remote_addr(
            req.extensions()
                .get::<tonic::transport::server::TcpConnectInfo>()
                .and_then(|info| info.remote_addr()),
        );

        Box::pin(async move {
            let body_bytes = match collect_body(req.into_body()).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!("Failed to read request body: {}", e);
                    let resp = JsonRpcResponse::failure(
                        "invalid_input",
                        format!("Failed to read request body: {}", e),
                    );
                    return Ok(build_response(&resp));
                }
            };

            let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                Ok(r) => r,
                Err(e) => {
                    let resp = JsonRpcResponse::failure(
                        "invalid_input",
                        format!("Invalid JSON-RPC request: {}", e),
                    );
                    return Ok(build_response(&resp));
                }
            };

            let rpc_response = inner.dispatch(rpc_request, caller).await;
            Ok(build_response(&rpc_response))
        })
    }
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build a 200 response carrying the JSON envelope.
fn build_response(envelope: &JsonRpcResponse) -> http::Response<tonic::body::BoxBody> {
    let json = serde_json::to_vec(envelope).unwrap_or_default();
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut response = http::Response::new(body);
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}
