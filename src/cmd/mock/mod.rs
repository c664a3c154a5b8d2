use std::{
    convert::Infallible,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use rama::{
    Layer as _, Service,
    error::{ErrorContext as _, extra::OpaqueError},
    graceful::ShutdownGuard,
    http::{
        BodyExtractExt as _, HeaderValue, Method, Request, Response, StatusCode,
        layer::{required_header::AddRequiredResponseHeadersLayer, trace::TraceLayer},
        server::HttpServer,
        service::web::response::{IntoResponse, Json},
    },
    net::socket::Interface,
    rt::Executor,
    tcp::server::TcpListener,
    telemetry::tracing,
};

use clap::Args;

use crate::spark::{MAX_COORD, SparkPayload};

#[derive(Debug, Clone, Args)]
/// run a sparkle board stand-in server
pub struct MockCommand {
    /// network interface to bind to
    #[arg(
        long,
        short = 'b',
        value_name = "INTERFACE",
        default_value = "127.0.0.1:4000"
    )]
    pub bind: Interface,

    /// base processing time before responding
    #[arg(long, value_name = "SECONDS", default_value_t = 0.)]
    pub base_latency: f64,

    /// random delay added to base-latency
    #[arg(long, value_name = "SECONDS", default_value_t = 0.)]
    pub jitter: f64,

    /// probability of answering a valid spark with a 500
    #[arg(long, default_value_t = 0.)]
    pub error_rate: f32,
}

pub async fn exec(guard: ShutdownGuard, args: MockCommand) -> Result<(), OpaqueError> {
    let stub = Arc::new(BoardStub::try_new(
        args.base_latency,
        args.jitter,
        args.error_rate,
    )?);

    let http_svc = (
        TraceLayer::new_for_http(),
        AddRequiredResponseHeadersLayer::new().with_server_header_value(
            HeaderValue::from_static(crate::utils::env::server_identifier()),
        ),
    )
        .into_layer(stub);

    let exec = Executor::graceful(guard);
    let http_server = HttpServer::auto(exec.clone()).service(Arc::new(http_svc));

    let tcp_listener = TcpListener::bind(args.bind, exec)
        .await
        .context("bind mock board server")?;

    let addr = tcp_listener
        .local_addr()
        .context("get bound address for mock board server")?;
    tracing::info!("mock board server listening on {addr}");

    tcp_listener.serve(http_server).await;

    Ok(())
}

/// Request counters exposed over `GET /stats`.
#[derive(Debug, Default)]
pub struct BoardCounters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    errored: AtomicU64,
}

impl BoardCounters {
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::SeqCst)
    }

    pub fn errored(&self) -> u64 {
        self.errored.load(Ordering::SeqCst)
    }
}

/// Stand-in for the sparkle board API.
///
/// Accepts `POST /api/{x}/{y}` with a spark payload body and optionally
/// injects processing latency and error responses, so the bombardment run
/// loop can be exercised against a slow or flaky target.
#[derive(Debug)]
pub struct BoardStub {
    base_latency: f64,
    jitter: f64,
    error_rate: f32,
    counters: Arc<BoardCounters>,
}

impl BoardStub {
    pub fn try_new(base_latency: f64, jitter: f64, error_rate: f32) -> Result<Self, OpaqueError> {
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(OpaqueError::from_display("error-rate must be within [0, 1]"));
        }

        Ok(Self {
            base_latency: base_latency.max(0.),
            jitter: jitter.max(0.),
            error_rate,
            counters: Arc::new(BoardCounters::default()),
        })
    }

    pub fn counters(&self) -> Arc<BoardCounters> {
        self.counters.clone()
    }

    fn compute_delay(&self) -> Duration {
        if self.jitter == 0.0 {
            return Duration::from_secs_f64(self.base_latency);
        }

        let u: f64 = rand::random();
        Duration::from_secs_f64(self.base_latency + u * self.jitter)
    }

    fn inject_error(&self) -> bool {
        self.error_rate > 0. && rand::random::<f32>() < self.error_rate
    }

    async fn serve_spark(&self, req: Request) -> Response {
        let Some((x, y)) = parse_spark_path(req.uri().path()) else {
            self.counters.rejected.fetch_add(1, Ordering::SeqCst);
            return StatusCode::NOT_FOUND.into_response();
        };

        if x > MAX_COORD || y > MAX_COORD {
            self.counters.rejected.fetch_add(1, Ordering::SeqCst);
            return (StatusCode::BAD_REQUEST, "coordinates out of range").into_response();
        }

        if let Err(err) = req.try_into_json::<SparkPayload>().await {
            self.counters.rejected.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("reject malformed spark payload for ({x}, {y}): {err}");
            return (StatusCode::BAD_REQUEST, "malformed spark payload").into_response();
        }

        let delay = self.compute_delay();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        if self.inject_error() {
            self.counters.errored.fetch_add(1, Ordering::SeqCst);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }

        self.counters.accepted.fetch_add(1, Ordering::SeqCst);
        Json(serde_json::json!({"status": "ok"})).into_response()
    }

    fn serve_stats(&self) -> Response {
        Json(serde_json::json!({
            "accepted": self.counters.accepted(),
            "rejected": self.counters.rejected(),
            "errored": self.counters.errored(),
        }))
        .into_response()
    }
}

impl Service<Request> for BoardStub {
    type Output = Response;
    type Error = Infallible;

    async fn serve(&self, req: Request) -> Result<Self::Output, Self::Error> {
        if req.method() == Method::GET && req.uri().path() == "/stats" {
            return Ok(self.serve_stats());
        }
        if req.method() == Method::POST {
            return Ok(self.serve_spark(req).await);
        }
        Ok(StatusCode::METHOD_NOT_ALLOWED.into_response())
    }
}

/// Parse `/api/{x}/{y}` into a coordinate pair.
fn parse_spark_path(path: &str) -> Option<(u32, u32)> {
    let rest = path.strip_prefix("/api/")?;
    let (x, y) = rest.split_once('/')?;
    if y.contains('/') {
        return None;
    }
    Some((x.parse().ok()?, y.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rama::http::Body;

    fn spark_request(x: u32, y: u32) -> Request {
        let payload = SparkPayload {
            color: [120, 90, 50],
            radius: 30.0,
            transparency: 0.5,
            time_to_grow: 400,
        };

        Request::builder()
            .method(Method::POST)
            .uri(format!("http://board.local/api/{x}/{y}"))
            .body(Body::from(
                serde_json::to_vec(&payload).expect("serialize spark payload"),
            ))
            .expect("build spark request")
    }

    #[test]
    fn spark_path_parsing() {
        assert_eq!(Some((0, 0)), parse_spark_path("/api/0/0"));
        assert_eq!(Some((511, 12)), parse_spark_path("/api/511/12"));
        assert_eq!(None, parse_spark_path("/api/1"));
        assert_eq!(None, parse_spark_path("/api/1/2/3"));
        assert_eq!(None, parse_spark_path("/api/x/2"));
        assert_eq!(None, parse_spark_path("/api/-1/2"));
        assert_eq!(None, parse_spark_path("/sparkle/1/2"));
    }

    #[tokio::test]
    async fn accepts_valid_sparks() {
        let stub = BoardStub::try_new(0.0, 0.0, 0.0).expect("create stub");

        let resp = stub.serve(spark_request(5, 7)).await.expect("serve");
        assert_eq!(StatusCode::OK, resp.status());
        assert_eq!(1, stub.counters().accepted());
    }

    #[tokio::test]
    async fn rejects_out_of_range_coordinates() {
        let stub = BoardStub::try_new(0.0, 0.0, 0.0).expect("create stub");

        let resp = stub.serve(spark_request(512, 7)).await.expect("serve");
        assert_eq!(StatusCode::BAD_REQUEST, resp.status());
        assert_eq!(1, stub.counters().rejected());
        assert_eq!(0, stub.counters().accepted());
    }

    #[tokio::test]
    async fn rejects_malformed_payloads() {
        let stub = BoardStub::try_new(0.0, 0.0, 0.0).expect("create stub");

        let req = Request::builder()
            .method(Method::POST)
            .uri("http://board.local/api/1/2")
            .body(Body::from("not json"))
            .expect("build request");

        let resp = stub.serve(req).await.expect("serve");
        assert_eq!(StatusCode::BAD_REQUEST, resp.status());
        assert_eq!(1, stub.counters().rejected());
    }

    #[tokio::test]
    async fn error_rate_of_one_always_errors() {
        let stub = BoardStub::try_new(0.0, 0.0, 1.0).expect("create stub");

        let resp = stub.serve(spark_request(1, 1)).await.expect("serve");
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, resp.status());
        assert_eq!(1, stub.counters().errored());
        assert_eq!(0, stub.counters().accepted());
    }

    #[tokio::test]
    async fn stats_reports_counters() {
        let stub = BoardStub::try_new(0.0, 0.0, 0.0).expect("create stub");
        stub.serve(spark_request(1, 1)).await.expect("serve");

        let req = Request::builder()
            .uri("http://board.local/stats")
            .body(Body::empty())
            .expect("build request");
        let resp = stub.serve(req).await.expect("serve");
        assert_eq!(StatusCode::OK, resp.status());

        let stats: serde_json::Value = resp.try_into_json().await.expect("decode stats");
        assert_eq!(serde_json::json!(1), stats["accepted"]);
    }

    #[test]
    fn error_rate_outside_unit_interval_is_refused() {
        assert!(BoardStub::try_new(0.0, 0.0, 1.5).is_err());
        assert!(BoardStub::try_new(0.0, 0.0, -0.1).is_err());
    }
}
