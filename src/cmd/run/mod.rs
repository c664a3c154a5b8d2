use std::{sync::Arc, time::Duration};

use rama::{
    error::{ErrorContext as _, extra::OpaqueError},
    graceful::ShutdownGuard,
    net::address::ProxyAddress,
    telemetry::tracing,
};

use clap::Args;
use tokio::{
    sync::{
        Semaphore,
        mpsc::{self, Receiver},
    },
    task::JoinSet,
    time::Instant,
};

use crate::spark::{SparkTuning, pattern::Pattern};

mod client;
mod generator;
mod pacer;
mod reporter;

use self::{
    client::SparkClient,
    generator::SparkGenerator,
    reporter::{HumanReporter, JsonlReporter, Reporter, RunSummary, SparkResultEvent},
};

#[derive(Debug, Clone, Args)]
/// bombard a sparkle board with spark requests
pub struct RunCommand {
    /// target host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// target port
    #[arg(long, default_value_t = 4000)]
    port: u16,

    /// coordinate pattern traced by the spark stream
    #[arg(long, value_enum, default_value = "random")]
    pattern: Pattern,

    /// target requests per second
    #[arg(long, value_name = "N", default_value_t = 1000)]
    rate: u32,

    /// points generated per tick
    #[arg(long, value_name = "N", default_value_t = 5)]
    batch: u32,

    /// random multiplier on pacer sleeps, in [0, 1]
    #[arg(long, default_value_t = 0.)]
    jitter: f64,

    /// wall-clock bound in seconds (0 = unbounded)
    #[arg(long, value_name = "SECONDS", default_value_t = 0.)]
    duration: f64,

    /// request ceiling (0 = unbounded)
    #[arg(long, value_name = "N", default_value_t = 0)]
    count: u64,

    #[clap(flatten)]
    tuning: SparkTuning,

    /// maximum in-flight requests (0 = derive from available parallelism)
    #[arg(long, value_name = "N", default_value_t = 200)]
    concurrency: usize,

    /// per-request timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 2.)]
    timeout: f64,

    /// optional upstream proxy for all spark traffic
    #[arg(long, value_name = "<scheme>://[user:[password]@]<host>[:port]")]
    proxy: Option<ProxyAddress>,

    /// print requests without sending them
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// report progress as json lines instead of a human-friendly format
    #[arg(long, default_value_t = false)]
    json: bool,
}

pub async fn exec(guard: ShutdownGuard, args: RunCommand) -> Result<(), OpaqueError> {
    let concurrency = if args.concurrency == 0 {
        crate::utils::env::compute_concurrent_request_count()
    } else {
        args.concurrency
    };

    let base_url = format!("http://{}:{}", args.host, args.port);

    tracing::info!(
        rate = %args.rate,
        batch = %args.batch,
        %concurrency,
        pattern = ?args.pattern,
        dry_run = %args.dry_run,
        "start bombardment of {base_url}",
    );

    let generator = SparkGenerator::new(
        base_url,
        args.pattern,
        args.tuning,
        args.rate,
        args.batch,
        args.jitter,
        args.count,
    );

    let client = if args.dry_run {
        None
    } else {
        let timeout = Duration::from_secs_f64(args.timeout.max(0.1));
        Some(
            SparkClient::try_new(timeout, args.proxy.clone())
                .context("create spark web client")?,
        )
    };

    const REPORT_INTERVAL: Duration = Duration::from_secs(1);
    const EMIT_EVENTS: bool = true;

    let reporter: Box<dyn Reporter> = if args.json {
        Box::new(JsonlReporter::new(REPORT_INTERVAL, EMIT_EVENTS))
    } else {
        Box::new(HumanReporter::new(REPORT_INTERVAL))
    };

    let deadline =
        (args.duration > 0.).then(|| Instant::now() + Duration::from_secs_f64(args.duration));

    let summary = dispatch_loop(guard, generator, client, reporter, concurrency, deadline).await;
    tracing::debug!("bombardment finished: {summary:?}");

    Ok(())
}

/// Drive the generator until a bound triggers, dispatching every task
/// through a semaphore-bounded set of concurrent transport calls, then
/// drain all outstanding work before reporting final totals.
async fn dispatch_loop(
    guard: ShutdownGuard,
    mut generator: SparkGenerator,
    client: Option<SparkClient>,
    reporter: Box<dyn Reporter>,
    concurrency: usize,
    deadline: Option<Instant>,
) -> RunSummary {
    let start = Instant::now();

    let (result_tx, result_rx) = mpsc::channel(concurrency.max(1) * 8);
    let report_handle = tokio::spawn(report_worker(reporter, result_rx, start));

    let limits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();

    let mut cancelled = std::pin::pin!(guard.clone_weak().into_cancelled());
    let mut sent: u64 = 0;

    loop {
        let task = tokio::select! {
            _ = cancelled.as_mut() => {
                tracing::debug!("exit dispatch loop early: guard shutdown");
                break;
            }
            _ = sleep_until_deadline(deadline) => {
                tracing::debug!("dispatch loop reached its duration bound");
                break;
            }
            maybe_task = generator.next_task() => {
                let Some(task) = maybe_task else {
                    tracing::debug!("dispatch loop reached its request ceiling");
                    break;
                };
                task
            }
        };

        sent += 1;

        let Some(client) = client.as_ref() else {
            println!(
                "[DRY] POST {} -> r:{:.1} t:{:.2} color:{:?}",
                task.url, task.payload.radius, task.payload.transparency, task.payload.color,
            );
            continue;
        };

        // keep the set from accumulating completed handles
        while in_flight.try_join_next().is_some() {}

        let client = client.clone();
        let limits = limits.clone();
        let result_tx = result_tx.clone();

        in_flight.spawn(async move {
            let _permit = match limits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            let req_start = Instant::now();
            let outcome = client.send(&task).await;

            let ev = SparkResultEvent {
                elapsed: start.elapsed(),
                index: task.index,
                x: task.x,
                y: task.y,
                latency: req_start.elapsed(),
                status: outcome.status,
                detail: outcome.detail,
            };
            if let Err(err) = result_tx.send(ev).await {
                tracing::debug!("failed to send spark result event: {err}");
            }
        });
    }

    if !in_flight.is_empty() {
        tracing::info!("waiting for {} outstanding sparks...", in_flight.len());
    }
    while in_flight.join_next().await.is_some() {}
    drop(result_tx);

    let summary = RunSummary {
        elapsed: start.elapsed(),
        sent,
        dry_run: client.is_none(),
    };

    match report_handle.await {
        Ok(mut reporter) => reporter.finish(&summary),
        Err(err) => tracing::error!("report worker failed: {err}"),
    }

    summary
}

async fn report_worker(
    mut reporter: Box<dyn Reporter>,
    mut result_rx: Receiver<SparkResultEvent>,
    start: Instant,
) -> Box<dyn Reporter> {
    while let Some(ev) = result_rx.recv().await {
        reporter.on_result(&ev);
        reporter.on_tick(start.elapsed());
    }
    reporter
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use rama::{
        Service as _,
        http::{Request, StatusCode, server::HttpServer, service::web::response::IntoResponse},
        net::socket::Interface,
        rt::Executor,
        service::service_fn,
        tcp::server::TcpListener,
    };

    use crate::{cmd::mock::BoardStub, spark::MAX_COORD};

    fn test_guard() -> (rama::graceful::Shutdown, ShutdownGuard) {
        let shutdown = rama::graceful::Shutdown::new(std::future::pending::<()>());
        let guard = shutdown.guard();
        (shutdown, guard)
    }

    fn test_generator(rate: u32, batch: u32, count: u64) -> SparkGenerator {
        SparkGenerator::new(
            "http://127.0.0.1:4000".to_owned(),
            Pattern::Golden,
            SparkTuning::default(),
            rate,
            batch,
            0.0,
            count,
        )
    }

    fn test_reporter() -> Box<dyn Reporter> {
        Box::new(HumanReporter::new(Duration::from_secs(1)))
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn dry_run_counts_without_dispatching() {
        let (_shutdown, guard) = test_guard();
        let generator = test_generator(1000, 2, 5);

        let summary = dispatch_loop(guard, generator, None, test_reporter(), 4, None).await;

        assert_eq!(5, summary.sent);
        assert!(summary.dry_run);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn duration_bound_stops_the_loop() {
        let (_shutdown, guard) = test_guard();
        // unbounded count: only the deadline can stop this run
        let generator = test_generator(10, 5, 0);
        let deadline = Some(Instant::now() + Duration::from_secs(1));

        let summary = dispatch_loop(guard, generator, None, test_reporter(), 4, deadline).await;

        // ticks at t=0, t=0.5 and possibly t=1.0 (racing the deadline)
        assert!(
            (10..=15).contains(&summary.sent),
            "sent {} requests",
            summary.sent
        );
        assert!(summary.elapsed >= Duration::from_secs(1));
        assert!(summary.elapsed < Duration::from_millis(1100));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn concurrency_limit_is_respected() {
        #[derive(Default)]
        struct Gauge {
            in_flight: AtomicUsize,
            peak: AtomicUsize,
            hits: AtomicUsize,
        }

        let gauge = Arc::new(Gauge::default());
        let svc = {
            let gauge = gauge.clone();
            service_fn(async move |_req: Request| {
                let now = gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                gauge.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
                gauge.hits.fetch_add(1, Ordering::SeqCst);
                Ok::<_, OpaqueError>(StatusCode::OK.into_response())
            })
        };
        let client = SparkClient::from_service(svc.boxed());

        let (_shutdown, guard) = test_guard();
        let generator = test_generator(100_000, 25, 25);

        let summary =
            dispatch_loop(guard, generator, Some(client), test_reporter(), 3, None).await;

        assert_eq!(25, summary.sent);
        assert_eq!(25, gauge.hits.load(Ordering::SeqCst));
        assert!(
            gauge.peak.load(Ordering::SeqCst) <= 3,
            "peak in-flight {} exceeded the configured concurrency",
            gauge.peak.load(Ordering::SeqCst)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delivers_every_spark_to_a_live_board() {
        let (_shutdown, guard) = test_guard();

        let stub = Arc::new(BoardStub::try_new(0.0, 0.0, 0.0).expect("create board stub"));
        let counters = stub.counters();

        let exec = Executor::graceful(guard.clone());
        let http_server = HttpServer::auto(exec.clone()).service(stub);
        let listener = TcpListener::bind(
            "127.0.0.1:0".parse::<Interface>().expect("parse interface"),
            exec,
        )
        .await
        .expect("bind board stub");
        let addr = listener.local_addr().expect("board stub addr");
        tokio::spawn(async move {
            listener.serve(http_server).await;
        });

        let client = SparkClient::try_new(Duration::from_secs(2), None).expect("create client");
        let generator = SparkGenerator::new(
            format!("http://{addr}"),
            Pattern::Lissajous,
            SparkTuning::default(),
            10_000,
            4,
            0.0,
            8,
        );

        let summary =
            dispatch_loop(guard, generator, Some(client), test_reporter(), 4, None).await;

        assert_eq!(8, summary.sent);
        assert_eq!(8, counters.accepted());
        assert_eq!(0, counters.rejected());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn generated_coordinates_stay_on_the_board() {
        let mut generator = test_generator(1000, 5, 20);
        while let Some(task) = generator.next_task().await {
            assert!(task.x <= MAX_COORD && task.y <= MAX_COORD);
        }
    }
}
