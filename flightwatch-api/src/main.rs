use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use flightwatch_api::{app, AppState};
use flightwatch_offer::{CallPacer, RetryPolicy, SearchOrchestrator, TokenBucketPacer, Unpaced};
use flightwatch_store::{
    AmadeusClient, CachedTokenProvider, Config, DbClient, OAuthTokenIssuer, SqliteResultStore, SqliteRuleStore,
    SqliteTokenStore, SqliteWatchStore,
};
use flightwatch_watch::{cron_expression, Cadence, Scheduler, TokioScheduler, WatchRunner, WatchSweep};
use secrecy::SecretString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flightwatch_api=debug,flightwatch_watch=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting FlightWatch API on port {}", config.server.port);

    // 1. Database
    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to open database")?;
    db.migrate().await.context("Failed to run migrations")?;

    let rules = Arc::new(SqliteRuleStore::new(db.pool.clone()));
    let watches = Arc::new(SqliteWatchStore::new(db.pool.clone()));
    let results = Arc::new(SqliteResultStore::new(db.pool.clone()));

    // 2. Upstream client with the shared token cache
    let amadeus = &config.amadeus;
    let issuer = OAuthTokenIssuer::new(
        &amadeus.base_url,
        amadeus.client_id.clone(),
        SecretString::new(amadeus.client_secret.clone().into()),
        amadeus.request_timeout(),
    )?;
    let tokens = Arc::new(CachedTokenProvider::new(
        Arc::new(issuer),
        Arc::new(SqliteTokenStore::new(db.pool.clone())),
        amadeus.token_safety_margin_secs,
    ));
    let upstream = Arc::new(AmadeusClient::new(&amadeus.base_url, tokens, amadeus.request_timeout())?);

    // 3. Search pipeline
    let pacer: Arc<dyn CallPacer> =
        match TokenBucketPacer::new(Duration::from_millis(config.pacing.min_call_interval_ms)) {
            Some(pacer) => {
                tracing::info!("Pacing upstream calls to one per {:?}", pacer.min_interval());
                Arc::new(pacer)
            }
            None => {
                tracing::warn!("Upstream call pacing disabled");
                Arc::new(Unpaced)
            }
        };
    let retry = RetryPolicy {
        max_attempts: config.retry.max_attempts.max(1),
        base_delay: Duration::from_millis(config.retry.base_delay_ms),
        max_delay: Duration::from_millis(config.retry.max_delay_ms),
    };
    let orchestrator = Arc::new(
        SearchOrchestrator::new(upstream, pacer)
            .with_retry(retry)
            .with_max_results(amadeus.max_results),
    );
    let runner = Arc::new(
        WatchRunner::new(watches.clone(), rules.clone(), results.clone(), orchestrator.clone())
            .with_search_deadline(config.scheduler.watch_deadline_secs.map(Duration::from_secs)),
    );

    // 4. Background sweep
    let mut scheduler = TokioScheduler::new();
    if config.scheduler.enabled {
        let period = Duration::from_secs(config.scheduler.interval_secs.max(1));
        let cadence = match (config.scheduler.aligned, cron_expression(period)) {
            (true, Some(_)) => Cadence::Aligned(period),
            (true, None) => {
                tracing::warn!("Interval {:?} does not divide a day, falling back to a fixed delay", period);
                Cadence::Every(period)
            }
            (false, _) => Cadence::Every(period),
        };
        let sweep = WatchSweep::new(watches.clone(), runner.clone());
        scheduler
            .schedule(cadence, Arc::new(sweep))
            .await
            .context("Failed to schedule watch sweep")?;
    } else {
        tracing::info!("Scheduler disabled, watches only run on demand");
    }

    let app_state = AppState {
        rules,
        watches,
        results,
        orchestrator,
        runner,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, waiting for scheduler");
    scheduler.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
