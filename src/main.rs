//! mint-watch-gateway server entry point.
//!
//! Wires the feed client, notifier, watch service, Telegram poller, audit
//! trail and the operator HTTP/WebSocket server.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use mint_watch_gateway::api;
use mint_watch_gateway::app_state::AppState;
use mint_watch_gateway::config::WatchConfig;
use mint_watch_gateway::domain::{EventBus, SignatureSet, WatchRegistry};
use mint_watch_gateway::feed::FeedClient;
use mint_watch_gateway::feed::websocket::WsFeedClient;
use mint_watch_gateway::notify::{LogSink, MessageFormatter, NotificationSink, Notifier};
use mint_watch_gateway::persistence::{self, AuditSink, FileAuditLog, PostgresAuditLog};
use mint_watch_gateway::service::WatchService;
use mint_watch_gateway::telegram::{TelegramClient, TelegramPoller};
use mint_watch_gateway::trigger::TriggerClassifier;
use mint_watch_gateway::ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; LOG_FORMAT=json switches to structured output
    let subscriber = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // Load configuration
    let config = WatchConfig::from_env().map_err(|e| anyhow::anyhow!("configuration: {e}"))?;
    tracing::info!(
        addr = %config.listen_addr,
        rules = config.rules.len(),
        heartbeat_secs = config.heartbeat_interval.as_secs(),
        close_policy = ?config.feed_close_policy,
        "starting mint-watch-gateway"
    );
    if config.rules.is_empty() {
        tracing::warn!("rule table is empty; no message will arm a watch");
    }

    // Build domain layer
    let registry = Arc::new(WatchRegistry::new());
    let signatures = Arc::new(SignatureSet::new(config.signature_cache_capacity));
    let event_bus = EventBus::new(config.event_bus_capacity);
    let classifier = Arc::new(TriggerClassifier::new(config.rules.clone()).context("rule table")?);

    // Outbound: Telegram when a token is configured, logs otherwise
    let telegram = match &config.bot_token {
        Some(token) => Some(Arc::new(
            TelegramClient::new(&config.telegram_api_url, token, config.telegram_poll_timeout_secs)
                .context("telegram client")?,
        )),
        None => {
            tracing::warn!("BOT_TOKEN not set; notifications are logged and polling is off");
            None
        }
    };
    let sink: Arc<dyn NotificationSink> = match &telegram {
        Some(client) => Arc::clone(client) as Arc<dyn NotificationSink>,
        None => Arc::new(LogSink),
    };
    let (notifier, _delivery) = Notifier::spawn(sink, MessageFormatter::new(&config.explorer_url));

    let feed: Arc<dyn FeedClient> = Arc::new(WsFeedClient::new(
        config.feed_ws_url.clone(),
        config.subscribe_options(),
        config.feed_queue_capacity,
    ));

    // Build service layer
    let watch_service = Arc::new(WatchService::new(
        registry,
        signatures,
        classifier,
        feed,
        notifier,
        event_bus.clone(),
        config.watcher_settings(),
    ));

    // Audit trail
    if config.audit_enabled {
        let audit: Arc<dyn AuditSink> = match &config.database_url {
            Some(url) => {
                tracing::info!("audit trail: postgres");
                Arc::new(
                    PostgresAuditLog::connect(url, config.database_max_connections)
                        .await
                        .context("audit database")?,
                )
            }
            None => {
                tracing::info!(path = %config.audit_log_path.display(), "audit trail: file");
                Arc::new(
                    FileAuditLog::open(&config.audit_log_path)
                        .await
                        .context("audit log file")?,
                )
            }
        };
        drop(persistence::spawn_audit(&event_bus, audit));
    }

    // Inbound: Telegram long polling
    if let Some(client) = telegram {
        let poller = TelegramPoller::new(
            client,
            Arc::clone(&watch_service),
            config.operator_chat_id,
        );
        drop(tokio::spawn(poller.run()));
    }

    // Build application state
    let app_state = AppState::new(Arc::clone(&watch_service));

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .merge(ws::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let cancelled = watch_service.cancel_all().await;
    tracing::info!(cancelled, "shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
