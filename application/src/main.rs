use std::{
    future::{self, IntoFuture as _},
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, config, graphql, Args, Config};
use axum::{
    extract::MatchedPath,
    routing::{get, on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use futures::TryFutureExt as _;
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// Levels written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(log_filter(false))),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(log_filter(true))),
        )
        .init();

    _ = start().await;
}

/// Returns a filter passing spans and either the [`STDERR_LEVELS`] events or
/// all the other ones, not exceeding the configured [`LOG_LEVEL`].
fn log_filter(stderr: bool) -> impl Fn(&log::Metadata<'_>) -> bool {
    move |meta| {
        let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
        meta.is_span()
            || STDERR_LEVELS.contains(meta.level()) == stderr
                && max >= *meta.level()
    }
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    postgres.migrate(&migrations::runner()).await.map_err(|e| {
        log::error!("failed to run database migrations: {e}");
    })?;

    let service = Service::new(service.into(), postgres);
    let schema = api::Schema::new(
        api::Query,
        api::Mutation,
        juniper::EmptySubscription::new(),
    );

    let mut app = Router::new().route(
        "/graphql",
        on(MethodFilter::GET.or(MethodFilter::POST), graphql),
    );
    if server.graphiql {
        app = app.route(
            "/graphiql",
            get(juniper_axum::graphiql("/graphql", None)),
        );
    }
    let app = app
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(service))
        .layer(cors(&server.cors)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|r: &http::Request<_>| {
                    tracing::info_span!(
                        "HTTP request",
                        http.client_ip = InsecureClientIp::from(
                            r.headers(),
                            r.extensions()
                        )
                            .map(|ip| ip.0.to_string())
                            .ok(),
                        http.method = r.method().as_str(),
                        http.route = r
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str),
                        http.target = r
                            .uri()
                            .path_and_query()
                            .map(http::uri::PathAndQuery::as_str),
                        http.user_agent = r
                            .headers()
                            .get(http::header::USER_AGENT)
                            .and_then(|h| h.to_str().ok()),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_response(
                    |r: &http::Response<_>,
                     dur: time::Duration,
                     span: &tracing::Span| {
                        let status = r.status();
                        _ = span.record(
                            "http.status_code",
                            tracing::field::display(status.as_u16()),
                        );

                        let duration = format!("{}ms", dur.as_millis());
                        if status.is_server_error() {
                            tracing::error!(duration = %duration);
                        } else if status.is_client_error() {
                            tracing::warn!(duration = %duration);
                        } else {
                            tracing::info!(duration = %duration);
                        }
                    },
                ),
        );

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(addr.as_str()).await.map_err(|e| {
        log::error!("failed to listen on `{addr}`: {e}");
    })?;

    log::info!("listening on `{addr}`");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future()
        .map_err(|e| log::error!("webserver failed: {e}"))
        .await?;

    log::info!("webserver stopped");
    Ok(())
}

/// Builds a [`CorsLayer`] allowing the configured origins to call the
/// GraphQL API.
fn cors(conf: &config::Cors) -> Result<CorsLayer, ()> {
    let mut cors = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
        ]);
    for origin in &conf.origins {
        let origin = origin.parse::<http::HeaderValue>().map_err(|e| {
            log::error!("`{origin}` is not a valid CORS origin: {e}");
        })?;
        cors = cors.allow_origin(origin);
    }
    Ok(cors)
}

/// Resolves once the process is asked to stop with `Ctrl+C`.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutdown signal received, draining connections"),
        Err(e) => {
            log::error!("failed to listen for shutdown signal: {e}");
            future::pending::<()>().await;
        }
    }
}
