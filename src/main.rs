use std::{future::IntoFuture, process, sync::Arc};

use libris::{
    application::{
        auth::{AuthService, TokenService},
        authors::AuthorService,
        books::BookService,
        cache::LookAsideCache,
        error::AppError,
        repos::{AuthorsRepo, BooksRepo, HealthRepo, ReviewsRepo, UsersRepo},
        reviews::ReviewService,
    },
    config,
    infra::{
        cache::build_cache_store,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, TokenBucket},
        telemetry,
    },
};
use sqlx::PgPool;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(target = "libris::migrate", "database migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    // Fail before touching the network when tokens could not be signed.
    let secret = settings
        .auth
        .signing_secret()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;
    let tokens = TokenService::new(secret, settings.auth.issuer.clone());

    let pool = connect_database(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    let repositories = Arc::new(PostgresRepositories::new(pool));

    let cache_store = build_cache_store(&settings.cache)
        .await
        .map_err(AppError::from)?;
    let cache = LookAsideCache::new(cache_store);

    let authors_repo: Arc<dyn AuthorsRepo> = repositories.clone();
    let books_repo: Arc<dyn BooksRepo> = repositories.clone();
    let reviews_repo: Arc<dyn ReviewsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let auth = Arc::new(AuthService::new(users_repo, tokens));
    if let Some(seed) = settings.admin.clone() {
        let created = auth.ensure_admin(seed).await.map_err(AppError::from)?;
        if !created {
            info!(target = "libris::auth", "administrator account already present");
        }
    } else {
        warn!(
            target = "libris::auth",
            "no administrator configured; mutating endpoints stay unreachable until one exists"
        );
    }

    let state = ApiState {
        auth,
        authors: Arc::new(AuthorService::new(authors_repo, cache.clone())),
        books: Arc::new(BookService::new(books_repo.clone(), cache.clone())),
        reviews: Arc::new(ReviewService::new(reviews_repo, books_repo, cache)),
        health: health_repo,
        rate_limiter: Arc::new(TokenBucket::new(
            settings.rate_limit.requests_per_second.get(),
            settings.rate_limit.burst.get(),
        )),
    };

    serve_http(&settings, state).await
}

async fn connect_database(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "libris::http",
        addr = %settings.server.addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    // The drain after a shutdown signal is bounded by the configured grace period.
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = async {
            shutdown_signal().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "libris::http",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; exiting"
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "libris::http", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "libris::http", "shutdown signal received");
}
