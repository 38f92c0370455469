use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use crate::{account, portfolio, trading};
use engine::{Engine, QuoteProvider};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub quotes: Arc<dyn QuoteProvider>,
}

/// Resolves Basic credentials to an account and stores it as a request
/// extension, so every handler gets an explicit identity.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let account = state
        .engine
        .verify_credentials(auth_header.username(), auth_header.password())
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let authed = Router::new()
        .route("/quote", post(trading::quote))
        .route("/buy", post(trading::buy))
        .route("/sell", post(trading::sell))
        .route("/balance", get(portfolio::balance))
        .route("/holdings", get(portfolio::holdings))
        .route("/history", get(portfolio::history))
        .route("/password", post(account::change_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/register", post(account::register))
        .merge(authed)
        .with_state(state)
}

pub async fn run(engine: Engine, quotes: Arc<dyn QuoteProvider>) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, quotes, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    quotes: Arc<dyn QuoteProvider>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        quotes,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    quotes: Arc<dyn QuoteProvider>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, quotes, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
