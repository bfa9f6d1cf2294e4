use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::rest;
use crate::GatewayState;

#[derive(Clone)]
pub struct ReelApp {
    pub state: GatewayState,
    pub router: Router<()>,
}

impl ReelApp {
    pub fn new(state: GatewayState) -> Self {
        let router = rest::media_router(state.clone());
        Self { state, router }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    /// Mount a GET handler at `path`.
    pub fn service<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Final router with request ids and HTTP tracing applied.
    pub fn into_router(self) -> Router {
        self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// Serve until Ctrl-C, then let in-flight requests drain.
    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

pub fn reel(state: GatewayState) -> ReelApp {
    ReelApp::new(state)
}
