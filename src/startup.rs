//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

use crate::application::services::Dispatcher;
use crate::config::Settings;
use crate::domain::{AudienceResolver, ProfileStore};
use crate::infrastructure::profile_store;
use crate::infrastructure::realtime::ConnectionRegistry;
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{cors, logging};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub profile_store: Arc<dyn ProfileStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings, profile_store: Arc<dyn ProfileStore>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let resolver = AudienceResolver::with_timeout(
            Arc::clone(&profile_store),
            settings.profile_store.timeout(),
        );
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), resolver));

        Self {
            registry,
            dispatcher,
            profile_store,
            settings: Arc::new(settings),
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    /// Build the application from settings, connecting the configured store
    pub async fn build(settings: Settings) -> Result<Self> {
        let store = profile_store::create_profile_store(&settings.profile_store).await?;
        tracing::info!(
            backend = ?settings.profile_store.backend,
            "Profile store ready"
        );

        Self::build_with_store(settings, store).await
    }

    /// Build the application over an existing profile store
    pub async fn build_with_store(
        settings: Settings,
        store: Arc<dyn ProfileStore>,
    ) -> Result<Self> {
        handlers::health::init_server_start();

        let addr = settings.server.socket_addr()?;
        let state = AppState::new(settings, store);

        // Build router with middleware
        let router = routes::create_router(state.clone()).layer(
            ServiceBuilder::new()
                .layer(logging::create_trace_layer())
                .layer(cors::create_cors_layer(&state.settings.cors)),
        );

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            queue_capacity = state.settings.websocket.outbound_queue_capacity,
            overflow_policy = %state.settings.websocket.overflow_policy,
            "Listening"
        );

        Ok(Self {
            listener,
            router,
            state,
        })
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
