//! Application startup and lifecycle management.

use crate::config::{DirectoryMode, GroupServiceConfig};
use crate::services::providers::{
    HttpEventSink, HttpGroupPool, HttpIdentitySource, MongoSettingsStore,
};
use crate::services::{AuditGate, DirectoryModeResolver, GroupDirectory, MembershipReconciler};
use crate::{build_router, AppState};
use service_core::error::AppError;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: GroupServiceConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                AppError::InternalError(e.into())
            })?;

        let directory_config = &config.directory;
        let resolver = match directory_config.mode {
            DirectoryMode::Managed => {
                let pool = HttpGroupPool::new(
                    client.clone(),
                    &directory_config.endpoint,
                    directory_config.pool_id.clone(),
                )
                .map_err(|e| AppError::ConfigError(e.into()))?;
                DirectoryModeResolver::managed(Arc::new(pool))
            }
            DirectoryMode::Federated => {
                let identity = HttpIdentitySource::new(
                    client.clone(),
                    &directory_config.endpoint,
                    directory_config.pool_id.clone(),
                )
                .map_err(|e| AppError::ConfigError(e.into()))?;
                DirectoryModeResolver::federated(Arc::new(identity))
            }
        };
        tracing::info!(
            mode = %directory_config.mode,
            pool_id = %directory_config.pool_id,
            "Directory backend selected"
        );

        let settings = MongoSettingsStore::connect(
            &config.settings.mongodb_uri,
            &config.settings.database,
            &config.settings.collection,
            config.settings.setting_id.clone(),
        )
        .await?;
        let sink = HttpEventSink::new(client, config.audit.sink_endpoint.clone());
        let audit = AuditGate::new(
            Arc::new(settings),
            Arc::new(sink),
            config.service_name.clone(),
        );

        let state = AppState {
            config: config.clone(),
            directory: GroupDirectory::new(resolver.clone(), audit.clone()),
            reconciler: MembershipReconciler::new(resolver, audit),
        };

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Group service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}
