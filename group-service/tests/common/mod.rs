#![allow(dead_code)]

use group_service::config::{
    AuditConfig, DirectoryConfig, DirectoryMode, Environment, GroupServiceConfig, SettingsConfig,
};
use group_service::models::{Attribute, AuthStatus, Ticket, UserRecord, UserStatus};
use group_service::services::providers::{
    MockEventSink, MockGroupPool, MockIdentitySource, MockSetting, MockSettingsStore,
};
use group_service::services::{
    AuditGate, DirectoryModeResolver, GroupDirectory, MembershipReconciler,
};
use group_service::{build_router, AppState};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;

pub const POOL_ID: &str = "pool-test";
pub const SERVICE_NAME: &str = "group-service";

pub fn admin_ticket() -> Ticket {
    Ticket::new(AuthStatus::Authorized, "", "admin-1", "Admin")
}

pub fn user_ticket(user_id: &str) -> Ticket {
    Ticket::new(AuthStatus::Authorized, "", user_id, "User")
}

pub fn invalid_ticket(reason: &str) -> Ticket {
    Ticket::new(AuthStatus::Invalid, reason, "", "")
}

pub fn user_record(username: &str, attributes: &[(&str, &str)]) -> UserRecord {
    UserRecord {
        username: username.to_string(),
        enabled: true,
        status: UserStatus::Confirmed,
        attributes: attributes
            .iter()
            .map(|(name, value)| Attribute::new(*name, *value))
            .collect(),
    }
}

/// A directory wired to in-memory collaborators.
pub struct TestDirectory {
    pub directory: GroupDirectory,
    pub reconciler: MembershipReconciler,
    pub pool: Arc<MockGroupPool>,
    pub identity: Arc<MockIdentitySource>,
    pub settings: Arc<MockSettingsStore>,
    pub sink: Arc<MockEventSink>,
    pub mode: DirectoryMode,
}

impl TestDirectory {
    pub fn managed(pool: MockGroupPool) -> Self {
        Self::build(
            Arc::new(pool),
            Arc::new(MockIdentitySource::new(POOL_ID)),
            DirectoryMode::Managed,
            MockEventSink::new(),
        )
    }

    pub fn federated(identity: MockIdentitySource) -> Self {
        Self::build(
            Arc::new(MockGroupPool::new(POOL_ID)),
            Arc::new(identity),
            DirectoryMode::Federated,
            MockEventSink::new(),
        )
    }

    pub fn managed_with_sink(pool: MockGroupPool, sink: MockEventSink) -> Self {
        Self::build(
            Arc::new(pool),
            Arc::new(MockIdentitySource::new(POOL_ID)),
            DirectoryMode::Managed,
            sink,
        )
    }

    fn build(
        pool: Arc<MockGroupPool>,
        identity: Arc<MockIdentitySource>,
        mode: DirectoryMode,
        sink: MockEventSink,
    ) -> Self {
        let settings = Arc::new(MockSettingsStore::new(MockSetting::Enabled));
        let sink = Arc::new(sink);
        let audit = AuditGate::new(settings.clone(), sink.clone(), SERVICE_NAME);
        let resolver = match mode {
            DirectoryMode::Managed => DirectoryModeResolver::managed(pool.clone()),
            DirectoryMode::Federated => DirectoryModeResolver::federated(identity.clone()),
        };

        Self {
            directory: GroupDirectory::new(resolver.clone(), audit.clone()),
            reconciler: MembershipReconciler::new(resolver, audit),
            pool,
            identity,
            settings,
            sink,
            mode,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            config: test_config(self.mode),
            directory: self.directory.clone(),
            reconciler: self.reconciler.clone(),
        }
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.state())
    }

    /// Audit events are dispatched in the background; wait for `count` of them.
    pub async fn wait_for_dispatches(&self, count: u64) -> bool {
        for _ in 0..100 {
            if self.sink.dispatch_count() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    /// Gives background audit tasks a chance to run.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

pub fn test_config(mode: DirectoryMode) -> GroupServiceConfig {
    GroupServiceConfig {
        common: CoreConfig {
            port: 0,
            log_level: "debug".to_string(),
        },
        environment: Environment::Dev,
        service_name: SERVICE_NAME.to_string(),
        directory: DirectoryConfig {
            mode,
            pool_id: POOL_ID.to_string(),
            endpoint: "http://127.0.0.1:9229".to_string(),
        },
        settings: SettingsConfig {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database: "group_test".to_string(),
            collection: "settings".to_string(),
            setting_id: "app-config".to_string(),
        },
        audit: AuditConfig {
            sink_endpoint: "http://127.0.0.1:9300/events".to_string(),
        },
        otlp_endpoint: None,
    }
}
