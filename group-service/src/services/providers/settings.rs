use super::{SettingsError, SettingsStore};
use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    Client as MongoClient, Collection,
};
use service_core::error::AppError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Reads `setting.audit_logging` from the settings document keyed by
/// `setting_id`. Every call is a fresh point lookup.
#[derive(Clone)]
pub struct MongoSettingsStore {
    settings: Collection<Document>,
    setting_id: String,
}

impl MongoSettingsStore {
    pub async fn connect(
        uri: &str,
        database: &str,
        collection: &str,
        setting_id: impl Into<String>,
    ) -> Result<Self, AppError> {
        tracing::info!(database = %database, collection = %collection, "Connecting settings store");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB settings store: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        Ok(Self::new(
            client.database(database).collection(collection),
            setting_id,
        ))
    }

    pub fn new(settings: Collection<Document>, setting_id: impl Into<String>) -> Self {
        Self {
            settings,
            setting_id: setting_id.into(),
        }
    }
}

/// Extracts the flag from a settings record. A record without the flag is
/// treated the same as a missing record.
fn audit_flag(record: &Document) -> Result<Option<bool>, SettingsError> {
    let setting = match record.get_document("setting") {
        Ok(setting) => setting,
        Err(mongodb::bson::document::ValueAccessError::NotPresent) => return Ok(None),
        Err(e) => return Err(SettingsError::Malformed(format!("setting: {}", e))),
    };

    match setting.get_bool("audit_logging") {
        Ok(enabled) => Ok(Some(enabled)),
        Err(mongodb::bson::document::ValueAccessError::NotPresent) => Ok(None),
        Err(e) => Err(SettingsError::Malformed(format!(
            "setting.audit_logging: {}",
            e
        ))),
    }
}

#[async_trait]
impl SettingsStore for MongoSettingsStore {
    async fn audit_logging_enabled(&self) -> Result<Option<bool>, SettingsError> {
        tracing::debug!(setting_id = %self.setting_id, "Retrieving app-config settings");
        let record = self
            .settings
            .find_one(doc! { "setting_id": &self.setting_id }, None)
            .await
            .map_err(|e| SettingsError::Lookup(e.to_string()))?;

        match record {
            Some(record) => audit_flag(&record),
            None => Ok(None),
        }
    }
}

/// What the mock settings store answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSetting {
    Enabled,
    Disabled,
    Absent,
    Failing,
}

pub struct MockSettingsStore {
    setting: Mutex<MockSetting>,
    lookup_count: AtomicU64,
}

impl MockSettingsStore {
    pub fn new(setting: MockSetting) -> Self {
        Self {
            setting: Mutex::new(setting),
            lookup_count: AtomicU64::new(0),
        }
    }

    pub fn set(&self, setting: MockSetting) {
        *self
            .setting
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = setting;
    }

    pub fn lookup_count(&self) -> u64 {
        self.lookup_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for MockSettingsStore {
    async fn audit_logging_enabled(&self) -> Result<Option<bool>, SettingsError> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        let setting = *self
            .setting
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match setting {
            MockSetting::Enabled => Ok(Some(true)),
            MockSetting::Disabled => Ok(Some(false)),
            MockSetting::Absent => Ok(None),
            MockSetting::Failing => Err(SettingsError::Lookup("mock settings store down".to_string())),
        }
    }
}
