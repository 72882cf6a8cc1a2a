//! The service object that owns settings, the reference cache, and the
//! readiness gate for the lifetime of the process.
//!
//! [`Fieldkit::start`] kicks off settings migrations on a blocking task. Every
//! settings-backed accessor waits for them to finish first; if they fail, the
//! accessors keep returning [`Error::NotReady`](crate::error::Error::NotReady).

use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::reference::cache::ReferenceCache;
use crate::reference::ReferenceFetcher;
use crate::registry::events::EventProjectRegistry;
use crate::registry::{AbbrevTable, AbbreviationRegistry};
use crate::settings::migrations::{MigrationContext, MigrationEngine};
use crate::settings::ready::{readiness_gate, ReadinessGate};
use crate::settings::resolver::SettingsResolver;
use crate::settings::users::UserIdentity;
use crate::settings::{Settings, SettingsStore};

pub struct Fieldkit {
    settings: Settings,
    cache: Arc<ReferenceCache>,
    gate: ReadinessGate,
    init: Mutex<Option<JoinHandle<()>>>,
}

impl Fieldkit {
    /// Construct the service and start migrating `store`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        store: Arc<dyn SettingsStore>,
        fetcher: Arc<dyn ReferenceFetcher>,
        engine: MigrationEngine,
        ctx: MigrationContext,
    ) -> Self {
        let settings = Settings::new(store);
        let (opener, gate) = readiness_gate();

        let migrating = settings.clone();
        let init = tokio::spawn(async move {
            let outcome =
                tokio::task::spawn_blocking(move || engine.run(&migrating, &ctx)).await;
            match outcome {
                Ok(Ok(version)) => {
                    tracing::info!(schema_version = version, "settings migrations complete");
                    opener.open();
                }
                Ok(Err(e)) => opener.fail(e.to_string()),
                Err(e) => opener.fail(format!("migration task did not finish: {e}")),
            }
        });

        Self {
            settings,
            cache: Arc::new(ReferenceCache::new(fetcher)),
            gate,
            init: Mutex::new(Some(init)),
        }
    }

    /// Wait until startup migrations have completed.
    pub async fn ready(&self) -> Result<()> {
        self.gate.wait().await
    }

    pub fn gate(&self) -> ReadinessGate {
        self.gate.clone()
    }

    /// The reference cache. It holds no settings, so it is usable before the gate opens.
    pub fn cache(&self) -> &Arc<ReferenceCache> {
        &self.cache
    }

    pub async fn settings(&self) -> Result<Settings> {
        self.ready().await?;
        Ok(self.settings.clone())
    }

    pub async fn resolver(&self) -> Result<SettingsResolver> {
        Ok(SettingsResolver::new(self.settings().await?))
    }

    pub async fn users(&self) -> Result<UserIdentity> {
        Ok(UserIdentity::new(self.settings().await?))
    }

    pub async fn abbreviations(&self, table: AbbrevTable) -> Result<AbbreviationRegistry> {
        Ok(AbbreviationRegistry::new(
            self.settings().await?,
            self.cache.clone(),
            table,
        ))
    }

    pub async fn event_projects(&self) -> Result<EventProjectRegistry> {
        Ok(EventProjectRegistry::new(
            self.settings().await?,
            self.cache.clone(),
        ))
    }

    /// Abort startup if it is still running. Waiters then see `NotReady`.
    pub fn shutdown(&self) {
        let pending = self
            .init
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(init) = pending {
            init.abort();
        }
    }
}

impl Drop for Fieldkit {
    fn drop(&mut self) {
        self.shutdown();
    }
}
