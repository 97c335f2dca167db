use crate::workflow::catalog::{builtin_pipelines, default_settings};
use pathocore::api::{ActiveSettings, MetricsSnapshot, PipelineList};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type SharedModel = Arc<RwLock<RegistryModel>>;

pub fn shared(model: RegistryModel) -> SharedModel {
    Arc::new(RwLock::new(model))
}

pub fn read(model: &SharedModel) -> RwLockReadGuard<'_, RegistryModel> {
    model.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write(model: &SharedModel) -> RwLockWriteGuard<'_, RegistryModel> {
    model.write().unwrap_or_else(PoisonError::into_inner)
}

/// Rejection for settings naming a pipeline that is not registered.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownPipeline(pub String);

impl fmt::Display for UnknownPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline '{}' not found", self.0)
    }
}

/// Everything the registry serves: catalog, active settings and the
/// metrics of the most recent frame.
#[derive(Debug, Clone)]
pub struct RegistryModel {
    catalog: PipelineList,
    active: ActiveSettings,
    latest: Option<MetricsSnapshot>,
}

impl RegistryModel {
    /// Starts with `initial` active, or the first registered pipeline when
    /// `initial` is unknown.
    pub fn new(initial: &str) -> Self {
        let catalog = builtin_pipelines();
        let active = default_settings(&catalog, initial)
            .or_else(|| {
                let first = catalog.pipelines.first()?;
                default_settings(&catalog, &first.name)
            })
            .unwrap_or_default();
        Self {
            catalog,
            active,
            latest: None,
        }
    }

    pub fn catalog(&self) -> &PipelineList {
        &self.catalog
    }

    pub fn active(&self) -> &ActiveSettings {
        &self.active
    }

    /// Replaces the active settings as submitted; parameters are stored
    /// verbatim, without merging defaults.
    pub fn apply(&mut self, settings: ActiveSettings) -> Result<ActiveSettings, UnknownPipeline> {
        if self.catalog.find(&settings.name).is_none() {
            return Err(UnknownPipeline(settings.name));
        }
        self.active = settings;
        Ok(self.active.clone())
    }

    pub fn record(&mut self, snapshot: MetricsSnapshot) {
        self.latest = Some(snapshot);
    }

    /// Latest metrics, or the empty snapshot before the first frame.
    pub fn latest(&self) -> MetricsSnapshot {
        self.latest.clone().unwrap_or_default()
    }
}
