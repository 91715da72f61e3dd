//! Lazily-loaded, process-lifetime cache of per-plant resources.
//!
//! Every registered category gets one [`OnceLock`] slot when the store is
//! built. The first request for a category loads its model, class map, and
//! advice map through a [`ResourceSource`]; concurrent first requests block
//! on the same slot, so each category is loaded at most once. Later reads
//! are lock-free and return the same [`Arc`].
//!
//! Missing or unreadable files never fail a load. Each sub-resource yields a
//! `Result<_, LoadWarning>`; failures leave an absent predictor or an empty
//! map behind and are reported once to the [`DiagnosticSink`].

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use leafscan_core::{Category, CategoryRegistry, LoadWarning, PipelineError, ResourceKind};
use tracing::{debug, info};

use crate::diagnostics::DiagnosticSink;
use crate::labels::{AdviceMap, ClassMap, IndexToLabel};
use crate::predictor::{ModelLoader, Predictor};

/// Where a category's model and metadata come from.
pub trait ResourceSource: Send + Sync {
    fn load_predictor(&self, category: &Category) -> Result<Arc<dyn Predictor>, LoadWarning>;
    fn load_class_map(&self, category: &Category) -> Result<ClassMap, LoadWarning>;
    fn load_advice(&self, category: &Category) -> Result<AdviceMap, LoadWarning>;
}

/// Everything needed to classify and describe one plant's diseases.
pub struct CategoryResources {
    pub category: Category,
    /// `None` when the model artifact was missing or failed to load.
    pub predictor: Option<Arc<dyn Predictor>>,
    pub index_to_label: IndexToLabel,
    pub label_to_advice: AdviceMap,
    /// Notices produced while loading, in load order.
    pub warnings: Vec<LoadWarning>,
}

impl CategoryResources {
    /// Combine the three sub-resource outcomes, degrading failures to empty
    /// values and collecting their warnings.
    pub fn assemble(
        category: Category,
        predictor: Result<Arc<dyn Predictor>, LoadWarning>,
        class_map: Result<ClassMap, LoadWarning>,
        advice: Result<AdviceMap, LoadWarning>,
    ) -> Self {
        let mut warnings = Vec::new();

        let predictor = predictor.map_err(|w| warnings.push(w)).ok();
        let index_to_label = class_map
            .map(|m| m.invert())
            .map_err(|w| warnings.push(w))
            .unwrap_or_default();
        let label_to_advice = advice.map_err(|w| warnings.push(w)).unwrap_or_default();

        Self {
            category,
            predictor,
            index_to_label,
            label_to_advice,
            warnings,
        }
    }

    pub fn has_predictor(&self) -> bool {
        self.predictor.is_some()
    }

    /// True when the class map or advice map could not be loaded.
    pub fn degraded_metadata(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w.resource, ResourceKind::ClassMap | ResourceKind::Advice))
    }
}

impl fmt::Debug for CategoryResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryResources")
            .field("category", &self.category)
            .field("predictor", &self.predictor.is_some())
            .field("labels", &self.index_to_label.len())
            .field("advice", &self.label_to_advice.len())
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// Cache of [`CategoryResources`], one slot per registered category.
pub struct ResourceStore {
    source: Arc<dyn ResourceSource>,
    sink: Arc<dyn DiagnosticSink>,
    slots: HashMap<Category, OnceLock<Arc<CategoryResources>>>,
}

impl ResourceStore {
    pub fn new(
        registry: &CategoryRegistry,
        source: Arc<dyn ResourceSource>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let slots = registry
            .iter()
            .map(|c| (c.clone(), OnceLock::new()))
            .collect();
        Self {
            source,
            sink,
            slots,
        }
    }

    /// Resources for `category`, loading them on first access.
    pub fn get_resources(
        &self,
        category: &Category,
    ) -> Result<Arc<CategoryResources>, PipelineError> {
        let slot = self
            .slots
            .get(category)
            .ok_or_else(|| PipelineError::InvalidCategory {
                category: category.to_string(),
            })?;

        if let Some(resources) = slot.get() {
            debug!(category = %category, "resource cache hit");
            return Ok(Arc::clone(resources));
        }

        let resources = slot.get_or_init(|| Arc::new(self.load(category)));
        Ok(Arc::clone(resources))
    }

    /// Load every registered category now. Returns how many have a model.
    pub fn preload_all(&self) -> usize {
        let mut with_model = 0;
        for category in self.slots.keys() {
            if let Ok(resources) = self.get_resources(category)
                && resources.has_predictor()
            {
                with_model += 1;
            }
        }
        info!(
            categories = self.slots.len(),
            with_model, "preloaded plant resources"
        );
        with_model
    }

    pub fn is_loaded(&self, category: &Category) -> bool {
        self.slots.get(category).is_some_and(|s| s.get().is_some())
    }

    fn load(&self, category: &Category) -> CategoryResources {
        let resources = CategoryResources::assemble(
            category.clone(),
            self.source.load_predictor(category),
            self.source.load_class_map(category),
            self.source.load_advice(category),
        );

        for warning in &resources.warnings {
            self.sink.notice(warning);
        }

        info!(
            category = %category,
            model = resources.has_predictor(),
            labels = resources.index_to_label.len(),
            advice = resources.label_to_advice.len(),
            "loaded plant resources"
        );
        resources
    }
}

/// Reads resources from a flat model directory:
///
/// - `<dir>/<plant>.<ext>` (model artifact, `onnx` by default)
/// - `<dir>/<plant>_class_map.json`
/// - `<dir>/<plant>_prevention.json`
pub struct FsSource {
    dir: PathBuf,
    extension: String,
    loader: Arc<dyn ModelLoader>,
}

impl FsSource {
    pub fn new(dir: impl Into<PathBuf>, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            dir: dir.into(),
            extension: "onnx".to_string(),
            loader,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn model_path(&self, category: &Category) -> PathBuf {
        self.dir.join(format!("{category}.{}", self.extension))
    }

    pub fn class_map_path(&self, category: &Category) -> PathBuf {
        self.dir.join(format!("{category}_class_map.json"))
    }

    pub fn advice_path(&self, category: &Category) -> PathBuf {
        self.dir.join(format!("{category}_prevention.json"))
    }
}

impl ResourceSource for FsSource {
    fn load_predictor(&self, category: &Category) -> Result<Arc<dyn Predictor>, LoadWarning> {
        let path = self.model_path(category);
        if !path.exists() {
            return Err(LoadWarning::missing(category, ResourceKind::Model, path));
        }
        self.loader
            .load(&path)
            .map_err(|e| LoadWarning::invalid(category, ResourceKind::Model, path, format!("{e:#}")))
    }

    fn load_class_map(&self, category: &Category) -> Result<ClassMap, LoadWarning> {
        let path = self.class_map_path(category);
        let text = read_resource(category, ResourceKind::ClassMap, &path)?;
        ClassMap::from_json_str(&text)
            .map_err(|e| LoadWarning::invalid(category, ResourceKind::ClassMap, path, e.to_string()))
    }

    fn load_advice(&self, category: &Category) -> Result<AdviceMap, LoadWarning> {
        let path = self.advice_path(category);
        let text = read_resource(category, ResourceKind::Advice, &path)?;
        AdviceMap::from_json_str(&text)
            .map_err(|e| LoadWarning::invalid(category, ResourceKind::Advice, path, e.to_string()))
    }
}

fn read_resource(
    category: &Category,
    resource: ResourceKind,
    path: &Path,
) -> Result<String, LoadWarning> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadWarning::missing(category, resource, path.to_path_buf()),
        _ => LoadWarning::invalid(category, resource, path.to_path_buf(), e.to_string()),
    })
}
