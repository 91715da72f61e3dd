use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use image::DynamicImage;
use leafscan_ai::{
    CategoryResources, DiagnosticSink, InferenceDispatcher, ResourceSource, ResourceStore,
};
use leafscan_core::{
    Category, CategoryRegistry, EnrichedResult, ImageSize, PipelineError, Prediction, Settings,
    display_label, preprocess,
};
use leafscan_translate::TranslationService;
use tracing::info;

/// Entry point for the presentation layer.
///
/// Owns the resource cache for its whole lifetime; dropping the pipeline
/// drops every loaded model.
pub struct Pipeline {
    registry: CategoryRegistry,
    dispatcher: InferenceDispatcher,
    translation: TranslationService,
    image_size: ImageSize,
}

impl Pipeline {
    pub fn new(
        registry: CategoryRegistry,
        dispatcher: InferenceDispatcher,
        translation: TranslationService,
        image_size: ImageSize,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            translation,
            image_size,
        }
    }

    /// Wire a pipeline from settings and an explicit resource source.
    pub fn from_settings(
        settings: &Settings,
        source: Arc<dyn ResourceSource>,
        sink: Arc<dyn DiagnosticSink>,
        translation: TranslationService,
    ) -> Self {
        let registry = settings.registry();
        let store = Arc::new(ResourceStore::new(&registry, source, sink));
        let dispatcher = InferenceDispatcher::new(store)
            .with_low_confidence_threshold(settings.low_confidence_threshold);
        Self::new(registry, dispatcher, translation, settings.image_size)
    }

    /// Open ONNX models from `settings.model_dir`.
    #[cfg(feature = "onnx")]
    pub fn open(settings: &Settings, sink: Arc<dyn DiagnosticSink>) -> anyhow::Result<Self> {
        use leafscan_ai::{FsSource, OnnxLoader};

        settings.validate()?;
        let source = FsSource::new(&settings.model_dir, Arc::new(OnnxLoader))
            .with_extension(&settings.model_extension);
        let translation = crate::translation_service(settings)?;
        info!(model_dir = %settings.model_dir.display(), "opened model directory");
        Ok(Self::from_settings(settings, Arc::new(source), sink, translation))
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        self.dispatcher.store()
    }

    /// Detect the disease on `image` using the model for `category`.
    ///
    /// The category is checked before anything is loaded. A missing model
    /// fails the request; missing metadata or a failed translation only
    /// degrades the text of the result.
    pub async fn run(
        &self,
        category: &str,
        image: &DynamicImage,
        target_language: &str,
    ) -> Result<EnrichedResult, PipelineError> {
        let category = self.registry.resolve(category)?;
        self.detect(category, image.clone(), target_language).await
    }

    /// Decode an image file and [`run`](Self::run) it.
    pub async fn run_path(
        &self,
        category: &str,
        path: &Path,
        target_language: &str,
    ) -> Result<EnrichedResult, PipelineError> {
        let category = self.registry.resolve(category)?;

        let owned = path.to_path_buf();
        let image = tokio::task::spawn_blocking(move || {
            image::open(&owned)
                .map_err(|e| PipelineError::Image(format!("{}: {e}", owned.display())))
        })
        .await
        .map_err(|e| PipelineError::Image(format!("{}: decode task failed: {e}", path.display())))??;

        self.detect(category, image, target_language).await
    }

    /// Load, preprocess and classify on the blocking pool, then enrich.
    ///
    /// Model loading and ONNX sessions block, so requests for different
    /// categories only overlap when they run off the async workers.
    async fn detect(
        &self,
        category: Category,
        image: DynamicImage,
        target_language: &str,
    ) -> Result<EnrichedResult, PipelineError> {
        let dispatcher = self.dispatcher.clone();
        let size = self.image_size;
        let task_category = category.clone();

        let (resources, prediction) = tokio::task::spawn_blocking(move || {
            let resources = dispatcher.store().get_resources(&task_category)?;
            let input = preprocess(&image, size);
            let prediction = dispatcher.classify_with(&resources, &input)?;
            Ok::<_, PipelineError>((resources, prediction))
        })
        .await
        .map_err(|e| PipelineError::Inference {
            category,
            reason: format!("inference task failed: {e}"),
        })??;

        Ok(self.enrich(&resources, prediction, target_language).await)
    }

    async fn enrich(
        &self,
        resources: &CategoryResources,
        prediction: Prediction,
        target_language: &str,
    ) -> EnrichedResult {
        let display = display_label(&prediction.label);
        let advice = resources
            .label_to_advice
            .advice_or_default(&prediction.label)
            .to_string();

        // Independent: one failing leaves the other intact.
        let (translated_label, translated_advice) = tokio::join!(
            self.translation
                .translate_or_original(&display, target_language),
            self.translation
                .translate_or_original(&advice, target_language),
        );

        let probabilities = resources
            .index_to_label
            .class_scores(&prediction.raw_scores);

        info!(
            category = %resources.category,
            label = %prediction.label,
            confidence = prediction.confidence,
            low_confidence = prediction.low_confidence,
            target_lang = target_language,
            "detection complete"
        );

        EnrichedResult {
            category: resources.category.clone(),
            display_label: display,
            advice,
            translated_label,
            translated_advice,
            target_language: target_language.to_string(),
            degraded_metadata: resources.degraded_metadata(),
            probabilities,
            prediction,
            predicted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use leafscan_ai::{AdviceMap, ClassMap, Predictor, RecordingSink};
    use leafscan_core::{InputTensor, LoadWarning, ResourceKind};
    use leafscan_translate::{TranslateError, Translator};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    struct FixedPredictor {
        scores: Vec<f32>,
        delay: Duration,
        seen_shapes: Arc<Mutex<Vec<[usize; 4]>>>,
    }

    impl Predictor for FixedPredictor {
        fn infer(&self, input: &InputTensor) -> anyhow::Result<Vec<f32>> {
            std::thread::sleep(self.delay);
            self.seen_shapes.lock().unwrap().push(input.shape);
            Ok(self.scores.clone())
        }
    }

    /// "apple" has everything, "tomato" has no model, "corn" has a model but
    /// no metadata.
    struct TestSource {
        scores: Vec<f32>,
        inference_delay: Duration,
        loads: AtomicUsize,
        seen_shapes: Arc<Mutex<Vec<[usize; 4]>>>,
    }

    impl TestSource {
        fn new(scores: Vec<f32>) -> Self {
            Self {
                scores,
                inference_delay: Duration::ZERO,
                loads: AtomicUsize::new(0),
                seen_shapes: Arc::default(),
            }
        }

        fn with_inference_delay(mut self, delay: Duration) -> Self {
            self.inference_delay = delay;
            self
        }
    }

    impl ResourceSource for TestSource {
        fn load_predictor(&self, category: &Category) -> Result<Arc<dyn Predictor>, LoadWarning> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if category.as_str() == "tomato" {
                return Err(LoadWarning::missing(
                    category,
                    ResourceKind::Model,
                    PathBuf::from("models/tomato.onnx"),
                ));
            }
            Ok(Arc::new(FixedPredictor {
                scores: self.scores.clone(),
                delay: self.inference_delay,
                seen_shapes: self.seen_shapes.clone(),
            }))
        }

        fn load_class_map(&self, category: &Category) -> Result<ClassMap, LoadWarning> {
            if category.as_str() == "corn" {
                return Err(LoadWarning::missing(
                    category,
                    ResourceKind::ClassMap,
                    PathBuf::from("models/corn_class_map.json"),
                ));
            }
            Ok(ClassMap::from_pairs([
                ("healthy", 0),
                ("Leaf_rust", 1),
                ("scab", 2),
            ]))
        }

        fn load_advice(&self, category: &Category) -> Result<AdviceMap, LoadWarning> {
            if category.as_str() == "corn" {
                return Err(LoadWarning::missing(
                    category,
                    ResourceKind::Advice,
                    PathBuf::from("models/corn_prevention.json"),
                ));
            }
            Ok(AdviceMap::from_pairs([
                ("Leaf_rust", "Apply a copper fungicide."),
                ("scab", "Rake fallen leaves."),
            ]))
        }
    }

    /// Upper-cases text, except text containing "fungicide" which fails.
    struct PickyTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for PickyTranslator {
        async fn translate(
            &self,
            text: &str,
            _source: &str,
            _target: &str,
        ) -> Result<String, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("fungicide") {
                return Err(TranslateError::Server {
                    status: 503,
                    body: "quota exceeded".into(),
                });
            }
            Ok(text.to_uppercase())
        }
    }

    struct DownTranslator;

    #[async_trait]
    impl Translator for DownTranslator {
        async fn translate(
            &self,
            _text: &str,
            _source: &str,
            _target: &str,
        ) -> Result<String, TranslateError> {
            Err(TranslateError::Malformed("connection reset".into()))
        }
    }

    struct Harness {
        pipeline: Pipeline,
        source: Arc<TestSource>,
        sink: Arc<RecordingSink>,
    }

    fn harness(scores: Vec<f32>, translator: Arc<dyn Translator>) -> Harness {
        harness_with(TestSource::new(scores), translator)
    }

    fn harness_with(source: TestSource, translator: Arc<dyn Translator>) -> Harness {
        let settings = Settings {
            categories: vec!["apple".into(), "tomato".into(), "corn".into()],
            image_size: ImageSize {
                width: 16,
                height: 16,
            },
            ..Settings::default()
        };
        let source = Arc::new(source);
        let sink = Arc::new(RecordingSink::new());
        let translation = TranslationService::new(translator, "en", Duration::from_secs(1));
        let pipeline = Pipeline::from_settings(&settings, source.clone(), sink.clone(), translation);
        Harness {
            pipeline,
            source,
            sink,
        }
    }

    fn picky() -> Arc<PickyTranslator> {
        Arc::new(PickyTranslator {
            calls: AtomicUsize::new(0),
        })
    }

    fn leaf() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([40, 160, 60])))
    }

    #[tokio::test]
    async fn unknown_category_rejected_before_loading() {
        let h = harness(vec![0.1, 0.7, 0.2], picky());
        let err = h.pipeline.run("banana", &leaf(), "en").await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidCategory { ref category } if category == "banana"));
        assert_eq!(h.source.loads.load(Ordering::SeqCst), 0);
        assert!(h.source.seen_shapes.lock().unwrap().is_empty());
        assert!(!h.pipeline.store().is_loaded(&Category::new("apple")));
    }

    #[tokio::test]
    async fn full_detection_in_source_language() {
        let translator = picky();
        let h = harness(vec![0.1, 0.7, 0.2], translator.clone());
        let result = h.pipeline.run("Apple", &leaf(), "en").await.unwrap();

        assert_eq!(result.category.as_str(), "apple");
        assert_eq!(result.prediction.label, "Leaf_rust");
        assert_eq!(result.prediction.confidence, 0.7);
        assert!(!result.prediction.low_confidence);
        assert_eq!(result.display_label, "Leaf rust");
        assert_eq!(result.advice, "Apply a copper fungicide.");
        assert_eq!(result.translated_label, "Leaf rust");
        assert_eq!(result.translated_advice, "Apply a copper fungicide.");
        assert!(!result.degraded_metadata);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);

        let shapes = h.source.seen_shapes.lock().unwrap();
        assert_eq!(shapes.as_slice(), &[[1, 16, 16, 3]]);
    }

    #[tokio::test]
    async fn translations_are_independent() {
        let h = harness(vec![0.1, 0.7, 0.2], picky());
        let result = h.pipeline.run("apple", &leaf(), "hi").await.unwrap();

        // Label translated; advice translation failed and fell back.
        assert_eq!(result.translated_label, "LEAF RUST");
        assert_eq!(result.translated_advice, "Apply a copper fungicide.");
        assert_eq!(result.target_language, "hi");
    }

    #[tokio::test]
    async fn translation_outage_keeps_original_text() {
        let h = harness(vec![0.8, 0.1, 0.1], Arc::new(DownTranslator));
        let result = h.pipeline.run("apple", &leaf(), "fr").await.unwrap();

        assert_eq!(result.prediction.label, "healthy");
        assert_eq!(result.translated_label, "healthy");
        assert_eq!(result.advice, "No prevention advice available.");
        assert_eq!(result.translated_advice, result.advice);
    }

    #[tokio::test]
    async fn low_confidence_flag_propagates() {
        let h = harness(vec![0.3, 0.25, 0.2], picky());
        let result = h.pipeline.run("apple", &leaf(), "en").await.unwrap();
        assert!(result.prediction.low_confidence);
        assert_eq!(result.prediction.label, "healthy");
    }

    #[tokio::test]
    async fn missing_model_fails_and_was_reported() {
        let h = harness(vec![0.1, 0.7, 0.2], picky());
        let err = h.pipeline.run("tomato", &leaf(), "en").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::ResourceUnavailable { ref category, resource: ResourceKind::Model }
                if category.as_str() == "tomato"
        ));
        assert!(h.sink.has_notice(&Category::new("tomato"), ResourceKind::Model));

        // Other categories keep working.
        assert!(h.pipeline.run("apple", &leaf(), "en").await.is_ok());
    }

    #[tokio::test]
    async fn missing_metadata_degrades_to_sentinels() {
        let h = harness(vec![0.1, 0.7, 0.2], picky());
        let result = h.pipeline.run("corn", &leaf(), "en").await.unwrap();

        assert_eq!(result.prediction.label, "Unknown Disease");
        assert_eq!(result.advice, "No prevention advice available.");
        assert!(result.degraded_metadata);
        assert_eq!(result.probabilities[1].label, "Class 1");

        let corn = Category::new("corn");
        assert!(h.sink.has_notice(&corn, ResourceKind::ClassMap));
        assert!(h.sink.has_notice(&corn, ResourceKind::Advice));
    }

    #[tokio::test]
    async fn probabilities_are_labelled_in_index_order() {
        let h = harness(vec![0.1, 0.7, 0.2], picky());
        let result = h.pipeline.run("apple", &leaf(), "en").await.unwrap();

        let labels: Vec<&str> = result
            .probabilities
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["healthy", "Leaf_rust", "scab"]);
        assert_eq!(result.probabilities[2].score, 0.2);
    }

    #[tokio::test]
    async fn resources_loaded_once_across_requests() {
        let h = harness(vec![0.1, 0.7, 0.2], picky());
        for _ in 0..3 {
            h.pipeline.run("apple", &leaf(), "en").await.unwrap();
        }
        assert_eq!(h.source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn categories_classify_in_parallel() {
        let source =
            TestSource::new(vec![0.1, 0.7, 0.2]).with_inference_delay(Duration::from_millis(300));
        let h = harness_with(source, picky());
        let image = leaf();

        let start = Instant::now();
        let (apple, corn) = tokio::join!(
            h.pipeline.run("apple", &image, "en"),
            h.pipeline.run("corn", &image, "en"),
        );
        let elapsed = start.elapsed();

        assert!(apple.is_ok());
        assert!(corn.is_ok());
        assert!(elapsed < Duration::from_millis(550), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn run_path_decodes_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        RgbImage::from_pixel(20, 20, Rgb([10, 200, 10]))
            .save(&path)
            .unwrap();

        let h = harness(vec![0.1, 0.2, 0.7], picky());
        let result = h.pipeline.run_path("apple", &path, "en").await.unwrap();
        assert_eq!(result.prediction.label, "scab");
        assert_eq!(result.advice, "Rake fallen leaves.");
    }

    #[tokio::test]
    async fn run_path_checks_category_before_decoding() {
        let h = harness(vec![1.0], picky());
        let missing = Path::new("/nonexistent/leaf.jpg");

        let err = h.pipeline.run_path("banana", missing, "en").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCategory { .. }));

        let err = h.pipeline.run_path("apple", missing, "en").await.unwrap_err();
        assert!(matches!(err, PipelineError::Image(_)));
    }
}
