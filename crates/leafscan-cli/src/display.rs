//! Text rendering for detection results.
//!
//! Renders an [`EnrichedResult`] as a vertical card grouped into sections,
//! in the order a grower reads it: what was found, how sure, what to do.

use std::fmt;

use leafscan_ai::{CategoryResources, ResourceStore};
use leafscan_core::{CategoryRegistry, EnrichedResult};
use leafscan_translate::{LANGUAGES, language_name};

const LOW_CONFIDENCE_WARNING: &str =
    "Low confidence prediction: image quality may affect accuracy.";

// ── Public API ──

/// Print a detection result as a card.
pub fn print_result_card(result: &EnrichedResult, show_probabilities: bool) {
    print!(
        "{}",
        ResultCard {
            result,
            show_probabilities,
        }
    );
}

pub fn print_plants(registry: &CategoryRegistry) {
    for category in registry.iter() {
        println!("  {:<12} {}", category.as_str(), category.display_name());
    }
}

/// Print every plant with what was found for it on disk. Loads all
/// categories first, so missing files are reported up front.
pub fn print_plant_status(registry: &CategoryRegistry, store: &ResourceStore) {
    let with_model = store.preload_all();
    for category in registry.iter() {
        let status = match store.get_resources(category) {
            Ok(resources) => plant_status(&resources),
            Err(_) => "not registered",
        };
        println!("  {:<12} {:<12} {}", category.as_str(), category.display_name(), status);
    }
    println!();
    println!("{with_model}/{} plants ready", registry.len());
}

pub fn print_languages() {
    for lang in LANGUAGES {
        println!("  {:<4} {}", lang.code, lang.name);
    }
}

// ── Rendering ──

fn plant_status(resources: &CategoryResources) -> &'static str {
    match (resources.has_predictor(), resources.degraded_metadata()) {
        (true, false) => "ready",
        (true, true) => "ready, labels or advice missing",
        (false, _) => "no model",
    }
}

struct ResultCard<'a> {
    result: &'a EnrichedResult,
    show_probabilities: bool,
}

impl fmt::Display for ResultCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let language =
            language_name(&result.target_language).unwrap_or(result.target_language.as_str());

        writeln!(f, "=== {} ===", result.category.display_name())?;
        writeln!(f)?;

        writeln!(f, "Detection")?;
        writeln!(f, "  {:<14} {}", "disease", result.translated_label)?;
        if result.translated_label != result.display_label {
            writeln!(f, "  {:<14} {}", "original", result.display_label)?;
        }
        writeln!(
            f,
            "  {:<14} {}",
            "confidence",
            format_percent(result.prediction.confidence)
        )?;
        writeln!(f, "  {:<14} {}", "language", language)?;
        if result.prediction.low_confidence {
            writeln!(f, "  ! {LOW_CONFIDENCE_WARNING}")?;
        }
        if result.degraded_metadata {
            writeln!(f, "  ! Label or advice data missing for this plant.")?;
        }
        writeln!(f)?;

        writeln!(f, "Prevention & Cure Tips")?;
        writeln!(f, "  {}", result.translated_advice)?;
        writeln!(f)?;

        if self.show_probabilities {
            writeln!(f, "Probabilities")?;
            for class in &result.probabilities {
                let marker = if class.index == result.prediction.category_index {
                    "*"
                } else {
                    " "
                };
                writeln!(
                    f,
                    "{marker} {:<26} {}",
                    class.label,
                    format_percent(class.score)
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// `0.8734` → `"87.34%"`.
fn format_percent(score: f32) -> String {
    format!("{:.2}%", score * 100.0)
}
