//! Publishing seam.
//!
//! The miner stops at the model document; turning it into documentation
//! pages is a collaborator's job. This module fixes the contract between
//! the two: what the collaborator receives, and how optional AI-written
//! measure descriptions fold back into the document. No network code
//! lives here.

use std::collections::HashMap;

use anyhow::Result;

use crate::config::Config;
use crate::core::model::{Measure, ModelDocument};

/// Options forwarded to the publishing collaborator alongside the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    pub project_name: String,
    pub use_ai_enrichment: bool,
}

impl PublishOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            project_name: config.project_name.clone(),
            use_ai_enrichment: config.use_ai_enrichment,
        }
    }
}

/// Produces human-readable descriptions for measures. Implementations may
/// call out to an AI service; the built-in [`NoEnrichment`] never does.
pub trait MeasureEnricher {
    /// Returns descriptions keyed by measure name. Measures absent from
    /// the map keep whatever description they already carry.
    fn describe(&self, measures: &[Measure]) -> Result<HashMap<String, String>>;
}

/// The default enricher: describes nothing.
pub struct NoEnrichment;

impl MeasureEnricher for NoEnrichment {
    fn describe(&self, _measures: &[Measure]) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}

/// Folds enricher output into the document. A non-empty description wins
/// over whatever the measure had; empty or missing entries leave the
/// existing text alone.
pub fn merge_descriptions(document: &mut ModelDocument, descriptions: &HashMap<String, String>) {
    for measure in &mut document.measures {
        if let Some(desc) = descriptions.get(&measure.name) {
            if !desc.trim().is_empty() {
                measure.desc = desc.clone();
            }
        }
    }
}
