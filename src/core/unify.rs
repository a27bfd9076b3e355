//! Page/visual unification.
//!
//! Two independently derived views of the report exist after analysis: the
//! scanner's page → visuals structure, and each measure's own usage
//! records. They can disagree, since the heuristics differ, so the unified
//! view seeds from the scanner (authoritative for which pages and visuals
//! exist) and then folds in every measure-side record (authoritative for
//! measure-to-visual linkage), synthesizing a minimal visual when the
//! scanner never saw it. The redundancy is deliberate: if the two views
//! disagree about which page a visual sits on, both records survive.

use std::collections::BTreeMap;

use crate::core::model::{Measure, Page, UnifiedVisual};

/// Builds the unified page view, keyed by page display name. Visual ids
/// are unique within each page bucket.
pub fn unify_pages(report: &[Page], measures: &[Measure]) -> BTreeMap<String, Vec<UnifiedVisual>> {
    let mut unified: BTreeMap<String, Vec<UnifiedVisual>> = BTreeMap::new();

    // Pass 1: scanner output verbatim, measures deduplicated per visual.
    for page in report {
        let bucket = unified.entry(page.name.clone()).or_default();
        for visual in &page.visuals {
            if bucket.iter().any(|v| v.id == visual.id) {
                continue;
            }
            let mut seen = Vec::new();
            for measure in &visual.measures {
                if !seen.contains(measure) {
                    seen.push(measure.clone());
                }
            }
            bucket.push(UnifiedVisual {
                id: visual.id.clone(),
                visual_type: visual.visual_type.clone(),
                label: visual.label.clone(),
                measures: seen,
            });
        }
    }

    // Pass 2: measure-side usage records complete the linkage.
    for measure in measures {
        for usage in &measure.visual_details {
            let bucket = unified.entry(usage.page.clone()).or_default();
            match bucket.iter_mut().find(|v| v.id == usage.id) {
                Some(existing) => {
                    if !existing.measures.contains(&measure.name) {
                        existing.measures.push(measure.name.clone());
                    }
                }
                None => bucket.push(UnifiedVisual {
                    id: usage.id.clone(),
                    visual_type: usage.visual_type.clone(),
                    label: String::new(),
                    measures: vec![measure.name.clone()],
                }),
            }
        }
    }

    unified
}
