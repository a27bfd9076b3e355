//! Measure dependency graph and lifecycle classification.
//!
//! Parent detection is a coarse full-text search: measure A is a parent of
//! B when A's name appears in B's DAX in bracket-reference (`[A]`) or
//! quoted (`"A"`) form, case-insensitively. Like the visual scanner this
//! is a containment heuristic, kept as such: a stricter tokenizer
//! would change which measures are classified as referenced.
//!
//! Ordering barrier: parents are computed for *every* measure before any
//! child set is derived. Children are the exact inverse relation, never an
//! independent search, so the parent/child invariant holds by construction.

use std::collections::HashMap;

use regex::Regex;

use crate::core::model::{Measure, MeasureStatus, VisualUsage};
use crate::core::tmdl::RawMeasure;

/// Classifies a measure from its graph position and visual usage.
/// Priority order, first match wins.
pub fn classify(has_parents: bool, has_children: bool, in_visual: bool) -> MeasureStatus {
    if !has_parents && !has_children && !in_visual {
        MeasureStatus::DeleteCandidate
    } else if in_visual {
        MeasureStatus::Visual
    } else if has_children {
        MeasureStatus::BaseCalculo
    } else {
        MeasureStatus::Dependente
    }
}

/// Builds the full measure list: sequential identifiers, parent/child
/// dependency sets and status, merged with the per-measure visual usage
/// records from the report scan.
///
/// `usage_by_measure` maps measure name → usage records; measures absent
/// from the map are simply not used in any visual.
pub fn analyze_measures(
    raw: Vec<RawMeasure>,
    usage_by_measure: &HashMap<String, Vec<VisualUsage>>,
) -> Vec<Measure> {
    // One reference pattern per distinct name, compiled once. Names are
    // assumed unique among measures for graph purposes.
    let reference_patterns: Vec<(String, Regex)> = {
        let mut seen = Vec::new();
        for measure in &raw {
            if !seen.iter().any(|(name, _)| name == &measure.name) {
                seen.push((measure.name.clone(), reference_regex(&measure.name)));
            }
        }
        seen
    };

    // Pass 1: parents for every measure, before any child set exists.
    let parent_sets: Vec<Vec<String>> = raw
        .iter()
        .map(|measure| {
            reference_patterns
                .iter()
                .filter(|(other, _)| other != &measure.name)
                .filter(|(_, pattern)| pattern.is_match(&measure.dax))
                .map(|(other, _)| other.clone())
                .collect()
        })
        .collect();

    // Pass 2: children as the exact inverse of the completed parent sets.
    let child_sets: Vec<Vec<String>> = raw
        .iter()
        .map(|measure| {
            raw.iter()
                .zip(&parent_sets)
                .filter(|(_, parents)| parents.contains(&measure.name))
                .map(|(child, _)| child.name.clone())
                .collect()
        })
        .collect();

    raw.into_iter()
        .zip(parent_sets)
        .zip(child_sets)
        .enumerate()
        .map(|(index, ((measure, parents), children))| {
            let visual_details = usage_by_measure
                .get(&measure.name)
                .cloned()
                .unwrap_or_default();
            let in_visual = !visual_details.is_empty();
            let status = classify(!parents.is_empty(), !children.is_empty(), in_visual);
            Measure {
                global_id: Measure::format_id(index),
                name: measure.name,
                table: measure.table,
                dax: measure.dax,
                parent_names: parents,
                child_names: children,
                visual_details,
                in_visual,
                status,
                desc: String::new(),
            }
        })
        .collect()
}

/// Case-insensitive pattern matching `[ name ]` or `" name "`, whitespace
/// tolerant inside the delimiters.
fn reference_regex(name: &str) -> Regex {
    let escaped = regex::escape(name);
    Regex::new(&format!(r#"(?i)\[\s*{escaped}\s*\]|"\s*{escaped}\s*""#))
        .expect("escaped measure name forms a valid pattern")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn raw(name: &str, dax: &str) -> RawMeasure {
        RawMeasure {
            name: name.to_string(),
            table: "Sales".to_string(),
            dax: dax.to_string(),
        }
    }

    #[test]
    fn test_status_priority_table() {
        // (has_parents, has_children, in_visual) → status, all 8 combinations
        let cases = [
            (false, false, false, MeasureStatus::DeleteCandidate),
            (false, false, true, MeasureStatus::Visual),
            (false, true, false, MeasureStatus::BaseCalculo),
            (false, true, true, MeasureStatus::Visual),
            (true, false, false, MeasureStatus::Dependente),
            (true, false, true, MeasureStatus::Visual),
            (true, true, false, MeasureStatus::BaseCalculo),
            (true, true, true, MeasureStatus::Visual),
        ];
        for (parents, children, visual, expected) in cases {
            assert_eq!(
                classify(parents, children, visual),
                expected,
                "classify({parents}, {children}, {visual})"
            );
        }
    }

    #[test]
    fn test_lone_measure_is_delete_candidate() {
        let measures = analyze_measures(
            vec![raw("TotalSales", "measure TotalSales = SUM(Sales[Amount])")],
            &HashMap::new(),
        );
        assert_eq!(measures.len(), 1);
        let m = &measures[0];
        assert_eq!(m.global_id, "M001");
        assert!(m.parent_names.is_empty());
        assert!(m.child_names.is_empty());
        assert!(!m.in_visual);
        assert_eq!(m.status, MeasureStatus::DeleteCandidate);
    }

    #[test]
    fn test_bracket_reference_builds_parent_edge() {
        let measures = analyze_measures(
            vec![
                raw("TotalSales", "measure TotalSales = SUM(Sales[Amount])"),
                raw(
                    "GrowthRate",
                    "measure GrowthRate = DIVIDE([TotalSales], [PriorSales])",
                ),
            ],
            &HashMap::new(),
        );

        let total = &measures[0];
        let growth = &measures[1];
        // PriorSales is not a measure: no edge for it
        assert_eq!(growth.parent_names, vec!["TotalSales"]);
        assert_eq!(total.child_names, vec!["GrowthRate"]);
        assert_eq!(total.status, MeasureStatus::BaseCalculo);
        assert_eq!(growth.status, MeasureStatus::Dependente);
    }

    #[test]
    fn test_reference_match_is_case_insensitive_and_whitespace_tolerant() {
        let measures = analyze_measures(
            vec![
                raw("Total Sales", "measure 'Total Sales' = 1"),
                raw("A", "measure A = [ total sales ] + 1"),
                raw("B", "measure B = CALCULATE(\"Total Sales\")"),
            ],
            &HashMap::new(),
        );
        assert_eq!(measures[1].parent_names, vec!["Total Sales"]);
        assert_eq!(measures[2].parent_names, vec!["Total Sales"]);
        assert_eq!(measures[0].child_names, vec!["A", "B"]);
    }

    #[test]
    fn test_parent_child_inverse_consistency() {
        let measures = analyze_measures(
            vec![
                raw("Base", "measure Base = 1"),
                raw("Mid", "measure Mid = [Base] * 2"),
                raw("Top", "measure Top = [Mid] + [Base]"),
            ],
            &HashMap::new(),
        );

        for a in &measures {
            for b in &measures {
                let a_parent_of_b = b.parent_names.contains(&a.name);
                let b_child_of_a = a.child_names.contains(&b.name);
                assert_eq!(
                    a_parent_of_b, b_child_of_a,
                    "inverse violated for {} / {}",
                    a.name, b.name
                );
            }
        }
        assert_eq!(measures[0].child_names, vec!["Mid", "Top"]);
    }

    #[test]
    fn test_visual_usage_wins_over_children() {
        let usage = HashMap::from([(
            "Base".to_string(),
            vec![VisualUsage {
                page: "Vendas".to_string(),
                visual_type: "Cartão (Card)".to_string(),
                id: "v1".to_string(),
            }],
        )]);
        let measures = analyze_measures(
            vec![
                raw("Base", "measure Base = 1"),
                raw("Leaf", "measure Leaf = [Base]"),
            ],
            &usage,
        );
        assert!(measures[0].in_visual);
        assert_eq!(measures[0].status, MeasureStatus::Visual);
        assert_eq!(measures[0].visual_details.len(), 1);
    }

    #[test]
    fn test_substring_names_are_an_accepted_false_positive() {
        // "Sales" is a substring of "Total Sales", but the bracket form
        // requires the full delimited name, so no spurious edge here...
        let measures = analyze_measures(
            vec![
                raw("Sales", "measure Sales = 1"),
                raw("Total", "measure Total = [Total Sales]"),
                raw("Total Sales", "measure 'Total Sales' = 2"),
            ],
            &HashMap::new(),
        );
        assert_eq!(measures[1].parent_names, vec!["Total Sales"]);
        // ...while a literal `[Sales]` reference to the column of the
        // same name would still count as an edge.
    }

    #[test]
    fn test_regex_metacharacters_in_names_are_escaped() {
        let measures = analyze_measures(
            vec![
                raw("Margin %", "measure 'Margin %' = 0.1"),
                raw("Alert", "measure Alert = IF([Margin %] < 0, 1, 0)"),
            ],
            &HashMap::new(),
        );
        assert_eq!(measures[1].parent_names, vec!["Margin %"]);
    }

    #[test]
    fn test_sequential_ids_follow_discovery_order() {
        let measures = analyze_measures(
            vec![raw("Z", "1"), raw("A", "2"), raw("M", "3")],
            &HashMap::new(),
        );
        let ids: Vec<_> = measures.iter().map(|m| m.global_id.as_str()).collect();
        assert_eq!(ids, vec!["M001", "M002", "M003"]);
        assert_eq!(measures[0].name, "Z");
    }
}
