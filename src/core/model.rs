//! Entity types for the mined semantic model.
//!
//! These types are both the in-memory working set of the pipeline and the
//! serialized document format (`model_structure.json`), so the serde field
//! names are part of the output contract and must stay stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================
// Tables and columns
// ============================================================

/// Where a column's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnOrigin {
    /// Loaded from the data source.
    #[serde(rename = "Física")]
    Physical,
    /// Computed by a DAX expression.
    #[serde(rename = "Calculada (DAX)")]
    Calculated,
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared `dataType:`, defaulting to `"string"` when absent.
    #[serde(rename = "type")]
    pub data_type: String,
    pub origin: ColumnOrigin,
    /// Raw DAX text for calculated columns. Extraction is best-effort: a
    /// calculated column whose expression could not be located keeps `None`.
    #[serde(rename = "expression_dax", skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// One table of the model: its columns plus an optional data-source
/// connection mined from the table's M expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<Connection>,
}

// ============================================================
// Relationships
// ============================================================

/// A relationship between two columns.
///
/// Identity is full structural equality: discovery may produce the same
/// declaration several times (repeated scans, duplicated files) and the
/// final output is a set, so `Eq`/`Hash` cover every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub cardinality: String,
    pub filter: String,
    pub active: bool,
}

// ============================================================
// Connections
// ============================================================

/// Data-source metadata mined from a table's `let ... in` M expression.
///
/// Every field except `table` and `m_expression` is a best-effort regex
/// capture: a sub-pattern that does not match yields an empty string,
/// never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub table: String,
    pub source_type: String,
    pub project: String,
    pub dataset: String,
    pub object: String,
    /// The raw M block, preserved verbatim.
    pub m_expression: String,
}

// ============================================================
// Measures
// ============================================================

/// Lifecycle classification of a measure, derived from its dependency
/// graph position and visual usage.
///
/// Assigned by priority, first match wins:
/// 1. no parents, no children, no visual → [`MeasureStatus::DeleteCandidate`]
/// 2. used in at least one visual → [`MeasureStatus::Visual`]
/// 3. referenced by other measures → [`MeasureStatus::BaseCalculo`]
/// 4. otherwise → [`MeasureStatus::Dependente`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureStatus {
    #[serde(rename = "Delete Candidate")]
    DeleteCandidate,
    #[serde(rename = "Visual")]
    Visual,
    #[serde(rename = "Base Cálculo")]
    BaseCalculo,
    #[serde(rename = "Dependente")]
    Dependente,
}

/// One appearance of a measure inside a visual, recorded from the
/// measure's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualUsage {
    /// Display name of the page holding the visual.
    pub page: String,
    #[serde(rename = "type")]
    pub visual_type: String,
    pub id: String,
}

/// A DAX measure with its mined dependency and usage information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    /// Sequential identifier (`M001`, `M002`, ...) in discovery order.
    pub global_id: String,
    pub name: String,
    /// Table scope the measure was found in.
    pub table: String,
    /// Full raw definition, verbatim from the TMDL file.
    pub dax: String,
    /// Names of measures this measure references.
    pub parent_names: Vec<String>,
    /// Names of measures that reference this measure. Exact inverse of
    /// `parent_names` across the whole measure list.
    pub child_names: Vec<String>,
    pub visual_details: Vec<VisualUsage>,
    pub in_visual: bool,
    pub status: MeasureStatus,
    /// Optional human description merged in by an enrichment collaborator.
    #[serde(default)]
    pub desc: String,
}

impl Measure {
    /// Formats a sequential identifier in the document's `M001` style.
    pub fn format_id(index: usize) -> String {
        format!("M{:03}", index + 1)
    }
}

// ============================================================
// Report structure
// ============================================================

/// A visual as discovered by the report scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visual {
    /// Base name of the visual's containing directory. Filenames are not
    /// stable across Power BI exports; directory names are.
    pub id: String,
    #[serde(rename = "type")]
    pub visual_type: String,
    pub measures: Vec<String>,
    #[serde(default)]
    pub label: String,
}

/// A report page with the visuals the scanner resolved onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub name: String,
    pub visuals: Vec<Visual>,
}

/// A visual in the unified page view, after reconciling the scanner's
/// output with the measures' own usage records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedVisual {
    pub id: String,
    #[serde(rename = "type")]
    pub visual_type: String,
    #[serde(default)]
    pub label: String,
    pub measures: Vec<String>,
}

// ============================================================
// Roles
// ============================================================

/// A row-level-security role declaration. Only populated for projects
/// that define roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub model_permission: String,
}

// ============================================================
// The model document
// ============================================================

/// The complete mined model: the top-level document written at the end of
/// a run and consumed by the publishing collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub tables: BTreeMap<String, Table>,
    pub relationships: Vec<Relationship>,
    pub measures: Vec<Measure>,
    pub connections: Vec<Connection>,
    pub roles: Vec<Role>,
    pub report_structure: Vec<Page>,
    pub unified_pages: BTreeMap<String, Vec<UnifiedVisual>>,
}

impl ModelDocument {
    /// Number of measures classified as safe-to-delete.
    pub fn delete_candidates(&self) -> usize {
        self.measures
            .iter()
            .filter(|m| m.status == MeasureStatus::DeleteCandidate)
            .count()
    }

    /// Total visuals across the raw report structure.
    pub fn total_visuals(&self) -> usize {
        self.report_structure.iter().map(|p| p.visuals.len()).sum()
    }
}
