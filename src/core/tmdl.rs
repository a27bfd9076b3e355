//! Regex-based structural miner for TMDL model-definition files.
//!
//! This is deliberately not a TMDL grammar: no AST is built and no scoping
//! is resolved beyond "the table declared in this file". Declarations are
//! located by line-anchored patterns and expression bodies are captured by a
//! cutoff rule (everything up to the next `measure`/`column`/`table`
//! declaration at the start of a line, or end of file). The cutoff rule is
//! shared between measures and calculated columns so both capture the same
//! verbatim window.
//!
//! Every sub-pattern here is best-effort: a miss yields a default or an
//! absent field, never an error. Only an unreadable file aborts, and only
//! that file, in the caller.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::model::{Column, ColumnOrigin, Connection, Relationship, Role};
use crate::core::names::{clean_name, clean_ref};

static TABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*table\s+['"]?([^'"\r\n]+)"#).unwrap());

static MEASURE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"measure\s+(['"]?.*?['"]?)\s*="#).unwrap());

static COLUMN_EXPR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"column\s+(['"]?.*?['"]?)\s*="#).unwrap());

/// Boundary for measure and calculated-column expression windows.
static EXPR_CUTOFF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*(?:measure|column|table)\s").unwrap());

static RELATIONSHIP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)relationship\s+").unwrap());

/// Boundary for relationship blocks (columns never terminate one).
static REL_CUTOFF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n\s*(?:relationship|table|measure)").unwrap());

static FROM_COLUMN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fromColumn:\s*([^\r\n]*)").unwrap());
static TO_COLUMN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"toColumn:\s*([^\r\n]*)").unwrap());
static CARDINALITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"cardinality:\s*(\w+)").unwrap());
static FILTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"crossFilteringBehavior:\s*(\w+)").unwrap());
static INACTIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"isActive:\s*false").unwrap());

static SOURCE_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)source\s*=\s*let(.*?)in\s+(.*)").unwrap());
static SOURCE_TYPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Source\s*=\s*([^,\n]+)").unwrap());
static SOURCE_PROJECT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Source\{\[Name="([^"]+)"\]\}\[Data\]"#).unwrap());
static SOURCE_SCHEMA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Name="([^"]+)",Kind="Schema""#).unwrap());
static SOURCE_OBJECT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Name="([^"]+)",Kind="(?:View|Table)""#).unwrap());

static ROLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*role\s+['"]?([^'"\r\n]+)"#).unwrap());
static ROLE_CUTOFF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*(?:role|table|relationship)\s").unwrap());
static MODEL_PERMISSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"modelPermission:\s*([^\r\n]+)").unwrap());

/// A measure as found in a file, before dependency analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMeasure {
    pub name: String,
    /// Table scope the measure was found in.
    pub table: String,
    /// Full raw definition, verbatim.
    pub dax: String,
}

/// The table half of a parsed file, when the file lives under a `tables`
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub name: String,
    pub columns: Vec<Column>,
    pub connection: Option<Connection>,
}

/// Everything mined from one TMDL file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTmdl {
    pub table: Option<ParsedTable>,
    pub measures: Vec<RawMeasure>,
    pub relationships: Vec<Relationship>,
    pub roles: Vec<Role>,
}

/// Mines one TMDL file. `path` decides whether the file describes a table
/// (it sits under a `tables` directory) and provides the filename fallback
/// for the table name.
pub fn parse_tmdl(path: &Path, content: &str) -> ParsedTmdl {
    let in_tables_dir = path
        .parent()
        .map(|dir| dir.to_string_lossy().contains("tables"))
        .unwrap_or(false);

    let table = if in_tables_dir {
        Some(parse_table(path, content))
    } else {
        None
    };

    // Measures outside a tables directory fall back to the model scope.
    let scope = match &table {
        Some(t) if !t.name.is_empty() => t.name.clone(),
        Some(_) => "System".to_string(),
        None => "Model".to_string(),
    };

    ParsedTmdl {
        measures: extract_measures(content, &scope),
        relationships: extract_relationships(content),
        roles: extract_roles(content),
        table,
    }
}

// ============================================================
// Tables and columns
// ============================================================

fn parse_table(path: &Path, content: &str) -> ParsedTable {
    let name = match TABLE_REGEX.captures(content) {
        Some(caps) => clean_name(&caps[1]),
        None => path
            .file_stem()
            .map(|s| clean_name(&s.to_string_lossy()))
            .unwrap_or_default(),
    };

    let mut columns = parse_columns(content);

    // Second pass attaches expressions to calculated columns. A column
    // whose expression cannot be located keeps metadata only.
    let expressions = extract_column_expressions(content);
    for column in &mut columns {
        if column.origin == ColumnOrigin::Calculated {
            column.expression = expressions.get(&column.name).cloned();
        }
    }

    let connection = extract_connection(content, &name);

    ParsedTable {
        name,
        columns,
        connection,
    }
}

fn parse_columns(content: &str) -> Vec<Column> {
    let mut columns = Vec::new();
    let mut current: Option<Column> = None;

    for line in content.lines() {
        let stripped = line.trim();
        if let Some(raw) = stripped.strip_prefix("column ") {
            if let Some(done) = current.take() {
                columns.push(done);
            }
            let is_calculated = raw.contains('=');
            let name = clean_name(raw.split('=').next().unwrap_or(raw));
            current = Some(Column {
                name,
                data_type: "string".to_string(),
                origin: if is_calculated {
                    ColumnOrigin::Calculated
                } else {
                    ColumnOrigin::Physical
                },
                expression: None,
            });
        } else if let Some(col) = current.as_mut() {
            if let Some(data_type) = stripped.strip_prefix("dataType:") {
                col.data_type = data_type.trim().to_string();
            }
        }
    }
    if let Some(done) = current.take() {
        columns.push(done);
    }

    columns
}

/// Maps calculated-column name → raw expression, using the same cutoff
/// rule as measure extraction.
fn extract_column_expressions(content: &str) -> HashMap<String, String> {
    let mut expressions = HashMap::new();
    for caps in COLUMN_EXPR_REGEX.captures_iter(content) {
        let name = clean_name(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
        let start = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let window = expression_window(content, start);
        let expr = window.trim();
        if !expr.is_empty() {
            expressions.insert(name, expr.to_string());
        }
    }
    expressions
}

/// Everything from `from` up to the next declaration at the start of a
/// line, or end of file.
fn expression_window(content: &str, from: usize) -> &str {
    let rest = &content[from..];
    match EXPR_CUTOFF_REGEX.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    }
}

// ============================================================
// Measures
// ============================================================

/// Finds every `measure <name> =` declaration in the file. The captured
/// DAX runs from the declaration itself to the cutoff, preserving the
/// original formatting (it is displayed verbatim downstream).
pub fn extract_measures(content: &str, scope: &str) -> Vec<RawMeasure> {
    let mut measures = Vec::new();
    for caps in MEASURE_REGEX.captures_iter(content) {
        let name = clean_name(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
        // Offset by one so a declaration at line start is not its own cutoff.
        let window = expression_window(content, start + 1);
        let end = start + 1 + window.len();
        measures.push(RawMeasure {
            name,
            table: scope.to_string(),
            dax: content[start..end].to_string(),
        });
    }
    measures
}

// ============================================================
// Relationships
// ============================================================

/// Extracts relationship blocks. Blocks missing either column reference
/// are discarded; the remaining fields fall back to TMDL's defaults.
/// Deduplication is the caller's concern, after the whole tree is mined.
pub fn extract_relationships(content: &str) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    for m in RELATIONSHIP_REGEX.find_iter(content) {
        let rest = &content[m.start()..];
        // Skip past the header so it does not terminate its own block.
        let body_from = m.end() - m.start();
        let block = match REL_CUTOFF_REGEX.find(&rest[body_from..]) {
            Some(cut) => &rest[..body_from + cut.start()],
            None => rest,
        };

        let from = FROM_COLUMN_REGEX.captures(block).map(|c| clean_ref(&c[1]));
        let to = TO_COLUMN_REGEX.captures(block).map(|c| clean_ref(&c[1]));
        let (Some(from), Some(to)) = (from, to) else {
            continue;
        };

        relationships.push(Relationship {
            from,
            to,
            cardinality: CARDINALITY_REGEX
                .captures(block)
                .map(|c| clean_ref(&c[1]))
                .unwrap_or_else(|| "OneToMany".to_string()),
            filter: FILTER_REGEX
                .captures(block)
                .map(|c| clean_ref(&c[1]))
                .unwrap_or_else(|| "Single".to_string()),
            active: !INACTIVE_REGEX.is_match(block),
        });
    }
    relationships
}

// ============================================================
// Connections
// ============================================================

/// Extracts the table's data-source metadata from its `let ... in` M
/// block, if one exists. Sub-pattern misses yield empty strings; the raw
/// block is always preserved.
pub fn extract_connection(content: &str, table: &str) -> Option<Connection> {
    let block = SOURCE_BLOCK_REGEX.find(content)?.as_str();

    let capture = |regex: &Regex| {
        regex
            .captures(block)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default()
    };

    Some(Connection {
        table: table.to_string(),
        source_type: capture(&SOURCE_TYPE_REGEX),
        project: capture(&SOURCE_PROJECT_REGEX),
        dataset: capture(&SOURCE_SCHEMA_REGEX),
        object: capture(&SOURCE_OBJECT_REGEX),
        m_expression: block.trim().to_string(),
    })
}

// ============================================================
// Roles
// ============================================================

/// Extracts row-level-security role declarations. Most projects have
/// none; the resulting list is usually empty.
pub fn extract_roles(content: &str) -> Vec<Role> {
    let mut roles = Vec::new();
    for caps in ROLE_REGEX.captures_iter(content) {
        let name = clean_name(&caps[1]);
        if name.is_empty() {
            continue;
        }
        let start = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let rest = &content[start..];
        let block = match ROLE_CUTOFF_REGEX.find(rest) {
            Some(cut) => &rest[..cut.start()],
            None => rest,
        };
        let model_permission = MODEL_PERMISSION_REGEX
            .captures(block)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        roles.push(Role {
            name,
            model_permission,
        });
    }
    roles
}
