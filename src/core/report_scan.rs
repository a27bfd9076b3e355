//! Heuristic scanner for report-layout files.
//!
//! Report layouts are JSON, but the scanner treats them mostly as raw text:
//! measure references are detected by case-insensitive containment of the
//! measure name in its quoted or bracketed form. This is a containment test,
//! not reference resolution: one measure whose name is a substring of
//! another's will produce false positives, and dynamically computed bindings
//! produce false negatives. That precision/recall tradeoff is accepted;
//! tightening the match would silently change which measures count as used.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::core::model::{Page, Visual};

/// Technical → human visual-type translation table. The scan order matters:
/// when a file declares no explicit type, the first keyword found wins.
pub const VISUAL_TRANSLATE: &[(&str, &str)] = &[
    ("card", "Cartão (Card)"),
    ("multiRowCard", "Cartão Multi-Linha"),
    ("slicer", "Segmentação de Dados (Slicer)"),
    ("pivotTable", "Matriz (Matrix)"),
    ("tableEx", "Tabela"),
    ("clusteredBarChart", "Gráfico de Barras Clusterizado"),
    ("clusteredColumnChart", "Gráfico de Colunas Clusterizado"),
    ("lineChart", "Gráfico de Linha"),
    ("areaChart", "Gráfico de Área"),
    ("pieChart", "Gráfico de Pizza"),
    ("donutChart", "Gráfico de Rosca"),
    ("scatterChart", "Gráfico de Dispersão"),
    ("gauge", "Gauge (Velocímetro)"),
    ("map", "Mapa"),
    ("filledMap", "Mapa Preenchido"),
    ("treemap", "Treemap"),
    ("waterfallChart", "Cascata"),
    ("basicShape", "Forma Básica"),
    ("textBox", "Caixa de Texto"),
    ("image", "Imagem"),
];

/// Fallback label for visuals whose type could not be determined at all.
pub const GENERIC_VISUAL: &str = "Visual Genérico";

/// Fallback page for visuals whose path matches no known page.
pub const UNKNOWN_PAGE_ID: &str = "unk";
pub const UNKNOWN_PAGE_NAME: &str = "Geral";

static VISUAL_TYPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:visType|visualType)"\s*:\s*"([^"]+)""#).unwrap());

/// Translates a technical visual type into its human-readable form.
/// Unknown types pass through unchanged.
pub fn human_visual_type(raw: &str) -> String {
    if raw.is_empty() {
        return "Visual Desconhecido".to_string();
    }
    VISUAL_TRANSLATE
        .iter()
        .find(|(tech, _)| *tech == raw)
        .map(|(_, human)| human.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Page identifier → display name, accumulated across the whole tree.
pub type PageMap = std::collections::HashMap<String, String>;

/// Phase A: collects page identifier/display-name pairs from every layout
/// file. Both `sections` arrays and direct top-level pairs contribute; for
/// a direct pair the file's containing directory is mapped too, since
/// visual paths reference pages by directory.
pub fn build_page_map(files: &[(PathBuf, String)]) -> PageMap {
    let mut page_map = PageMap::new();

    for (path, content) in files {
        let Ok(data) = serde_json::from_str::<Value>(content) else {
            continue;
        };

        if let Some(sections) = data.get("sections").and_then(Value::as_array) {
            for section in sections {
                if let (Some(name), Some(display)) = (
                    section.get("name").and_then(Value::as_str),
                    section.get("displayName").and_then(Value::as_str),
                ) {
                    page_map.insert(name.to_string(), display.to_string());
                }
            }
        }

        if let (Some(name), Some(display)) = (
            data.get("name").and_then(Value::as_str),
            data.get("displayName").and_then(Value::as_str),
        ) {
            page_map.insert(name.to_string(), display.to_string());
            if let Some(dir) = directory_basename(path) {
                page_map.insert(dir, display.to_string());
            }
        }
    }

    page_map
}

/// Phase B: walks the layout files, resolves each visual-configuration
/// file to a page and detects which measures it references.
///
/// `measure_names` must be in measure discovery order; the per-visual
/// measure lists inherit that order, keeping repeated scans identical.
pub fn scan_visuals(
    files: &[(PathBuf, String)],
    page_map: &PageMap,
    measure_names: &[String],
) -> Vec<Page> {
    let lowered: Vec<(String, String)> = measure_names
        .iter()
        .map(|name| (name.clone(), name.to_lowercase()))
        .collect();

    let mut pages: Vec<Page> = Vec::new();

    for (path, content) in files {
        let path_str = path.to_string_lossy();
        // The data-model layer lives in the same tree but is not report layout
        if path_str.contains("SemanticModel") {
            continue;
        }
        if !is_visual_file(path) {
            continue;
        }

        let (page_id, page_name) = resolve_page(path, page_map);
        let page_index = match pages.iter().position(|p| p.id == page_id) {
            Some(i) => i,
            None => {
                pages.push(Page {
                    id: page_id,
                    name: page_name,
                    visuals: Vec::new(),
                });
                pages.len() - 1
            }
        };

        let lower_content = content.to_lowercase();
        let measures_found: Vec<String> = lowered
            .iter()
            .filter(|(_, lower)| {
                lower_content.contains(&format!("\"{lower}\""))
                    || lower_content.contains(&format!("'{lower}'"))
                    || lower_content.contains(&format!("[{lower}]"))
            })
            .map(|(name, _)| name.clone())
            .collect();

        if measures_found.is_empty() {
            continue;
        }

        let visual_type = detect_visual_type(content);
        let label = extract_title_label(content);
        let Some(visual_id) = directory_basename(path) else {
            continue;
        };

        let page = &mut pages[page_index];
        if let Some(existing) = page.visuals.iter_mut().find(|v| v.id == visual_id) {
            for measure in measures_found {
                if !existing.measures.contains(&measure) {
                    existing.measures.push(measure);
                }
            }
            if existing.label.is_empty() && !label.is_empty() {
                existing.label = label;
            }
        } else {
            page.visuals.push(Visual {
                id: visual_id,
                visual_type,
                measures: measures_found,
                label,
            });
        }
    }

    pages
}

/// A file is a visual configuration if its name says so or it sits under
/// a `visuals` directory.
fn is_visual_file(path: &Path) -> bool {
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if file_name.contains("visual") {
        return true;
    }
    path.parent()
        .map(|dir| dir.to_string_lossy().to_lowercase().contains("visuals"))
        .unwrap_or(false)
}

/// Resolves the owning page by matching path segments, rightmost first,
/// against the page map.
fn resolve_page(path: &Path, page_map: &PageMap) -> (String, String) {
    for component in path.components().rev() {
        let part = component.as_os_str().to_string_lossy();
        if let Some(display) = page_map.get(part.as_ref()) {
            return (part.to_string(), display.clone());
        }
    }
    (UNKNOWN_PAGE_ID.to_string(), UNKNOWN_PAGE_NAME.to_string())
}

/// Visual id is the base name of the containing directory. File names are
/// not stable across Power BI exports; directory names are.
fn directory_basename(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
}

/// Determines the human-readable visual type: the explicit type field if
/// present, otherwise the first known type keyword in the raw text.
fn detect_visual_type(content: &str) -> String {
    if let Some(caps) = VISUAL_TYPE_REGEX.captures(content) {
        return human_visual_type(&caps[1]);
    }
    for (tech, human) in VISUAL_TRANSLATE {
        if content.contains(&format!("\"{tech}\"")) {
            return human.to_string();
        }
    }
    GENERIC_VISUAL.to_string()
}

/// Pulls the visual's title text out of the nested container-objects
/// structure, trimming one pair of wrapping single quotes.
fn extract_title_label(content: &str) -> String {
    fn find_label(data: &Value) -> Option<String> {
        let titles = data
            .get("visual")?
            .get("visualContainerObjects")?
            .get("title")?
            .as_array()?;
        for obj in titles {
            let value = obj
                .get("properties")?
                .get("text")?
                .get("expr")?
                .get("Literal")?
                .get("Value")
                .and_then(Value::as_str);
            if let Some(raw) = value {
                let mut label = raw.trim();
                if label.len() >= 2 && label.starts_with('\'') && label.ends_with('\'') {
                    label = &label[1..label.len() - 1];
                }
                if !label.is_empty() {
                    return Some(label.to_string());
                }
            }
        }
        None
    }

    serde_json::from_str::<Value>(content)
        .ok()
        .and_then(|data| find_label(&data))
        .unwrap_or_default()
}
