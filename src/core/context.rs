use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Result, bail};
use rayon::prelude::*;

use crate::{
    config::Config,
    core::{
        deps::analyze_measures,
        file_scanner::scan_files,
        model::{Connection, Measure, ModelDocument, Page, Relationship, Role, Table, VisualUsage},
        report_scan::{build_page_map, scan_visuals},
        tmdl::{RawMeasure, parse_tmdl},
        unify::unify_pages,
    },
    utils::strip_bom,
};

/// Accumulated TMDL inventory: everything mined from the model-definition
/// half of the tree, before dependency analysis.
pub struct Inventory {
    pub tables: BTreeMap<String, Table>,
    /// Structurally deduplicated, first-seen order.
    pub relationships: Vec<Relationship>,
    /// Discovery order; sequential measure ids follow this order.
    pub measures: Vec<RawMeasure>,
    pub connections: Vec<Connection>,
    pub roles: Vec<Role>,
}

/// Orchestrator for one mining run over a project tree.
///
/// Construction scans the tree eagerly (a missing root is a fatal
/// precondition); the pipeline phases run lazily on first access:
///
/// 1. `inventory()`: TMDL mining (tables, columns, measures,
///    relationships, connections, roles)
/// 2. `report_structure()`: page map + visual scan over layout files
/// 3. `measures()`: dependency graph and status, merged with visual usage
/// 4. `document()`: the assembled model document with unified pages
///
/// The ordering barrier the pipeline needs (all measures known before the
/// dependency pass, all parents before any child set) falls out of the
/// phase boundaries: each phase consumes only completed predecessors.
///
/// Per-file read failures are skipped and counted, never fatal; the run
/// favors completeness over failing fast.
pub struct MineContext {
    pub config: Config,
    pub root_dir: PathBuf,
    pub verbose: bool,
    /// Paths the scan could not read or traverse.
    pub skipped_count: usize,

    tmdl_files: Vec<PathBuf>,
    layout_files: Vec<PathBuf>,

    inventory: OnceLock<Inventory>,
    layout_contents: OnceLock<Vec<(PathBuf, String)>>,
    report: OnceLock<Vec<Page>>,
    measures: OnceLock<Vec<Measure>>,
    document: OnceLock<ModelDocument>,
}

impl MineContext {
    pub fn new(root_dir: &Path, config: Config, verbose: bool) -> Result<Self> {
        if !root_dir.exists() {
            bail!("Project root does not exist: {}", root_dir.display());
        }
        if !root_dir.is_dir() {
            bail!("Project root is not a directory: {}", root_dir.display());
        }

        let scan = scan_files(root_dir, &config.ignores, verbose);
        if scan.skipped_count > 0 {
            eprintln!(
                "Warning: {} path(s) skipped due to access errors{}",
                scan.skipped_count,
                if verbose { "" } else { " (use -v for details)" }
            );
        }

        Ok(Self {
            config,
            root_dir: root_dir.to_path_buf(),
            verbose,
            skipped_count: scan.skipped_count,
            tmdl_files: scan.tmdl_files,
            layout_files: scan.layout_files,
            inventory: OnceLock::new(),
            layout_contents: OnceLock::new(),
            report: OnceLock::new(),
            measures: OnceLock::new(),
            document: OnceLock::new(),
        })
    }

    pub fn tmdl_file_count(&self) -> usize {
        self.tmdl_files.len()
    }

    pub fn layout_file_count(&self) -> usize {
        self.layout_files.len()
    }

    /// Phase 1: mine the TMDL files (lazy initialization).
    ///
    /// File reading and per-file parsing run in parallel; the merge is
    /// sequential in scan order so accumulation stays deterministic.
    pub fn inventory(&self) -> &Inventory {
        self.inventory.get_or_init(|| {
            let parsed: Vec<_> = self
                .tmdl_files
                .par_iter()
                .filter_map(|path| match fs::read_to_string(path) {
                    Ok(content) => Some(parse_tmdl(path, strip_bom(&content))),
                    Err(e) => {
                        if self.verbose {
                            eprintln!("Warning: {} - {}", path.display(), e);
                        }
                        None
                    }
                })
                .collect();

            let mut tables: BTreeMap<String, Table> = BTreeMap::new();
            let mut relationships = Vec::new();
            let mut measures = Vec::new();
            let mut connections = Vec::new();
            let mut roles = Vec::new();

            for file in parsed {
                if let Some(parsed_table) = file.table {
                    let entry = tables.entry(parsed_table.name).or_default();
                    entry.columns.extend(parsed_table.columns);
                    if let Some(connection) = parsed_table.connection {
                        if entry.connection.is_none() {
                            entry.connection = Some(connection.clone());
                        }
                        connections.push(connection);
                    }
                }
                measures.extend(file.measures);
                relationships.extend(file.relationships);
                roles.extend(file.roles);
            }

            // Relationships are a set: identical declarations from
            // repeated discovery collapse silently.
            let mut seen = HashSet::new();
            relationships.retain(|rel: &Relationship| seen.insert(rel.clone()));

            Inventory {
                tables,
                relationships,
                measures,
                connections,
                roles,
            }
        })
    }

    /// Raw contents of the layout files (lazy, parallel reads; unreadable
    /// files are skipped).
    fn layout_contents(&self) -> &Vec<(PathBuf, String)> {
        self.layout_contents.get_or_init(|| {
            self.layout_files
                .par_iter()
                .filter_map(|path| match fs::read_to_string(path) {
                    Ok(content) => Some((path.clone(), strip_bom(&content).to_string())),
                    Err(e) => {
                        if self.verbose {
                            eprintln!("Warning: {} - {}", path.display(), e);
                        }
                        None
                    }
                })
                .collect()
        })
    }

    /// Phase 2: report page/visual scan (lazy initialization).
    ///
    /// Needs the inventory first: visual detection searches for the full
    /// measure name list.
    pub fn report_structure(&self) -> &Vec<Page> {
        self.report.get_or_init(|| {
            let names: Vec<String> = self
                .inventory()
                .measures
                .iter()
                .map(|m| m.name.clone())
                .collect();
            let files = self.layout_contents();
            let page_map = build_page_map(files);
            if self.verbose {
                eprintln!("Note: {} page(s) identified", page_map.len());
            }
            scan_visuals(files, &page_map, &names)
        })
    }

    /// Phase 3: the full measure list with dependency graph, status and
    /// visual usage (lazy initialization).
    pub fn measures(&self) -> &Vec<Measure> {
        self.measures.get_or_init(|| {
            let usage = usage_by_measure(self.report_structure());
            analyze_measures(self.inventory().measures.clone(), &usage)
        })
    }

    /// Phase 4: the assembled model document (lazy initialization).
    pub fn document(&self) -> &ModelDocument {
        self.document.get_or_init(|| {
            let measures = self.measures().clone();
            let report = self.report_structure().clone();
            let inventory = self.inventory();
            ModelDocument {
                tables: inventory.tables.clone(),
                relationships: inventory.relationships.clone(),
                connections: inventory.connections.clone(),
                roles: inventory.roles.clone(),
                unified_pages: unify_pages(&report, &measures),
                report_structure: report,
                measures,
            }
        })
    }
}

/// Inverts the scanner's page → visual → measures view into measure →
/// usage records, the measure-side source of truth for the unifier.
fn usage_by_measure(report: &[Page]) -> HashMap<String, Vec<VisualUsage>> {
    let mut usage: HashMap<String, Vec<VisualUsage>> = HashMap::new();
    for page in report {
        for visual in &page.visuals {
            for measure in &visual.measures {
                usage.entry(measure.clone()).or_default().push(VisualUsage {
                    page: page.name.clone(),
                    visual_type: visual.visual_type.clone(),
                    id: visual.id.clone(),
                });
            }
        }
    }
    usage
}

/// Convenience entry point: builds a context and returns the completed
/// document in one call.
pub fn mine_project(root_dir: &Path, config: Config, verbose: bool) -> Result<ModelDocument> {
    let ctx = MineContext::new(root_dir, config, verbose)?;
    Ok(ctx.document().clone())
}
