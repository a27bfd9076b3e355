use std::path::{Path, PathBuf};

use colored::Colorize;
use glob::Pattern;
use walkdir::WalkDir;

/// File extension of TMDL model-definition files.
pub const TMDL_EXT: &str = "tmdl";

/// Check if a pattern contains glob wildcards (* or ?).
/// Patterns without wildcards are treated as literal directory paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Result of scanning a Power BI project tree.
///
/// Paths are sorted so that measure discovery order (and with it the
/// sequential `M001` identifiers) is reproducible for an unchanged tree.
pub struct ScanResult {
    /// Model-definition files (`.tmdl`).
    pub tmdl_files: Vec<PathBuf>,
    /// Report-layout files (`.json`).
    pub layout_files: Vec<PathBuf>,
    pub skipped_count: usize,
}

pub fn scan_files(base_dir: &Path, ignore_patterns: &[String], verbose: bool) -> ScanResult {
    let mut tmdl_files = Vec::new();
    let mut layout_files = Vec::new();
    let mut skipped_count = 0;

    // Separate ignore patterns into literal paths and glob patterns
    let mut literal_ignore_paths: Vec<PathBuf> = Vec::new();
    let mut glob_patterns: Vec<Pattern> = Vec::new();

    for p in ignore_patterns {
        if is_glob_pattern(p) {
            match Pattern::new(p) {
                Ok(pattern) => glob_patterns.push(pattern),
                Err(e) => {
                    if verbose {
                        eprintln!(
                            "{} Invalid ignore pattern '{}': {}",
                            "warning:".bold().yellow(),
                            p,
                            e
                        );
                    }
                }
            }
        } else {
            // Literal path mode: join onto the base dir for prefix matching
            literal_ignore_paths.push(base_dir.join(p));
        }
    }

    for entry in WalkDir::new(base_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                skipped_count += 1;
                if verbose {
                    eprintln!("{} Cannot access path: {}", "warning:".bold().yellow(), e);
                }
                continue;
            }
        };
        let path = entry.path();
        let path_str = path.to_string_lossy();

        if literal_ignore_paths
            .iter()
            .any(|ignore_path| path.starts_with(ignore_path))
        {
            continue;
        }

        if glob_patterns.iter().any(|p| p.matches(&path_str)) {
            continue;
        }

        if !path.is_file() {
            continue;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(TMDL_EXT) => {
                tmdl_files.push(path.to_path_buf());
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => {
                layout_files.push(path.to_path_buf());
            }
            _ => {}
        }
    }

    ScanResult {
        tmdl_files,
        layout_files,
        skipped_count,
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_scan_splits_by_extension() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        File::create(dir_path.join("Sales.tmdl")).unwrap();
        File::create(dir_path.join("page.json")).unwrap();
        File::create(dir_path.join("readme.md")).unwrap();

        let result = scan_files(dir_path, &[], false);

        assert_eq!(result.tmdl_files.len(), 1);
        assert_eq!(result.layout_files.len(), 1);
        assert!(result.tmdl_files[0].ends_with("Sales.tmdl"));
        assert!(result.layout_files[0].ends_with("page.json"));
    }

    #[test]
    fn test_scan_nested_directories() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let tables = dir_path.join("SemanticModel").join("definition").join("tables");
        fs::create_dir_all(&tables).unwrap();
        File::create(tables.join("Sales.tmdl")).unwrap();

        let visuals = dir_path.join("Report").join("visuals").join("abc123");
        fs::create_dir_all(&visuals).unwrap();
        File::create(visuals.join("visual.json")).unwrap();

        let result = scan_files(dir_path, &[], false);

        assert_eq!(result.tmdl_files.len(), 1);
        assert_eq!(result.layout_files.len(), 1);
    }

    #[test]
    fn test_scan_ignores_glob_pattern() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let cache = dir_path.join(".pbi").join("cache");
        fs::create_dir_all(&cache).unwrap();
        File::create(cache.join("localSettings.json")).unwrap();
        File::create(dir_path.join("page.json")).unwrap();

        let result = scan_files(dir_path, &["**/.pbi/**".to_owned()], false);

        assert_eq!(result.layout_files.len(), 1);
        assert!(result.layout_files[0].ends_with("page.json"));
    }

    #[test]
    fn test_scan_ignores_literal_directory_path() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let backup = dir_path.join("backup");
        fs::create_dir_all(&backup).unwrap();
        File::create(backup.join("Sales.tmdl")).unwrap();
        File::create(dir_path.join("Dim.tmdl")).unwrap();

        let result = scan_files(dir_path, &["backup".to_owned()], false);

        assert_eq!(result.tmdl_files.len(), 1);
        assert!(result.tmdl_files[0].ends_with("Dim.tmdl"));
    }

    #[test]
    fn test_scan_order_is_stable() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        for name in ["b.tmdl", "a.tmdl", "c.tmdl"] {
            File::create(dir_path.join(name)).unwrap();
        }

        let first = scan_files(dir_path, &[], false);
        let second = scan_files(dir_path, &[], false);

        assert_eq!(first.tmdl_files, second.tmdl_files);
        let names: Vec<_> = first
            .tmdl_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.tmdl", "b.tmdl", "c.tmdl"]);
    }

    #[test]
    fn test_is_glob_pattern() {
        assert!(is_glob_pattern("**/.pbi/**"));
        assert!(is_glob_pattern("cache?.json"));
        assert!(!is_glob_pattern("backup"));
        assert!(!is_glob_pattern("Report/StaticResources"));
    }
}
