//! pbimine - Power BI semantic-model miner
//!
//! pbimine is a CLI tool and library that walks a Power BI project saved in
//! PBIP format (TMDL model definition plus report layout JSON) and mines it
//! into one structured model document: tables, columns, measures with their
//! dependency graph and lifecycle status, relationships, data source
//! connections, security roles, and the report's page/visual structure.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (commands, reporting, exit codes)
//! - `config`: Configuration file loading and parsing
//! - `core`: Core mining engine (scan, mine, analyze, unify)
//! - `export`: Model document and measure CSV writers
//! - `publish`: Contract for the documentation-publishing collaborator
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod core;
pub mod export;
pub mod publish;
pub mod utils;
