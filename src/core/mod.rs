//! Core mining engine.
//!
//! The pipeline runs in four phases over a filesystem snapshot:
//!
//! 1. **Scan**: collect `.tmdl` and `.json` files ([`file_scanner`])
//! 2. **Mine**: structural extraction from TMDL ([`tmdl`]) and the
//!    page/visual scan over report layouts ([`report_scan`])
//! 3. **Analyze**: measure dependency graph and lifecycle status ([`deps`])
//! 4. **Unify**: reconcile the two page/visual views ([`unify`])
//!
//! [`context::MineContext`] orchestrates the phases; [`model`] holds the
//! entity types shared by all of them.

pub mod context;
pub mod deps;
pub mod file_scanner;
pub mod model;
pub mod names;
pub mod report_scan;
pub mod tmdl;
pub mod unify;

pub use context::{Inventory, MineContext, mine_project};
pub use model::{
    Column, ColumnOrigin, Connection, Measure, MeasureStatus, ModelDocument, Page, Relationship,
    Role, Table, UnifiedVisual, Visual, VisualUsage,
};
