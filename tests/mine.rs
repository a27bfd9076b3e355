//! End-to-end mining tests over synthetic PBIP project trees.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::{TempDir, tempdir};

use pbimine::config::Config;
use pbimine::core::{ColumnOrigin, MeasureStatus, mine_project};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const SALES_TMDL: &str = "\
table Sales
	lineageTag: t-sales

	measure 'Total Sales' = SUM(Sales[Amount])
		formatString: #,0

	measure 'Growth Rate' =
			DIVIDE([Total Sales] - [Total Sales], 1)
		formatString: 0.0%

	measure Orphan = COUNTROWS(Sales)

	column Amount
		dataType: decimal
		lineageTag: c-amount

	column Margin = Sales[Amount] * 0.1
		lineageTag: c-margin

	partition Sales = m
		source = let
				Source = Sql.Database(\"srv\"),
				db = Source{[Name=\"AdventureWorks\"]}[Data],
				schema = db{[Name=\"dbo\",Kind=\"Schema\"]}[Data],
				view = schema{[Name=\"vSales\",Kind=\"View\"]}[Data]
			in
				view
";

const RELATIONSHIPS_TMDL: &str = "\
relationship r1
	fromColumn: Sales.CustomerKey
	toColumn: Customer.CustomerKey
";

/// Builds a PBIP-shaped project: semantic model definition plus report
/// layout with one card showing Total Sales.
fn sample_project() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "Demo.SemanticModel/definition/tables/Sales.tmdl",
        SALES_TMDL,
    );
    write(
        root,
        "Demo.SemanticModel/definition/relationships.tmdl",
        RELATIONSHIPS_TMDL,
    );
    write(
        root,
        "Demo.Report/definition/pages/a1b2/page.json",
        r#"{"name": "sec1", "displayName": "Painel de Vendas"}"#,
    );
    write(
        root,
        "Demo.Report/definition/pages/a1b2/visuals/vis1/visual.json",
        r#"{"visual": {"visualType": "card"}, "query": "[Total Sales]"}"#,
    );

    dir
}

#[test]
fn mines_tables_columns_and_connection() {
    let dir = sample_project();
    let doc = mine_project(dir.path(), Config::default(), false).unwrap();

    let sales = &doc.tables["Sales"];
    assert_eq!(sales.columns.len(), 2);

    let amount = &sales.columns[0];
    assert_eq!(amount.name, "Amount");
    assert_eq!(amount.origin, ColumnOrigin::Physical);
    assert_eq!(amount.data_type, "decimal");

    let margin = &sales.columns[1];
    assert_eq!(margin.name, "Margin");
    assert_eq!(margin.origin, ColumnOrigin::Calculated);
    assert!(
        margin
            .expression
            .as_deref()
            .unwrap()
            .starts_with("Sales[Amount] * 0.1")
    );

    let conn = sales.connection.as_ref().unwrap();
    assert_eq!(conn.project, "AdventureWorks");
    assert_eq!(conn.dataset, "dbo");
    assert_eq!(conn.object, "vSales");
    assert_eq!(doc.connections.len(), 1);
}

#[test]
fn mines_relationships_with_defaults() {
    let dir = sample_project();
    let doc = mine_project(dir.path(), Config::default(), false).unwrap();

    assert_eq!(doc.relationships.len(), 1);
    let rel = &doc.relationships[0];
    assert_eq!(rel.from, "Sales.CustomerKey");
    assert_eq!(rel.to, "Customer.CustomerKey");
    assert_eq!(rel.cardinality, "OneToMany");
    assert_eq!(rel.filter, "Single");
    assert!(rel.active);
}

#[test]
fn classifies_measures_by_dependencies_and_visual_usage() {
    let dir = sample_project();
    let doc = mine_project(dir.path(), Config::default(), false).unwrap();

    assert_eq!(doc.measures.len(), 3);

    let total = &doc.measures[0];
    assert_eq!(total.global_id, "M001");
    assert_eq!(total.name, "Total Sales");
    assert_eq!(total.table, "Sales");
    // Referenced by Growth Rate, but visual usage takes priority
    assert_eq!(total.child_names, vec!["Growth Rate"]);
    assert!(total.in_visual);
    assert_eq!(total.status, MeasureStatus::Visual);
    assert_eq!(total.visual_details[0].page, "Painel de Vendas");
    assert_eq!(total.visual_details[0].id, "vis1");

    let growth = &doc.measures[1];
    assert_eq!(growth.global_id, "M002");
    assert_eq!(growth.parent_names, vec!["Total Sales"]);
    assert!(growth.child_names.is_empty());
    assert!(!growth.in_visual);
    assert_eq!(growth.status, MeasureStatus::Dependente);

    let orphan = &doc.measures[2];
    assert_eq!(orphan.global_id, "M003");
    assert!(orphan.parent_names.is_empty());
    assert!(orphan.child_names.is_empty());
    assert_eq!(orphan.status, MeasureStatus::DeleteCandidate);
    assert_eq!(doc.delete_candidates(), 1);
}

#[test]
fn builds_report_structure_and_unified_pages() {
    let dir = sample_project();
    let doc = mine_project(dir.path(), Config::default(), false).unwrap();

    assert_eq!(doc.report_structure.len(), 1);
    let page = &doc.report_structure[0];
    assert_eq!(page.id, "a1b2");
    assert_eq!(page.name, "Painel de Vendas");
    assert_eq!(page.visuals.len(), 1);
    assert_eq!(page.visuals[0].visual_type, "Cartão (Card)");
    assert_eq!(page.visuals[0].measures, vec!["Total Sales"]);

    let unified = &doc.unified_pages["Painel de Vendas"];
    assert_eq!(unified.len(), 1);
    assert_eq!(unified[0].id, "vis1");
    assert_eq!(unified[0].measures, vec!["Total Sales"]);
}

#[test]
fn mining_is_deterministic() {
    let dir = sample_project();
    let first = mine_project(dir.path(), Config::default(), false).unwrap();
    let second = mine_project(dir.path(), Config::default(), false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn ignored_directories_are_excluded() {
    let dir = sample_project();
    write(
        dir.path(),
        "backup/definition/tables/Old.tmdl",
        "table Old\n\tmeasure Stale = 1\n",
    );

    let config = Config {
        ignores: vec!["backup".to_string()],
        ..Default::default()
    };
    let doc = mine_project(dir.path(), config, false).unwrap();

    assert_eq!(doc.measures.len(), 3);
    assert!(!doc.tables.contains_key("Old"));
}

#[test]
fn document_survives_a_serde_round_trip() {
    let dir = sample_project();
    let doc = mine_project(dir.path(), Config::default(), false).unwrap();

    let json = serde_json::to_string_pretty(&doc).unwrap();
    let read: pbimine::core::ModelDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(read, doc);

    // Document labels are part of the output contract
    assert!(json.contains("\"Delete Candidate\""));
    assert!(json.contains("\"Física\""));
    assert!(json.contains("\"Calculada (DAX)\""));
}
