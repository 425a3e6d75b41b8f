// crates/woodshop-mcp/src/tools/tests.rs
// ============================================================================
// Module: Built-in Tool Unit Tests
// Description: Behavior of every built-in tool.
// Purpose: Pin ids, cutlists, layouts, deltas, and tool-specific errors.
// Dependencies: woodshop-mcp, woodshop-core, serde_json, tokio
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions favor direct unwraps for clarity."
)]

use std::collections::BTreeMap;

use serde_json::Value;
use serde_json::json;
use woodshop_core::HandlerError;
use woodshop_core::NoopObserver;
use woodshop_core::codes;

use super::*;

fn catalog() -> ToolCatalog {
    let metadata =
        ProcessMetadata::new(BTreeMap::from([("wood".to_string(), "0.0.0".to_string())]), "rev")
            .shared();
    let observer: Arc<dyn PipelineObserver> = Arc::new(NoopObserver);
    builtin_catalog(&metadata, &observer).expect("catalog builds")
}

fn movement_input(species: &str, relative_humidity: f64) -> Value {
    json!({
        "project_id": "proj_demo",
        "ambient": {"relative_humidity": relative_humidity},
        "parts": [{
            "part_id": "side",
            "species": species,
            "grain_axis": "length",
            "nominal_mm": {"length": 1000, "width": 300, "thickness": 18}
        }]
    })
}

fn nesting_input(stock_quantity: u32) -> Value {
    json!({
        "project_id": "proj_demo",
        "kerf_mm": 1,
        "parts": [
            {"part_id": "panel_a", "length_mm": 762, "width_mm": 381, "quantity": 2},
            {"part_id": "shelf", "length_mm": 1150, "width_mm": 380, "quantity": 1},
            {"part_id": "back", "length_mm": 1200, "width_mm": 762, "quantity": 1}
        ],
        "stock": [
            {"sheet_id": "ply", "length_mm": 2440, "width_mm": 1220, "quantity": stock_quantity}
        ]
    })
}

fn single_part_input(length_mm: f64, width_mm: f64, allow_rotation: bool) -> Value {
    json!({
        "project_id": "proj_demo",
        "parts": [{
            "part_id": "rail",
            "length_mm": length_mm,
            "width_mm": width_mm,
            "quantity": 1,
            "allow_rotation": allow_rotation
        }],
        "stock": [{"sheet_id": "ply", "length_mm": 2440, "width_mm": 1220, "quantity": 1}]
    })
}

#[test]
fn catalog_lists_tools_in_name_order() {
    let catalog = catalog();
    assert_eq!(
        catalog.names(),
        vec![create_project::NAME, extract_cutlist::NAME, nest_parts::NAME, wood_movement::NAME]
    );
}

#[test]
fn descriptors_carry_reference_free_schemas() {
    let catalog = catalog();
    let tool = catalog.get(create_project::NAME).unwrap();
    let rendered = tool.input_schema().to_string();
    assert!(!rendered.contains("$ref"));
    assert_eq!(tool.input_schema()["properties"]["units"]["enum"], json!(["mm", "in"]));
    let output = tool.output_schema();
    assert!(output.get("allOf").is_none());
    let required = output["required"].as_array().unwrap();
    assert!(required.contains(&json!("inputs_hash")));
    assert!(required.contains(&json!("project_id")));
}

#[test]
fn project_id_is_prefixed_hash() {
    let id = create_project::project_id("mm", None, 0).unwrap();
    assert!(id.starts_with("proj_"));
    assert_eq!(id.len(), 17);
    assert_eq!(id, create_project::project_id("mm", None, 0).unwrap());
    assert_ne!(id, create_project::project_id("mm", Some("bookshelf"), 0).unwrap());
    assert_ne!(id, create_project::project_id("mm", None, 1).unwrap());
}

#[tokio::test]
async fn create_project_defaults_seed_and_materials() {
    let tool = catalog().get(create_project::NAME).unwrap();
    let output = tool.run(json!({"units": "mm"})).await.unwrap();
    assert_eq!(output["seed"], 0);
    assert_eq!(output["template"], Value::Null);
    assert_eq!(output["project_id"], json!(create_project::project_id("mm", None, 0).unwrap()));
    assert_eq!(output["materials"].as_array().unwrap().len(), 3);
    assert_eq!(output["materials"][2]["name"], "Backer Ply 6mm");
    assert_eq!(output["materials"][2]["grain"], "width");
}

#[tokio::test]
async fn create_project_summary_names_project() {
    let tool = catalog().get(create_project::NAME).unwrap();
    let result = tool.call(json!({"units": "in", "template": "bookshelf", "seed": 7})).await;
    let expected = create_project::project_id("in", Some("bookshelf"), 7).unwrap();
    assert_eq!(result.text(), Some(format!("Project {expected} created with units in.").as_str()));
}

#[tokio::test]
async fn create_project_rejects_unknown_units_and_keys() {
    let tool = catalog().get(create_project::NAME).unwrap();
    let error = tool.run(json!({"units": "cubits"})).await.unwrap_err();
    assert_eq!(error.code, codes::INVALID_INPUT);
    assert_eq!(error.details["issues"][0]["path"], "units");
    let error = tool.run(json!({"units": "mm", "color": "red"})).await.unwrap_err();
    assert_eq!(
        error.details["issues"][0]["message"],
        "Unrecognized key(s) in object: 'color'"
    );
}

#[test]
fn species_lookup_ignores_case() {
    assert_eq!(wood_movement::coefficients("Walnut"), wood_movement::coefficients("walnut"));
    assert!(wood_movement::coefficients("teak").is_none());
}

#[tokio::test]
async fn wood_movement_computes_rounded_deltas_and_warnings() {
    let tool = catalog().get(wood_movement::NAME).unwrap();
    let output = tool.run(movement_input("Birch", 70.0)).await.unwrap();
    let part = &output["per_part"][0];
    assert_eq!(part["delta_length_mm"], json!(0.4));
    assert_eq!(part["delta_width_mm"], json!(2.46));
    assert_eq!(part["delta_thickness_mm"], json!(0.097));
    assert_eq!(part["species"], "Birch");
    assert_eq!(part["warning"], "Movement exceeds 1mm on at least one axis.");
    assert_eq!(
        output["warnings"],
        json!([{
            "part_id": "side",
            "severity": "warning",
            "message": "Movement exceeds 1mm on at least one axis."
        }])
    );
    assert_eq!(output["ambient"], json!({"relative_humidity": 70.0}));
}

#[tokio::test]
async fn wood_movement_at_reference_humidity_is_zero() {
    let tool = catalog().get(wood_movement::NAME).unwrap();
    let output = tool.run(movement_input("oak", 50.0)).await.unwrap();
    let part = &output["per_part"][0];
    assert_eq!(part["delta_width_mm"], json!(0.0));
    assert_eq!(part["warning"], Value::Null);
    assert_eq!(output["warnings"], json!([]));
}

#[tokio::test]
async fn wood_movement_unknown_species_is_tool_specific() {
    let tool = catalog().get(wood_movement::NAME).unwrap();
    let result = tool.call(movement_input("Teak", 60.0)).await;
    assert!(result.is_error);
    assert_eq!(
        result.structured_content,
        json!({
            "code": "UNKNOWN_SPECIES",
            "message": "No movement coefficients registered for species 'Teak'.",
            "details": {"species": "Teak"}
        })
    );
    assert_eq!(
        result.text(),
        Some("wood_movement_check failed: No movement coefficients registered for species 'Teak'.")
    );
}

#[tokio::test]
async fn wood_movement_summary_counts_parts() {
    let tool = catalog().get(wood_movement::NAME).unwrap();
    let result = tool.call(movement_input("cherry", 40.0)).await;
    assert_eq!(result.text(), Some("Wood movement computed for 1 parts."));
}

#[tokio::test]
async fn wood_movement_echoes_temperature_without_using_it() {
    let tool = catalog().get(wood_movement::NAME).unwrap();
    let mut input = movement_input("maple", 65.0);
    input["ambient"]["temperature_c"] = json!(21);
    let warm = tool.run(input).await.unwrap();
    let plain = tool.run(movement_input("maple", 65.0)).await.unwrap();
    assert_eq!(warm["ambient"], json!({"relative_humidity": 65.0, "temperature_c": 21.0}));
    assert_eq!(warm["per_part"], plain["per_part"]);
}

#[test]
fn wood_movement_without_humidity_fails_instead_of_assuming_reference() {
    let mut input = movement_input("oak", 80.0);
    input["ambient"] = json!({});
    match wood_movement::check(&input) {
        Err(HandlerError::Unexpected(message)) => assert!(message.contains("relative_humidity")),
        other => panic!("expected an unexpected-error failure, got {other:?}"),
    }
}

#[test]
fn cutlist_rows_are_namespaced_and_sorted() {
    let rows = extract_cutlist::cutlist_rows("proj_demo");
    let ids: Vec<&str> = rows.iter().map(|row| row.part_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "proj_demo::back_panel",
            "proj_demo::panel_bottom",
            "proj_demo::panel_side_a",
            "proj_demo::panel_side_b",
            "proj_demo::panel_top",
            "proj_demo::shelf_mid",
        ]
    );
}

#[test]
fn cutlist_totals_count_quantities_per_material() {
    let totals = extract_cutlist::cutlist_totals(&extract_cutlist::cutlist_rows("proj_demo"));
    assert_eq!(totals.parts, 8);
    let per_material: Vec<(&str, u32)> =
        totals.material_totals.iter().map(|total| (total.material, total.count)).collect();
    assert_eq!(per_material, vec![("Backer Ply 6mm", 1), ("Birch Ply 18mm", 7)]);
}

#[tokio::test]
async fn extract_cutlist_returns_rows_totals_and_summary() {
    let tool = catalog().get(extract_cutlist::NAME).unwrap();
    let result = tool.call(json!({"project_id": "proj_demo", "seed": 5})).await;
    assert!(!result.is_error);
    let output = &result.structured_content;
    assert_eq!(output["rows"].as_array().unwrap().len(), 6);
    assert_eq!(output["rows"][0]["material"], "Backer Ply 6mm");
    assert_eq!(output["totals"]["parts"], 8);
    assert_eq!(output["seed"], 5);
    assert_eq!(result.text(), Some("Cutlist ready with 6 unique parts (seed 5)."));
}

#[tokio::test]
async fn extract_cutlist_requires_project_id() {
    let tool = catalog().get(extract_cutlist::NAME).unwrap();
    let error = tool.run(json!({"seed": 1})).await.unwrap_err();
    assert_eq!(error.code, codes::INVALID_INPUT);
    assert_eq!(error.details["issues"][0]["path"], "project_id");
}

#[tokio::test]
async fn nest_parts_packs_sample_cabinet_on_one_sheet() {
    let tool = catalog().get(nest_parts::NAME).unwrap();
    let output = tool.run(nesting_input(1)).await.unwrap();
    assert_eq!(output["strategy"], "skyline");
    let layout = &output["layouts"][0];
    let placed: Vec<(&str, f64, f64)> = layout["placements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|placement| {
            (
                placement["part_id"].as_str().unwrap(),
                placement["x_mm"].as_f64().unwrap(),
                placement["y_mm"].as_f64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        placed,
        vec![
            ("back", 0.0, 0.0),
            ("shelf", 763.0, 0.0),
            ("panel_a", 0.0, 1201.0),
            ("panel_a", 382.0, 1201.0),
        ]
    );
    assert_eq!(layout["utilization"], json!(0.649));
    assert_eq!(layout["used_area_mm2"], json!(1_932_044.0));
    assert_eq!(
        output["offcuts"][0],
        json!({
            "sheet_id": "ply",
            "area_mm2": 1_044_756.0,
            "bounding_box_mm": {"length": 1240.0, "width": 1220.0}
        })
    );
    assert_eq!(output["not_placed"], json!([]));
    let svg = layout["svg"].as_str().unwrap();
    assert!(svg.contains("viewBox=\"0 0 1220 2440\""));
    assert!(svg.contains("<rect x=\"763.00\" y=\"0.00\" width=\"380.00\" height=\"1150.00\""));
    assert!(svg.contains(">shelf</text>"));
}

#[tokio::test]
async fn nest_parts_extra_stock_never_raises_utilization() {
    let tool = catalog().get(nest_parts::NAME).unwrap();
    let one = tool.run(nesting_input(1)).await.unwrap();
    let two = tool.run(nesting_input(2)).await.unwrap();
    let overall = |output: &Value| output["utilization_summary"]["overall_utilization"].as_f64();
    assert!(overall(&two).unwrap() <= overall(&one).unwrap());
    assert_eq!(two["layouts"].as_array().unwrap().len(), 2);
    assert_eq!(two["layouts"][1]["placements"], json!([]));
    assert_eq!(two["layouts"][1]["utilization"], json!(0.0));
}

#[tokio::test]
async fn nest_parts_reports_parts_that_do_not_fit() {
    let tool = catalog().get(nest_parts::NAME).unwrap();
    let result = tool.call(single_part_input(3000.0, 100.0, false)).await;
    assert!(result.is_error);
    assert_eq!(
        result.structured_content,
        json!({
            "code": "INSUFFICIENT_STOCK",
            "message": "Not all parts could be placed on the provided stock.",
            "details": {"parts": ["rail"]}
        })
    );
}

#[tokio::test]
async fn nest_parts_rejects_unknown_strategy() {
    let tool = catalog().get(nest_parts::NAME).unwrap();
    let mut input = nesting_input(1);
    input["strategy"] = json!("genetic");
    let error = tool.run(input).await.unwrap_err();
    assert_eq!(error.code, codes::INVALID_INPUT);
    assert_eq!(error.details["issues"][0]["path"], "strategy");
}

#[test]
fn nest_parts_rotation_follows_the_seed() {
    let input = single_part_input(600.0, 300.0, true);
    let turned = nest_parts::nest(&input, 30_000).unwrap();
    assert_eq!(turned["layouts"][0]["placements"][0]["rotation_deg"], json!(90));
    assert_eq!(turned["layouts"][0]["placements"][0]["width_mm"], json!(600.0));
    let upright = nest_parts::nest(&input, 0).unwrap();
    assert_eq!(upright["layouts"][0]["placements"][0]["rotation_deg"], json!(0));
    assert_eq!(upright["layouts"][0]["placements"][0]["width_mm"], json!(300.0));
    assert_eq!(turned, nest_parts::nest(&input, 30_000).unwrap());
}

#[test]
fn nest_parts_without_sheets_is_no_stock() {
    let mut input = single_part_input(600.0, 300.0, false);
    input["stock"][0]["quantity"] = json!(0);
    match nest_parts::nest(&input, 0) {
        Err(HandlerError::Tool(error)) => assert_eq!(error.code, nest_parts::NO_STOCK),
        other => panic!("expected NO_STOCK, got {other:?}"),
    }
}

#[test]
fn lcg_matches_minimal_standard_sequence() {
    let mut rng = nest_parts::Lcg::new(0);
    assert!((rng.next_unit() - 48_271.0 / 2_147_483_647.0).abs() < f64::EPSILON);
    assert!((rng.next_unit() - 182_605_794.0 / 2_147_483_647.0).abs() < f64::EPSILON);
}
