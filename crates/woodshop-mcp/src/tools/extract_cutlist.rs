// crates/woodshop-mcp/src/tools/extract_cutlist.rs
// ============================================================================
// Module: extract_cutlist Tool
// Description: Produces the cutlist for a project revision.
// Purpose: List every part with its stock and total parts per material.
// Dependencies: async-trait, serde, serde_json, woodshop-core
// ============================================================================

//! ## Overview
//! Every project currently shares one carcass: two pairs of sides, a top, a
//! bottom, a fixed shelf, and a back panel. Rows are namespaced by project id
//! (`<project_id>::<part>`) and sorted by that id; material totals count part
//! quantities per material and are sorted by material name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use woodshop_core::ExecutionContext;
use woodshop_core::HandlerError;
use woodshop_core::SchemaSource;
use woodshop_core::ToolDefinition;
use woodshop_core::ToolHandler;
use woodshop_core::output_object;

use crate::schemas::input_key;
use crate::schemas::output_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tool name.
pub const NAME: &str = "extract_cutlist";

/// Sheet stock for the carcass panels.
const BIRCH_PLY: &str = "Birch Ply 18mm";
/// Sheet stock for the back panel.
const BACKER_PLY: &str = "Backer Ply 6mm";

/// Parts of the standard carcass.
const CARCASS: [CarcassPart; 6] = [
    CarcassPart {
        id: "panel_side_a",
        name: "Side A",
        quantity: 2,
        length_mm: 762,
        width_mm: 381,
        thickness_mm: 18,
        material: BIRCH_PLY,
        grain: "length",
    },
    CarcassPart {
        id: "panel_side_b",
        name: "Side B",
        quantity: 2,
        length_mm: 762,
        width_mm: 381,
        thickness_mm: 18,
        material: BIRCH_PLY,
        grain: "length",
    },
    CarcassPart {
        id: "panel_top",
        name: "Top",
        quantity: 1,
        length_mm: 1200,
        width_mm: 400,
        thickness_mm: 18,
        material: BIRCH_PLY,
        grain: "width",
    },
    CarcassPart {
        id: "panel_bottom",
        name: "Bottom",
        quantity: 1,
        length_mm: 1200,
        width_mm: 400,
        thickness_mm: 18,
        material: BIRCH_PLY,
        grain: "width",
    },
    CarcassPart {
        id: "shelf_mid",
        name: "Middle Shelf",
        quantity: 1,
        length_mm: 1150,
        width_mm: 380,
        thickness_mm: 18,
        material: BIRCH_PLY,
        grain: "width",
    },
    CarcassPart {
        id: "back_panel",
        name: "Back Panel",
        quantity: 1,
        length_mm: 1200,
        width_mm: 762,
        thickness_mm: 6,
        material: BACKER_PLY,
        grain: "width",
    },
];

/// One part of the standard carcass.
#[derive(Debug, Clone, Copy)]
struct CarcassPart {
    /// Part id within a project.
    id: &'static str,
    /// Display name.
    name: &'static str,
    /// Pieces to cut.
    quantity: u32,
    /// Finished length.
    length_mm: u32,
    /// Finished width.
    width_mm: u32,
    /// Stock thickness.
    thickness_mm: u32,
    /// Stock material.
    material: &'static str,
    /// Grain direction.
    grain: &'static str,
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Validated input.
#[derive(Debug, Deserialize)]
struct ExtractCutlistInput {
    /// Project the cutlist belongs to.
    project_id: String,
}

/// Cutlist row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutlistRow {
    /// `<project_id>::<part>`.
    pub part_id: String,
    /// Display name.
    pub name: &'static str,
    /// Pieces to cut.
    pub quantity: u32,
    /// Finished length.
    pub length_mm: u32,
    /// Finished width.
    pub width_mm: u32,
    /// Stock thickness.
    pub thickness_mm: u32,
    /// Stock material.
    pub material: &'static str,
    /// Grain direction.
    pub grain: &'static str,
}

/// Pieces needed from one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialTotal {
    /// Material name.
    pub material: &'static str,
    /// Sum of row quantities.
    pub count: u32,
}

/// Cutlist totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutlistTotals {
    /// Sum of all row quantities.
    pub parts: u32,
    /// Per-material counts sorted by material.
    pub material_totals: Vec<MaterialTotal>,
}

/// Handler result before provenance is merged.
#[derive(Debug, Serialize)]
struct ExtractCutlistOutput {
    /// Project the cutlist belongs to.
    project_id: String,
    /// Rows sorted by part id.
    rows: Vec<CutlistRow>,
    /// Aggregates over the rows.
    totals: CutlistTotals,
}

// ============================================================================
// SECTION: Cutlist
// ============================================================================

/// Builds the sorted rows for a project.
#[must_use]
pub fn cutlist_rows(project_id: &str) -> Vec<CutlistRow> {
    let mut rows: Vec<CutlistRow> = CARCASS
        .iter()
        .map(|part| CutlistRow {
            part_id: format!("{project_id}::{}", part.id),
            name: part.name,
            quantity: part.quantity,
            length_mm: part.length_mm,
            width_mm: part.width_mm,
            thickness_mm: part.thickness_mm,
            material: part.material,
            grain: part.grain,
        })
        .collect();
    rows.sort_by(|left, right| left.part_id.cmp(&right.part_id));
    rows
}

/// Sums quantities overall and per material.
#[must_use]
pub fn cutlist_totals(rows: &[CutlistRow]) -> CutlistTotals {
    let mut per_material: BTreeMap<&'static str, u32> = BTreeMap::new();
    for row in rows {
        *per_material.entry(row.material).or_default() += row.quantity;
    }
    CutlistTotals {
        parts: rows.iter().map(|row| row.quantity).sum(),
        material_totals: per_material
            .into_iter()
            .map(|(material, count)| MaterialTotal {
                material,
                count,
            })
            .collect(),
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// `extract_cutlist` business logic.
struct ExtractCutlist;

#[async_trait]
impl ToolHandler for ExtractCutlist {
    async fn handle(
        &self,
        input: &Value,
        _context: &ExecutionContext,
    ) -> Result<Map<String, Value>, HandlerError> {
        let input: ExtractCutlistInput = serde_json::from_value(input.clone())?;
        let rows = cutlist_rows(&input.project_id);
        let totals = cutlist_totals(&rows);
        output_object(&ExtractCutlistOutput {
            project_id: input.project_id,
            rows,
            totals,
        })
    }
}

/// Success summary.
fn summarize(output: &Value, context: &ExecutionContext) -> String {
    let rows = output["rows"].as_array().map_or(0, Vec::len);
    format!("Cutlist ready with {rows} unique parts (seed {}).", context.seed())
}

/// Returns the tool definition.
#[must_use]
pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        SchemaSource::Document(input_key(NAME)),
        SchemaSource::Document(output_key(NAME)),
        ExtractCutlist,
    )
    .with_title("Extract Cutlist")
    .with_description("Produce a deterministic cutlist for the current project revision.")
    .with_summary(summarize)
}
