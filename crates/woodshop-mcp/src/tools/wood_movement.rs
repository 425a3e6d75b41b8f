// crates/woodshop-mcp/src/tools/wood_movement.rs
// ============================================================================
// Module: wood_movement_check Tool
// Description: Estimates dimensional change of parts under ambient humidity.
// Purpose: Flag parts whose movement exceeds a millimetre on any axis.
// Dependencies: async-trait, serde, serde_json, woodshop-core
// ============================================================================

//! ## Overview
//! Movement is linear in the humidity difference from a 50 % RH reference:
//! length moves with the longitudinal coefficient, width with the tangential
//! one, thickness with the radial one. Deltas are rounded to three decimals.
//! Species without coefficients fail the call with `UNKNOWN_SPECIES`. The
//! ambient temperature is echoed back but does not enter the estimate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use woodshop_core::ExecutionContext;
use woodshop_core::HandlerError;
use woodshop_core::SchemaSource;
use woodshop_core::ToolDefinition;
use woodshop_core::ToolError;
use woodshop_core::ToolHandler;
use woodshop_core::output_object;

use crate::schemas::input_key;
use crate::schemas::output_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tool name.
pub const NAME: &str = "wood_movement_check";
/// Error code for species missing from the coefficient table.
pub const UNKNOWN_SPECIES: &str = "UNKNOWN_SPECIES";
/// Relative humidity the nominal dimensions are measured at, in percent.
const REFERENCE_RH: f64 = 50.0;
/// Movement above this many millimetres on any axis raises a warning.
const WARNING_THRESHOLD_MM: f64 = 1.0;
/// Warning attached to parts over the threshold.
const WARNING_MESSAGE: &str = "Movement exceeds 1mm on at least one axis.";

// ============================================================================
// SECTION: Coefficients
// ============================================================================

/// Dimensional change per millimetre per percent RH.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// Across the growth rings (thickness).
    pub radial: f64,
    /// Along the growth rings (width).
    pub tangential: f64,
    /// Along the grain (length).
    pub longitudinal: f64,
}

/// Looks up coefficients by case-insensitive species name.
#[must_use]
pub fn coefficients(species: &str) -> Option<Coefficients> {
    let (radial, tangential, longitudinal) = match species.to_lowercase().as_str() {
        "birch" => (0.000_27, 0.000_41, 0.000_02),
        "oak" => (0.000_30, 0.000_38, 0.000_02),
        "maple" => (0.000_29, 0.000_43, 0.000_02),
        "walnut" => (0.000_28, 0.000_37, 0.000_02),
        "cherry" => (0.000_27, 0.000_36, 0.000_02),
        _ => return None,
    };
    Some(Coefficients {
        radial,
        tangential,
        longitudinal,
    })
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Validated input.
#[derive(Debug, Deserialize)]
struct WoodMovementInput {
    /// Owning project.
    project_id: String,
    /// Shop conditions, echoed back.
    ambient: Ambient,
    /// Parts to check.
    parts: Vec<PartInput>,
}

/// Shop conditions the parts are exposed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Ambient {
    /// Relative humidity in percent.
    relative_humidity: f64,
    /// Shop temperature; recorded but not used in the estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature_c: Option<f64>,
}

/// One part to check. The grain axis is accepted but deltas follow the
/// board's own axes, so it does not change the result.
#[derive(Debug, Deserialize)]
struct PartInput {
    /// Part identifier.
    part_id: String,
    /// Species name.
    species: String,
    /// Nominal dimensions at the reference humidity.
    nominal_mm: Dimensions,
}

/// Length, width, and thickness in millimetres.
#[derive(Debug, Clone, Copy, Deserialize)]
struct Dimensions {
    /// Along the grain.
    length: f64,
    /// Across the face.
    width: f64,
    /// Through the board.
    thickness: f64,
}

/// Per-part result.
#[derive(Debug, Serialize)]
struct PartMovement {
    /// Part identifier.
    part_id: String,
    /// Species as supplied.
    species: String,
    /// Length change.
    delta_length_mm: f64,
    /// Width change.
    delta_width_mm: f64,
    /// Thickness change.
    delta_thickness_mm: f64,
    /// Threshold warning or `null`.
    warning: Option<&'static str>,
}

/// Warning list entry.
#[derive(Debug, Serialize)]
struct MovementWarning {
    /// Part identifier.
    part_id: String,
    /// Severity label.
    severity: &'static str,
    /// Warning text.
    message: &'static str,
}

/// Handler result before provenance is merged.
#[derive(Debug, Serialize)]
struct WoodMovementOutput {
    /// Owning project.
    project_id: String,
    /// Shop conditions.
    ambient: Ambient,
    /// Per-part deltas in input order.
    per_part: Vec<PartMovement>,
    /// Parts over the threshold.
    warnings: Vec<MovementWarning>,
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// `wood_movement_check` business logic.
struct WoodMovementCheck;

#[async_trait]
impl ToolHandler for WoodMovementCheck {
    async fn handle(
        &self,
        input: &Value,
        _context: &ExecutionContext,
    ) -> Result<Map<String, Value>, HandlerError> {
        check(input)
    }
}

/// Computes the movement report for a validated input.
///
/// # Errors
///
/// Returns [`HandlerError::Unexpected`] when the input does not have the
/// validated shape (for example no `ambient.relative_humidity`) and
/// [`HandlerError::Tool`] with `UNKNOWN_SPECIES` for a species without
/// coefficients.
pub fn check(input: &Value) -> Result<Map<String, Value>, HandlerError> {
    let input: WoodMovementInput = serde_json::from_value(input.clone())?;
    let delta_rh = input.ambient.relative_humidity - REFERENCE_RH;
    let per_part = input
        .parts
        .into_iter()
        .map(|part| part_movement(part, delta_rh))
        .collect::<Result<Vec<_>, _>>()?;
    let warnings = per_part
        .iter()
        .filter_map(|part| {
            part.warning.map(|message| MovementWarning {
                part_id: part.part_id.clone(),
                severity: "warning",
                message,
            })
        })
        .collect();
    output_object(&WoodMovementOutput {
        project_id: input.project_id,
        ambient: input.ambient,
        per_part,
        warnings,
    })
}

/// Computes the rounded deltas for one part.
fn part_movement(part: PartInput, delta_rh: f64) -> Result<PartMovement, ToolError> {
    let coefficients = coefficients(&part.species).ok_or_else(|| {
        ToolError::new(
            UNKNOWN_SPECIES,
            format!("No movement coefficients registered for species '{}'.", part.species),
        )
        .with_details(json!({"species": part.species}))
    })?;
    let nominal = part.nominal_mm;
    let length = nominal.length * coefficients.longitudinal * delta_rh;
    let width = nominal.width * coefficients.tangential * delta_rh;
    let thickness = nominal.thickness * coefficients.radial * delta_rh;
    let largest = length.abs().max(width.abs()).max(thickness.abs());
    Ok(PartMovement {
        part_id: part.part_id,
        species: part.species,
        delta_length_mm: round_mm(length),
        delta_width_mm: round_mm(width),
        delta_thickness_mm: round_mm(thickness),
        warning: (largest > WARNING_THRESHOLD_MM).then_some(WARNING_MESSAGE),
    })
}

/// Rounds to three decimals; adding zero folds `-0.0` into `0.0`.
fn round_mm(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0 + 0.0
}

/// Success summary.
fn summarize(output: &Value, _context: &ExecutionContext) -> String {
    let parts = output["per_part"].as_array().map_or(0, Vec::len);
    format!("Wood movement computed for {parts} parts.")
}

/// Returns the tool definition.
#[must_use]
pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        SchemaSource::Document(input_key(NAME)),
        SchemaSource::Document(output_key(NAME)),
        WoodMovementCheck,
    )
    .with_title("Wood Movement Check")
    .with_description("Estimate dimensional change under varying ambient humidity.")
    .with_summary(summarize)
}
