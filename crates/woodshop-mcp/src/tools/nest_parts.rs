// crates/woodshop-mcp/src/tools/nest_parts.rs
// ============================================================================
// Module: nest_parts Tool
// Description: Row-based skyline nesting of rectangular parts onto stock.
// Purpose: Lay parts out on sheets deterministically for a given seed.
// Dependencies: async-trait, serde, serde_json, woodshop-core
// ============================================================================

//! ## Overview
//! Parts are expanded to one entry per piece and sorted by area (largest
//! first), then part id, then piece index. Sheets are filled in stock order.
//! Each sheet is packed in rows: a piece goes right of the previous one,
//! wraps to a new row (offset by the tallest piece plus kerf) when it would
//! cross the sheet width, and is left for the next sheet when it would cross
//! the sheet length or does not fit the sheet at all.
//!
//! Pieces that allow rotation are turned 90 degrees when a seeded
//! Park-Miller generator draws above one half, so the seed alone decides
//! the layout. Any piece left after the last sheet fails the call with
//! `INSUFFICIENT_STOCK`. Each layout carries an SVG drawing of its sheet.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt::Write;

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
pub const NAME: &str = "nest_parts";
/// The only packing strategy.
pub const SKYLINE: &str = "skyline";
/// Error code when pieces remain after every sheet is used.
pub const INSUFFICIENT_STOCK: &str = "INSUFFICIENT_STOCK";
/// Error code when the stock list expands to no sheets.
pub const NO_STOCK: &str = "NO_STOCK";
/// Slack allowed when comparing a piece against sheet edges.
const FIT_TOLERANCE_MM: f64 = 1e-6;
/// Park-Miller modulus (2^31 - 1).
const LCG_MODULUS: u32 = 2_147_483_647;
/// Park-Miller multiplier.
const LCG_MULTIPLIER: u64 = 48_271;

// ============================================================================
// SECTION: Seeded Generator
// ============================================================================

/// Minimal-standard linear congruential generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg {
    /// Current state, always below the modulus.
    state: u32,
}

impl Lcg {
    /// Seeds the generator with `(seed + 1) mod (2^31 - 1)`.
    #[must_use]
    pub fn new(seed: i64) -> Self {
        let state = seed.saturating_add(1).rem_euclid(i64::from(LCG_MODULUS));
        Self {
            state: u32::try_from(state).unwrap_or(0),
        }
    }

    /// Advances and returns a value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        let next = u64::from(self.state) * LCG_MULTIPLIER % u64::from(LCG_MODULUS);
        self.state = u32::try_from(next).unwrap_or(0);
        f64::from(self.state) / f64::from(LCG_MODULUS)
    }
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Validated input.
#[derive(Debug, Deserialize)]
struct NestPartsInput {
    /// Owning project.
    project_id: String,
    /// Packing strategy.
    #[serde(default = "default_strategy")]
    strategy: String,
    /// Saw kerf between neighbouring pieces.
    #[serde(default)]
    kerf_mm: f64,
    /// Parts to place.
    parts: Vec<PartInput>,
    /// Available sheets.
    stock: Vec<StockInput>,
}

/// Strategy used when the caller names none.
fn default_strategy() -> String {
    SKYLINE.to_string()
}

/// Part request.
#[derive(Debug, Deserialize)]
struct PartInput {
    /// Part identifier.
    part_id: String,
    /// Extent along the sheet length.
    length_mm: f64,
    /// Extent along the sheet width.
    width_mm: f64,
    /// Pieces to place.
    quantity: u32,
    /// Whether the piece may be turned 90 degrees.
    #[serde(default)]
    allow_rotation: bool,
}

/// Stock entry.
#[derive(Debug, Deserialize)]
struct StockInput {
    /// Sheet identifier.
    sheet_id: String,
    /// Sheet length.
    length_mm: f64,
    /// Sheet width.
    width_mm: f64,
    /// Number of identical sheets.
    quantity: u32,
}

/// One piece awaiting placement.
#[derive(Debug, Clone)]
struct Piece {
    /// Part identifier.
    part_id: String,
    /// Piece index within its part.
    instance: u32,
    /// Unrotated length.
    length_mm: f64,
    /// Unrotated width.
    width_mm: f64,
    /// Whether the piece may be turned.
    allow_rotation: bool,
}

impl Piece {
    /// Face area.
    fn area(&self) -> f64 {
        self.length_mm * self.width_mm
    }
}

/// One physical sheet.
#[derive(Debug, Clone)]
struct Sheet {
    /// Sheet identifier.
    sheet_id: String,
    /// Sheet length.
    length_mm: f64,
    /// Sheet width.
    width_mm: f64,
}

impl Sheet {
    /// Face area.
    fn area(&self) -> f64 {
        self.length_mm * self.width_mm
    }
}

/// Placed piece.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Placement {
    /// Part identifier.
    part_id: String,
    /// Piece index within its part.
    instance: u32,
    /// Offset across the sheet width.
    x_mm: f64,
    /// Offset along the sheet length.
    y_mm: f64,
    /// Placed extent across the sheet width.
    width_mm: f64,
    /// Placed extent along the sheet length.
    length_mm: f64,
    /// `0` or `90`.
    rotation_deg: u16,
}

/// Result for one sheet.
#[derive(Debug, Serialize)]
struct SheetLayout {
    /// Sheet identifier.
    sheet_id: String,
    /// Position in the expanded sheet list.
    sheet_index: usize,
    /// Used area over sheet area, four decimals.
    utilization: f64,
    /// Placed area, two decimals.
    used_area_mm2: f64,
    /// SVG drawing of the sheet.
    svg: String,
    /// Pieces on this sheet in placement order.
    placements: Vec<Placement>,
}

/// Whole-job utilization.
#[derive(Debug, Serialize)]
struct UtilizationSummary {
    /// Area of every requested piece.
    total_parts_area_mm2: f64,
    /// Area of every sheet.
    total_stock_area_mm2: f64,
    /// Placed area over stock area.
    overall_utilization: f64,
}

/// Leftover material on one sheet.
#[derive(Debug, Serialize)]
struct Offcut {
    /// Sheet identifier.
    sheet_id: String,
    /// Unused area.
    area_mm2: f64,
    /// Strip below the longest placed piece.
    bounding_box_mm: OffcutBox,
}

/// Offcut strip extent.
#[derive(Debug, Serialize)]
struct OffcutBox {
    /// Sheet length past the longest piece.
    length: f64,
    /// Full sheet width.
    width: f64,
}

/// Handler result before provenance is merged.
#[derive(Debug, Serialize)]
struct NestPartsOutput {
    /// Owning project.
    project_id: String,
    /// Strategy used.
    strategy: String,
    /// One layout per sheet.
    layouts: Vec<SheetLayout>,
    /// Whole-job utilization.
    utilization_summary: UtilizationSummary,
    /// One offcut per sheet.
    offcuts: Vec<Offcut>,
    /// Always empty on success.
    not_placed: Vec<String>,
}

// ============================================================================
// SECTION: Nesting
// ============================================================================

/// Nests a validated input using the given seed.
///
/// # Errors
///
/// Returns [`HandlerError::Tool`] with `NO_STOCK` when no sheets are given
/// and `INSUFFICIENT_STOCK` (listing the unplaced part ids) when pieces are
/// left over, or [`HandlerError::Unexpected`] for a malformed input.
pub fn nest(input: &Value, seed: i64) -> Result<Map<String, Value>, HandlerError> {
    let input: NestPartsInput = serde_json::from_value(input.clone())?;
    let pieces = expand_pieces(&input.parts);
    let sheets = expand_sheets(&input.stock);
    if sheets.is_empty() {
        return Err(ToolError::new(NO_STOCK, "No stock sheets were provided.").into());
    }

    let mut rng = Lcg::new(seed);
    let mut remaining = pieces.clone();
    let mut layouts = Vec::with_capacity(sheets.len());
    let mut total_used_area = 0.0;
    for (sheet_index, sheet) in sheets.iter().enumerate() {
        let (placements, used_area) = fill_sheet(sheet, &remaining, &mut rng, input.kerf_mm);
        let placed: BTreeSet<(&str, u32)> = placements
            .iter()
            .map(|placement| (placement.part_id.as_str(), placement.instance))
            .collect();
        remaining.retain(|piece| !placed.contains(&(piece.part_id.as_str(), piece.instance)));
        total_used_area += used_area;
        layouts.push(SheetLayout {
            sheet_id: sheet.sheet_id.clone(),
            sheet_index,
            utilization: ratio(used_area, sheet.area()),
            used_area_mm2: round_to(used_area, 2),
            svg: sheet_svg(sheet, &placements),
            placements,
        });
    }

    if !remaining.is_empty() {
        let parts: Vec<&str> = remaining.iter().map(|piece| piece.part_id.as_str()).collect();
        return Err(ToolError::new(
            INSUFFICIENT_STOCK,
            "Not all parts could be placed on the provided stock.",
        )
        .with_details(json!({"parts": parts}))
        .into());
    }

    let offcuts =
        layouts.iter().zip(&sheets).map(|(layout, sheet)| offcut(layout, sheet)).collect();
    let total_stock_area: f64 = sheets.iter().map(Sheet::area).sum();
    let utilization_summary = UtilizationSummary {
        total_parts_area_mm2: round_to(pieces.iter().map(Piece::area).sum(), 2),
        total_stock_area_mm2: round_to(total_stock_area, 2),
        overall_utilization: ratio(total_used_area, total_stock_area),
    };
    output_object(&NestPartsOutput {
        project_id: input.project_id,
        strategy: input.strategy,
        layouts,
        utilization_summary,
        offcuts,
        not_placed: Vec::new(),
    })
}

/// Expands part requests into pieces in placement priority order.
fn expand_pieces(parts: &[PartInput]) -> Vec<Piece> {
    let mut pieces: Vec<Piece> = parts
        .iter()
        .flat_map(|part| {
            (0..part.quantity).map(|instance| Piece {
                part_id: part.part_id.clone(),
                instance,
                length_mm: part.length_mm,
                width_mm: part.width_mm,
                allow_rotation: part.allow_rotation,
            })
        })
        .collect();
    pieces.sort_by(|left, right| {
        right
            .area()
            .total_cmp(&left.area())
            .then_with(|| left.part_id.cmp(&right.part_id))
            .then_with(|| left.instance.cmp(&right.instance))
    });
    pieces
}

/// Expands stock entries into individual sheets.
fn expand_sheets(stock: &[StockInput]) -> Vec<Sheet> {
    stock
        .iter()
        .flat_map(|entry| {
            (0..entry.quantity).map(|_| Sheet {
                sheet_id: entry.sheet_id.clone(),
                length_mm: entry.length_mm,
                width_mm: entry.width_mm,
            })
        })
        .collect()
}

/// Packs as many pieces as fit onto one sheet, returning placements and the
/// placed area.
fn fill_sheet(
    sheet: &Sheet,
    pieces: &[Piece],
    rng: &mut Lcg,
    kerf: f64,
) -> (Vec<Placement>, f64) {
    let mut placements = Vec::new();
    let mut cursor_x = 0.0;
    let mut cursor_y = 0.0;
    let mut row_height: f64 = 0.0;
    let mut used_area = 0.0;
    for piece in pieces {
        let rotate = piece.allow_rotation && rng.next_unit() > 0.5;
        let (width, length) = if rotate {
            (piece.length_mm, piece.width_mm)
        } else {
            (piece.width_mm, piece.length_mm)
        };
        if width <= 0.0 || length <= 0.0 {
            continue;
        }
        let oversized = width > sheet.width_mm + FIT_TOLERANCE_MM
            || length > sheet.length_mm + FIT_TOLERANCE_MM;
        if oversized {
            continue;
        }
        if cursor_x + width > sheet.width_mm + FIT_TOLERANCE_MM {
            cursor_x = 0.0;
            cursor_y += row_height + kerf;
            row_height = 0.0;
        }
        if cursor_y + length > sheet.length_mm + FIT_TOLERANCE_MM {
            continue;
        }
        placements.push(Placement {
            part_id: piece.part_id.clone(),
            instance: piece.instance,
            x_mm: cursor_x,
            y_mm: cursor_y,
            width_mm: width,
            length_mm: length,
            rotation_deg: if rotate { 90 } else { 0 },
        });
        used_area += width * length;
        cursor_x += width + kerf;
        row_height = row_height.max(length);
    }
    (placements, used_area)
}

/// Leftover strip and area for one sheet.
fn offcut(layout: &SheetLayout, sheet: &Sheet) -> Offcut {
    let longest =
        layout.placements.iter().map(|placement| placement.length_mm).fold(0.0, f64::max);
    Offcut {
        sheet_id: layout.sheet_id.clone(),
        area_mm2: round_to((sheet.area() - layout.used_area_mm2).max(0.0), 2),
        bounding_box_mm: OffcutBox {
            length: round_to((sheet.length_mm - longest).max(0.0), 2),
            width: round_to(sheet.width_mm, 2),
        },
    }
}

/// Draws a sheet outline, each placement, and its part label.
fn sheet_svg(sheet: &Sheet, placements: &[Placement]) -> String {
    let (width, height) = (sheet.width_mm, sheet.length_mm);
    let mut svg = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {width} {height}\">"
    );
    let _ = writeln!(
        svg,
        "  <rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"none\" \
         stroke=\"#4b5563\" stroke-width=\"2\"/>"
    );
    for placement in placements {
        let _ = writeln!(
            svg,
            "  <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" \
             stroke=\"#1f2937\" stroke-width=\"1\" />",
            placement.x_mm, placement.y_mm, placement.width_mm, placement.length_mm
        );
    }
    for placement in placements {
        let center_x = placement.x_mm + placement.width_mm / 2.0;
        let center_y = placement.y_mm + placement.length_mm / 2.0;
        let _ = writeln!(
            svg,
            "  <text x=\"{center_x:.2}\" y=\"{center_y:.2}\" font-size=\"18\" \
             text-anchor=\"middle\" fill=\"#374151\">{}</text>",
            placement.part_id
        );
    }
    svg.push_str("</svg>\n");
    svg
}

/// `used / total` to four decimals, or `0` for an empty total.
fn ratio(used: f64, total: f64) -> f64 {
    if total > 0.0 { round_to(used / total, 4) } else { 0.0 }
}

/// Rounds to a number of decimals.
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// `nest_parts` business logic.
struct NestParts;

#[async_trait]
impl ToolHandler for NestParts {
    async fn handle(
        &self,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<Map<String, Value>, HandlerError> {
        nest(input, context.seed())
    }
}

/// Success summary.
fn summarize(output: &Value, _context: &ExecutionContext) -> String {
    let layouts = output["layouts"].as_array().map_or(&[][..], Vec::as_slice);
    let placed: usize = layouts
        .iter()
        .map(|layout| layout["placements"].as_array().map_or(0, Vec::len))
        .sum();
    format!("Nested {placed} parts across {} sheets.", layouts.len())
}

/// Returns the tool definition.
#[must_use]
pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        SchemaSource::Document(input_key(NAME)),
        SchemaSource::Document(output_key(NAME)),
        NestParts,
    )
    .with_title("Nest Parts")
    .with_description("Deterministic skyline nesting with seedable RNG.")
    .with_summary(summarize)
}
