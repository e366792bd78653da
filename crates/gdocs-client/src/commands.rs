//! Presentation commands sent through `documents.batchUpdate`
//!
//! Each command serializes to one request object of the batch, e.g.
//! `{"updateTextStyle": {"range": ..., "textStyle": ..., "fields": "bold"}}`.
//! The `fields` mask is derived from whichever style fields are set.

use crate::model::WeightedFontFamily;
use serde::Serialize;

/// A single style mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentationCommand {
    UpdateTextStyle(UpdateTextStyle),
    UpdateParagraphStyle(UpdateParagraphStyle),
    UpdateTableCellStyle(UpdateTableCellStyle),
}

impl PresentationCommand {
    pub fn text_style(range: Range, style: TextStyleUpdate) -> Self {
        let fields = style.fields();
        PresentationCommand::UpdateTextStyle(UpdateTextStyle {
            range,
            text_style: style,
            fields,
        })
    }

    pub fn paragraph_style(range: Range, style: ParagraphStyleUpdate) -> Self {
        let fields = style.fields();
        PresentationCommand::UpdateParagraphStyle(UpdateParagraphStyle {
            range,
            paragraph_style: style,
            fields,
        })
    }

    /// Style a rectangular block of cells
    pub fn table_cell_style(range: TableRange, style: TableCellStyleUpdate) -> Self {
        let fields = style.fields();
        PresentationCommand::UpdateTableCellStyle(UpdateTableCellStyle {
            table_range: range,
            table_cell_style: style,
            fields,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyle {
    pub range: Range,
    pub text_style: TextStyleUpdate,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParagraphStyle {
    pub range: Range,
    pub paragraph_style: ParagraphStyleUpdate,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTableCellStyle {
    pub table_range: TableRange,
    pub table_cell_style: TableCellStyleUpdate,
    pub fields: String,
}

/// Half-open index range `[start_index, end_index)` within one tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: u32,
    pub end_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

impl Range {
    pub fn new(start_index: u32, end_index: u32) -> Self {
        Self {
            start_index,
            end_index,
            tab_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end_index <= self.start_index
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRange {
    pub table_cell_location: TableCellLocation,
    pub row_span: u32,
    pub column_span: u32,
}

impl TableRange {
    /// The top-left `rows` x `columns` block of the table at `table_start`
    pub fn whole(table_start: Location, rows: u32, columns: u32) -> Self {
        Self {
            table_cell_location: TableCellLocation {
                table_start_location: table_start,
                row_index: 0,
                column_index: 0,
            },
            row_span: rows,
            column_span: columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellLocation {
    pub table_start_location: Location,
    pub row_index: u32,
    pub column_index: u32,
}

/// A length in points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub magnitude: f64,
    pub unit: &'static str,
}

impl Dimension {
    pub fn pt(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: "PT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RgbColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl RgbColor {
    /// Parse `#rrggbb` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .ok()
                .map(|v| f64::from(v) / 255.0)
        };
        Some(Self {
            red: channel(0)?,
            green: channel(2)?,
            blue: channel(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub rgb_color: RgbColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionalColor {
    pub color: Color,
}

impl From<RgbColor> for OptionalColor {
    fn from(rgb_color: RgbColor) -> Self {
        Self {
            color: Color { rgb_color },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_font_family: Option<WeightedFontFamily>,
}

impl TextStyleUpdate {
    fn fields(&self) -> String {
        field_mask(&[
            ("bold", self.bold.is_some()),
            ("fontSize", self.font_size.is_some()),
            ("weightedFontFamily", self.weighted_font_family.is_some()),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_below: Option<Dimension>,
}

impl ParagraphStyleUpdate {
    fn fields(&self) -> String {
        field_mask(&[("spaceBelow", self.space_below.is_some())])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellBorder {
    pub color: OptionalColor,
    pub width: Dimension,
    pub dash_style: &'static str,
}

impl TableCellBorder {
    pub fn solid(color: RgbColor, width_pt: f64) -> Self {
        Self {
            color: color.into(),
            width: Dimension::pt(width_pt),
            dash_style: "SOLID",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellStyleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_top: Option<TableCellBorder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_bottom: Option<TableCellBorder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_left: Option<TableCellBorder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_right: Option<TableCellBorder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<OptionalColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_alignment: Option<&'static str>,
}

impl TableCellStyleUpdate {
    /// Same border on all four sides
    pub fn with_borders(mut self, border: TableCellBorder) -> Self {
        self.border_top = Some(border.clone());
        self.border_bottom = Some(border.clone());
        self.border_left = Some(border.clone());
        self.border_right = Some(border);
        self
    }

    fn fields(&self) -> String {
        field_mask(&[
            ("borderTop", self.border_top.is_some()),
            ("borderBottom", self.border_bottom.is_some()),
            ("borderLeft", self.border_left.is_some()),
            ("borderRight", self.border_right.is_some()),
            ("backgroundColor", self.background_color.is_some()),
            ("contentAlignment", self.content_alignment.is_some()),
        ])
    }
}

fn field_mask(fields: &[(&str, bool)]) -> String {
    fields
        .iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(",")
}
