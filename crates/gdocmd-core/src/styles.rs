//! Style rule set applied after upload
//!
//! The converter cannot express the house style, so it is applied as
//! presentation commands against ranges taken from a fresh read of the
//! uploaded document. Each [`StyleRole`] yields its own command list so a
//! failing role can be skipped without affecting the others.

use crate::reader::{TabContent, document_tabs};
use gdocs_client::RemoteDocument;
use gdocs_client::commands::{
    Dimension, Location, ParagraphStyleUpdate, PresentationCommand, Range, RgbColor,
    TableCellBorder, TableCellStyleUpdate, TableRange, TextStyleUpdate,
};
use gdocs_client::model::{ElementKind, StructuralElement, Table, WeightedFontFamily};

/// House style parameters
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRules {
    pub heading_font: String,
    pub heading_weight: u32,
    pub paragraph_space_below_pt: f64,
    pub border_width_pt: f64,
    /// `#rrggbb`
    pub border_color: String,
    /// `#rrggbb`
    pub header_background: String,
    pub header_bold: bool,
    pub table_font_size_pt: f64,
    /// Maximum commands per `batchUpdate` call
    pub batch_size: usize,
}

impl Default for StyleRules {
    fn default() -> Self {
        Self {
            heading_font: "Proxima Nova".to_string(),
            heading_weight: 700,
            paragraph_space_below_pt: 6.0,
            border_width_pt: 0.5,
            border_color: "#b7b7b7".to_string(),
            header_background: "#f3f3f3".to_string(),
            header_bold: true,
            table_font_size_pt: 11.0,
            batch_size: 30,
        }
    }
}

/// Independent groups of presentation commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleRole {
    HeadingFont,
    ParagraphSpacing,
    TableBorders,
    TableHeader,
    TableFont,
}

impl StyleRole {
    pub const ALL: [StyleRole; 5] = [
        StyleRole::HeadingFont,
        StyleRole::ParagraphSpacing,
        StyleRole::TableBorders,
        StyleRole::TableHeader,
        StyleRole::TableFont,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StyleRole::HeadingFont => "heading font",
            StyleRole::ParagraphSpacing => "paragraph spacing",
            StyleRole::TableBorders => "table borders",
            StyleRole::TableHeader => "table header",
            StyleRole::TableFont => "table font",
        }
    }
}

impl std::fmt::Display for StyleRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl StyleRules {
    /// Commands for one role across every tab of `doc`.
    ///
    /// Roles that need a color yield nothing when the configured color is
    /// not a valid `#rrggbb` value.
    pub fn commands_for(&self, role: StyleRole, doc: &RemoteDocument) -> Vec<PresentationCommand> {
        let mut commands = Vec::new();
        for tab in document_tabs(doc) {
            let ctx = TabContext { tab };
            match role {
                StyleRole::HeadingFont => self.heading_font(&ctx, &mut commands),
                StyleRole::ParagraphSpacing => self.paragraph_spacing(&ctx, &mut commands),
                StyleRole::TableBorders => {
                    let Some(color) = parse_color(&self.border_color, "border_color") else {
                        return Vec::new();
                    };
                    self.table_borders(&ctx, color, &mut commands);
                }
                StyleRole::TableHeader => {
                    let Some(color) = parse_color(&self.header_background, "header_background")
                    else {
                        return Vec::new();
                    };
                    self.table_header(&ctx, color, &mut commands);
                }
                StyleRole::TableFont => self.table_font(&ctx, &mut commands),
            }
        }
        commands
    }

    /// Split commands into `batchUpdate`-sized chunks
    pub fn batches<'a>(&self, commands: &'a [PresentationCommand]) -> std::slice::Chunks<'a, PresentationCommand> {
        commands.chunks(self.batch_size.max(1))
    }

    fn heading_font(&self, ctx: &TabContext<'_>, out: &mut Vec<PresentationCommand>) {
        for element in ctx.elements() {
            if let ElementKind::Paragraph(p) = element.kind()
                && p.paragraph_style.heading_level().is_some()
                && element.end_index.saturating_sub(1) > element.start_index
            {
                out.push(PresentationCommand::text_style(
                    ctx.range(element.start_index, element.end_index - 1),
                    TextStyleUpdate {
                        weighted_font_family: Some(WeightedFontFamily {
                            font_family: self.heading_font.clone(),
                            weight: self.heading_weight,
                        }),
                        ..Default::default()
                    },
                ));
            }
        }
    }

    fn paragraph_spacing(&self, ctx: &TabContext<'_>, out: &mut Vec<PresentationCommand>) {
        for element in ctx.elements() {
            if matches!(element.kind(), ElementKind::Paragraph(_))
                && element.end_index > element.start_index
            {
                out.push(PresentationCommand::paragraph_style(
                    ctx.range(element.start_index, element.end_index),
                    ParagraphStyleUpdate {
                        space_below: Some(Dimension::pt(self.paragraph_space_below_pt)),
                    },
                ));
            }
        }
    }

    fn table_borders(&self, ctx: &TabContext<'_>, color: RgbColor, out: &mut Vec<PresentationCommand>) {
        for (element, table) in ctx.tables() {
            if table.rows == 0 || table.columns == 0 {
                continue;
            }
            let style = TableCellStyleUpdate {
                content_alignment: Some("MIDDLE"),
                ..Default::default()
            }
            .with_borders(TableCellBorder::solid(color.clone(), self.border_width_pt));
            out.push(PresentationCommand::table_cell_style(
                TableRange::whole(ctx.location(element.start_index), table.rows, table.columns),
                style,
            ));
        }
    }

    fn table_header(&self, ctx: &TabContext<'_>, color: RgbColor, out: &mut Vec<PresentationCommand>) {
        for (element, table) in ctx.tables() {
            if table.rows == 0 || table.columns == 0 {
                continue;
            }
            out.push(PresentationCommand::table_cell_style(
                TableRange::whole(ctx.location(element.start_index), 1, table.columns),
                TableCellStyleUpdate {
                    background_color: Some(color.clone().into()),
                    ..Default::default()
                },
            ));

            if !self.header_bold {
                continue;
            }
            let Some(header) = table.table_rows.first() else {
                continue;
            };
            for paragraph in header
                .table_cells
                .iter()
                .flat_map(|cell| cell.content.iter())
                .filter(|c| matches!(c.kind(), ElementKind::Paragraph(_)))
            {
                if paragraph.end_index.saturating_sub(1) > paragraph.start_index {
                    out.push(PresentationCommand::text_style(
                        ctx.range(paragraph.start_index, paragraph.end_index - 1),
                        TextStyleUpdate {
                            bold: Some(true),
                            ..Default::default()
                        },
                    ));
                }
            }
        }
    }

    fn table_font(&self, ctx: &TabContext<'_>, out: &mut Vec<PresentationCommand>) {
        for (_, table) in ctx.tables() {
            for paragraph in table
                .table_rows
                .iter()
                .flat_map(|row| row.table_cells.iter())
                .flat_map(|cell| cell.content.iter())
                .filter(|c| matches!(c.kind(), ElementKind::Paragraph(_)))
            {
                if paragraph.end_index.saturating_sub(1) > paragraph.start_index {
                    out.push(PresentationCommand::text_style(
                        ctx.range(paragraph.start_index, paragraph.end_index - 1),
                        TextStyleUpdate {
                            font_size: Some(Dimension::pt(self.table_font_size_pt)),
                            ..Default::default()
                        },
                    ));
                }
            }
        }
    }
}

/// Tab-scoped range construction
struct TabContext<'a> {
    tab: TabContent<'a>,
}

impl<'a> TabContext<'a> {
    fn elements(&self) -> impl Iterator<Item = &'a StructuralElement> {
        self.tab.body.content.iter()
    }

    fn tables(&self) -> impl Iterator<Item = (&'a StructuralElement, &'a Table)> {
        self.elements().filter_map(|e| match e.kind() {
            ElementKind::Table(t) => Some((e, t)),
            _ => None,
        })
    }

    fn range(&self, start: u32, end: u32) -> Range {
        Range {
            tab_id: self.tab.tab_id.map(str::to_string),
            ..Range::new(start, end)
        }
    }

    fn location(&self, index: u32) -> Location {
        Location {
            index,
            tab_id: self.tab.tab_id.map(str::to_string),
        }
    }
}

fn parse_color(hex: &str, setting: &str) -> Option<RgbColor> {
    let color = RgbColor::from_hex(hex);
    if color.is_none() {
        log::warn!("Invalid {} {:?}; expected #rrggbb", setting, hex);
    }
    color
}
