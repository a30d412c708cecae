//! Style records and the deduplicated style tables
//!
//! A cell's `s` attribute is an index into the cell-format table; each
//! cell format in turn references one entry in each of the number-format,
//! font, fill and border tables. All four tables assign indices on first
//! use and keep them stable for the lifetime of the document build.

use indexmap::IndexSet;

/// Font record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    pub name: String,
    pub size: u32,
    pub family: u32,
    /// RGB color, e.g. "FF0000"
    pub color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            name: "Calibri".to_string(),
            size: 11,
            family: 2,
            color: None,
            bold: false,
            italic: false,
            underline: false,
            strike: false,
        }
    }
}

/// Pattern fill record. Child order in the emitted XML is fgColor then
/// bgColor, regardless of which fields are set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fill {
    pub pattern: String,
    pub fg_color: Option<String>,
    pub bg_color: Option<String>,
}

impl Fill {
    pub fn none() -> Self {
        Fill {
            pattern: "none".to_string(),
            fg_color: None,
            bg_color: None,
        }
    }

    /// Mandatory second default fill in the styles part
    pub fn gray125() -> Self {
        Fill {
            pattern: "gray125".to_string(),
            fg_color: None,
            bg_color: None,
        }
    }

    pub fn solid(color: &str) -> Self {
        Fill {
            pattern: "solid".to_string(),
            fg_color: Some(color.to_string()),
            bg_color: None,
        }
    }
}

/// One side of a border
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BorderSide {
    /// Line style, e.g. "thin", "medium", "dashed"
    pub style: Option<String>,
    pub color: Option<String>,
}

impl BorderSide {
    pub fn thin() -> Self {
        BorderSide {
            style: Some("thin".to_string()),
            color: None,
        }
    }
}

/// Border record; the diagonal side is emitted but never configurable
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Border {
    pub left: BorderSide,
    pub right: BorderSide,
    pub top: BorderSide,
    pub bottom: BorderSide,
}

impl Border {
    pub fn all(side: BorderSide) -> Self {
        Border {
            left: side.clone(),
            right: side.clone(),
            top: side.clone(),
            bottom: side,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Border::default()
    }
}

/// Cell format (xf) record composing one index from each style table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellFormat {
    /// Index into the number-format table; emitted as numFmtId 164+index
    pub num_fmt_idx: u32,
    pub font_idx: u32,
    pub fill_idx: u32,
    pub border_idx: Option<u32>,
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap: bool,
    /// Parent style id; 0 references the default "Normal" style
    pub xf_id: u32,
}

impl CellFormat {
    pub fn has_alignment(&self) -> bool {
        self.horizontal.is_some() || self.vertical.is_some() || self.wrap
    }
}

/// User-facing style description, registered with
/// [`crate::Workbook::add_style`] to obtain a cell-format index.
#[derive(Debug, Clone, Default)]
pub struct Style {
    /// Number format code ("#,##0.00", "MM/DD/YYYY", ...); None = General
    pub format: Option<String>,
    pub font: Font,
    pub fill: Fill,
    pub border: Option<Border>,
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap: bool,
}

impl Default for Fill {
    fn default() -> Self {
        Fill::none()
    }
}

impl Style {
    pub fn new() -> Self {
        Style::default()
    }

    pub fn format(mut self, code: &str) -> Self {
        self.format = Some(code.to_string());
        self
    }

    pub fn bold(mut self) -> Self {
        self.font.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.font.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.font.underline = true;
        self
    }

    pub fn strike(mut self) -> Self {
        self.font.strike = true;
        self
    }

    pub fn font_name(mut self, name: &str) -> Self {
        self.font.name = name.to_string();
        self
    }

    pub fn font_size(mut self, size: u32) -> Self {
        self.font.size = size;
        self
    }

    pub fn font_color(mut self, rgb: &str) -> Self {
        self.font.color = Some(rgb.to_string());
        self
    }

    pub fn fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn bg(mut self, rgb: &str) -> Self {
        self.fill = Fill::solid(rgb);
        self
    }

    pub fn border(mut self, border: Border) -> Self {
        self.border = Some(border);
        self
    }

    pub fn align(mut self, horizontal: &str) -> Self {
        self.horizontal = Some(horizontal.to_string());
        self
    }

    pub fn valign(mut self, vertical: &str) -> Self {
        self.vertical = Some(vertical.to_string());
        self
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }
}

/// The four deduplicated style tables plus the cell-format table.
///
/// Index 0 of the cell-format table is the default format every unstyled
/// cell references; fills are seeded with the two pattern fills viewers
/// expect at indices 0 and 1.
pub struct StyleTables {
    number_formats: IndexSet<String>,
    fonts: IndexSet<Font>,
    fills: IndexSet<Fill>,
    borders: IndexSet<Border>,
    cell_formats: IndexSet<CellFormat>,
}

impl StyleTables {
    pub fn new() -> Self {
        let mut tables = StyleTables {
            number_formats: IndexSet::new(),
            fonts: IndexSet::new(),
            fills: IndexSet::new(),
            borders: IndexSet::new(),
            cell_formats: IndexSet::new(),
        };
        tables.fonts.insert(Font::default());
        tables.fills.insert(Fill::none());
        tables.fills.insert(Fill::gray125());
        tables.borders.insert(Border::default());
        tables.add_style(&Style::default());
        tables
    }

    /// Register a style, returning the cell-format index for the `s`
    /// attribute. Identical styles share one index.
    pub fn add_style(&mut self, style: &Style) -> u32 {
        let code = style.format.as_deref().unwrap_or("GENERAL");
        let num_fmt_idx = self.number_formats.insert_full(code.to_string()).0 as u32;
        let font_idx = self.fonts.insert_full(style.font.clone()).0 as u32;
        let fill_idx = self.fills.insert_full(style.fill.clone()).0 as u32;
        let border_idx = style
            .border
            .as_ref()
            .filter(|b| !b.is_empty())
            .map(|b| self.borders.insert_full(b.clone()).0 as u32);
        let format = CellFormat {
            num_fmt_idx,
            font_idx,
            fill_idx,
            border_idx,
            horizontal: style.horizontal.clone(),
            vertical: style.vertical.clone(),
            wrap: style.wrap,
            xf_id: 0,
        };
        self.cell_formats.insert_full(format).0 as u32
    }

    pub fn number_formats(&self) -> &IndexSet<String> {
        &self.number_formats
    }

    pub fn fonts(&self) -> &IndexSet<Font> {
        &self.fonts
    }

    pub fn fills(&self) -> &IndexSet<Fill> {
        &self.fills
    }

    pub fn borders(&self) -> &IndexSet<Border> {
        &self.borders
    }

    pub fn cell_formats(&self) -> &IndexSet<CellFormat> {
        &self.cell_formats
    }
}

impl Default for StyleTables {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_index_zero() {
        let tables = StyleTables::new();
        assert_eq!(tables.cell_formats().len(), 1);
        assert_eq!(tables.fonts().len(), 1);
        assert_eq!(tables.fills().len(), 2);
        assert_eq!(tables.borders().len(), 1);
    }

    #[test]
    fn test_first_use_deduplication() {
        let mut tables = StyleTables::new();
        let bold = Style::new().bold();
        let idx1 = tables.add_style(&bold);
        let idx2 = tables.add_style(&Style::new().bold());
        assert_eq!(idx1, 1);
        assert_eq!(idx2, idx1);
        // same font as default except bold, so a second font entry exists
        assert_eq!(tables.fonts().len(), 2);
    }

    #[test]
    fn test_distinct_styles_get_distinct_indices() {
        let mut tables = StyleTables::new();
        let a = tables.add_style(&Style::new().format("#,##0.00"));
        let b = tables.add_style(&Style::new().format("0.00%"));
        assert_ne!(a, b);
        assert_eq!(tables.number_formats().len(), 3); // GENERAL + two customs
    }

    #[test]
    fn test_empty_border_not_interned() {
        let mut tables = StyleTables::new();
        tables.add_style(&Style::new().border(Border::default()));
        assert_eq!(tables.borders().len(), 1);
    }
}
