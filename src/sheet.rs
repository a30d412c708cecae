//! Worksheet state: extents, layout options and the streamed body part

use std::collections::{BTreeMap, HashMap};

use crate::types::{cell_address, ValueType};
use crate::writer::part::PartWriter;

/// One worksheet being streamed.
///
/// Row data is appended to `body` as it arrives; the header (which needs
/// the final extents) is generated at close time and spliced in front.
pub struct Sheet {
    pub(crate) name: String,
    pub(crate) xml_name: String,
    pub(crate) body: Option<PartWriter>,
    pub(crate) row_count: u32,
    pub(crate) col_count: u32,
    pub(crate) col_widths: BTreeMap<u32, f64>,
    pub(crate) col_types: HashMap<u32, ValueType>,
    pub(crate) merged_cells: Vec<String>,
    pub(crate) freeze_rows: u32,
    pub(crate) freeze_columns: u32,
    /// 1-based header row the autofilter starts at
    pub(crate) auto_filter_row: Option<u32>,
    pub(crate) page_fit: bool,
    pub(crate) page_orientation: String,
    pub(crate) right_to_left: bool,
    pub(crate) closed: bool,
}

impl Sheet {
    pub(crate) fn new(name: &str, index: usize) -> Self {
        Sheet {
            name: sanitize_sheet_name(name, index),
            xml_name: format!("sheet{index}.xml"),
            body: None,
            row_count: 0,
            col_count: 0,
            col_widths: BTreeMap::new(),
            col_types: HashMap::new(),
            merged_cells: Vec::new(),
            freeze_rows: 0,
            freeze_columns: 0,
            auto_filter_row: None,
            page_fit: false,
            page_orientation: "portrait".to_string(),
            right_to_left: false,
            closed: false,
        }
    }

    /// Sheet name as written into workbook.xml
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rows written so far
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Widest row written so far
    pub fn col_count(&self) -> u32 {
        self.col_count
    }

    /// Set the width of a column (0-based index)
    pub fn set_col_width(&mut self, col: u32, width: f64) {
        self.col_widths.insert(col, width);
    }

    /// Declare the cell type of a column (0-based index), overriding
    /// per-value inference
    pub fn set_col_type(&mut self, col: u32, vtype: ValueType) {
        self.col_types.insert(col, vtype);
    }

    /// Record a merged range, e.g. "A1:C1"
    pub fn merge_cells(&mut self, range: &str) {
        self.merged_cells.push(range.to_string());
    }

    /// Freeze the given number of leading rows and columns
    pub fn freeze_panes(&mut self, rows: u32, columns: u32) {
        self.freeze_rows = rows;
        self.freeze_columns = columns;
    }

    /// Enable an autofilter across the data, headed at the given 1-based row
    pub fn set_auto_filter(&mut self, header_row: u32) {
        self.auto_filter_row = Some(header_row.max(1));
    }

    /// Scale the printout to fit the page
    pub fn set_page_fit(&mut self, fit: bool) {
        self.page_fit = fit;
    }

    /// Page orientation, "portrait" or "landscape"
    pub fn set_page_orientation(&mut self, orientation: &str) {
        self.page_orientation = orientation.to_string();
    }

    pub fn set_right_to_left(&mut self, rtl: bool) {
        self.right_to_left = rtl;
    }

    /// Bottom-right cell of the written extent
    pub(crate) fn max_cell(&self) -> String {
        cell_address(self.row_count.max(1), self.col_count.max(1))
            .unwrap_or_else(|| "A1".to_string())
    }
}

/// Strip characters a sheet name may not contain and cap the length.
///
/// Falls back to "SheetN" when nothing printable remains.
pub(crate) fn sanitize_sheet_name(name: &str, index: usize) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if matches!(c, '\\' | '/' | '?' | '*' | ':' | '[' | ']') {
                ' '
            } else {
                c
            }
        })
        .take(31)
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim().to_string();
    if cleaned.is_empty() {
        format!("Sheet{index}")
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Data", 1), "Data");
        assert_eq!(sanitize_sheet_name("a/b:c", 1), "a b c");
        assert_eq!(sanitize_sheet_name("'quoted'", 1), "quoted");
        assert_eq!(sanitize_sheet_name("[]", 2), "Sheet2");
        let long = "x".repeat(60);
        assert_eq!(sanitize_sheet_name(&long, 1).chars().count(), 31);
    }

    #[test]
    fn test_max_cell() {
        let mut sheet = Sheet::new("S", 1);
        assert_eq!(sheet.max_cell(), "A1");
        sheet.row_count = 10;
        sheet.col_count = 3;
        assert_eq!(sheet.max_cell(), "C10");
    }
}
