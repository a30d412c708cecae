//! Workbook model and the streaming row-writing API
//!
//! The workbook owns every piece of shared mutable state a cell write can
//! touch: the shared-string table, the style tables and the temp-file
//! store. Rows stream straight into the current sheet's body part; nothing
//! is buffered per sheet beyond a small write buffer.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use crate::style::{Style, StyleTables};
use crate::types::CellValue;
use crate::writer::cell::{self, EncodeContext};
use crate::writer::package;
use crate::writer::part::{PartWriter, TempStore};
use crate::writer::shared_strings::SharedStrings;

/// Document properties written into docProps/core.xml and app.xml
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub subject: String,
    pub author: String,
    pub company: String,
    pub description: String,
    pub keywords: Vec<String>,
}

/// Streaming workbook writer
///
/// # Examples
///
/// ```no_run
/// use sheetstream::{CellValue, Workbook};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut workbook = Workbook::new()?;
/// workbook.add_sheet("Report")?;
/// workbook.write_row(&[
///     CellValue::String("Total".to_string()),
///     CellValue::Int(42),
///     CellValue::Formula("=R[0]C[-1]*2".to_string()),
/// ])?;
/// workbook.save("report.xlsx")?;
/// # Ok(())
/// # }
/// ```
pub struct Workbook {
    pub(crate) temp: TempStore,
    pub(crate) sheets: Vec<Sheet>,
    pub(crate) current: Option<usize>,
    pub(crate) shared_strings: SharedStrings,
    pub(crate) styles: StyleTables,
    pub(crate) functions: Option<IndexMap<String, String>>,
    pub(crate) metadata: Metadata,
}

impl Workbook {
    /// Create a new workbook. Fails when no temporary directory can be
    /// created for part streaming.
    pub fn new() -> Result<Self> {
        Ok(Workbook {
            temp: TempStore::new()?,
            sheets: Vec::new(),
            current: None,
            shared_strings: SharedStrings::new(),
            styles: StyleTables::new(),
            functions: None,
            metadata: Metadata::default(),
        })
    }

    /// Add a worksheet and make it current
    pub fn add_sheet(&mut self, name: &str) -> Result<()> {
        let index = self.sheets.len() + 1;
        let mut sheet = Sheet::new(name, index);
        let mut body = PartWriter::create(&mut self.temp)?;
        body.write("<sheetData>")?;
        sheet.body = Some(body);
        self.sheets.push(sheet);
        self.current = Some(self.sheets.len() - 1);
        Ok(())
    }

    /// The sheet currently being written
    pub fn current_sheet_mut(&mut self) -> Result<&mut Sheet> {
        let index = self
            .current
            .ok_or_else(|| SheetError::WriteError("No active worksheet".to_string()))?;
        Ok(&mut self.sheets[index])
    }

    /// Write a row of values with the default style
    pub fn write_row(&mut self, cells: &[CellValue]) -> Result<()> {
        self.write_row_internal(cells, None)
    }

    /// Write a row where each cell carries a style index from [`Self::add_style`]
    pub fn write_row_styled(&mut self, cells: &[(CellValue, u32)]) -> Result<()> {
        let values: Vec<CellValue> = cells.iter().map(|(v, _)| v.clone()).collect();
        let styles: Vec<u32> = cells.iter().map(|(_, s)| *s).collect();
        self.write_row_internal(&values, Some(&styles))
    }

    /// Write a row applying one style index to every cell
    pub fn write_row_with_style(&mut self, cells: &[CellValue], style_idx: u32) -> Result<()> {
        let styles = vec![style_idx; cells.len()];
        self.write_row_internal(cells, Some(&styles))
    }

    fn write_row_internal(&mut self, cells: &[CellValue], styles: Option<&[u32]>) -> Result<()> {
        let index = self
            .current
            .ok_or_else(|| SheetError::WriteError("No active worksheet".to_string()))?;
        let sheet = &mut self.sheets[index];
        if sheet.closed {
            return Err(SheetError::WriteError(format!(
                "Worksheet '{}' is already sealed",
                sheet.name
            )));
        }
        let part = sheet
            .body
            .as_mut()
            .ok_or_else(|| SheetError::WriteError("No active worksheet".to_string()))?;

        sheet.row_count += 1;
        let row_num = sheet.row_count;

        let mut buf = itoa::Buffer::new();
        part.write("<row r=\"")?;
        part.write(buf.format(row_num))?;
        part.write("\">")?;

        let mut ctx = EncodeContext {
            shared_strings: &mut self.shared_strings,
            functions: self.functions.as_ref(),
        };
        for (col_idx, value) in cells.iter().enumerate() {
            let vtype = sheet
                .col_types
                .get(&(col_idx as u32))
                .copied()
                .unwrap_or_else(|| value.default_type());
            let style_idx = styles.map_or(0, |s| s[col_idx]);
            cell::write_cell(
                part,
                row_num,
                col_idx as u32 + 1,
                value,
                vtype,
                style_idx,
                &mut ctx,
            )?;
        }
        part.write("</row>")?;

        sheet.col_count = sheet.col_count.max(cells.len() as u32);
        Ok(())
    }

    /// Register a style; the returned index is valid for every sheet
    pub fn add_style(&mut self, style: &Style) -> u32 {
        self.styles.add_style(style)
    }

    /// Install a localized-to-English function-name table used when
    /// rewriting formulas
    pub fn set_locale_functions(&mut self, functions: IndexMap<String, String>) {
        self.functions = Some(functions);
    }

    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name().to_string()).collect()
    }

    /// Finalize every sheet and package the document at `path`.
    ///
    /// Fails fast when the output directory is missing, an existing file
    /// cannot be replaced, or no worksheet was added. All temporary part
    /// files are removed when the workbook is dropped, error or not.
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        package::save(self, path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_without_sheet_fails() {
        let mut workbook = Workbook::new().unwrap();
        let err = workbook.write_row(&[CellValue::Int(1)]).unwrap_err();
        assert!(err.to_string().contains("No active worksheet"));
    }

    #[test]
    fn test_row_and_col_extents() {
        let mut workbook = Workbook::new().unwrap();
        workbook.add_sheet("Data").unwrap();
        workbook
            .write_row(&[CellValue::Int(1), CellValue::Int(2), CellValue::Int(3)])
            .unwrap();
        workbook.write_row(&[CellValue::Int(1)]).unwrap();
        let sheet = &workbook.sheets[0];
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.col_count(), 3);
    }

    #[test]
    fn test_add_sheet_switches_current() {
        let mut workbook = Workbook::new().unwrap();
        workbook.add_sheet("First").unwrap();
        workbook.write_row(&[CellValue::Int(1)]).unwrap();
        workbook.add_sheet("Second").unwrap();
        workbook.write_row(&[CellValue::Int(2)]).unwrap();
        assert_eq!(workbook.sheets[0].row_count(), 1);
        assert_eq!(workbook.sheets[1].row_count(), 1);
        assert_eq!(workbook.sheet_names(), vec!["First", "Second"]);
    }

    #[test]
    fn test_style_indices_shared_across_sheets() {
        let mut workbook = Workbook::new().unwrap();
        let bold = workbook.add_style(&Style::new().bold());
        let again = workbook.add_style(&Style::new().bold());
        assert_eq!(bold, again);
        assert_eq!(bold, 1); // 0 is the default format
    }
}
