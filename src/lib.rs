//! # sheetstream
//!
//! A streaming XLSX writer: rows are encoded to worksheet XML as they
//! arrive and spooled to temporary files, so workbook size is bounded by
//! disk, not memory.
//!
//! ## Features
//!
//! - **Streaming Write**: Write millions of rows with constant memory usage
//! - **Formula Support**: R1C1 relative references rewritten to A1 form
//! - **Typed Cells**: Numeric auto-detection, date serials, shared strings
//! - **Styles**: Fonts, fills, borders, number formats with deduplication
//! - **Layout**: Merged cells, frozen panes, column widths, autofilters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheetstream::{CellValue, Style, Workbook};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut workbook = Workbook::new()?;
//! let header = workbook.add_style(&Style::new().bold());
//! workbook.add_sheet("Sales")?;
//! workbook.write_row_with_style(
//!     &[CellValue::from("Region"), CellValue::from("Total")],
//!     header,
//! )?;
//! workbook.write_row(&[CellValue::from("North"), CellValue::Float(1520.75)])?;
//! workbook.write_row(&[
//!     CellValue::Empty,
//!     CellValue::Formula("=SUM(B2:B2)".to_string()),
//! ])?;
//! workbook.save("sales.xlsx")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Dates
//!
//! Date cells accept calendar text ("2024-01-15", "2024-01-15 08:30:00")
//! or UNIX timestamp digits and are written as 1900-epoch serial numbers.
//! Pair them with a date number format to have viewers render them as
//! dates:
//!
//! ```rust,no_run
//! use sheetstream::{CellValue, Style, Workbook};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut workbook = Workbook::new()?;
//! let date_style = workbook.add_style(&Style::new().format("YYYY-MM-DD"));
//! workbook.add_sheet("Log")?;
//! workbook.write_row_styled(&[(
//!     CellValue::Date("2024-01-15".to_string()),
//!     date_style,
//! )])?;
//! workbook.save("log.xlsx")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod sheet;
pub mod style;
pub mod types;
pub mod workbook;
pub mod writer;

pub use error::{Result, SheetError};
pub use sheet::Sheet;
pub use style::{Border, BorderSide, CellFormat, Fill, Font, Style};
pub use types::{cell_address, col_letter, CellValue, ValueType, MAX_COL, MAX_ROW};
pub use workbook::{Metadata, Workbook};
