//! Type definitions for cell values and cell addressing

use std::fmt;

/// Highest row number a worksheet may address (1-based)
pub const MAX_ROW: u32 = 1_048_576;
/// Highest column number a worksheet may address (1-based, "XFD")
pub const MAX_COL: u32 = 16_384;

/// Represents a single cell value in a worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Formula value (e.g., "=SUM(A1:A10)" or "=R[-1]C*2").
    /// The formula must start with '=' and use Excel formula syntax.
    Formula(String),
    /// Date value - raw calendar text or UNIX timestamp digits, converted
    /// to a whole-day serial number when written
    Date(String),
    /// DateTime value - converted to a fractional serial number when written
    DateTime(String),
    /// Reference into the shared-string table by index
    SharedStringRef(u32),
}

/// Declared cell type driving the encoder's branch selection.
///
/// `Auto` runs the numeric-literal detection and falls back to an inline
/// string; the other variants force a branch (with date conversion failures
/// degrading back to `Auto`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Infer numeric vs. string from the value itself
    Auto,
    /// Numeric cell
    Numeric,
    /// Inline string cell
    Text,
    /// Date serial (truncated to whole days)
    Date,
    /// Date-time serial (fractional days preserved)
    DateTime,
    /// Index into the shared-string table
    SharedString,
}

impl CellValue {
    /// The type the encoder assumes when no column type is declared
    pub fn default_type(&self) -> ValueType {
        match self {
            CellValue::Int(_) | CellValue::Float(_) => ValueType::Numeric,
            CellValue::Date(_) => ValueType::Date,
            CellValue::DateTime(_) => ValueType::DateTime,
            CellValue::SharedStringRef(_) => ValueType::SharedString,
            _ => ValueType::Auto,
        }
    }

    /// Convert cell value to its raw string form
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Formula(f) => f.clone(),
            CellValue::Date(d) => d.clone(),
            CellValue::DateTime(d) => d.clone(),
            CellValue::SharedStringRef(i) => i.to_string(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

/// Convert a 1-based column number to its letter form (1 -> A, 26 -> Z, 27 -> AA)
pub fn col_letter(col: u32) -> String {
    let mut col_str = String::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        col_str.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    col_str
}

/// Build an "A1"-style address from 1-based row and column numbers.
///
/// Returns `None` when either component is zero or outside the sheet limits,
/// so callers can leave unresolvable references untouched.
pub fn cell_address(row: u32, col: u32) -> Option<String> {
    if row == 0 || row > MAX_ROW || col == 0 || col > MAX_COL {
        return None;
    }
    Some(format!("{}{}", col_letter(col), row))
}

/// Build a "$A$1"-style absolute address, used in defined names
pub fn cell_address_abs(row: u32, col: u32) -> Option<String> {
    if row == 0 || row > MAX_ROW || col == 0 || col > MAX_COL {
        return None;
    }
    Some(format!("${}${}", col_letter(col), row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_address() {
        assert_eq!(cell_address(1, 1).unwrap(), "A1");
        assert_eq!(cell_address(1, 26).unwrap(), "Z1");
        assert_eq!(cell_address(1, 27).unwrap(), "AA1");
        assert_eq!(cell_address(100, 1).unwrap(), "A100");
        assert_eq!(cell_address(1, MAX_COL).unwrap(), "XFD1");
    }

    #[test]
    fn test_cell_address_out_of_range() {
        assert!(cell_address(0, 1).is_none());
        assert!(cell_address(1, 0).is_none());
        assert!(cell_address(MAX_ROW + 1, 1).is_none());
        assert!(cell_address(1, MAX_COL + 1).is_none());
    }

    #[test]
    fn test_absolute_address() {
        assert_eq!(cell_address_abs(3, 2).unwrap(), "$B$3");
    }

    #[test]
    fn test_default_types() {
        assert_eq!(CellValue::Int(1).default_type(), ValueType::Numeric);
        assert_eq!(
            CellValue::String("x".into()).default_type(),
            ValueType::Auto
        );
        assert_eq!(
            CellValue::Date("2024-01-01".into()).default_type(),
            ValueType::Date
        );
        assert_eq!(CellValue::SharedStringRef(4).default_type(), ValueType::SharedString);
    }
}
