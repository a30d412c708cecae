//! Typed cell encoding into worksheet XML fragments
//!
//! One `<c>` element is appended to the sheet's body part per call. The
//! declared [`ValueType`] picks the branch; `Auto` infers numeric vs. string
//! from the value text, and a failed date conversion degrades to `Auto`
//! instead of failing the document.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SheetError};
use crate::types::{cell_address, CellValue, ValueType};

use super::formula;
use super::part::PartWriter;
use super::shared_strings::SharedStrings;
use super::serial_date;
use super::xml;

// "0" is numeric but any other leading-zero digit string is kept as text so
// values like zip codes and identifiers survive round-tripping.
static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?(0|[1-9]\d*)(\.\d+)?$").unwrap());

fn is_numeric_literal(value: &str) -> bool {
    value == "0"
        || (!value.starts_with('0') && INT_RE.is_match(value))
        || DECIMAL_RE.is_match(value)
}

/// Mutable per-document context threaded through every cell write
pub struct EncodeContext<'a> {
    pub shared_strings: &'a mut SharedStrings,
    pub functions: Option<&'a IndexMap<String, String>>,
}

/// Append one cell element for `value` at the 1-based (row, col) position
pub fn write_cell(
    part: &mut PartWriter,
    row: u32,
    col: u32,
    value: &CellValue,
    vtype: ValueType,
    style_idx: u32,
    ctx: &mut EncodeContext<'_>,
) -> Result<()> {
    let cell_name = cell_address(row, col)
        .ok_or_else(|| SheetError::InvalidCell(format!("row {row}, col {col}")))?;

    // empty cell: only the style survives, no matter the declared type
    let raw = value.as_string();
    if value.is_empty() || raw.is_empty() {
        part.write(&format!("<c r=\"{cell_name}\" s=\"{style_idx}\"/>"))?;
        return Ok(());
    }

    // formulas are recognized solely by the leading '='
    if raw.starts_with('=') {
        let translated = formula::translate(&raw, row, col, ctx.functions);
        part.write(&format!(
            "<c r=\"{cell_name}\" s=\"{style_idx}\" t=\"s\"><f>{}</f></c>",
            xml::escape(&translated)
        ))?;
        return Ok(());
    }

    match vtype {
        ValueType::SharedString => {
            let index = match value {
                CellValue::SharedStringRef(i) => *i,
                CellValue::String(s) => ctx.shared_strings.add(s),
                CellValue::Int(i) if *i >= 0 => *i as u32,
                _ => return write_auto(part, &cell_name, value, &raw, style_idx),
            };
            part.write(&format!(
                "<c r=\"{cell_name}\" s=\"{style_idx}\" t=\"s\"><v>{index}</v></c>"
            ))?;
            Ok(())
        }
        ValueType::Text => write_inline_string(part, &cell_name, style_idx, &raw),
        ValueType::Numeric => {
            match value {
                CellValue::Int(_) | CellValue::Float(_) => part.write(&format!(
                    "<c r=\"{cell_name}\" s=\"{style_idx}\"><v>{raw}</v></c>"
                ))?,
                _ if raw.parse::<f64>().is_err() => {
                    return write_inline_string(part, &cell_name, style_idx, &raw)
                }
                _ => part.write(&format!(
                    "<c r=\"{cell_name}\" s=\"{style_idx}\"><v>{}</v></c>",
                    xml::escape(&raw)
                ))?,
            }
            Ok(())
        }
        ValueType::Date | ValueType::DateTime => {
            match serial_date::convert_date_time(&raw) {
                Some(serial) if vtype == ValueType::Date => {
                    part.write(&format!(
                        "<c r=\"{cell_name}\" s=\"{style_idx}\"><v>{}</v></c>",
                        serial.trunc() as i64
                    ))?;
                    Ok(())
                }
                Some(serial) => {
                    part.write(&format!(
                        "<c r=\"{cell_name}\" s=\"{style_idx}\" t=\"n\"><v>{serial}</v></c>"
                    ))?;
                    Ok(())
                }
                // unparseable date degrades to auto-detection
                None => write_auto(part, &cell_name, value, &raw, style_idx),
            }
        }
        ValueType::Auto => write_auto(part, &cell_name, value, &raw, style_idx),
    }
}

fn write_auto(
    part: &mut PartWriter,
    cell_name: &str,
    value: &CellValue,
    raw: &str,
    style_idx: u32,
) -> Result<()> {
    let already_numeric = matches!(value, CellValue::Int(_) | CellValue::Float(_));
    if already_numeric || is_numeric_literal(raw) {
        part.write(&format!(
            "<c r=\"{cell_name}\" s=\"{style_idx}\" t=\"n\"><v>{raw}</v></c>"
        ))?;
        return Ok(());
    }
    // an escaped "\=" (or "\\=") marks a literal string that merely looks
    // like a formula; one backslash is consumed
    let text = raw
        .strip_prefix('\\')
        .filter(|rest| rest.starts_with('=') || rest.starts_with("\\="))
        .unwrap_or(raw);
    write_inline_string(part, cell_name, style_idx, text)
}

fn write_inline_string(
    part: &mut PartWriter,
    cell_name: &str,
    style_idx: u32,
    text: &str,
) -> Result<()> {
    part.write(&format!(
        "<c r=\"{cell_name}\" s=\"{style_idx}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
        xml::escape(text)
    ))?;
    Ok(())
}
