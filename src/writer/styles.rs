//! Styles part (`xl/styles.xml`) assembly
//!
//! The SpreadsheetML schema mandates exact child ordering inside this part;
//! viewers reject or silently reinterpret documents that get it wrong:
//! custom number formats start at id 164, a patternFill's fgColor must
//! precede bgColor, and border children always appear as left, right, top,
//! bottom, diagonal.

use crate::style::{Border, BorderSide, CellFormat, Fill, Font, StyleTables};

use super::xml;

/// Base id for custom number formats; 0..163 are reserved for builtins
const CUSTOM_NUM_FMT_BASE: u32 = 164;

/// Build the complete styleSheet part from the populated style tables
pub fn build_styles_xml(tables: &StyleTables) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    out.push_str(
        "<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">",
    );

    write_num_fmts(&mut out, tables);
    write_fonts(&mut out, tables);
    write_fills(&mut out, tables);
    write_borders(&mut out, tables);

    out.push_str("<cellStyleXfs count=\"1\">");
    out.push_str("<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/>");
    out.push_str("</cellStyleXfs>");

    write_cell_xfs(&mut out, tables);

    // exactly one default "Normal" style, always present
    out.push_str("<cellStyles count=\"1\">");
    out.push_str("<cellStyle builtinId=\"0\" customBuiltin=\"false\" name=\"Normal\" xfId=\"0\"/>");
    out.push_str("</cellStyles>");
    out.push_str("<dxfs count=\"0\"/>");
    out.push_str(
        "<tableStyles count=\"0\" defaultTableStyle=\"TableStyleMedium2\" defaultPivotStyle=\"PivotStyleLight16\"/>",
    );
    out.push_str("</styleSheet>");
    out
}

fn write_num_fmts(out: &mut String, tables: &StyleTables) {
    let formats = tables.number_formats();
    if formats.is_empty() {
        out.push_str("<numFmts count=\"0\"/>");
        return;
    }
    out.push_str(&format!("<numFmts count=\"{}\">", formats.len()));
    for (num, code) in formats.iter().enumerate() {
        out.push_str(&format!(
            "<numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
            CUSTOM_NUM_FMT_BASE + num as u32,
            xml::escape(code)
        ));
    }
    out.push_str("</numFmts>");
}

fn write_fonts(out: &mut String, tables: &StyleTables) {
    let fonts = tables.fonts();
    out.push_str(&format!("<fonts count=\"{}\">", fonts.len()));
    for font in fonts {
        write_font(out, font);
    }
    out.push_str("</fonts>");
}

fn write_font(out: &mut String, font: &Font) {
    out.push_str("<font>");
    out.push_str(&format!(
        "<name val=\"{}\"/><charset val=\"1\"/><family val=\"{}\"/>",
        xml::escape(&font.name),
        font.family
    ));
    out.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if let Some(color) = &font.color {
        out.push_str(&format!("<color rgb=\"{}\"/>", xml::escape(color)));
    }
    if font.bold {
        out.push_str("<b val=\"true\"/>");
    }
    if font.italic {
        out.push_str("<i val=\"true\"/>");
    }
    if font.underline {
        out.push_str("<u val=\"single\"/>");
    }
    if font.strike {
        out.push_str("<strike val=\"true\"/>");
    }
    out.push_str("</font>");
}

fn write_fills(out: &mut String, tables: &StyleTables) {
    let fills = tables.fills();
    out.push_str(&format!("<fills count=\"{}\">", fills.len()));
    for fill in fills {
        write_fill(out, fill);
    }
    out.push_str("</fills>");
}

fn write_fill(out: &mut String, fill: &Fill) {
    out.push_str("<fill>");
    // child order matters: fgColor before bgColor, absent colors omitted
    if fill.fg_color.is_none() && fill.bg_color.is_none() {
        out.push_str(&format!(
            "<patternFill patternType=\"{}\"/>",
            xml::escape(&fill.pattern)
        ));
    } else {
        out.push_str(&format!(
            "<patternFill patternType=\"{}\">",
            xml::escape(&fill.pattern)
        ));
        if let Some(fg) = &fill.fg_color {
            out.push_str(&format!("<fgColor rgb=\"{}\"/>", xml::escape(fg)));
        }
        if let Some(bg) = &fill.bg_color {
            out.push_str(&format!("<bgColor rgb=\"{}\"/>", xml::escape(bg)));
        }
        out.push_str("</patternFill>");
    }
    out.push_str("</fill>");
}

fn write_borders(out: &mut String, tables: &StyleTables) {
    let borders = tables.borders();
    out.push_str(&format!("<borders count=\"{}\">", borders.len()));
    for border in borders {
        write_border(out, border);
    }
    out.push_str("</borders>");
}

fn write_border(out: &mut String, border: &Border) {
    out.push_str("<border diagonalDown=\"false\" diagonalUp=\"false\">");
    // fixed side order; diagonal is always present but empty
    write_border_side(out, "left", &border.left);
    write_border_side(out, "right", &border.right);
    write_border_side(out, "top", &border.top);
    write_border_side(out, "bottom", &border.bottom);
    out.push_str("<diagonal/>");
    out.push_str("</border>");
}

fn write_border_side(out: &mut String, side: &str, record: &BorderSide) {
    match (&record.style, &record.color) {
        (None, _) => out.push_str(&format!("<{side}/>")),
        (Some(style), None) => {
            out.push_str(&format!("<{side} style=\"{}\"/>", xml::escape(style)))
        }
        (Some(style), Some(color)) => out.push_str(&format!(
            "<{side} style=\"{}\"><color rgb=\"{}\"/></{side}>",
            xml::escape(style),
            xml::escape(color)
        )),
    }
}

fn write_cell_xfs(out: &mut String, tables: &StyleTables) {
    let formats = tables.cell_formats();
    if formats.is_empty() {
        out.push_str("<cellXfs count=\"1\">");
        out.push_str("<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>");
        out.push_str("</cellXfs>");
        return;
    }
    out.push_str(&format!("<cellXfs count=\"{}\">", formats.len()));
    for format in formats {
        write_xf(out, format);
    }
    out.push_str("</cellXfs>");
}

fn write_xf(out: &mut String, format: &CellFormat) {
    let mut attrs = String::from("applyFont=\"true\" ");
    if format.has_alignment() {
        attrs.push_str("applyAlignment=\"true\" ");
    }
    if format.border_idx.is_some() {
        attrs.push_str("applyBorder=\"true\" ");
    }
    let body = format!(
        "{}borderId=\"{}\" fillId=\"{}\" fontId=\"{}\" numFmtId=\"{}\" xfId=\"{}\"",
        attrs,
        format.border_idx.unwrap_or(0),
        format.fill_idx,
        format.font_idx,
        CUSTOM_NUM_FMT_BASE + format.num_fmt_idx,
        format.xf_id
    );
    if format.has_alignment() {
        let mut alignment = String::new();
        if let Some(horizontal) = &format.horizontal {
            alignment.push_str(&format!(" horizontal=\"{}\"", xml::escape(horizontal)));
        }
        if let Some(vertical) = &format.vertical {
            alignment.push_str(&format!(" vertical=\"{}\"", xml::escape(vertical)));
        }
        if format.wrap {
            alignment.push_str(" wrapText=\"true\"");
        }
        out.push_str(&format!("<xf {body}><alignment{alignment}/></xf>"));
    } else {
        out.push_str(&format!("<xf {body}/>"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Style;

    #[test]
    fn test_default_tables_emit_normal_style() {
        let xml = build_styles_xml(&StyleTables::new());
        assert!(xml.contains("name=\"Normal\""));
        assert!(xml.contains("<cellStyleXfs count=\"1\">"));
        assert!(xml.contains("<cellXfs count=\"1\">"));
        assert!(xml.contains("<fills count=\"2\">"));
        assert!(xml.contains("<fill><patternFill patternType=\"none\"/></fill>"));
        assert!(xml.contains("<fill><patternFill patternType=\"gray125\"/></fill>"));
    }

    #[test]
    fn test_custom_num_fmt_ids_start_at_164() {
        let mut tables = StyleTables::new();
        tables.add_style(&Style::new().format("#,##0.00"));
        let xml = build_styles_xml(&tables);
        assert!(xml.contains("<numFmt numFmtId=\"164\" formatCode=\"GENERAL\"/>"));
        assert!(xml.contains("<numFmt numFmtId=\"165\" formatCode=\"#,##0.00\"/>"));
        assert!(xml.contains("numFmtId=\"165\" xfId=\"0\""));
    }

    #[test]
    fn test_fill_bg_only_has_no_fg_placeholder() {
        let mut tables = StyleTables::new();
        tables.add_style(&Style::new().fill(Fill {
            pattern: "solid".to_string(),
            fg_color: None,
            bg_color: Some("FFFF00".to_string()),
        }));
        tables.add_style(&Style::new().fill(Fill {
            pattern: "solid".to_string(),
            fg_color: Some("FF0000".to_string()),
            bg_color: Some("00FF00".to_string()),
        }));
        let xml = build_styles_xml(&tables);
        assert!(xml.contains(
            "<patternFill patternType=\"solid\"><bgColor rgb=\"FFFF00\"/></patternFill>"
        ));
        // fg before bg when both are present
        assert!(xml.contains(
            "<patternFill patternType=\"solid\"><fgColor rgb=\"FF0000\"/><bgColor rgb=\"00FF00\"/></patternFill>"
        ));
        assert!(!xml.contains("<fgColor/>"));
    }

    #[test]
    fn test_border_side_order_and_diagonal() {
        let mut tables = StyleTables::new();
        let mut border = Border::all(BorderSide::thin());
        border.top.color = Some("FF0000".to_string());
        tables.add_style(&Style::new().border(border));
        let xml = build_styles_xml(&tables);
        assert!(xml.contains(
            "<left style=\"thin\"/><right style=\"thin\"/><top style=\"thin\"><color rgb=\"FF0000\"/></top><bottom style=\"thin\"/><diagonal/>"
        ));
        // default border keeps empty sides in fixed order
        assert!(xml.contains("<left/><right/><top/><bottom/><diagonal/>"));
    }

    #[test]
    fn test_xf_apply_flags() {
        let mut tables = StyleTables::new();
        tables.add_style(&Style::new().align("center").wrap());
        tables.add_style(&Style::new().border(Border::all(BorderSide::thin())));
        let xml = build_styles_xml(&tables);
        assert!(xml.contains(
            "applyFont=\"true\" applyAlignment=\"true\" "
        ));
        assert!(xml.contains("<alignment horizontal=\"center\" wrapText=\"true\"/>"));
        assert!(xml.contains("applyFont=\"true\" applyBorder=\"true\" "));
        // the default xf carries neither conditional flag
        assert!(xml.contains("<xf applyFont=\"true\" borderId=\"0\" fillId=\"0\" fontId=\"0\" numFmtId=\"164\" xfId=\"0\"/>"));
    }
}
