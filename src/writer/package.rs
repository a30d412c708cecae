//! Final document assembly: worksheet finalization and ZIP packaging
//!
//! Each worksheet body was streamed to a temp part while rows arrived. At
//! save time the deferred header (dimension, panes, column widths) is built
//! from the now-known extents, spliced in front of the body, and every part
//! is packed into the OPC container with the deflate method.

use std::fs::File;
use std::io;
use std::path::Path;

use chrono::Utc;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use crate::types::{cell_address, cell_address_abs};
use crate::workbook::{Metadata, Workbook};

use super::part::{PartWriter, TempStore};
use super::styles;
use super::xml;

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// Finalize every sheet and write the document to `path`
pub fn save(mut workbook: Workbook, path: &Path) -> Result<()> {
    if workbook.sheets.is_empty() {
        return Err(SheetError::NoWorksheets);
    }
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.is_dir() {
            return Err(SheetError::OutputDirMissing(dir.to_path_buf()));
        }
    }
    if path.exists() {
        std::fs::remove_file(path)
            .map_err(|_| SheetError::FileNotWritable(path.to_path_buf()))?;
    }

    for sheet in &mut workbook.sheets {
        finish_sheet(sheet, &mut workbook.temp)?;
    }

    let file = File::create(path).map_err(|_| SheetError::FileNotWritable(path.to_path_buf()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(6));

    let shared = workbook.shared_strings.to_xml();

    zip.start_file("docProps/app.xml", options)?;
    io::Write::write_all(&mut zip, build_app_props(&workbook.metadata).as_bytes())?;

    zip.start_file("docProps/core.xml", options)?;
    io::Write::write_all(&mut zip, build_core_props(&workbook.metadata).as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    io::Write::write_all(&mut zip, build_root_rels().as_bytes())?;

    zip.start_file("xl/workbook.xml", options)?;
    io::Write::write_all(&mut zip, build_workbook_xml(&workbook.sheets).as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    io::Write::write_all(
        &mut zip,
        build_workbook_rels(&workbook.sheets, shared.is_some()).as_bytes(),
    )?;

    zip.start_file("xl/styles.xml", options)?;
    io::Write::write_all(&mut zip, styles::build_styles_xml(&workbook.styles).as_bytes())?;

    for sheet in &workbook.sheets {
        zip.start_file(format!("xl/worksheets/{}", sheet.xml_name), options)?;
        let part = sheet
            .body
            .as_ref()
            .ok_or_else(|| SheetError::WriteError(format!("Worksheet '{}' has no part", sheet.name)))?;
        let mut source = File::open(part.path())?;
        io::copy(&mut source, &mut zip)?;
    }

    if let Some(sst) = &shared {
        zip.start_file("xl/sharedStrings.xml", options)?;
        io::Write::write_all(&mut zip, sst.as_bytes())?;
    }

    zip.start_file("[Content_Types].xml", options)?;
    io::Write::write_all(
        &mut zip,
        build_content_types(&workbook.sheets, shared.is_some()).as_bytes(),
    )?;

    zip.finish()?;
    Ok(())
}

/// Close the streamed body with the worksheet footer, then build the header
/// from the final extents and splice the two parts.
fn finish_sheet(sheet: &mut Sheet, store: &mut TempStore) -> Result<()> {
    if sheet.closed {
        return Ok(());
    }
    let mut body = sheet
        .body
        .take()
        .ok_or_else(|| SheetError::WriteError(format!("Worksheet '{}' has no part", sheet.name)))?;

    body.write("</sheetData>")?;
    write_footer(&mut body, sheet)?;
    body.close()?;

    let mut head = PartWriter::create(store)?;
    write_header(&mut head, sheet)?;

    let full = head.append_part(body, store)?;
    sheet.body = Some(full);
    sheet.closed = true;
    Ok(())
}

fn write_footer(part: &mut PartWriter, sheet: &Sheet) -> Result<()> {
    if let Some(header_row) = sheet.auto_filter_row {
        part.write(&format!(
            "<autoFilter ref=\"A{}:{}\"/>",
            header_row,
            sheet.max_cell()
        ))?;
    }
    if !sheet.merged_cells.is_empty() {
        part.write(&format!("<mergeCells count=\"{}\">", sheet.merged_cells.len()))?;
        for range in &sheet.merged_cells {
            part.write(&format!("<mergeCell ref=\"{}\"/>", xml::escape(range)))?;
        }
        part.write("</mergeCells>")?;
    }
    part.write("<printOptions headings=\"false\" gridLines=\"false\" gridLinesSet=\"true\" horizontalCentered=\"false\" verticalCentered=\"false\"/>")?;
    part.write("<pageMargins left=\"0.5\" right=\"0.5\" top=\"1.0\" bottom=\"1.0\" header=\"0.5\" footer=\"0.5\"/>")?;
    if sheet.page_fit {
        part.write(&format!(
            "<pageSetup blackAndWhite=\"false\" cellComments=\"none\" copies=\"1\" draft=\"false\" firstPageNumber=\"1\" fitToHeight=\"0\" fitToWidth=\"1\" horizontalDpi=\"300\" orientation=\"{}\" pageOrder=\"downThenOver\" paperSize=\"1\" useFirstPageNumber=\"true\" usePrinterDefaults=\"false\" verticalDpi=\"300\"/>",
            xml::escape(&sheet.page_orientation)
        ))?;
    } else {
        part.write(&format!(
            "<pageSetup blackAndWhite=\"false\" cellComments=\"none\" copies=\"1\" draft=\"false\" firstPageNumber=\"1\" horizontalDpi=\"300\" orientation=\"{}\" pageOrder=\"downThenOver\" paperSize=\"1\" scale=\"100\" useFirstPageNumber=\"true\" usePrinterDefaults=\"false\" verticalDpi=\"300\"/>",
            xml::escape(&sheet.page_orientation)
        ))?;
    }
    part.write("<headerFooter differentFirst=\"false\" differentOddEven=\"false\"><oddHeader/><oddFooter/></headerFooter>")?;
    part.write("</worksheet>")?;
    Ok(())
}

fn write_header(part: &mut PartWriter, sheet: &Sheet) -> Result<()> {
    part.write(XML_DECL)?;
    part.write(
        "<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
    )?;
    part.write(&format!(
        "<sheetPr filterMode=\"false\"><pageSetUpPr fitToPage=\"{}\"/></sheetPr>",
        sheet.page_fit
    ))?;

    // dimension covers the written extent; an untouched sheet claims A1
    if sheet.row_count() == 0 || sheet.col_count() == 0 {
        part.write("<dimension ref=\"A1\"/>")?;
    } else {
        part.write(&format!("<dimension ref=\"A1:{}\"/>", sheet.max_cell()))?;
    }

    write_sheet_view(part, sheet)?;
    write_cols(part, sheet)?;
    Ok(())
}

fn write_sheet_view(part: &mut PartWriter, sheet: &Sheet) -> Result<()> {
    part.write("<sheetViews>")?;
    part.write(&format!(
        "<sheetView rightToLeft=\"{}\" showGridLines=\"true\" showRowColHeaders=\"true\" tabSelected=\"{}\" workbookViewId=\"0\">",
        sheet.right_to_left,
        sheet.xml_name == "sheet1.xml"
    ))?;
    if sheet.freeze_rows > 0 || sheet.freeze_columns > 0 {
        let top_left = cell_address(sheet.freeze_rows + 1, sheet.freeze_columns + 1)
            .unwrap_or_else(|| "A1".to_string());
        let active_pane = match (sheet.freeze_columns > 0, sheet.freeze_rows > 0) {
            (true, true) => "bottomRight",
            (true, false) => "topRight",
            _ => "bottomLeft",
        };
        part.write(&format!(
            "<pane activePane=\"{active_pane}\" state=\"frozen\" topLeftCell=\"{top_left}\" xSplit=\"{}\" ySplit=\"{}\"/>",
            sheet.freeze_columns, sheet.freeze_rows
        ))?;
        if sheet.freeze_rows > 0 && sheet.freeze_columns > 0 {
            let right = cell_address(1, sheet.freeze_columns + 1)
                .unwrap_or_else(|| "A1".to_string());
            let below = cell_address(sheet.freeze_rows + 1, 1)
                .unwrap_or_else(|| "A1".to_string());
            part.write(&format!(
                "<selection activeCell=\"{right}\" pane=\"topRight\" sqref=\"{right}\"/>"
            ))?;
            part.write(&format!(
                "<selection activeCell=\"{below}\" pane=\"bottomLeft\" sqref=\"{below}\"/>"
            ))?;
        }
        part.write(&format!(
            "<selection activeCell=\"{top_left}\" pane=\"{active_pane}\" sqref=\"{top_left}\"/>"
        ))?;
    } else {
        part.write("<selection activeCell=\"A1\" activeCellId=\"0\" pane=\"topLeft\" sqref=\"A1\"/>")?;
    }
    part.write("</sheetView></sheetViews>")?;
    Ok(())
}

fn write_cols(part: &mut PartWriter, sheet: &Sheet) -> Result<()> {
    if sheet.col_widths.is_empty() {
        return Ok(());
    }
    part.write("<cols>")?;
    for (col, width) in &sheet.col_widths {
        part.write(&format!(
            "<col collapsed=\"false\" customWidth=\"true\" hidden=\"false\" max=\"{0}\" min=\"{0}\" width=\"{1}\"/>",
            col + 1,
            width
        ))?;
    }
    part.write("</cols>")?;
    Ok(())
}

fn build_workbook_xml(sheets: &[Sheet]) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(XML_DECL);
    out.push_str(
        "<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
    );
    out.push_str("<fileVersion appName=\"Calc\"/><workbookPr backupFile=\"false\" showObjects=\"all\" date1904=\"false\"/>");
    out.push_str("<bookViews><workbookView activeTab=\"0\" firstSheet=\"0\" showHorizontalScroll=\"true\" showSheetTabs=\"true\" showVerticalScroll=\"true\" tabRatio=\"600\" windowHeight=\"8000\" windowWidth=\"16000\"/></bookViews>");
    out.push_str("<sheets>");
    for (num, sheet) in sheets.iter().enumerate() {
        out.push_str(&format!(
            "<sheet name=\"{}\" sheetId=\"{}\" state=\"visible\" r:id=\"rId{}\"/>",
            xml::escape(sheet.name()),
            num + 1,
            num + 2
        ));
    }
    out.push_str("</sheets>");

    // autofilters are mirrored as hidden _FilterDatabase defined names
    let mut defined = String::new();
    for (num, sheet) in sheets.iter().enumerate() {
        if let Some(header_row) = sheet.auto_filter_row {
            let start = cell_address_abs(header_row, 1);
            let end = cell_address_abs(sheet.row_count().max(1), sheet.col_count().max(1));
            if let (Some(start), Some(end)) = (start, end) {
                defined.push_str(&format!(
                    "<definedName function=\"false\" hidden=\"true\" localSheetId=\"{}\" name=\"_xlnm._FilterDatabase\" vbProcedure=\"false\">'{}'!{}:{}</definedName>",
                    num,
                    xml::escape(sheet.name()),
                    start,
                    end
                ));
            }
        }
    }
    if !defined.is_empty() {
        out.push_str("<definedNames>");
        out.push_str(&defined);
        out.push_str("</definedNames>");
    }

    out.push_str("<calcPr fullCalcOnLoad=\"true\" iterateCount=\"100\" iterateDelta=\"0.001\" refMode=\"A1\"/>");
    out.push_str("</workbook>");
    out
}

fn build_workbook_rels(sheets: &[Sheet], has_shared: bool) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    out.push_str("<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">");
    out.push_str("<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>");
    for (num, sheet) in sheets.iter().enumerate() {
        out.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/{}\"/>",
            num + 2,
            sheet.xml_name
        ));
    }
    if has_shared {
        out.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings\" Target=\"sharedStrings.xml\"/>",
            sheets.len() + 2
        ));
    }
    out.push_str("</Relationships>");
    out
}

fn build_root_rels() -> String {
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    out.push_str("<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">");
    out.push_str("<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>");
    out.push_str("<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>");
    out.push_str("<Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties\" Target=\"docProps/app.xml\"/>");
    out.push_str("</Relationships>");
    out
}

fn build_content_types(sheets: &[Sheet], has_shared: bool) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(XML_DECL);
    out.push_str("<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">");
    out.push_str("<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>");
    out.push_str("<Default Extension=\"xml\" ContentType=\"application/xml\"/>");
    out.push_str("<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>");
    for sheet in sheets {
        out.push_str(&format!(
            "<Override PartName=\"/xl/worksheets/{}\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
            sheet.xml_name
        ));
    }
    out.push_str("<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>");
    if has_shared {
        out.push_str("<Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>");
    }
    out.push_str("<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>");
    out.push_str("<Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>");
    out.push_str("</Types>");
    out
}

fn build_core_props(metadata: &Metadata) -> String {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    out.push_str(
        "<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:dcmitype=\"http://purl.org/dc/dcmitype/\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">",
    );
    out.push_str(&format!(
        "<dcterms:created xsi:type=\"dcterms:W3CDTF\">{now}</dcterms:created>"
    ));
    out.push_str(&format!(
        "<dcterms:modified xsi:type=\"dcterms:W3CDTF\">{now}</dcterms:modified>"
    ));
    if !metadata.title.is_empty() {
        out.push_str(&format!("<dc:title>{}</dc:title>", xml::escape(&metadata.title)));
    }
    if !metadata.subject.is_empty() {
        out.push_str(&format!("<dc:subject>{}</dc:subject>", xml::escape(&metadata.subject)));
    }
    if !metadata.author.is_empty() {
        out.push_str(&format!("<dc:creator>{}</dc:creator>", xml::escape(&metadata.author)));
    }
    if !metadata.description.is_empty() {
        out.push_str(&format!(
            "<dc:description>{}</dc:description>",
            xml::escape(&metadata.description)
        ));
    }
    if !metadata.keywords.is_empty() {
        out.push_str(&format!(
            "<cp:keywords>{}</cp:keywords>",
            xml::escape(&metadata.keywords.join(", "))
        ));
    }
    out.push_str("<cp:revision>0</cp:revision>");
    out.push_str("</cp:coreProperties>");
    out
}

fn build_app_props(metadata: &Metadata) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECL);
    out.push_str(
        "<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\" \
         xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\">",
    );
    out.push_str("<TotalTime>0</TotalTime>");
    if !metadata.company.is_empty() {
        out.push_str(&format!("<Company>{}</Company>", xml::escape(&metadata.company)));
    }
    out.push_str("</Properties>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_sheet(sheet: &Sheet) -> String {
        std::fs::read_to_string(sheet.body.as_ref().unwrap().path()).unwrap()
    }

    fn finished_sheet(configure: impl FnOnce(&mut Sheet)) -> String {
        let mut store = TempStore::new().unwrap();
        let mut sheet = Sheet::new("S", 1);
        let mut body = PartWriter::create(&mut store).unwrap();
        body.write("<sheetData>").unwrap();
        sheet.body = Some(body);
        configure(&mut sheet);
        finish_sheet(&mut sheet, &mut store).unwrap();
        read_sheet(&sheet)
    }

    #[test]
    fn test_finished_sheet_is_well_formed_shell() {
        let xml = finished_sheet(|_| {});
        assert!(xml.starts_with(XML_DECL));
        assert!(xml.contains("<dimension ref=\"A1\"/>"));
        assert!(xml.contains("<sheetData></sheetData>"));
        assert!(xml.ends_with("</worksheet>"));
    }

    #[test]
    fn test_dimension_matches_extent() {
        let xml = finished_sheet(|sheet| {
            sheet.row_count = 5;
            sheet.col_count = 2;
        });
        assert!(xml.contains("<dimension ref=\"A1:B5\"/>"));
    }

    #[test]
    fn test_frozen_rows_emit_pane() {
        let xml = finished_sheet(|sheet| sheet.freeze_panes(1, 0));
        assert!(xml.contains(
            "<pane activePane=\"bottomLeft\" state=\"frozen\" topLeftCell=\"A2\" xSplit=\"0\" ySplit=\"1\"/>"
        ));
        assert!(xml.contains("<selection activeCell=\"A2\" pane=\"bottomLeft\" sqref=\"A2\"/>"));
    }

    #[test]
    fn test_frozen_rows_and_columns() {
        let xml = finished_sheet(|sheet| sheet.freeze_panes(2, 1));
        assert!(xml.contains(
            "<pane activePane=\"bottomRight\" state=\"frozen\" topLeftCell=\"B3\" xSplit=\"1\" ySplit=\"2\"/>"
        ));
        assert!(xml.contains("pane=\"topRight\""));
        assert!(xml.contains("pane=\"bottomLeft\""));
    }

    #[test]
    fn test_merged_cells_and_autofilter_in_footer() {
        let xml = finished_sheet(|sheet| {
            sheet.row_count = 4;
            sheet.col_count = 3;
            sheet.merge_cells("A1:C1");
            sheet.set_auto_filter(1);
        });
        assert!(xml.contains("<autoFilter ref=\"A1:C4\"/>"));
        assert!(xml.contains("<mergeCells count=\"1\"><mergeCell ref=\"A1:C1\"/></mergeCells>"));
        // schema order: autoFilter before mergeCells, both after sheetData
        let data_end = xml.find("</sheetData>").unwrap();
        let filter = xml.find("<autoFilter").unwrap();
        let merged = xml.find("<mergeCells").unwrap();
        assert!(data_end < filter && filter < merged);
    }

    #[test]
    fn test_col_widths_in_header() {
        let xml = finished_sheet(|sheet| sheet.set_col_width(0, 25.5));
        assert!(xml.contains("max=\"1\" min=\"1\" width=\"25.5\""));
        let cols = xml.find("<cols>").unwrap();
        let data = xml.find("<sheetData>").unwrap();
        assert!(cols < data);
    }

    #[test]
    fn test_workbook_xml_sheets_and_rels() {
        let sheets = vec![Sheet::new("Alpha", 1), Sheet::new("Beta", 2)];
        let xml = build_workbook_xml(&sheets);
        assert!(xml.contains("<sheet name=\"Alpha\" sheetId=\"1\" state=\"visible\" r:id=\"rId2\"/>"));
        assert!(xml.contains("<sheet name=\"Beta\" sheetId=\"2\" state=\"visible\" r:id=\"rId3\"/>"));

        let rels = build_workbook_rels(&sheets, true);
        assert!(rels.contains("Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\""));
        assert!(rels.contains("Id=\"rId2\"") && rels.contains("worksheets/sheet1.xml"));
        assert!(rels.contains("Id=\"rId4\"") && rels.contains("sharedStrings.xml"));
    }

    #[test]
    fn test_filter_database_defined_name() {
        let mut sheet = Sheet::new("Data", 1);
        sheet.row_count = 10;
        sheet.col_count = 4;
        sheet.set_auto_filter(1);
        let xml = build_workbook_xml(&[sheet]);
        assert!(xml.contains(
            "name=\"_xlnm._FilterDatabase\" vbProcedure=\"false\">'Data'!$A$1:$D$10</definedName>"
        ));
    }

    #[test]
    fn test_content_types_cover_all_parts() {
        let sheets = vec![Sheet::new("S", 1)];
        let xml = build_content_types(&sheets, false);
        assert!(xml.contains("/xl/workbook.xml"));
        assert!(xml.contains("/xl/worksheets/sheet1.xml"));
        assert!(xml.contains("/xl/styles.xml"));
        assert!(!xml.contains("sharedStrings"));
        assert!(build_content_types(&sheets, true).contains("/xl/sharedStrings.xml"));
    }

    #[test]
    fn test_core_props_carry_metadata() {
        let metadata = Metadata {
            title: "Report".to_string(),
            author: "Jane".to_string(),
            keywords: vec!["a".to_string(), "b".to_string()],
            ..Metadata::default()
        };
        let xml = build_core_props(&metadata);
        assert!(xml.contains("<dc:title>Report</dc:title>"));
        assert!(xml.contains("<dc:creator>Jane</dc:creator>"));
        assert!(xml.contains("<cp:keywords>a, b</cp:keywords>"));
        assert!(xml.contains("dcterms:W3CDTF"));
    }
}
