//! Shared strings table for string deduplication

use indexmap::IndexMap;

use super::xml;

/// Deduplicated string table shared across the workbook.
///
/// Each entry keeps its first-use index (stable for the document lifetime)
/// and a reference count, summed into the `count` attribute of the sst part.
pub struct SharedStrings {
    table: IndexMap<String, u32>,
}

impl SharedStrings {
    pub fn new() -> Self {
        SharedStrings {
            table: IndexMap::with_capacity(1000),
        }
    }

    /// Record one use of a string and return its table index
    pub fn add(&mut self, s: &str) -> u32 {
        if let Some((index, _, count)) = self.table.get_full_mut(s) {
            *count += 1;
            return index as u32;
        }
        let index = self.table.len() as u32;
        self.table.insert(s.to_string(), 1);
        index
    }

    /// Number of unique strings
    pub fn unique_count(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Build the `sst` part, or `None` when no shared strings were used
    pub fn to_xml(&self) -> Option<String> {
        if self.table.is_empty() {
            return None;
        }
        let count: u32 = self.table.values().sum();
        let mut result = String::with_capacity(256 + self.table.len() * 24);
        result.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>");
        result.push_str(&format!(
            "<sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" count=\"{}\" uniqueCount=\"{}\">",
            count,
            self.table.len()
        ));
        for s in self.table.keys() {
            result.push_str("<si><t>");
            xml::push_escaped(&mut result, s);
            result.push_str("</t></si>");
        }
        result.push_str("</sst>");
        Some(result)
    }
}

impl Default for SharedStrings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_use_indices() {
        let mut ss = SharedStrings::new();
        assert_eq!(ss.add("Hello"), 0);
        assert_eq!(ss.add("World"), 1);
        assert_eq!(ss.add("Hello"), 0);
        assert_eq!(ss.unique_count(), 2);
    }

    #[test]
    fn test_empty_table_has_no_part() {
        assert!(SharedStrings::new().to_xml().is_none());
    }

    #[test]
    fn test_counts_in_sst() {
        let mut ss = SharedStrings::new();
        ss.add("a");
        ss.add("a");
        ss.add("b");
        let xml = ss.to_xml().unwrap();
        assert!(xml.contains("count=\"3\" uniqueCount=\"2\""));
        assert!(xml.contains("<si><t>a</t></si><si><t>b</t></si>"));
    }

    #[test]
    fn test_strings_escaped() {
        let mut ss = SharedStrings::new();
        ss.add("a<b&c");
        let xml = ss.to_xml().unwrap();
        assert!(xml.contains("<si><t>a&lt;b&amp;c</t></si>"));
    }
}
