//! Append-only part writers backed by temporary files
//!
//! Worksheet XML is streamed to disk row by row so a sheet never has to fit
//! in memory. The worksheet header (dimension, panes, column widths) can
//! only be produced after the last row, so it is written to a second part
//! and the two are spliced with [`PartWriter::append_part`].
//!
//! All part files live inside one [`TempStore`] directory; dropping the
//! store removes them best-effort, whether the build succeeded or not.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{Result, SheetError};

/// Owns the temporary directory all part files are created in.
///
/// Cleanup happens on drop via [`TempDir`]; deletion failures are swallowed.
pub struct TempStore {
    dir: TempDir,
    counter: u32,
}

impl TempStore {
    pub fn new() -> Result<Self> {
        let dir = TempDir::with_prefix("xlsx_writer_")
            .map_err(|source| SheetError::TempFile { source })?;
        Ok(TempStore { dir, counter: 0 })
    }

    fn next_path(&mut self) -> PathBuf {
        self.counter += 1;
        self.dir.path().join(format!("part{}.xml", self.counter))
    }
}

/// Append-only text sink for building one XML part.
///
/// Text accumulates in an in-memory buffer and spills to the backing file;
/// `flush` forces everything to disk and truncates the buffer. A part is
/// written once, sequentially, and consumed exactly once during packaging.
pub struct PartWriter {
    file: BufWriter<File>,
    path: PathBuf,
    buffer: String,
}

const BUFFER_SPILL: usize = 4096;

impl PartWriter {
    pub fn create(store: &mut TempStore) -> Result<Self> {
        let path = store.next_path();
        let file = File::create(&path).map_err(|source| SheetError::TempFile { source })?;
        Ok(PartWriter {
            file: BufWriter::with_capacity(64 * 1024, file),
            path,
            buffer: String::with_capacity(8192),
        })
    }

    /// Append text to the part
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.buffer.push_str(text);
        if self.buffer.len() > BUFFER_SPILL {
            self.spill()?;
        }
        Ok(())
    }

    fn spill(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.file.write_all(self.buffer.as_bytes())?;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Force all buffered text to the backing file
    pub fn flush(&mut self) -> Result<()> {
        self.spill()?;
        self.file.flush()?;
        Ok(())
    }

    /// Seal the part; no more writes are expected after this
    pub fn close(&mut self) -> Result<()> {
        self.flush()
    }

    /// Path of the backing file, for packaging
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Concatenate this part followed by `other` into a fresh temp file.
    ///
    /// Used to prepend a deferred worksheet header (`self`) to an
    /// already-streamed body (`other`). Both inputs are flushed first; the
    /// returned writer owns the combined content.
    pub fn append_part(mut self, mut other: PartWriter, store: &mut TempStore) -> Result<PartWriter> {
        self.flush()?;
        other.flush()?;

        let path = store.next_path();
        let file = File::create(&path).map_err(|source| SheetError::TempFile { source })?;
        let mut out = BufWriter::with_capacity(64 * 1024, file);
        io::copy(&mut File::open(&self.path)?, &mut out)?;
        io::copy(&mut File::open(&other.path)?, &mut out)?;
        out.flush()?;

        Ok(PartWriter {
            file: out,
            path,
            buffer: String::with_capacity(8192),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_part(part: &PartWriter) -> String {
        std::fs::read_to_string(part.path()).unwrap()
    }

    #[test]
    fn test_write_and_flush() {
        let mut store = TempStore::new().unwrap();
        let mut part = PartWriter::create(&mut store).unwrap();
        part.write("<a>").unwrap();
        part.write("text").unwrap();
        // not yet on disk
        assert_eq!(read_part(&part), "");
        part.flush().unwrap();
        assert_eq!(read_part(&part), "<a>text");
        part.write("</a>").unwrap();
        part.flush().unwrap();
        assert_eq!(read_part(&part), "<a>text</a>");
    }

    #[test]
    fn test_spill_on_large_writes() {
        let mut store = TempStore::new().unwrap();
        let mut part = PartWriter::create(&mut store).unwrap();
        let chunk = "x".repeat(1000);
        for _ in 0..10 {
            part.write(&chunk).unwrap();
        }
        part.flush().unwrap();
        assert_eq!(read_part(&part).len(), 10_000);
    }

    #[test]
    fn test_append_part_splices_header_before_body() {
        let mut store = TempStore::new().unwrap();

        let mut body = PartWriter::create(&mut store).unwrap();
        body.write("<sheetData/></worksheet>").unwrap();
        body.flush().unwrap();

        let mut head = PartWriter::create(&mut store).unwrap();
        head.write("<worksheet><dimension ref=\"A1\"/>").unwrap();

        let full = head.append_part(body, &mut store).unwrap();
        assert_eq!(
            read_part(&full),
            "<worksheet><dimension ref=\"A1\"/><sheetData/></worksheet>"
        );
    }

    #[test]
    fn test_temp_files_removed_on_drop() {
        let path;
        {
            let mut store = TempStore::new().unwrap();
            let mut part = PartWriter::create(&mut store).unwrap();
            part.write("data").unwrap();
            part.flush().unwrap();
            path = part.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
