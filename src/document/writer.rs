/*!
 * Incremental output writer.
 *
 * The output document grows one batch at a time: the first batch writes the
 * preamble, every batch appends one line per record, and the last batch
 * closes the container. Every write is synced to disk before returning so a
 * checkpoint saved afterwards always describes bytes that exist.
 */

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::debug;
use quick_xml::escape::partial_escape;

use super::model::{DocumentSchema, TextRecord};
use crate::translation::tokenizer::{self, TokenMap};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Appends translated batches to the output document
#[derive(Debug, Clone)]
pub struct IncrementalWriter {
    path: PathBuf,
    schema: DocumentSchema,
    entity_tokens: TokenMap,
}

impl IncrementalWriter {
    /// Create a writer for `path`. `entity_tokens` are restored in every line.
    pub fn new(path: impl Into<PathBuf>, schema: DocumentSchema, entity_tokens: TokenMap) -> Self {
        Self {
            path: path.into(),
            schema,
            entity_tokens,
        }
    }

    /// Write one batch of translated records.
    ///
    /// Batch 0 truncates the file; the final batch closes the document.
    pub fn write_batch(
        &self,
        records: &[TextRecord],
        batch_index: usize,
        total_batches: usize,
    ) -> std::io::Result<()> {
        let file = if batch_index == 0 {
            File::create(&self.path)?
        } else {
            OpenOptions::new().append(true).open(&self.path)?
        };
        let mut out = BufWriter::new(file);

        if batch_index == 0 {
            self.write_preamble(&mut out)?;
        }

        for record in records {
            writeln!(out, "    {}", self.record_line(record))?;
        }

        if batch_index + 1 == total_batches {
            self.write_closing(&mut out)?;
        }

        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        debug!(
            "Batch {} appended to {}",
            batch_index + 1,
            self.path.display()
        );
        Ok(())
    }

    /// Write a complete document with no records.
    pub fn write_empty(&self) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        self.write_preamble(&mut out)?;
        self.write_closing(&mut out)?;
        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }

    /// Serialized record element, entity references restored
    pub fn record_line(&self, record: &TextRecord) -> String {
        let line = format!(
            r#"<{} {}="{}" {}="{}" />"#,
            self.schema.record_element,
            self.schema.id_attribute,
            escape_attribute(&record.id),
            self.schema.text_attribute,
            escape_attribute(&record.text),
        );
        tokenizer::restore_entities(&line, &self.entity_tokens)
    }

    fn write_preamble<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", XML_DECLARATION)?;
        writeln!(out, "<{}>", self.schema.root_element)?;
        writeln!(out, "  <{}>", self.schema.container_element)
    }

    fn write_closing<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "  </{}>", self.schema.container_element)?;
        writeln!(out, "</{}>", self.schema.root_element)
    }
}

/// Escape a value for a double-quoted XML attribute.
///
/// Markup characters go through quick-xml; quotes and line breaks become
/// character references so the value survives attribute normalization.
pub fn escape_attribute(value: &str) -> String {
    let escaped = partial_escape(value);
    if !escaped.contains(['"', '\n', '\r', '\t']) {
        return escaped.into_owned();
    }

    let mut out = String::with_capacity(escaped.len() + 16);
    for c in escaped.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#09;"),
            _ => out.push(c),
        }
    }
    out
}
