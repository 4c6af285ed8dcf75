/*!
 * Tests for string table parsing and incremental output
 */

use anyhow::Result;
use std::fs;
use xmltl::document::{Document, DocumentSchema, IncrementalWriter};
use xmltl::errors::DocumentError;

use crate::common;

/// Test that a missing input file is reported as a read error
#[test]
fn test_load_withMissingFile_shouldReturnReadError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let result = Document::load(temp_dir.path().join("missing.xml"), &DocumentSchema::default());

    assert!(matches!(result, Err(DocumentError::Read { .. })));
    Ok(())
}

/// Test that records are found wherever they sit in the tree
#[test]
fn test_parse_withNestedRecords_shouldFindAll() {
    let raw = r#"<StblData>
  <Header Version="3" />
  <TextStringDefinitions>
    <Group><TextStringDefinition InstanceID="a" TextString="one" /></Group>
    <TextStringDefinition InstanceID="b" TextString="two"></TextStringDefinition>
  </TextStringDefinitions>
</StblData>"#;
    let doc = Document::parse(raw, &DocumentSchema::default()).unwrap();

    let ids: Vec<&str> = doc.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

/// Test that writing the parsed records back reproduces a canonical table byte for byte
#[test]
fn test_writer_withParsedRecords_shouldReproduceCanonicalTable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::string_table(&[
        ("0x1", "Plain"),
        ("0x2", "Tom &amp; Jerry &lt;b&gt;"),
        ("0x3", "Quote &quot;this&quot;"),
        ("0x4", "It&#x2019;s&#10;two lines"),
        ("0x5", ""),
    ]);
    let input = common::create_test_file(temp_dir.path(), "in.xml", &original)?;
    let output = temp_dir.path().join("out.xml");

    let doc = Document::load(&input, &DocumentSchema::default())?;
    let (records, tokens) = doc.into_parts();
    let writer = IncrementalWriter::new(&output, DocumentSchema::default(), tokens);
    writer.write_batch(&records[..2], 0, 2)?;
    writer.write_batch(&records[2..], 1, 2)?;

    assert_eq!(fs::read_to_string(&output)?, original);
    Ok(())
}
