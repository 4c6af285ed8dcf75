/*!
 * Tests for file system helpers
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use xmltl::file_utils::FileManager;

use crate::common;

/// Test that directory discovery skips outputs of earlier runs
#[test]
fn test_findFiles_withPreviousOutputs_shouldListOnlyInputs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    fs::create_dir(dir.join("nested"))?;
    common::create_test_file(dir, "b.xml", "<a/>")?;
    common::create_test_file(dir, "a.xml", "<a/>")?;
    common::create_test_file(dir, "a_de.xml", "<a/>")?;
    common::create_test_file(dir, "notes.txt", "")?;
    common::create_test_file(&dir.join("nested"), "c.XML", "<a/>")?;

    let inputs: Vec<_> = FileManager::find_files(dir, "xml")?
        .into_iter()
        .filter(|p| !FileManager::is_translated_output(p, "de"))
        .collect();

    let names: Vec<_> = inputs
        .iter()
        .map(|p| p.strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["a.xml", "b.xml", "nested/c.XML"]);
    Ok(())
}

/// Test the generated output name
#[test]
fn test_generateOutputPath_shouldAppendTargetLanguage() {
    let output = FileManager::generate_output_path(Path::new("tables/strings.xml"), "pt-BR");
    assert_eq!(output, Path::new("tables/strings_pt-BR.xml"));
}

/// Test that hashing is stable and content sensitive
#[test]
fn test_hashFile_withChangedContent_shouldChangeHash() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "data.xml", &"x".repeat(10_000))?;

    let first = FileManager::hash_file(&path)?;
    assert_eq!(first, FileManager::hash_file(&path)?);
    assert_eq!(first.len(), 64);

    fs::write(&path, "x".repeat(10_001))?;
    assert_ne!(first, FileManager::hash_file(&path)?);
    Ok(())
}

/// Test that removing a missing file is not an error
#[test]
fn test_removeIfExists_withMissingFile_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    FileManager::remove_if_exists(temp_dir.path().join("gone.prc"))?;
    Ok(())
}
