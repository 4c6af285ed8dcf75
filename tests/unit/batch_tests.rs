/*!
 * Tests for character-bounded batching
 */

use xmltl::document::TextRecord;
use xmltl::translation::batch::split;

fn record(id: &str, len: usize) -> TextRecord {
    TextRecord::new(id, "x".repeat(len))
}

/// Test the 4000/3000/1000 scenario with a 5000 character limit
#[test]
fn test_split_withThreeRecords_shouldPackGreedily() {
    let batches = split(vec![record("r1", 4000), record("r2", 3000), record("r3", 1000)], 5000);

    let grouped: Vec<Vec<String>> = batches
        .iter()
        .map(|b| b.records().iter().map(|r| r.id.clone()).collect())
        .collect();
    assert_eq!(grouped, vec![vec!["r1".to_string()], vec!["r2".to_string(), "r3".to_string()]]);
}

/// Test that an oversized record is kept whole in its own batch
#[test]
fn test_split_withOversizedRecord_shouldNotTruncate() {
    let batches = split(vec![record("big", 9000)], 5000);

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].records()[0].text.len(), 9000);
}

/// Test that character counting uses characters, not bytes
#[test]
fn test_split_withMultibyteText_shouldCountCharacters() {
    let records = vec![TextRecord::new("a", "ééééé"), TextRecord::new("b", "ééééé")];
    let batches = split(records, 10);

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].char_count(), 10);
}

/// Test that batching is deterministic
#[test]
fn test_split_withSameInput_shouldProduceSameBoundaries() {
    let records: Vec<TextRecord> = (0..50).map(|i| record(&i.to_string(), (i * 7) % 23)).collect();

    let first = split(records.clone(), 40);
    let second = split(records, 40);
    assert_eq!(first, second);
}
