/*!
 * Character-bounded batching of text records.
 *
 * Records are packed greedily, in order, into batches whose total text
 * length stays within a character budget. A record is never split; one that
 * is longer than the budget on its own becomes a batch by itself.
 */

use crate::document::TextRecord;

/// A contiguous run of records translated as one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    records: Vec<TextRecord>,
    char_count: usize,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, record: TextRecord) {
        self.char_count += record.char_len();
        self.records.push(record);
    }

    pub fn records(&self) -> &[TextRecord] {
        &self.records
    }

    /// Sum of the text lengths of all records
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<TextRecord> {
        self.records
    }
}

/// Split `records` into batches of at most `char_limit` characters each.
pub fn split(records: Vec<TextRecord>, char_limit: usize) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut current = Batch::new();

    for record in records {
        if current.char_count + record.char_len() > char_limit && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
        }
        current.push(record);
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}
