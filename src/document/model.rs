/*!
 * Document model for string-table XML files.
 *
 * A document is a flat collection of record elements, each carrying an
 * identifier attribute and a text attribute. Everything else in the file is
 * only walked past while locating records.
 */

use std::fs;
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::errors::DocumentError;
use crate::file_utils::FileManager;
use crate::translation::tokenizer::{self, TokenMap};

/// One identifier/text pair extracted from the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    /// Identifier, unique within the document
    pub id: String,
    /// Text to translate (entity references are tokenized)
    pub text: String,
}

impl TextRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Length in characters, the unit of every batch budget
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Same record with its text replaced
    pub fn with_text(&self, text: String) -> Self {
        Self {
            id: self.id.clone(),
            text,
        }
    }
}

/// Element and attribute names of the document layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSchema {
    /// Root element
    #[serde(default = "default_root_element")]
    pub root_element: String,

    /// Element directly wrapping the records
    #[serde(default = "default_container_element")]
    pub container_element: String,

    /// Record element
    #[serde(default = "default_record_element")]
    pub record_element: String,

    /// Attribute holding the record identifier
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,

    /// Attribute holding the translatable text
    #[serde(default = "default_text_attribute")]
    pub text_attribute: String,
}

impl Default for DocumentSchema {
    fn default() -> Self {
        Self {
            root_element: default_root_element(),
            container_element: default_container_element(),
            record_element: default_record_element(),
            id_attribute: default_id_attribute(),
            text_attribute: default_text_attribute(),
        }
    }
}

fn default_root_element() -> String {
    "StblData".to_string()
}

fn default_container_element() -> String {
    "TextStringDefinitions".to_string()
}

fn default_record_element() -> String {
    "TextStringDefinition".to_string()
}

fn default_id_attribute() -> String {
    "InstanceID".to_string()
}

fn default_text_attribute() -> String {
    "TextString".to_string()
}

/// Parsed input document
#[derive(Debug, Clone)]
pub struct Document {
    records: Vec<TextRecord>,
    entity_tokens: TokenMap,
    source_hash: String,
}

impl Document {
    /// Read and parse a document from disk
    pub fn load<P: AsRef<Path>>(path: P, schema: &DocumentSchema) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw, schema)
    }

    /// Parse raw document text.
    ///
    /// Character references are tokenized before parsing so that they survive
    /// the round trip byte for byte; the record texts keep the `_XML_N_`
    /// tokens and [`Document::entity_tokens`] maps them back.
    pub fn parse(raw: &str, schema: &DocumentSchema) -> Result<Self, DocumentError> {
        let (content, entity_tokens) = tokenizer::protect_entities(raw);

        let mut reader = Reader::from_str(&content);
        let mut records = Vec::new();
        let mut saw_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                    saw_element = true;
                    if element.name().as_ref() == schema.record_element.as_bytes() {
                        records.push(read_record(&element, schema)?);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(DocumentError::Parse(format!(
                        "{} (at byte {})",
                        e,
                        reader.buffer_position()
                    )));
                }
            }
        }

        if !saw_element {
            return Err(DocumentError::Parse("no element found".to_string()));
        }

        debug!(
            "Parsed {} record(s), {} protected entity reference(s)",
            records.len(),
            entity_tokens.len()
        );

        Ok(Self {
            records,
            entity_tokens,
            source_hash: FileManager::hash_bytes(raw.as_bytes()),
        })
    }

    pub fn records(&self) -> &[TextRecord] {
        &self.records
    }

    /// Tokens standing in for character references in the record texts
    pub fn entity_tokens(&self) -> &TokenMap {
        &self.entity_tokens
    }

    /// SHA-256 of the exact text that was parsed
    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }

    /// Total characters over all records
    pub fn total_chars(&self) -> usize {
        self.records.iter().map(TextRecord::char_len).sum()
    }

    pub fn into_parts(self) -> (Vec<TextRecord>, TokenMap) {
        (self.records, self.entity_tokens)
    }
}

fn read_record(element: &BytesStart<'_>, schema: &DocumentSchema) -> Result<TextRecord, DocumentError> {
    let mut id = None;
    let mut text = None;

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| DocumentError::Parse(e.to_string()))?;
        let key = attribute.key.as_ref();
        if key == schema.id_attribute.as_bytes() || key == schema.text_attribute.as_bytes() {
            let value = attribute
                .unescape_value()
                .map_err(|e| DocumentError::Parse(e.to_string()))?;
            let value = normalize_attribute_whitespace(&value);
            if key == schema.id_attribute.as_bytes() {
                id = Some(value);
            } else {
                text = Some(value);
            }
        }
    }

    let missing = |attribute: &str| DocumentError::MissingAttribute {
        element: schema.record_element.clone(),
        attribute: attribute.to_string(),
    };

    Ok(TextRecord {
        id: id.ok_or_else(|| missing(&schema.id_attribute))?,
        text: text.ok_or_else(|| missing(&schema.text_attribute))?,
    })
}

// Literal tab/CR/LF in attribute values read as spaces.
fn normalize_attribute_whitespace(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\t', '\n', '\r'], " ")
}
