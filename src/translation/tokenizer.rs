/*!
 * Reversible placeholder protection.
 *
 * Substrings matched by a pattern are swapped for opaque tokens before text
 * leaves the process, and swapped back afterwards. Tokens look like
 * `<NAMESPACE_N>` by default, with `N` counting from zero within a single
 * `protect` call.
 */

use std::collections::HashMap;

use log::trace;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Numeric and hexadecimal character references (`&#169;`, `&#xA9;`)
pub const ENTITY_PATTERN: &str = r"&(?:#[0-9]+|#x[0-9a-fA-F]+);";

/// Brace placeholders such as `{0}` or `{name}`
pub const PLACEHOLDER_PATTERN: &str = r"\{[^{}]*\}";

/// Namespace used for entity tokens in the raw document
pub const ENTITY_NAMESPACE: &str = "XML";

/// Namespace used for placeholder tokens sent to translation
pub const PLACEHOLDER_NAMESPACE: &str = "TOKEN";

/// Shape of the tokens produced for the entity namespace
pub const ENTITY_TOKEN_PATTERN: &str = r"_XML_[0-9]+_";

static ENTITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(ENTITY_PATTERN).expect("Invalid entity regex"));

static ENTITY_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(ENTITY_TOKEN_PATTERN).expect("Invalid entity token regex"));

/// Delimiters wrapped around every generated token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrapper {
    pub open: &'static str,
    pub close: &'static str,
}

impl Wrapper {
    /// `<NS_N>`, safe for free text
    pub const ANGLE: Wrapper = Wrapper { open: "<", close: ">" };

    /// `_NS_N_`, safe inside XML attribute values
    pub const UNDERSCORE: Wrapper = Wrapper { open: "_", close: "_" };
}

impl Default for Wrapper {
    fn default() -> Self {
        Self::ANGLE
    }
}

/// Token → original substring, in generation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original text stored for a token
    pub fn get(&self, token: &str) -> Option<&str> {
        self.index
            .get(token)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Iterate over `(token, original)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn push(&mut self, token: String, original: String) {
        self.index.insert(token.clone(), self.entries.len());
        self.entries.push((token, original));
    }
}

/// Replace every match of `pattern` in `text` with a `<namespace_N>` token.
pub fn protect(text: &str, pattern: &Regex, namespace: &str) -> (String, TokenMap) {
    protect_with_wrapper(text, pattern, namespace, Wrapper::ANGLE)
}

/// Like [`protect`], with an explicit delimiter pair.
pub fn protect_with_wrapper(
    text: &str,
    pattern: &Regex,
    namespace: &str,
    wrapper: Wrapper,
) -> (String, TokenMap) {
    let mut map = TokenMap::new();
    let mut counter = 0usize;

    let protected = pattern.replace_all(text, |caps: &Captures| {
        let token = format!("{}{}_{}{}", wrapper.open, namespace, counter, wrapper.close);
        counter += 1;
        map.push(token.clone(), caps[0].to_string());
        token
    });

    if !map.is_empty() {
        trace!("Protected {} '{}' token(s)", map.len(), namespace);
    }

    (protected.into_owned(), map)
}

/// Put the original substrings back. Tokens missing from `text` are skipped.
pub fn restore(text: &str, map: &TokenMap) -> String {
    let mut restored = text.to_string();
    for (token, original) in map.iter() {
        if restored.contains(token) {
            restored = restored.replace(token, original);
        }
    }
    restored
}

/// Put back the `_XML_N_` tokens of [`protect_entities`].
///
/// Tokens are located with a single scan and looked up by name, so the cost
/// does not grow with the number of entities in the document.
pub fn restore_entities(text: &str, map: &TokenMap) -> String {
    if map.is_empty() {
        return text.to_string();
    }
    ENTITY_TOKEN_REGEX
        .replace_all(text, |caps: &Captures| {
            map.get(&caps[0]).unwrap_or(&caps[0]).to_string()
        })
        .into_owned()
}

/// Protect character references in a raw document with `_XML_N_` tokens.
pub fn protect_entities(raw: &str) -> (String, TokenMap) {
    protect_with_wrapper(raw, &ENTITY_REGEX, ENTITY_NAMESPACE, Wrapper::UNDERSCORE)
}

/// Compiled pattern used on record text before translation.
///
/// Covers the configured placeholder syntax and the entity tokens left in the
/// text by [`protect_entities`], so neither is exposed to the service.
pub fn record_pattern(placeholder_pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?:{})|{}", placeholder_pattern, ENTITY_TOKEN_PATTERN))
}
