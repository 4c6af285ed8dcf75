/*!
 * Tests for placeholder and entity protection
 */

use regex::Regex;
use xmltl::translation::tokenizer::{
    self, protect, protect_entities, record_pattern, restore, PLACEHOLDER_NAMESPACE, PLACEHOLDER_PATTERN,
};

/// Test the greeting scenario from the placeholder documentation
#[test]
fn test_protect_withTwoPlaceholders_shouldEmitNumberedTokens() {
    let pattern = Regex::new(PLACEHOLDER_PATTERN).unwrap();
    let (text, map) = protect("Hello {0}, you have {1} messages", &pattern, PLACEHOLDER_NAMESPACE);

    assert_eq!(text, "Hello <TOKEN_0>, you have <TOKEN_1> messages");
    assert_eq!(restore(&text, &map), "Hello {0}, you have {1} messages");
}

/// Test that restore is the inverse of protect for texts without token-like content
#[test]
fn test_restore_withVariousTexts_shouldRoundTrip() {
    let pattern = record_pattern(PLACEHOLDER_PATTERN).unwrap();
    let samples = [
        "",
        "no placeholders here",
        "{0}{1}{2}",
        "{name} bought {count} {item}s",
        "nested {outer {inner}} braces",
        "entity_XML_0_token and {0}",
        "unicode {ünïcödé} 日本語 {0}",
    ];

    for sample in samples {
        let (text, map) = protect(sample, &pattern, PLACEHOLDER_NAMESPACE);
        assert_eq!(restore(&text, &map), sample, "sample {:?}", sample);
    }
}

/// Test that tokens are local to a single call
#[test]
fn test_protect_withSeparateCalls_shouldRestartCounter() {
    let pattern = Regex::new(PLACEHOLDER_PATTERN).unwrap();
    let (first, _) = protect("{a}", &pattern, "TOKEN");
    let (second, _) = protect("{b}", &pattern, "TOKEN");

    assert_eq!(first, "<TOKEN_0>");
    assert_eq!(second, "<TOKEN_0>");
}

/// Test that a translation mangling one token only loses that token
#[test]
fn test_restore_withMangledToken_shouldLeaveItVisible() {
    let pattern = Regex::new(PLACEHOLDER_PATTERN).unwrap();
    let (_, map) = protect("{0} and {1}", &pattern, "TOKEN");

    let restored = restore("<TOKEN_0> und < TOKEN_1 >", &map);
    assert_eq!(restored, "{0} und < TOKEN_1 >");
}

/// Test entity protection on a raw document fragment
#[test]
fn test_protectEntities_withDecimalAndHex_shouldTokenizeBoth() {
    let raw = r#"<TextStringDefinition InstanceID="1" TextString="It&#x2019;s&#10;fine" />"#;
    let (text, map) = protect_entities(raw);

    assert!(text.contains(r#"TextString="It_XML_0_s_XML_1_fine""#));
    assert_eq!(map.len(), 2);
    assert_eq!(tokenizer::restore(&text, &map), raw);
}
