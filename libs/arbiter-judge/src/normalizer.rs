/// Output Normalizer - Canonical Form for Comparison
///
/// **Rules:**
/// - Output that parses as JSON is re-serialized compactly, so pretty-printing
///   and spacing differences disappear
/// - Anything else is treated as text: trimmed, with every internal whitespace
///   run collapsed to a single space
/// - Case sensitivity: YES
/// - Floating-point tolerance: NO
/// - Numbers keep their literal text (`arbitrary_precision`), so big integers
///   never round through `f64` and `2` differs from `2.0`
///
/// Both the strict and the normalized verdicts are decided here so there is a
/// single definition of equality for the whole pipeline.

/// Canonicalize raw program output
///
/// Never fails; malformed JSON simply falls through to the text rules.
pub fn normalize(raw: &str) -> String {
    if let Some(canonical) = canonical_json(raw) {
        return canonical;
    }

    let collapsed = collapse_whitespace(raw);

    // Unicode spaces are not JSON whitespace, so collapsing can turn
    // near-JSON text into valid JSON. Canonicalize that too so the
    // function stays idempotent.
    canonical_json(&collapsed).unwrap_or(collapsed)
}

/// Trimmed byte-for-byte equality
pub fn strict_equal(received: &str, expected: &str) -> bool {
    received.trim() == expected.trim()
}

/// Equality after normalizing both sides
pub fn normalized_equal(received: &str, expected: &str) -> bool {
    normalize(received) == normalize(expected)
}

fn canonical_json(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    serde_json::to_string(&value).ok()
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_trim_and_collapse() {
        assert_eq!(normalize("hello"), "hello");
        assert_eq!(normalize("  hello   world \n"), "hello world");
        assert_eq!(normalize("line1\r\nline2\n"), "line1 line2");
        assert_eq!(normalize("\ta\t\tb\t"), "a b");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n"), "");
    }

    #[test]
    fn test_whitespace_tolerance() {
        assert_eq!(normalize(" 5\n"), normalize("5"));
        assert_eq!(normalize("5"), "5");
    }

    #[test]
    fn test_json_formatting_tolerance() {
        assert_eq!(normalize(r#"{"a":1, "b":2}"#), normalize(r#"{"a": 1,"b": 2}"#));
        assert_eq!(normalize("[1, 2,\n 3]"), "[1,2,3]");
        assert_eq!(
            normalize("{\n  \"name\": \"x\",\n  \"tags\": [ ]\n}\n"),
            r#"{"name":"x","tags":[]}"#
        );
    }

    #[test]
    fn test_json_strings_keep_inner_whitespace() {
        assert_eq!(normalize("\"a  b\""), "\"a  b\"");
        assert_ne!(normalize("\"a  b\""), normalize("\"a b\""));
    }

    #[test]
    fn test_semantic_differences_survive() {
        assert_ne!(normalize("Hello"), normalize("hello"));
        assert_ne!(normalize("[1,2]"), normalize("[2,1]"));
        assert_ne!(normalize(r#"{"a":1}"#), normalize(r#"{"a":2}"#));
    }

    #[test]
    fn test_big_integers_compare_exactly() {
        assert!(!normalized_equal("15511210043330985984000001", "15511210043330985984000000"));
        assert_eq!(normalize(" 15511210043330985984000000\n"), "15511210043330985984000000");
        assert!(!normalized_equal(
            "[18446744073709551616, 1]",
            "[18446744073709551617, 1]"
        ));
        assert!(normalized_equal("[ 18446744073709551616 ]", "[18446744073709551616]"));
    }

    #[test]
    fn test_number_spelling_is_significant() {
        assert!(!normalized_equal("2", "2.0"));
        assert!(!normalized_equal("1e2", "100"));
        assert_eq!(normalize("[0.10]"), "[0.10]");
    }

    #[test]
    fn test_malformed_json_is_text() {
        assert_eq!(normalize("{\"a\": 1,"), "{\"a\": 1,");
        assert_eq!(normalize("[1,   2"), "[1, 2");
    }

    #[test]
    fn test_unicode_space_inside_json_like_text() {
        // U+00A0 is whitespace to Rust but not to JSON
        let raw = "[1,\u{a0}2]";
        assert_eq!(normalize(raw), "[1,2]");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "  5 \n",
            "hello   world",
            r#"{"b": [1, 2.5, "x  y"], "a": null}"#,
            "[1,\u{a0}2]",
            "1E400",
            "-0",
            "{\"a\": 1,",
            "\u{3000}text\u{3000}",
            "true",
            "\"\\u00e9\"",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_strict_equal() {
        assert!(strict_equal("4\n", "4"));
        assert!(strict_equal("  4  ", "4"));
        assert!(!strict_equal("hello", "Hello"));
        assert!(!strict_equal("1  2", "1 2"));
    }

    #[test]
    fn test_normalized_equal() {
        assert!(normalized_equal("1  2", "1 2"));
        assert!(normalized_equal("[1, 2]", "[1,2]"));
        assert!(!normalized_equal("hello", "Hello"));
    }
}
