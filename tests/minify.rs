//! Crate-level acceptance tests for the universal minification invariants.

use turbojson::{minify, ProcessingMode};

const MODES: [ProcessingMode; 3] = [ProcessingMode::Eco, ProcessingMode::Sport, ProcessingMode::Turbo];

#[test]
fn concrete_inputs_minify_to_expected_bytes() {
    let cases: &[(&[u8], &[u8])] = &[
        (br#"{ "hello" : "world" }"#, br#"{"hello":"world"}"#),
        (br#"[ 1 , 2 , 3 ]"#, br#"[1,2,3]"#),
        (br#"{"s":"a \" b"}"#, br#"{"s":"a \" b"}"#),
        (
            br#"{"n": 1.0e2, "k": null, "b": true}"#,
            br#"{"n":1.0e2,"k":null,"b":true}"#,
        ),
    ];

    for (input, expected) in cases {
        for mode in MODES {
            let out = minify(input, mode).unwrap();
            assert_eq!(out, *expected, "mode {mode:?} mismatch for {input:?}");
        }
    }
}

#[test]
fn all_three_modes_are_byte_identical_for_varied_structure() {
    let input = br#"{
        "array": [1, 2.5, -3, 4e10, true, false, null, "s t r"],
        "nested": {"a": {"b": {"c": [1,2,3]}}},
        "unicode_escape": "café"
    }"#;
    let outputs: Vec<_> = MODES.iter().map(|&m| minify(input, m).unwrap()).collect();
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn output_never_exceeds_input_length() {
    let input = br#"{ "a" : [ 1 , 2 , 3 ], "b" : { "c" : true } }"#;
    for mode in MODES {
        let out = minify(input, mode).unwrap();
        assert!(out.len() <= input.len());
    }
}

#[test]
fn minify_is_idempotent_across_modes() {
    for mode in MODES {
        let input = br#"{"x":[1,2,{"y":"z"}]}"#;
        let once = minify(input, mode).unwrap();
        let twice = minify(&once, mode).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn whitespace_inside_strings_survives_verbatim() {
    let input = br#"{"text": "  leading and trailing spaces  ", "tabs": "a\tb"}"#;
    let out = minify(input, ProcessingMode::Sport).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("\"  leading and trailing spaces  \""));
    assert!(text.contains("\"a\\tb\""));
}

#[test]
fn empty_array_and_object_minify_to_themselves() {
    assert_eq!(minify(b"{}", ProcessingMode::Sport).unwrap(), b"{}");
    assert_eq!(minify(b"[]", ProcessingMode::Sport).unwrap(), b"[]");
}

#[test]
fn bare_top_level_value_is_accepted() {
    assert_eq!(minify(b"   42   ", ProcessingMode::Sport).unwrap(), b"42");
    assert_eq!(minify(b"  true  ", ProcessingMode::Sport).unwrap(), b"true");
}
