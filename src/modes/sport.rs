//! SPORT mode: single-pass buffered minifier.
//!
//! Allocates one output buffer sized to the input (an upper bound, since
//! output can never exceed input) and writes the
//! result in one contiguous allocation. Preferred when the input fits
//! comfortably in memory and the caller wants one allocation back.

use crate::capability::CpuCapabilities;
use crate::minify_core;

pub fn run(bytes: &[u8], caps: CpuCapabilities) -> Vec<u8> {
    let bytes = strip_bom(bytes);
    minify_core::strip_buffer(bytes, caps)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
    if bytes.starts_with(&UTF8_BOM) {
        &bytes[3..]
    } else {
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_never_exceeds_input_length() {
        let input = br#"{ "hello" : "world" }"#;
        let out = run(input, CpuCapabilities::scalar());
        assert!(out.len() <= input.len());
    }

    #[test]
    fn numbers_and_literals_are_unchanged() {
        let input = br#"{"n": 1.0e2, "k": null, "b": true}"#;
        let out = run(input, CpuCapabilities::scalar());
        assert_eq!(out, br#"{"n":1.0e2,"k":null,"b":true}"#);
    }
}
