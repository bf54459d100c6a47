//! Shared byte-stripping core for ECO/SPORT/TURBO.
//!
//! All three modes reduce to the same rule:
//! every byte that is either inside a string, or outside a string and not
//! whitespace, survives; everything else is dropped. This module is the
//! one place that rule is implemented, so the three-way equivalence
//! invariant holds by construction rather than by
//! coincidence between three separate implementations.

use crate::capability::CpuCapabilities;
use crate::scanner::{self, StringCarry};

/// Strip whitespace from `bytes` given the incoming string-state carry,
/// writing surviving bytes to `out`. Returns the outgoing carry, so a
/// caller can feed consecutive windows/chunks through in sequence.
pub fn strip_into(bytes: &[u8], carry_in: StringCarry, caps: CpuCapabilities, out: &mut Vec<u8>) -> StringCarry {
    if bytes.is_empty() {
        return carry_in;
    }
    let masks = scanner::scan(bytes, caps);
    let (in_string, carry_out) = scanner::StringStateTracker::track(&masks, carry_in);

    out.reserve(bytes.len());
    for i in 0..bytes.len() {
        if in_string.get(i) || !masks.is_whitespace(i) {
            out.push(bytes[i]);
        }
    }
    carry_out
}

/// Strip whitespace from a complete, in-memory buffer in one pass —
/// the SPORT entry point.
pub fn strip_buffer(bytes: &[u8], caps: CpuCapabilities) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    strip_into(bytes, StringCarry::default(), caps, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CpuCapabilities;

    #[test]
    fn strips_outside_string_whitespace_only() {
        let out = strip_buffer(br#"{ "hello" : "world" }"#, CpuCapabilities::scalar());
        assert_eq!(out, br#"{"hello":"world"}"#);
    }

    #[test]
    fn preserves_whitespace_inside_strings() {
        let out = strip_buffer(br#"{"s":"a  b"}"#, CpuCapabilities::scalar());
        assert_eq!(out, br#"{"s":"a  b"}"#);
    }

    #[test]
    fn carry_lets_windows_be_processed_independently() {
        let caps = CpuCapabilities::scalar();
        let whole = strip_buffer(br#"{"a": "b c d"}"#, caps);

        let (first, second) = br#"{"a": "b c d"}"#.split_at(7);
        let mut out = Vec::new();
        let carry = strip_into(first, Default::default(), caps, &mut out);
        strip_into(second, carry, caps, &mut out);
        assert_eq!(out, whole);
    }

    #[test]
    fn idempotent_on_already_minified_input() {
        let caps = CpuCapabilities::scalar();
        let once = strip_buffer(br#"{"hello":"world"}"#, caps);
        let twice = strip_buffer(&once, caps);
        assert_eq!(once, twice);
    }
}
