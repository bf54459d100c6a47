//! ECO mode: bounded-memory streaming minifier.
//!
//! Reads fixed-size windows and writes surviving bytes immediately;
//! memory footprint is O(window size), independent of input length. No
//! token buffer is ever materialised — the stripped-down byte
//! classification in [`crate::minify_core`] is all ECO needs, since
//! minification has no use for token kinds, only for string state.

use std::io::Read;

use crate::capability::CpuCapabilities;
use crate::error::Error;
use crate::minify_core;
use crate::scanner::StringCarry;
use crate::sink::Sink;

pub const DEFAULT_WINDOW: usize = 64 * 1024;

pub fn run(mut reader: impl Read, mut sink: impl Sink, caps: CpuCapabilities, window: usize) -> Result<(), Error> {
    let mut buf = vec![0u8; window.max(1)];
    let mut carry = StringCarry::default();
    let mut out = Vec::with_capacity(window);
    let mut first = true;

    loop {
        let n = reader.read(&mut buf).map_err(Error::Io)?;
        if n == 0 {
            break;
        }
        let mut chunk = &buf[..n];
        if first {
            chunk = strip_bom(chunk);
            first = false;
        }
        out.clear();
        carry = minify_core::strip_into(chunk, carry, caps, &mut out);
        sink.write(&out)?;
    }
    sink.finish()
}

/// BOM is tolerated and stripped from the head only.
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
    use crate::sink::VecSink;

    #[test]
    fn streams_in_small_windows_and_matches_single_pass() {
        let input = br#"{ "a" : [1, 2, 3], "b": { "c": true } }"#;
        let mut sink = VecSink::default();
        run(&input[..], &mut sink, CpuCapabilities::scalar(), 5).unwrap();
        let expected = crate::minify_core::strip_buffer(input, CpuCapabilities::scalar());
        assert_eq!(sink.0, expected);
    }

    #[test]
    fn strips_leading_bom() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(br#"{"a":1}"#);
        let mut sink = VecSink::default();
        run(&input[..], &mut sink, CpuCapabilities::scalar(), DEFAULT_WINDOW).unwrap();
        assert_eq!(sink.0, br#"{"a":1}"#);
    }
}
