//! turbojson: a three-mode JSON minifier with a pluggable streaming
//! transformation pipeline.
//!
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  capability  │    │  topology   │    │   scanner   │
//! │  / topology  │ -> │   probes    │ -> │  + tracker  │
//! └─────────────┘    └─────────────┘    └──────┬──────┘
//!                                               │
//!                  ┌────────────────────────────┼───────────────────┐
//!                  │                            │                   │
//!            ┌─────▼─────┐              ┌───────▼──────┐    ┌──────▼──────┐
//!            │ minify_core│              │  tokenizer   │    │ coordinator │
//!            │ (ECO/SPORT)│              │ (pipeline's  │    │  (TURBO)    │
//!            └───────────┘               │  token feed) │    └─────────────┘
//!                                        └──────┬───────┘
//!                                               │
//!                                        ┌──────▼──────┐
//!                                        │   pipeline   │
//!                                        │ + transforms │
//!                                        └─────────────┘
//!
//! ECO, SPORT, and TURBO all reduce whitespace elimination to the same rule
//! implemented once in [`minify_core`] — this is what makes their outputs
//! byte-identical by construction rather than by convention between three
//! separate implementations. The full [`tokenizer::TokenStream`] exists for
//! [`pipeline::Engine`] callers who need more than minification: field
//! filtering, schema validation, or a caller-supplied transform.

pub mod bench;
pub mod capability;
pub mod coordinator;
pub mod error;
pub mod minify_core;
pub mod modes;
pub mod pipeline;
pub mod scanner;
pub mod sink;
pub mod stats;
pub mod tokenizer;
pub mod topology;
pub mod transform;

use std::io::{Read, Write};

pub use error::Error;
pub use modes::ProcessingMode;

/// Core entry point: minify `input` under the given mode. Byte-identical
/// across modes for any input.
pub fn minify(input: &[u8], mode: ProcessingMode) -> Result<Vec<u8>, Error> {
    let caps = capability::detect_capabilities();
    match mode {
        ProcessingMode::Eco => {
            let mut sink = sink::VecSink::default();
            modes::eco::run(input, &mut sink, caps, modes::eco::DEFAULT_WINDOW)?;
            Ok(sink.0)
        }
        ProcessingMode::Sport => Ok(modes::sport::run(input, caps)),
        ProcessingMode::Turbo => {
            let topology = topology::detect_numa();
            modes::turbo::run(input, caps, &topology, num_cpus::get())
        }
    }
}

/// ECO-friendly streaming form: reads from `reader`, writes minified bytes
/// to `writer` as they are produced, independent of `mode`'s natural
/// buffering. TURBO and SPORT still run to completion before
/// their buffered output is written; only ECO is incremental end-to-end.
pub fn minify_streaming(mut reader: impl std::io::Read, mut writer: impl std::io::Write, mode: ProcessingMode) -> Result<(), Error> {
    let caps = capability::detect_capabilities();
    match mode {
        ProcessingMode::Eco => modes::eco::run(reader, &mut writer, caps, modes::eco::DEFAULT_WINDOW),
        ProcessingMode::Sport | ProcessingMode::Turbo => {
            let mut input = Vec::new();
            reader.read_to_end(&mut input).map_err(Error::Io)?;
            let output = minify(&input, mode)?;
            writer.write_all(&output).map_err(Error::Io)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minify_matches_across_all_three_modes() {
        let input = br#"{ "a" : [1, 2, 3], "b" : { "c" : true, "d": null } }"#;
        let eco = minify(input, ProcessingMode::Eco).unwrap();
        let sport = minify(input, ProcessingMode::Sport).unwrap();
        let turbo = minify(input, ProcessingMode::Turbo).unwrap();
        assert_eq!(eco, sport);
        assert_eq!(sport, turbo);
    }

    #[test]
    fn minify_streaming_matches_buffered_minify() {
        let input = br#"{"hello": "world", "n": 42}"#;
        let mut out = Vec::new();
        minify_streaming(&input[..], &mut out, ProcessingMode::Eco).unwrap();
        assert_eq!(out, minify(input, ProcessingMode::Sport).unwrap());
    }

    #[test]
    fn output_length_never_exceeds_input_length() {
        let input = br#"{ "x" : "y z" , "n" : [ 1 , 2 , 3 ] }"#;
        for mode in [ProcessingMode::Eco, ProcessingMode::Sport, ProcessingMode::Turbo] {
            let out = minify(input, mode).unwrap();
            assert!(out.len() <= input.len());
        }
    }

    #[test]
    fn minify_is_idempotent() {
        let input = br#"{"a":1,"b":[true,false,null]}"#;
        let once = minify(input, ProcessingMode::Sport).unwrap();
        let twice = minify(&once, ProcessingMode::Sport).unwrap();
        assert_eq!(once, twice);
    }
}
