//! Field-filter transformation scenarios from spec §8.

use turbojson::pipeline::Engine;
use turbojson::sink::VecSink;
use turbojson::transform::filter::FilterConfig;
use turbojson::transform::Transformation;

fn filtered(input: &[u8], config: FilterConfig) -> String {
    let mut engine = Engine::new();
    engine.add_transformation(Transformation::filter(0, config));
    let mut sink = VecSink::default();
    engine.process(input, &mut sink).unwrap();
    String::from_utf8(sink.0).unwrap()
}

#[test]
fn exclude_drops_key_and_descendants() {
    let input = br#"{"user":{"name":"x","security":{"pw":"y"}}}"#;
    let out = filtered(input, FilterConfig::exclude(["user.security".to_string()]));
    assert!(out.contains("\"name\""));
    assert!(!out.contains("security"));
    assert!(!out.contains("\"pw\""));
}

#[test]
fn include_preserves_ancestor_chain_down_to_match() {
    let input = br#"{"user":{"name":"x","profile":{"bio":"hi","age":9}}}"#;
    let out = filtered(input, FilterConfig::include(["user.profile.*".to_string()]));
    assert!(out.contains("\"user\""));
    assert!(out.contains("\"profile\""));
    assert!(out.contains("\"bio\""));
    assert!(!out.contains("\"name\""));
}

#[test]
fn exclude_wins_over_include_when_both_configured() {
    let input = br#"{"user":{"name":"x","security":{"pw":"y"}}}"#;
    let config = FilterConfig {
        include: vec![turbojson::transform::filter::CompiledPattern::compile("user.*")],
        exclude: vec![turbojson::transform::filter::CompiledPattern::compile("user.security")],
    };
    let out = filtered(input, config);
    assert!(out.contains("\"name\""));
    assert!(!out.contains("security"));
}
