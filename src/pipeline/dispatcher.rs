//! Protocol dispatch
//!
//! Maps a source's protocol and the run's validation mode to the ordered
//! stages it goes through. An empty plan means the source cannot be checked.

use crate::models::{Protocol, Source, Stage, ValidationMode};

const HTTP_STRUCTURAL: &[Stage] = &[
    Stage::Reachability,
    Stage::ContentSignature,
    Stage::MediaStructure,
];
const RTMP_STRUCTURAL: &[Stage] = &[Stage::MediaStructure];
const HTTP_BEHAVIORAL: &[Stage] = &[Stage::Reachability, Stage::Behavioral];
const RTMP_BEHAVIORAL: &[Stage] = &[Stage::Behavioral];

/// Ordered stages for a protocol under the given mode
pub fn stage_plan(protocol: Protocol, mode: ValidationMode) -> &'static [Stage] {
    match (protocol, mode) {
        (Protocol::Http | Protocol::Https, ValidationMode::Structural) => HTTP_STRUCTURAL,
        (Protocol::Http | Protocol::Https, ValidationMode::Behavioral) => HTTP_BEHAVIORAL,
        (Protocol::Rtmp, ValidationMode::Structural) => RTMP_STRUCTURAL,
        (Protocol::Rtmp, ValidationMode::Behavioral) => RTMP_BEHAVIORAL,
        (Protocol::Unsupported, _) => &[],
    }
}

/// Classify a URL and select its stages
pub fn dispatch(url: &str, mode: ValidationMode) -> (Source, &'static [Stage]) {
    let source = Source::new(url);
    let plan = stage_plan(source.protocol, mode);
    (source, plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://a.example/live.m3u8", ValidationMode::Structural, HTTP_STRUCTURAL)]
    #[case("https://a.example/live.m3u8", ValidationMode::Structural, HTTP_STRUCTURAL)]
    #[case("rtmp://a.example/app/s", ValidationMode::Structural, RTMP_STRUCTURAL)]
    #[case("http://a.example/live.m3u8", ValidationMode::Behavioral, HTTP_BEHAVIORAL)]
    #[case("rtmp://a.example/app/s", ValidationMode::Behavioral, RTMP_BEHAVIORAL)]
    fn test_stage_plans(
        #[case] url: &str,
        #[case] mode: ValidationMode,
        #[case] expected: &[Stage],
    ) {
        let (_, plan) = dispatch(url, mode);
        assert_eq!(plan, expected);
    }

    #[rstest]
    #[case("rtsp://cam.example/feed")]
    #[case("ftp://files.example/x.ts")]
    #[case("garbage")]
    fn test_unsupported_has_no_stages(#[case] url: &str) {
        for mode in [ValidationMode::Structural, ValidationMode::Behavioral] {
            let (source, plan) = dispatch(url, mode);
            assert_eq!(source.protocol, Protocol::Unsupported);
            assert!(plan.is_empty());
        }
    }

    #[test]
    fn test_media_structure_is_last_structural_stage() {
        for protocol in [Protocol::Http, Protocol::Https, Protocol::Rtmp] {
            let plan = stage_plan(protocol, ValidationMode::Structural);
            assert_eq!(plan.last(), Some(&Stage::MediaStructure));
        }
    }
}
