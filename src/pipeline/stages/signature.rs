//! Content signature stage (HTTP/HTTPS)
//!
//! Decides from the captured reachability response whether the source serves
//! media: either the content type says so, or the first bytes of the body
//! match a known container signature.

use std::fmt;

use crate::models::ProbeOutcome;
use crate::services::traits::HttpProbeResponse;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const HLS_MAGIC: &[u8] = b"#EXTM3U";
const FLV_MAGIC: &[u8] = b"FLV";
const EBML_MAGIC: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3];
const TS_SYNC_BYTE: u8 = 0x47;
const TS_PACKET_SIZE: usize = 188;

/// Container formats recognised from a body prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSignature {
    HlsPlaylist,
    Flv,
    IsoBmff,
    MpegTs,
    Matroska,
}

impl fmt::Display for MediaSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HlsPlaylist => "HLS playlist",
            Self::Flv => "FLV",
            Self::IsoBmff => "ISO base media",
            Self::MpegTs => "MPEG-TS",
            Self::Matroska => "Matroska/WebM",
        };
        f.write_str(name)
    }
}

/// Identify a container from the first bytes of a body
pub fn sniff(prefix: &[u8]) -> Option<MediaSignature> {
    if is_hls_playlist(prefix) {
        return Some(MediaSignature::HlsPlaylist);
    }
    if prefix.starts_with(FLV_MAGIC) {
        return Some(MediaSignature::Flv);
    }
    if prefix.len() >= 8 && &prefix[4..8] == b"ftyp" {
        return Some(MediaSignature::IsoBmff);
    }
    if prefix.starts_with(EBML_MAGIC) {
        return Some(MediaSignature::Matroska);
    }
    if is_mpeg_ts(prefix) {
        return Some(MediaSignature::MpegTs);
    }
    None
}

fn is_hls_playlist(prefix: &[u8]) -> bool {
    let body = prefix.strip_prefix(UTF8_BOM).unwrap_or(prefix);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body[start..].starts_with(HLS_MAGIC)
}

fn is_mpeg_ts(prefix: &[u8]) -> bool {
    match prefix.first() {
        Some(&TS_SYNC_BYTE) => prefix
            .get(TS_PACKET_SIZE)
            .is_none_or(|&b| b == TS_SYNC_BYTE),
        _ => false,
    }
}

/// Filename extensions that identify a media download
const MEDIA_EXTENSIONS: &[&str] = &["m3u8", "m3u", "ts", "flv", "mp4", "mkv", "webm"];

/// Filename offered through `Content-Disposition`, if it names a media file
fn media_attachment_name(response: &HttpProbeResponse) -> Option<String> {
    let disposition = response.header("content-disposition")?;
    let filename = disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?
        .trim_matches('"');
    let extension = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    MEDIA_EXTENSIONS
        .contains(&extension.as_str())
        .then(|| filename.to_string())
}

/// Evaluate the captured response
///
/// Checked in order: the content type, the body prefix, then an attachment
/// filename for servers that label every stream `application/octet-stream`.
pub fn check(response: Option<&HttpProbeResponse>) -> ProbeOutcome {
    let Some(response) = response else {
        return ProbeOutcome::rejected("no response captured for content check");
    };

    if response.has_media_content_type() {
        return ProbeOutcome::pass(format!(
            "media content type {}",
            response.content_type.as_deref().unwrap_or_default()
        ));
    }

    if let Some(signature) = sniff(&response.body_prefix) {
        return ProbeOutcome::pass(format!("{signature} signature"));
    }

    match media_attachment_name(response) {
        Some(filename) => ProbeOutcome::pass(format!("media attachment {filename}")),
        None => ProbeOutcome::rejected(format!(
            "no media signature (content type: {})",
            response.content_type.as_deref().unwrap_or("none")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;
    use rstest::rstest;

    fn ts_packets(count: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; TS_PACKET_SIZE * count];
        for i in 0..count {
            bytes[i * TS_PACKET_SIZE] = TS_SYNC_BYTE;
        }
        bytes
    }

    #[rstest]
    #[case(b"#EXTM3U\n#EXT-X-VERSION:3".to_vec(), MediaSignature::HlsPlaylist)]
    #[case(b"\xEF\xBB\xBF  \r\n#EXTM3U\n".to_vec(), MediaSignature::HlsPlaylist)]
    #[case(b"FLV\x01\x05\x00\x00\x00\x09".to_vec(), MediaSignature::Flv)]
    #[case(b"\x00\x00\x00\x18ftypmp42".to_vec(), MediaSignature::IsoBmff)]
    #[case(vec![0x1A, 0x45, 0xDF, 0xA3, 0x01], MediaSignature::Matroska)]
    #[case(ts_packets(2), MediaSignature::MpegTs)]
    #[case(vec![0x47, 0x40, 0x11], MediaSignature::MpegTs)]
    fn test_sniff_recognises_signatures(#[case] prefix: Vec<u8>, #[case] expected: MediaSignature) {
        assert_eq!(sniff(&prefix), Some(expected));
    }

    #[rstest]
    #[case(b"<!DOCTYPE html><html>".to_vec())]
    #[case(b"".to_vec())]
    #[case(b"EXTM3U without hash".to_vec())]
    #[case(b"\x00\x00\x00\x18ftpymp42".to_vec())]
    fn test_sniff_rejects_non_media(#[case] prefix: Vec<u8>) {
        assert_eq!(sniff(&prefix), None);
    }

    #[test]
    fn test_ts_requires_second_sync_byte_when_long_enough() {
        let mut bytes = ts_packets(2);
        bytes[TS_PACKET_SIZE] = 0x00;
        assert_eq!(sniff(&bytes), None);
    }

    #[test]
    fn test_content_type_alone_passes() {
        let response = HttpProbeResponse::new(200, Some("application/vnd.apple.mpegurl"), b"");
        assert!(check(Some(&response)).passed);
    }

    #[test]
    fn test_html_page_is_rejected_with_content_type() {
        let response = HttpProbeResponse::new(200, Some("text/html"), b"<html><body>");
        let outcome = check(Some(&response));
        assert_eq!(outcome.failure, Some(FailureKind::Rejected));
        assert!(outcome.reason.contains("text/html"));
    }

    #[test]
    fn test_signature_overrides_generic_content_type() {
        let response =
            HttpProbeResponse::new(200, Some("application/octet-stream"), b"#EXTM3U\n");
        let outcome = check(Some(&response));
        assert!(outcome.passed);
        assert!(outcome.reason.contains("HLS"));
    }

    #[rstest]
    #[case("attachment; filename=\"live.m3u8\"", true)]
    #[case("Attachment; filename=channel.TS", true)]
    #[case("attachment; filename=\"index.html\"", false)]
    #[case("inline", false)]
    fn test_attachment_filename_decides_for_opaque_bodies(
        #[case] disposition: &str,
        #[case] passes: bool,
    ) {
        let response = HttpProbeResponse::new(200, Some("application/octet-stream"), b"\x00\x01")
            .with_header("Content-Disposition", disposition);
        assert_eq!(check(Some(&response)).passed, passes);
    }
}
