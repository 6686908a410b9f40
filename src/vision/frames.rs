// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Frame preparation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// The most recent `max_frames` frames, order preserved.
pub fn latest(frames: &[String], max_frames: usize) -> &[String] {
    let start = frames.len().saturating_sub(max_frames);
    &frames[start..]
}

/// Wrap a base64 image in a data URL.
///
/// Frames that already are data URLs pass through. Otherwise the MIME type is
/// sniffed from the first byte (`0xFF` JPEG, `0x89` PNG), falling back to JPEG.
pub fn data_url(frame: &str) -> String {
    let frame = frame.trim();
    if frame.starts_with("data:") {
        return frame.to_string();
    }
    let mime = sniff_mime(frame);
    format!("data:{mime};base64,{frame}")
}

fn sniff_mime(b64: &str) -> &'static str {
    // Eight characters decode to the first six bytes without padding concerns.
    let prefix: String = b64.chars().take(8).collect();
    match STANDARD.decode(prefix).ok().and_then(|bytes| bytes.first().copied()) {
        Some(0x89) => "image/png",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: &str = "/9j/4AAQSkZJRgABAQAAAQABAAD";
    const PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAE";

    #[test]
    fn keeps_the_latest_frames() {
        let frames: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        assert_eq!(latest(&frames, 3), &frames[2..]);
        assert_eq!(latest(&frames, 10), &frames[..]);
        assert!(latest(&frames, 0).is_empty());
    }

    #[test]
    fn sniffs_png_and_jpeg() {
        assert_eq!(data_url(PNG), format!("data:image/png;base64,{PNG}"));
        assert_eq!(data_url(JPEG), format!("data:image/jpeg;base64,{JPEG}"));
    }

    #[test]
    fn unknown_or_undecodable_defaults_to_jpeg() {
        assert!(data_url("R0lGODlhAQABAIAAAP").starts_with("data:image/jpeg;"));
        assert!(data_url("!!!!").starts_with("data:image/jpeg;"));
    }

    #[test]
    fn data_urls_pass_through_trimmed() {
        let url = "data:image/webp;base64,AAAA";
        assert_eq!(data_url(&format!("  {url}\n")), url);
        assert_eq!(data_url(&format!(" {JPEG} ")), format!("data:image/jpeg;base64,{JPEG}"));
    }
}
