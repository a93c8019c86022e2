//! XMP packet inspection.
//!
//! Editors that keep non-destructive settings (Lightroom, Camera Raw) write
//! them under the `crs:` namespace, either inside the file's XMP packet or
//! in a `.xmp` sidecar next to it.

use regex::bytes::Regex;
use std::sync::OnceLock;

fn packet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<x:xmpmeta[\s>].*?</x:xmpmeta>").expect("static XMP packet pattern")
    })
}

fn edits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"crs:HasSettings\s*=\s*"True"|<crs:HasSettings>True<|crs:ProcessVersion"#)
            .expect("static Camera Raw settings pattern")
    })
}

fn rating_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"xmp:Rating\s*=\s*"(-?\d+)"|<xmp:Rating>\s*(-?\d+)\s*</xmp:Rating>"#)
            .expect("static rating pattern")
    })
}

/// The first XMP packet in `bytes`, if any
pub fn find_packet(bytes: &[u8]) -> Option<&[u8]> {
    packet_pattern().find(bytes).map(|m| m.as_bytes())
}

/// Whether an XMP packet carries editor (Camera Raw) settings
pub fn has_editor_settings(packet: &[u8]) -> bool {
    edits_pattern().is_match(packet)
}

/// `xmp:Rating` from an XMP packet
pub fn rating(packet: &[u8]) -> Option<i32> {
    let captures = rating_pattern().captures(packet)?;
    let digits = captures.get(1).or_else(|| captures.get(2))?;
    std::str::from_utf8(digits.as_bytes()).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDITED: &[u8] = br#"garbage<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF><rdf:Description xmp:Rating="4"
   crs:ProcessVersion="11.0" crs:HasSettings="True"/></rdf:RDF>
</x:xmpmeta>more garbage"#;

    const PLAIN: &[u8] = br#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF><rdf:Description><xmp:Rating>2</xmp:Rating></rdf:Description></rdf:RDF>
</x:xmpmeta>"#;

    #[test]
    fn finds_packet_inside_binary() {
        let packet = find_packet(EDITED).unwrap();
        assert!(packet.starts_with(b"<x:xmpmeta"));
        assert!(packet.ends_with(b"</x:xmpmeta>"));
    }

    #[test]
    fn no_packet_in_plain_bytes() {
        assert!(find_packet(&[0xFF, 0xD8, 0xFF, 0xD9]).is_none());
    }

    #[test]
    fn detects_camera_raw_settings() {
        assert!(has_editor_settings(find_packet(EDITED).unwrap()));
        assert!(!has_editor_settings(find_packet(PLAIN).unwrap()));
    }

    #[test]
    fn reads_rating_attribute_and_element() {
        assert_eq!(rating(EDITED), Some(4));
        assert_eq!(rating(PLAIN), Some(2));
    }

    #[test]
    fn reads_rejected_rating() {
        assert_eq!(rating(br#"xmp:Rating="-1""#), Some(-1));
    }
}
