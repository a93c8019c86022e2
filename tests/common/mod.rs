//! Fixture files shared by the integration tests.

#![allow(dead_code)]

pub const JPEG_COVER: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

pub const PNG_COVER: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D',
    b'R', 0x00, 0x00, 0x00, 0x01,
];

/// A distinct JPEG-looking cover; `seed` varies the payload
pub fn jpeg_cover(seed: u8) -> Vec<u8> {
    let mut cover = JPEG_COVER.to_vec();
    cover.insert(4, seed);
    cover
}

/// FLAC stream: STREAMINFO then one front-cover PICTURE block
pub fn flac_with_cover(cover: &[u8]) -> Vec<u8> {
    let mut out = b"fLaC".to_vec();
    out.push(0x00);
    out.extend_from_slice(&[0, 0, 34]);
    out.extend_from_slice(&[0u8; 34]);

    let mime = b"image/jpeg";
    let mut block = Vec::new();
    block.extend_from_slice(&3u32.to_be_bytes());
    block.extend_from_slice(&(mime.len() as u32).to_be_bytes());
    block.extend_from_slice(mime);
    block.extend_from_slice(&0u32.to_be_bytes());
    block.extend_from_slice(&500u32.to_be_bytes());
    block.extend_from_slice(&500u32.to_be_bytes());
    block.extend_from_slice(&24u32.to_be_bytes());
    block.extend_from_slice(&0u32.to_be_bytes());
    block.extend_from_slice(&(cover.len() as u32).to_be_bytes());
    block.extend_from_slice(cover);

    out.push(0x86);
    out.extend_from_slice(&(block.len() as u32).to_be_bytes()[1..]);
    out.extend_from_slice(&block);
    out.extend_from_slice(&[0xFF, 0xF8, 0x00, 0x00]);
    out
}

/// FLAC stream with no pictures
pub fn flac_without_cover() -> Vec<u8> {
    let mut out = b"fLaC".to_vec();
    out.push(0x80);
    out.extend_from_slice(&[0, 0, 34]);
    out.extend_from_slice(&[0u8; 34]);
    out.extend_from_slice(&[0xFF, 0xF8, 0x00, 0x00]);
    out
}

fn syncsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

/// MP3 with an ID3v2.4 tag holding one APIC frame
pub fn mp3_with_cover(cover: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8];
    frame.extend_from_slice(b"image/jpeg\0");
    frame.push(3);
    frame.extend_from_slice(b"\0");
    frame.extend_from_slice(cover);

    let mut frames = b"APIC".to_vec();
    frames.extend_from_slice(&syncsafe(frame.len() as u32));
    frames.extend_from_slice(&[0, 0]);
    frames.extend_from_slice(&frame);

    let mut out = b"ID3".to_vec();
    out.extend_from_slice(&[4, 0, 0]);
    out.extend_from_slice(&syncsafe(frames.len() as u32));
    out.extend_from_slice(&frames);
    out.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
    out
}

/// Bytes wrapped around an XMP packet with the given description attributes
pub fn with_xmp(attributes: &str) -> Vec<u8> {
    let mut out = b"RAWDATA ".to_vec();
    out.extend_from_slice(
        format!(
            r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF><rdf:Description {}/></rdf:RDF></x:xmpmeta>"#,
            attributes
        )
        .as_bytes(),
    );
    out.extend_from_slice(&[0u8; 32]);
    out
}
