//! Locates cover art stored inside audio containers.
//!
//! Only the byte range of the picture is reported; the picture itself is
//! never decoded here.
//!
//! ## Supported Containers
//! - FLAC `PICTURE` metadata blocks
//! - ID3v2.3 / ID3v2.4 `APIC` frames (MP3)

/// Where an embedded picture's bytes live inside its container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtworkLocation {
    pub offset: u64,
    pub length: u64,
    /// Width in pixels when the container records it, else 0
    pub width: u32,
    /// Height in pixels when the container records it, else 0
    pub height: u32,
}

const FLAC_MAGIC: &[u8] = b"fLaC";
const FLAC_PICTURE_BLOCK: u8 = 6;
const ID3_MAGIC: &[u8] = b"ID3";
const FRONT_COVER: u32 = 3;

/// Find the front cover (or else the first picture) in an audio container
pub fn find_artwork(bytes: &[u8]) -> Option<ArtworkLocation> {
    if bytes.starts_with(FLAC_MAGIC) {
        find_flac_picture(bytes)
    } else if bytes.starts_with(ID3_MAGIC) {
        find_id3_picture(bytes)
    } else {
        None
    }
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn be_u24(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at.checked_add(3)?)?;
    Some(u32::from_be_bytes([0, slice[0], slice[1], slice[2]]))
}

fn syncsafe_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at.checked_add(4)?)?;
    if slice.iter().any(|b| b & 0x80 != 0) {
        return None;
    }
    Some(slice.iter().fold(0u32, |acc, b| (acc << 7) | u32::from(*b)))
}

/// Keep the first front cover, otherwise the first picture seen
fn prefer_front_cover(
    best: Option<(u32, ArtworkLocation)>,
    candidate: (u32, ArtworkLocation),
) -> Option<(u32, ArtworkLocation)> {
    match best {
        Some((kind, _)) if kind == FRONT_COVER => best,
        Some(_) if candidate.0 != FRONT_COVER => best,
        _ => Some(candidate),
    }
}

fn find_flac_picture(bytes: &[u8]) -> Option<ArtworkLocation> {
    let mut pos = FLAC_MAGIC.len();
    let mut best = None;

    // a damaged header ends the walk but keeps what was already found
    while let (Some(&header), Some(block_len)) = (bytes.get(pos), be_u24(bytes, pos + 1)) {
        let is_last = header & 0x80 != 0;
        let block_type = header & 0x7F;
        let block_len = block_len as usize;
        let body = pos + 4;

        if block_type == FLAC_PICTURE_BLOCK {
            if let Some(found) = parse_flac_picture(bytes, body, block_len) {
                best = prefer_front_cover(best, found);
            }
        }

        match body.checked_add(block_len) {
            Some(next) if !is_last => pos = next,
            _ => break,
        }
    }

    best.map(|(_, location)| location)
}

fn parse_flac_picture(bytes: &[u8], body: usize, block_len: usize) -> Option<(u32, ArtworkLocation)> {
    let end = body.checked_add(block_len)?;
    let picture_type = be_u32(bytes, body)?;

    let mime_len = be_u32(bytes, body + 4)? as usize;
    let mut pos = body.checked_add(8)?.checked_add(mime_len)?;
    let desc_len = be_u32(bytes, pos)? as usize;
    pos = pos.checked_add(4)?.checked_add(desc_len)?;

    let width = be_u32(bytes, pos)?;
    let height = be_u32(bytes, pos + 4)?;
    // colour depth and palette size are not needed
    let data_len = be_u32(bytes, pos + 16)? as usize;
    let data = pos + 20;

    if data.checked_add(data_len)? > end || end > bytes.len() {
        return None;
    }

    Some((
        picture_type,
        ArtworkLocation {
            offset: data as u64,
            length: data_len as u64,
            width,
            height,
        },
    ))
}

fn find_id3_picture(bytes: &[u8]) -> Option<ArtworkLocation> {
    let major = *bytes.get(3)?;
    if major != 3 && major != 4 {
        return None;
    }

    let flags = *bytes.get(5)?;
    // unsynchronised tags alter the picture bytes on disk
    if flags & 0x80 != 0 {
        return None;
    }

    let tag_end = 10usize.checked_add(syncsafe_u32(bytes, 6)? as usize)?;
    let tag_end = tag_end.min(bytes.len());
    let mut pos = 10;

    if flags & 0x40 != 0 {
        pos += match major {
            3 => 4 + be_u32(bytes, pos)? as usize,
            _ => syncsafe_u32(bytes, pos)? as usize,
        };
    }

    let mut best = None;

    while pos + 10 <= tag_end {
        let id = &bytes[pos..pos + 4];
        if id[0] == 0 {
            break; // padding
        }

        let frame_len = match major {
            3 => be_u32(bytes, pos + 4)?,
            _ => syncsafe_u32(bytes, pos + 4)?,
        } as usize;
        let format_flags = bytes[pos + 9];
        let body = pos + 10;
        let end = body.checked_add(frame_len)?;
        if end > tag_end {
            break;
        }

        // compressed, encrypted or per-frame unsynchronised bodies can't be
        // lifted out verbatim
        let transformed = match major {
            3 => format_flags & 0xC0 != 0,
            _ => format_flags & 0x0F != 0,
        };

        if id == b"APIC" && !transformed {
            if let Some(found) = parse_apic(bytes, body, end) {
                best = prefer_front_cover(best, found);
            }
        }

        pos = end;
    }

    best.map(|(_, location)| location)
}

fn parse_apic(bytes: &[u8], body: usize, end: usize) -> Option<(u32, ArtworkLocation)> {
    let frame = bytes.get(body..end)?;
    let encoding = *frame.first()?;

    let mime_end = 1 + frame.get(1..)?.iter().position(|b| *b == 0)?;
    let picture_type = u32::from(*frame.get(mime_end + 1)?);
    let desc_start = mime_end + 2;

    let data_start = match encoding {
        // UTF-16 variants end the description with a 16-bit NUL
        1 | 2 => {
            let mut i = desc_start;
            loop {
                let pair = frame.get(i..i + 2)?;
                if pair == [0, 0] {
                    break i + 2;
                }
                i += 2;
            }
        }
        _ => desc_start + frame.get(desc_start..)?.iter().position(|b| *b == 0)? + 1,
    };

    if data_start >= frame.len() {
        return None;
    }

    Some((
        picture_type,
        ArtworkLocation {
            offset: (body + data_start) as u64,
            length: (frame.len() - data_start) as u64,
            width: 0,
            height: 0,
        },
    ))
}
