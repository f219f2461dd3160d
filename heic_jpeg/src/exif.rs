//! EXIF block handling.
//!
//! The block is carried byte-for-byte: it is only unwrapped from the source
//! container and re-wrapped as the payload of a JPEG APP1 segment, never
//! parsed or edited.

const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";
const TIFF_LE: &[u8; 4] = b"II*\0";
const TIFF_BE: &[u8; 4] = b"MM\0*";

/// JPEG marker number of the segment that carries EXIF.
pub const EXIF_APP_SEGMENT: u8 = 1;

/// Largest TIFF payload that fits one APP1 segment (16-bit length incl. itself and header).
pub const MAX_APP1_PAYLOAD: usize = u16::MAX as usize - 2 - EXIF_HEADER.len();

fn is_tiff(data: &[u8]) -> bool {
    data.starts_with(TIFF_LE) || data.starts_with(TIFF_BE)
}

/// Accepts either a bare TIFF block or one still prefixed with `Exif\0\0`.
pub fn normalize_tiff_block(raw: &[u8]) -> Option<Vec<u8>> {
    let data = raw.strip_prefix(EXIF_HEADER.as_slice()).unwrap_or(raw);
    is_tiff(data).then(|| data.to_vec())
}

/// HEIF stores EXIF as a 4-byte big-endian offset followed by the payload;
/// the offset points at the TIFF header inside the payload.
pub fn tiff_from_heif_exif(raw: &[u8]) -> Option<Vec<u8>> {
    let offset_bytes: [u8; 4] = raw.get(..4)?.try_into().ok()?;
    let offset = u32::from_be_bytes(offset_bytes) as usize;
    let payload = raw.get(4usize.checked_add(offset)?..)?;
    normalize_tiff_block(payload)
}

/// `Exif\0\0` followed by `tiff`, ready to be written as an APP1 segment.
/// `None` when the block does not fit a single segment.
pub fn app1_payload(tiff: &[u8]) -> Option<Vec<u8>> {
    if tiff.len() > MAX_APP1_PAYLOAD {
        return None;
    }
    let mut payload = Vec::with_capacity(EXIF_HEADER.len() + tiff.len());
    payload.extend_from_slice(EXIF_HEADER);
    payload.extend_from_slice(tiff);
    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiff_block() -> Vec<u8> {
        let mut t = TIFF_LE.to_vec();
        t.extend_from_slice(&[8, 0, 0, 0, 0, 0]);
        t
    }

    #[test]
    fn test_normalize_strips_exif_header() {
        let mut raw = EXIF_HEADER.to_vec();
        raw.extend(tiff_block());
        assert_eq!(normalize_tiff_block(&raw), Some(tiff_block()));
        assert_eq!(normalize_tiff_block(&tiff_block()), Some(tiff_block()));
        assert_eq!(normalize_tiff_block(b"garbage"), None);
    }

    #[test]
    fn test_heif_offset_is_honoured() {
        // offset 6: the payload starts with "Exif\0\0" before the TIFF header
        let mut raw = vec![0, 0, 0, 6];
        raw.extend_from_slice(EXIF_HEADER);
        raw.extend(tiff_block());
        assert_eq!(tiff_from_heif_exif(&raw), Some(tiff_block()));

        let mut zero = vec![0, 0, 0, 0];
        zero.extend(tiff_block());
        assert_eq!(tiff_from_heif_exif(&zero), Some(tiff_block()));
    }

    #[test]
    fn test_heif_offset_out_of_range() {
        assert_eq!(tiff_from_heif_exif(&[0, 0, 0xFF, 0xFF, 1, 2]), None);
        assert_eq!(tiff_from_heif_exif(&[0, 0]), None);
    }

    #[test]
    fn test_app1_payload_prefixes_header() {
        let payload = app1_payload(&tiff_block()).unwrap();
        assert_eq!(&payload[..6], EXIF_HEADER);
        assert_eq!(&payload[6..], tiff_block().as_slice());
        assert_eq!(normalize_tiff_block(&payload), Some(tiff_block()));
    }

    #[test]
    fn test_app1_payload_size_limit() {
        assert!(app1_payload(&vec![0u8; MAX_APP1_PAYLOAD]).is_some());
        assert!(app1_payload(&vec![0u8; MAX_APP1_PAYLOAD + 1]).is_none());
    }
}
