use base64::{engine::general_purpose, Engine as _};

/// Content type inferred from the first bytes of an image payload.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Some("image/png");
    }
    if bytes.starts_with(b"GIF8") {
        return Some("image/gif");
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Some("image/tiff");
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(b"%PDF") {
        return Some("application/pdf");
    }
    None
}

/// Decode a picture column as stored by earlier versions of the service.
///
/// Legacy rows hold a mix of encodings: raw image bytes, plain base64 text,
/// hex digits wrapping base64 text, and full data URLs. New writes always
/// store raw bytes, so the raw check runs first.
pub fn decode_stored(stored: &[u8]) -> (Vec<u8>, &'static str) {
    if let Some(mime) = sniff_mime(stored) {
        return (stored.to_vec(), mime);
    }

    if let Ok(text) = std::str::from_utf8(stored) {
        let text = text.trim();

        if let Some((mime, payload)) = split_data_url(text) {
            if let Ok(bytes) = general_purpose::STANDARD.decode(payload) {
                let mime = sniff_mime(&bytes).unwrap_or(mime);
                return (bytes, mime);
            }
        }

        if let Some(hex_bytes) = decode_hex(text) {
            // Some rows hold base64 text that was hex-encoded on top.
            if let Ok(inner) = std::str::from_utf8(&hex_bytes) {
                if let Ok(bytes) = general_purpose::STANDARD.decode(inner.trim()) {
                    if let Some(mime) = sniff_mime(&bytes) {
                        return (bytes, mime);
                    }
                }
            }
            if let Some(mime) = sniff_mime(&hex_bytes) {
                return (hex_bytes, mime);
            }
        }

        if let Ok(bytes) = general_purpose::STANDARD.decode(text) {
            if let Some(mime) = sniff_mime(&bytes) {
                return (bytes, mime);
            }
        }
    }

    (stored.to_vec(), "application/octet-stream")
}

/// Turn an uploaded picture string (plain base64 or data URL) into raw
/// bytes for storage. Returns None when the payload is not decodable.
pub fn normalize_upload(payload: &str) -> Option<Vec<u8>> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }
    let base64_part = match split_data_url(payload) {
        Some((_, part)) => part,
        None => payload,
    };
    general_purpose::STANDARD.decode(base64_part).ok()
}

/// Raw bytes as a base64 string, the form the client expects in JSON fields.
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

fn split_data_url(text: &str) -> Option<(&'static str, &str)> {
    let rest = text.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = match header.trim_end_matches(";base64") {
        "image/jpeg" | "image/jpg" => "image/jpeg",
        "image/png" => "image/png",
        "image/gif" => "image/gif",
        "image/bmp" => "image/bmp",
        "image/tiff" => "image/tiff",
        "image/webp" => "image/webp",
        "application/pdf" => "application/pdf",
        _ => "application/octet-stream",
    };
    Some((mime, payload))
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() < 2 || text.len() % 2 != 0 {
        return None;
    }
    if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut out = Vec::with_capacity(text.len() / 2);
    let bytes = text.as_bytes();
    for pair in bytes.chunks(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn sniffs_common_signatures() {
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(PNG_HEADER), Some("image/png"));
        assert_eq!(sniff_mime(b"%PDF-1.4"), Some("application/pdf"));
        assert_eq!(sniff_mime(b"plain text"), None);
    }

    #[test]
    fn raw_bytes_pass_through() {
        let (bytes, mime) = decode_stored(PNG_HEADER);
        assert_eq!(bytes, PNG_HEADER);
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn decodes_plain_base64_rows() {
        let stored = to_base64(PNG_HEADER);
        let (bytes, mime) = decode_stored(stored.as_bytes());
        assert_eq!(bytes, PNG_HEADER);
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn decodes_hex_wrapped_base64_rows() {
        let base64_text = to_base64(PNG_HEADER);
        let hex: String = base64_text.bytes().map(|b| format!("{:02x}", b)).collect();
        let (bytes, mime) = decode_stored(hex.as_bytes());
        assert_eq!(bytes, PNG_HEADER);
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn decodes_data_url_rows() {
        let stored = format!("data:image/png;base64,{}", to_base64(PNG_HEADER));
        let (bytes, mime) = decode_stored(stored.as_bytes());
        assert_eq!(bytes, PNG_HEADER);
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn unknown_payload_falls_back_to_octet_stream() {
        let (bytes, mime) = decode_stored(b"not an image at all ***");
        assert_eq!(bytes, b"not an image at all ***");
        assert_eq!(mime, "application/octet-stream");
    }

    #[test]
    fn normalizes_uploads_to_raw_bytes() {
        let upload = format!("data:image/png;base64,{}", to_base64(PNG_HEADER));
        assert_eq!(normalize_upload(&upload).unwrap(), PNG_HEADER);
        assert_eq!(normalize_upload(&to_base64(PNG_HEADER)).unwrap(), PNG_HEADER);
        assert!(normalize_upload("").is_none());
        assert!(normalize_upload("%%not-base64%%").is_none());
    }
}
