//! Content type detection from file bytes.
//!
//! Sniffing never fails: bytes it does not recognise yield
//! [`MimeGuess::NoOpinion`], which callers handle as its own branch.

use crate::allowlist::OLE_STORAGE_MIME;

/// MIME reported for Windows PE executables.
pub const PE_EXECUTABLE_MIME: &str = "application/x-msdownload";
/// MIME reported for ELF executables.
pub const ELF_EXECUTABLE_MIME: &str = "application/x-executable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeGuess {
    Known(&'static str),
    NoOpinion,
}

impl MimeGuess {
    pub fn known(self) -> Option<&'static str> {
        match self {
            MimeGuess::Known(mime) => Some(mime),
            MimeGuess::NoOpinion => None,
        }
    }

    pub fn is_executable(self) -> bool {
        matches!(
            self,
            MimeGuess::Known(PE_EXECUTABLE_MIME) | MimeGuess::Known(ELF_EXECUTABLE_MIME)
        )
    }
}

/// Capability to determine a file's type from its content.
pub trait ContentSniffer: Send + Sync {
    fn detect(&self, data: &[u8]) -> MimeGuess;
}

/// Magic-byte sniffer covering the formats the attachment allow-list admits,
/// plus native executables so they can be named in rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl ContentSniffer for MagicSniffer {
    fn detect(&self, data: &[u8]) -> MimeGuess {
        match sniff(data) {
            Some(mime) => MimeGuess::Known(mime),
            None => MimeGuess::NoOpinion,
        }
    }
}

fn sniff(data: &[u8]) -> Option<&'static str> {
    // Images
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return Some("image/tiff");
    }
    if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) && data.len() >= 6 {
        return Some("image/vnd.microsoft.icon");
    }

    // RIFF containers
    if data.len() >= 12 && data.starts_with(b"RIFF") {
        return match &data[8..12] {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        };
    }

    // Documents
    if data.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    if data.starts_with(b"{\\rtf") {
        return Some("application/rtf");
    }
    if data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]) {
        return Some(OLE_STORAGE_MIME);
    }
    if data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06") {
        return Some(sniff_zip(data));
    }

    // Archives
    if data.starts_with(&[0x1F, 0x8B]) {
        return Some("application/gzip");
    }
    if data.starts_with(&[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C]) {
        return Some("application/x-7z-compressed");
    }
    if data.starts_with(b"Rar!\x1A\x07") {
        return Some("application/vnd.rar");
    }

    // Audio
    if data.starts_with(b"fLaC") {
        return Some("audio/flac");
    }
    if data.starts_with(b"OggS") {
        return Some("audio/ogg");
    }
    if data.starts_with(b"ID3") || is_mpeg_frame_sync(data) {
        return Some("audio/mpeg");
    }

    // ISO base media and Matroska
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return Some(match &data[8..12] {
            b"qt  " => "video/quicktime",
            b"M4A " | b"M4B " => "audio/mp4",
            b"heic" | b"heix" | b"mif1" | b"msf1" => "image/heic",
            _ => "video/mp4",
        });
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        let head = &data[..data.len().min(64)];
        return Some(if contains(head, b"webm") {
            "video/webm"
        } else {
            "video/x-matroska"
        });
    }

    // Executables
    if is_dos_header(data) {
        return Some(PE_EXECUTABLE_MIME);
    }
    if data.starts_with(&[0x7F, b'E', b'L', b'F']) {
        return Some(ELF_EXECUTABLE_MIME);
    }

    // BMP last: the two-byte signature is weak
    if is_bmp_header(data) {
        return Some("image/bmp");
    }

    None
}

/// Tell OOXML packages apart from plain ZIP archives by their part names.
fn sniff_zip(data: &[u8]) -> &'static str {
    if contains(data, b"[Content_Types].xml") {
        if contains(data, b"word/") {
            return "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
        }
        if contains(data, b"xl/") {
            return "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
        }
        if contains(data, b"ppt/") {
            return "application/vnd.openxmlformats-officedocument.presentationml.presentation";
        }
    }
    "application/zip"
}

/// MPEG audio frame header: 11 sync bits, a non-reserved layer, and usable
/// bitrate and sample-rate indexes. `FF FE` is a UTF-16LE byte-order mark.
fn is_mpeg_frame_sync(data: &[u8]) -> bool {
    if data.len() < 4 || data[0] != 0xFF || data[1] == 0xFE {
        return false;
    }
    let bitrate_index = data[2] >> 4;
    let sample_rate_index = (data[2] >> 2) & 0x03;
    (data[1] & 0xE0) == 0xE0
        && (data[1] & 0x06) != 0
        && bitrate_index != 0x0F
        && sample_rate_index != 0x03
}

/// `MZ` followed by a binary DOS header. Text never carries a NUL byte.
fn is_dos_header(data: &[u8]) -> bool {
    data.len() >= 4 && data.starts_with(b"MZ") && data[2..data.len().min(64)].contains(&0)
}

/// `BM`, four size bytes, four reserved zero bytes, then a pixel-data offset
/// that lands inside the declared file size.
fn is_bmp_header(data: &[u8]) -> bool {
    if data.len() < 14 || !data.starts_with(b"BM") {
        return false;
    }
    let declared_size = u32::from_le_bytes([data[2], data[3], data[4], data[5]]);
    let pixel_offset = u32::from_le_bytes([data[10], data[11], data[12], data[13]]);
    data[6..10] == [0, 0, 0, 0] && pixel_offset >= 14 && pixel_offset < declared_size
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
