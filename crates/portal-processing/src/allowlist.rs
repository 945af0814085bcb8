//! Extension policy for attachments.

/// Extensions that are never accepted, whatever the file contains.
pub const DENIED_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "scr", "com", "pif", "vbs", "vbe", "js", "jse", "jar", "msi", "msp",
    "wsf", "wsh", "ps1", "psm1", "sh", "bash", "csh", "ksh", "app", "apk", "dll", "cpl", "hta",
    "reg", "lnk",
];

/// MIME type reported for OLE2 compound files (legacy Office).
pub const OLE_STORAGE_MIME: &str = "application/x-ole-storage";

pub fn is_denied(extension: &str) -> bool {
    DENIED_EXTENSIONS.contains(&extension)
}

/// Permitted MIME types for `extension`, canonical type first.
pub fn allowed_mime_types(extension: &str) -> Option<&'static [&'static str]> {
    let types: &'static [&'static str] = match extension {
        // Images
        "jpg" | "jpeg" => &["image/jpeg"],
        "png" => &["image/png"],
        "gif" => &["image/gif"],
        "webp" => &["image/webp"],
        "bmp" => &["image/bmp", "image/x-ms-bmp"],
        "tif" | "tiff" => &["image/tiff"],
        "ico" => &["image/vnd.microsoft.icon", "image/x-icon"],
        "heic" => &["image/heic", "image/heif"],
        // Documents
        "pdf" => &["application/pdf"],
        "rtf" => &["application/rtf", "text/rtf"],
        "txt" => &["text/plain"],
        "csv" => &["text/csv", "text/plain"],
        // Office
        "doc" => &["application/msword", OLE_STORAGE_MIME],
        "xls" => &["application/vnd.ms-excel", OLE_STORAGE_MIME],
        "ppt" => &["application/vnd.ms-powerpoint", OLE_STORAGE_MIME],
        "docx" => &[
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/zip",
        ],
        "xlsx" => &[
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/zip",
        ],
        "pptx" => &[
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "application/zip",
        ],
        // Archives
        "zip" => &["application/zip", "application/x-zip-compressed"],
        "gz" => &["application/gzip", "application/x-gzip"],
        "7z" => &["application/x-7z-compressed"],
        "rar" => &["application/vnd.rar", "application/x-rar-compressed"],
        // Audio
        "mp3" => &["audio/mpeg", "audio/mp3"],
        "wav" => &["audio/wav", "audio/x-wav", "audio/wave"],
        "flac" => &["audio/flac", "audio/x-flac"],
        "ogg" => &["audio/ogg", "application/ogg"],
        "m4a" => &["audio/mp4", "audio/x-m4a", "video/mp4"],
        // Video
        "mp4" => &["video/mp4"],
        "mov" => &["video/quicktime"],
        "webm" => &["video/webm"],
        "mkv" => &["video/x-matroska"],
        "avi" => &["video/x-msvideo"],
        _ => return None,
    };
    Some(types)
}

/// Whether files with this extension may be accepted without any
/// determinable type.
pub fn allows_text_fallback(extension: &str) -> bool {
    allowed_mime_types(extension)
        .map(|types| types.contains(&"text/plain"))
        .unwrap_or(false)
}
