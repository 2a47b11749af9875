/// 验证音频内容的魔术字节是否与扩展名匹配
///
/// # Arguments
/// * `data` - 文件内容的前几个字节
/// * `extension` - 文件扩展名（包含点号，如 ".webm"）
///
/// # Returns
/// * `true` - 魔术字节匹配
/// * `false` - 魔术字节不匹配或格式未知
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match extension.to_lowercase().as_str() {
        // Matroska / WebM (EBML)
        ".webm" | ".mka" => data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),
        ".ogg" | ".oga" | ".opus" => data.starts_with(b"OggS"),
        ".mp3" => {
            // ID3 标签，或直接以 MPEG 帧同步字开头
            data.starts_with(b"ID3") || (data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0)
        }
        ".wav" => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE",
        ".m4a" | ".mp4" | ".aac" => data.len() >= 8 && &data[4..8] == b"ftyp",
        ".flac" => data.starts_with(b"fLaC"),

        // 未知格式 - 默认拒绝
        _ => false,
    }
}

/// 根据扩展名给出音频的 Content-Type
pub fn audio_content_type(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        ".webm" => "audio/webm",
        ".mka" => "audio/x-matroska",
        ".ogg" | ".oga" | ".opus" => "audio/ogg",
        ".mp3" => "audio/mpeg",
        ".wav" => "audio/wav",
        ".m4a" | ".mp4" | ".aac" => "audio/mp4",
        ".flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webm_magic() {
        let header = [0x1A, 0x45, 0xDF, 0xA3, 0x9F];
        assert!(validate_magic_bytes(&header, ".webm"));
        assert!(validate_magic_bytes(&header, ".WEBM"));
        assert!(!validate_magic_bytes(&header, ".ogg"));
    }

    #[test]
    fn test_mp3_magic() {
        assert!(validate_magic_bytes(b"ID3\x04\x00", ".mp3"));
        assert!(validate_magic_bytes(&[0xFF, 0xFB, 0x90, 0x00], ".mp3"));
        assert!(!validate_magic_bytes(&[0x00, 0xFB], ".mp3"));
    }

    #[test]
    fn test_container_magic() {
        assert!(validate_magic_bytes(b"RIFF\x24\x00\x00\x00WAVEfmt ", ".wav"));
        assert!(!validate_magic_bytes(b"RIFF\x24\x00\x00\x00WEBPVP8 ", ".wav"));
        assert!(validate_magic_bytes(b"\x00\x00\x00\x20ftypM4A ", ".m4a"));
        assert!(validate_magic_bytes(b"OggS\x00\x02", ".ogg"));
    }

    #[test]
    fn test_empty_and_unknown() {
        assert!(!validate_magic_bytes(&[], ".webm"));
        assert!(!validate_magic_bytes(&[0x4D, 0x5A], ".exe"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(audio_content_type(".webm"), "audio/webm");
        assert_eq!(audio_content_type(".MP3"), "audio/mpeg");
        assert_eq!(audio_content_type(".bin"), "application/octet-stream");
    }
}
