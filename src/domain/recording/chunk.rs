//! Encoded chunk value object

use std::fmt;

/// MIME tags for produced chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    Wav,
    Flac,
}

impl MimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Flac => "audio/flac",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for MimeType {
    fn default() -> Self {
        Self::Wav
    }
}

/// Value object representing one encoded output chunk.
/// Contains the encoded bytes and the MIME tag they were produced under.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    data: Vec<u8>,
    mime_type: MimeType,
}

impl EncodedChunk {
    /// Create a chunk from raw bytes
    pub fn new(data: Vec<u8>, mime_type: MimeType) -> Self {
        Self { data, mime_type }
    }

    /// Get the encoded bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the encoded bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Get the MIME tag
    pub fn mime_type(&self) -> MimeType {
        self.mime_type
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_as_str() {
        assert_eq!(MimeType::Wav.as_str(), "audio/wav");
        assert_eq!(MimeType::Flac.as_str(), "audio/flac");
    }

    #[test]
    fn mime_type_extension() {
        assert_eq!(MimeType::Wav.extension(), "wav");
        assert_eq!(MimeType::Flac.extension(), "flac");
    }

    #[test]
    fn default_mime_type_is_wav() {
        assert_eq!(MimeType::default(), MimeType::Wav);
    }

    #[test]
    fn chunk_size() {
        let chunk = EncodedChunk::new(vec![0u8; 1024], MimeType::Wav);
        assert_eq!(chunk.size_bytes(), 1024);
        assert_eq!(chunk.mime_type(), MimeType::Wav);
    }

    #[test]
    fn human_readable_size_bytes() {
        let chunk = EncodedChunk::new(vec![0u8; 500], MimeType::Wav);
        assert_eq!(chunk.human_readable_size(), "500 B");
    }

    #[test]
    fn human_readable_size_kb() {
        let chunk = EncodedChunk::new(vec![0u8; 2048], MimeType::Wav);
        assert_eq!(chunk.human_readable_size(), "2.0 KB");
    }

    #[test]
    fn human_readable_size_mb() {
        let chunk = EncodedChunk::new(vec![0u8; 2 * 1024 * 1024], MimeType::Flac);
        assert_eq!(chunk.human_readable_size(), "2.0 MB");
    }

    #[test]
    fn into_data_returns_bytes() {
        let chunk = EncodedChunk::new(vec![1, 2, 3, 4], MimeType::Flac);
        assert_eq!(chunk.data(), &[1, 2, 3, 4]);
        assert_eq!(chunk.into_data(), vec![1, 2, 3, 4]);
    }
}
