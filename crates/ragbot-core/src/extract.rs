use crate::error::{Error, Result};
use crate::types::FileType;

/// Pull plain text out of an uploaded file.
///
/// Text formats decode as UTF-8, falling back to lossy decoding for
/// invalid sequences. Binary formats are rejected.
pub fn extract_text(bytes: &[u8], file_type: FileType) -> Result<String> {
    match file_type {
        FileType::Txt | FileType::Md => Ok(match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        }),
        FileType::Pdf | FileType::Docx => Err(Error::UnsupportedFileType(format!(
            "{} (only plain text documents can be indexed)",
            file_type.as_str()
        ))),
    }
}
