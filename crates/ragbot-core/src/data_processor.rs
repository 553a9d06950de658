//! Sentence-aligned chunking and source-file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::types::FileType;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 500 }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self { max_tokens: settings.max_tokens }
    }
}

/// A file picked up for ingestion.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub filename: String,
    pub file_type: FileType,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self {
        Self { chunking_config }
    }

    /// Split `text` into passages of at most `max_tokens` words.
    ///
    /// Sentences are accumulated greedily and never split, so a sentence
    /// longer than the limit becomes its own oversized chunk. Output order
    /// follows the text.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_tokens = 0usize;
        for sentence in split_sentences(text) {
            let tokens = count_tokens(sentence);
            if current_tokens + tokens > self.chunking_config.max_tokens && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_tokens += tokens;
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Collect ingestible files under `root` (or `root` itself when it is a file).
    pub fn list_source_files(&self, root: &Path) -> Vec<PathBuf> {
        if root.is_file() {
            return vec![root.to_path_buf()];
        }
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let supported = path
                .extension()
                .and_then(|s| s.to_str())
                .and_then(FileType::from_extension)
                .is_some_and(|t| matches!(t, FileType::Txt | FileType::Md));
            if supported {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        files
    }

    pub fn read_source(&self, path: &Path) -> Result<SourceFile> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
        let file_type = FileType::from_extension(ext)
            .ok_or_else(|| Error::UnsupportedFileType(format!("{} ({})", ext, path.display())))?;
        let bytes = fs::read(path)
            .map_err(|e| Error::Operation(format!("reading {}: {}", path.display(), e)))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(SourceFile { path: path.to_path_buf(), filename, file_type, bytes })
    }
}

/// Whitespace-delimited word count.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split on runs of `.`, `!` or `?` that are followed by whitespace or the
/// end of the text. Sentences are trimmed; blank ones are dropped. Trailing
/// text without a terminator is kept as the last sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_terminator(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
        if at_boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}
