use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::translation::glossary::Glossary;

// @module: File and directory utilities

// @const: Byte order mark some editors put at the start of SRT files
const UTF8_BOM: char = '\u{feff}';

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: SRT extension, case-insensitive
    pub fn is_subtitle_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("srt"))
            .unwrap_or(false)
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for translated subtitle
    // @params: input_file, output_dir (defaults to the input's directory), target_language
    pub fn generate_output_path<P: AsRef<Path>>(
        input_file: P,
        output_dir: Option<&Path>,
        target_language: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let output_dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input_file.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        let stem = input_file.file_stem().unwrap_or_default();
        let output_filename = format!("{}.{}.srt", stem.to_string_lossy(), target_language);
        output_dir.join(output_filename)
    }

    /// Read a file to a string, dropping a leading byte order mark
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;
        Ok(match content.strip_prefix(UTF8_BOM) {
            Some(stripped) => stripped.to_string(),
            None => content,
        })
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        debug!("Wrote {} bytes to {:?}", content.len(), path.as_ref());
        Ok(())
    }

    /// Read a glossary file; a missing file is an empty glossary
    pub fn read_glossary<P: AsRef<Path>>(path: P) -> Result<Glossary> {
        if !Self::file_exists(&path) {
            return Ok(Glossary::new());
        }
        let text = Self::read_to_string(&path)?;
        Ok(Glossary::parse(&text))
    }

    /// Write a glossary in its exchange format, followed by a newline
    pub fn write_glossary<P: AsRef<Path>>(path: P, glossary: &Glossary) -> Result<()> {
        let mut text = glossary.serialize();
        text.push('\n');
        Self::write_to_file(path, &text)
    }
}
