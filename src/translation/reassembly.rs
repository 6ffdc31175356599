/*!
 * Reassembly of translated lines into SRT text.
 *
 * Each block keeps its id and timestamp; every text line is replaced by the
 * normalized translation of the matching unit.
 */

use log::debug;
use std::collections::HashMap;

use crate::errors::TranslationError;
use crate::subtitle_processor::SubtitleDocument;

use super::prompts::TranslationResult;

/// Replace `，` and `、` with a space and drop one trailing `。`.
pub fn normalize_line(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| match c {
            '，' | '、' => ' ',
            other => other,
        })
        .collect();

    match replaced.strip_suffix('。') {
        Some(stripped) => stripped.to_string(),
        None => replaced,
    }
}

/// Rebuilds the document from translation results
#[derive(Debug, Clone, Copy, Default)]
pub struct Reassembler;

impl Reassembler {
    pub fn new() -> Self {
        Self
    }

    /// Rebuild `document` with the translated lines of `results`.
    ///
    /// Fails if any line of the document has no result.
    pub fn reassemble(
        &self,
        document: &SubtitleDocument,
        results: &[TranslationResult],
    ) -> Result<String, TranslationError> {
        let by_id: HashMap<&str, &str> = results
            .iter()
            .map(|r| (r.unique_id.as_str(), r.translated_text.as_str()))
            .collect();

        let mut blocks = Vec::with_capacity(document.len());
        for block in document.blocks() {
            let mut lines = Vec::with_capacity(block.text_lines.len() + 2);
            lines.push(block.id.clone());
            lines.push(block.timestamp.clone());

            for line_index in 0..block.text_lines.len() {
                let unique_id = block.unique_id(line_index);
                let translated = by_id
                    .get(unique_id.as_str())
                    .ok_or_else(|| TranslationError::Reassembly { unique_id: unique_id.clone() })?;
                lines.push(normalize_line(translated));
            }
            blocks.push(lines.join("\n"));
        }

        debug!("Reassembled {} blocks from {} lines", blocks.len(), results.len());

        let mut output = blocks.join("\n\n");
        output.push('\n');
        Ok(output)
    }
}
