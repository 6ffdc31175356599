use std::collections::HashSet;
use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use log::debug;

use crate::errors::SubtitleError;

// @module: Subtitle segmentation into blocks and translation units

// @const: Blank-line block separator (whitespace-only lines count as blank)
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)*").expect("valid block separator regex")
});

// @struct: One subtitle entry as it appears in the source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleBlock {
    // @field: Sequence number, kept as text
    pub id: String,

    // @field: Timestamp line, passed through untouched
    pub timestamp: String,

    // @field: Text lines in display order
    pub text_lines: Vec<String>,
}

impl SubtitleBlock {
    /// Creates a new block
    pub fn new(id: impl Into<String>, timestamp: impl Into<String>, text_lines: Vec<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: timestamp.into(),
            text_lines,
        }
    }

    /// Unique id of the line at `line_index` within this block
    pub fn unique_id(&self, line_index: usize) -> String {
        format!("{}-{}", self.id, line_index)
    }
}

impl fmt::Display for SubtitleBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n{}", self.id, self.timestamp)?;
        for line in &self.text_lines {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}

/// The smallest translatable item: one text line of one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationUnit {
    /// `{block_id}-{line_index}`
    pub unique_id: String,

    /// Source text of the line
    pub original_text: String,

    /// Position of the owning block in the document
    #[serde(skip)]
    pub block_index: usize,
}

/// Parsed subtitle file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleDocument {
    blocks: Vec<SubtitleBlock>,
    source_chars: usize,
}

impl SubtitleDocument {
    /// Build a document from already-segmented blocks
    pub fn from_blocks(blocks: Vec<SubtitleBlock>) -> Result<Self, SubtitleError> {
        if blocks.is_empty() {
            return Err(SubtitleError::EmptyInput);
        }

        let mut seen = HashSet::with_capacity(blocks.len());
        for block in &blocks {
            if !seen.insert(block.id.as_str()) {
                return Err(SubtitleError::DuplicateBlockId { block_id: block.id.clone() });
            }
        }

        let source_chars = blocks.iter().map(|b| b.to_string().chars().count()).sum();
        Ok(Self { blocks, source_chars })
    }

    /// Parse raw SRT text into blocks.
    ///
    /// Blocks are separated by one or more blank lines. In each block the first
    /// line is the id, the second the timestamp and the rest are text lines.
    /// Trailing whitespace is ignored, and so is a missing blank line after the
    /// final block.
    pub fn parse(content: &str) -> Result<Self, SubtitleError> {
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
        let trimmed = normalized.trim();
        if trimmed.is_empty() {
            return Err(SubtitleError::EmptyInput);
        }

        let mut blocks = Vec::new();
        for raw_block in BLOCK_SEPARATOR.split(trimmed) {
            let mut lines = raw_block.lines().map(str::trim_end);

            let id = match lines.next() {
                Some(id) => id.trim_start().to_string(),
                None => continue,
            };
            if id.is_empty() {
                continue;
            }

            let timestamp = match lines.next() {
                Some(ts) if !ts.trim().is_empty() => ts.to_string(),
                _ => return Err(SubtitleError::MissingTimestamp { block_id: id }),
            };

            let text_lines = lines.map(str::to_string).collect();
            blocks.push(SubtitleBlock { id, timestamp, text_lines });
        }

        let document = Self::from_blocks(blocks)?;
        debug!(
            "Parsed {} subtitle blocks with {} text lines",
            document.len(),
            document.unit_count()
        );
        Ok(document)
    }

    /// Blocks in document order
    pub fn blocks(&self) -> &[SubtitleBlock] {
        &self.blocks
    }

    /// Block at `index`, if any
    pub fn block(&self, index: usize) -> Option<&SubtitleBlock> {
        self.blocks.get(index)
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false for a parsed document; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Character count of the source text
    pub fn source_chars(&self) -> usize {
        self.source_chars
    }

    /// Total number of text lines across all blocks
    pub fn unit_count(&self) -> usize {
        self.blocks.iter().map(|b| b.text_lines.len()).sum()
    }

    /// Flatten blocks into translation units, block order then line order
    pub fn units(&self) -> Vec<TranslationUnit> {
        let mut units = Vec::with_capacity(self.unit_count());
        for (block_index, block) in self.blocks.iter().enumerate() {
            for (line_index, line) in block.text_lines.iter().enumerate() {
                units.push(TranslationUnit {
                    unique_id: block.unique_id(line_index),
                    original_text: line.clone(),
                    block_index,
                });
            }
        }
        units
    }

    /// Serialize the untranslated document with the canonical block framing
    pub fn to_srt_string(&self) -> String {
        let mut output = self
            .blocks
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join("\n\n");
        output.push('\n');
        output
    }
}
