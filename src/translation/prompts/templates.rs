/*!
 * Prompt templates for glossary extraction and chunk translation.
 *
 * Two request shapes are built here:
 * - the analysis prompt: free text in, a flat `original:translated` list out;
 * - the chunk prompt: a JSON payload of lines in, schema-constrained JSON out.
 */

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::providers::CompletionRequest;
use crate::subtitle_processor::TranslationUnit;
use crate::translation::glossary::Glossary;

/// Source and target language labels as they appear in prompts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLanguages {
    pub source: String,
    pub target: String,
}

impl PromptLanguages {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl Default for PromptLanguages {
    fn default() -> Self {
        Self::new("Korean", "Taiwanese Traditional Chinese")
    }
}

/// Template with `{source_language}` / `{target_language}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// System instruction for chunk translation.
    pub const SUBTITLE_TRANSLATOR: &'static str = r#"You are a senior subtitle translator working from {source_language} into {target_language}. You have translated many television dramas and variety shows, and your subtitles read the way native viewers speak.

## Translation principles
- Translate meaning, not words. Capture tone, register and emotion.
- Use the vocabulary, phrasing and conventions of {target_language} viewers.
- Prefer plain modern wording that a twelve-year-old understands.
- Do not end a line with a full stop "。".
- Put one half-width space between CJK text and Latin letters or digits.
- If a source line starts with a dash (-), the translation starts with a dash too.
- Never use the full-width comma "，" or the enumeration comma "、"; write one half-width space instead.

## Structure rules (highest priority)
- The input is a JSON object whose `linesToTranslate` array holds one object per subtitle line, each with a `uniqueId` fingerprint.
- Return exactly one output object per input line. The counts must match.
- Copy every `uniqueId` verbatim from the input. Never invent, drop or alter one.
- Never merge or split lines. Each line is translated on its own.
- The translated text contains no line breaks.

## Consistency
- Stay consistent with the program introduction: characters, relationships, setting.
- Render place names, show titles and other proper nouns the way {target_language} media commonly does.

## Terminology override (absolute)
- The glossary in the request is an absolute override list. When a listed original term appears, use the listed translation character for character. Do not paraphrase it, shorten it or replace it with a title or honorific.
- When the source uses only a given name or nickname (e.g. "Minseong"), the translation uses only the matching given name. Never expand a given name into a full name, even if the full name is known from the introduction or the glossary.

Return only the JSON object described by the response schema."#;

    /// Prompt for one-shot glossary extraction.
    pub const TERM_EXTRACTOR: &'static str = r#"You are a linguist specialising in {source_language} and {target_language}. Extract high-value terms from the subtitle text below and give their {target_language} translation, staying consistent with the terms already established.

## What counts as a term
A term is a proper noun or a culturally specific noun or short noun phrase:
- people's names and forms of address tied to a person
- place names
- organisation and brand names
- titles of works (films, shows, books)
- culture-specific concepts, food or items
- technical or medical jargon

## Never extract
- full sentences or clauses
- common conversational phrases
- verb phrases or general descriptions

## Procedure
1. Read the program introduction to learn the characters and setting.
2. Treat the established terms as the source of truth.
3. Scan the subtitle text line by line.
4. Keep only NEW terms that are not in the established list.
5. Translate each new term consistently with the established terms.
6. Omit a term if it is already written in {target_language} or its translation would be identical to the original.
7. Output a single comma-separated list of `original:translated` pairs and nothing else.

## Name handling (highest priority)
- The introduction may map full names to given names, e.g. "Kim Minseong (Minseong)".
- A full name in the text is extracted and translated as a full name ("Kim Minseong:金民成").
- A given name on its own is extracted and translated as a given name only ("Minseong:民成").
- Never translate a given name into a full name.
- If both forms appear, output both as separate pairs.

## Established terms
---
{established_terms}
---

## Program introduction
---
{program_context}
---

## Subtitle text
---
{subtitle_text}
---"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// The chunk translation system instruction.
    pub fn subtitle_translator() -> Self {
        Self::new(Self::SUBTITLE_TRANSLATOR)
    }

    /// The glossary extraction prompt.
    pub fn term_extractor() -> Self {
        Self::new(Self::TERM_EXTRACTOR)
    }

    /// Render the language placeholders.
    pub fn render(&self, languages: &PromptLanguages) -> String {
        self.template
            .replace("{source_language}", &languages.source)
            .replace("{target_language}", &languages.target)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::subtitle_translator()
    }
}

/// Payload sent to the model for one chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPayload {
    pub lines_to_translate: Vec<TranslationUnit>,
}

/// One translated line as returned by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub unique_id: String,
    pub translated_text: String,
}

impl TranslationResult {
    pub fn new(unique_id: impl Into<String>, translated_text: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            translated_text: translated_text.into(),
        }
    }
}

/// Top-level shape of a chunk response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedLinesResponse {
    pub translated_lines: Vec<TranslationResult>,
}

/// JSON schema of a chunk response
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "translatedLines": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "uniqueId": { "type": "string" },
                        "translatedText": { "type": "string" }
                    },
                    "required": ["uniqueId", "translatedText"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["translatedLines"],
        "additionalProperties": false
    })
}

/// Placeholder used when a prompt section has no content
const NONE_PLACEHOLDER: &str = "None";

fn or_none(text: &str) -> &str {
    if text.trim().is_empty() {
        NONE_PLACEHOLDER
    } else {
        text.trim()
    }
}

/// Build the free-text glossary extraction request.
pub fn build_analysis_request(
    languages: &PromptLanguages,
    program_context: &str,
    established: &Glossary,
    subtitle_text: &str,
) -> CompletionRequest {
    let established_terms = established.serialize();
    let prompt = PromptTemplate::term_extractor()
        .render(languages)
        .replace("{established_terms}", or_none(&established_terms))
        .replace("{program_context}", or_none(program_context))
        .replace("{subtitle_text}", subtitle_text);

    CompletionRequest::new(prompt)
}

/// Build the structured request for one chunk.
pub fn build_chunk_request(
    languages: &PromptLanguages,
    program_context: &str,
    glossary: &Glossary,
    chunk: &[TranslationUnit],
) -> Result<CompletionRequest, serde_json::Error> {
    let payload = ChunkPayload {
        lines_to_translate: chunk.to_vec(),
    };
    let payload_json = serde_json::to_string_pretty(&payload)?;
    let glossary_text = glossary.serialize();

    let prompt = format!(
        "Reference material for this translation:\n\n\
         [Program introduction]\n{}\n\n\
         [Glossary: terms that must be used] (format \"original:translated\")\n{}\n\n\
         ---\n\
         Subtitle lines to translate (JSON):\n\n{}\n",
        or_none(program_context),
        or_none(&glossary_text),
        payload_json
    );

    Ok(CompletionRequest::new(prompt)
        .system(PromptTemplate::subtitle_translator().render(languages))
        .schema(response_schema()))
}

/// Locate the JSON object in a model response.
///
/// Accepts a bare object, an object inside a code fence, or an object
/// surrounded by prose (first `{` to last `}`).
pub fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    if let Some(start) = trimmed.find("```json") {
        if let Some(end) = trimmed[start + 7..].find("```") {
            let inner = trimmed[start + 7..start + 7 + end].trim();
            if inner.starts_with('{') {
                return Some(inner);
            }
        }
    }

    if let Some(start) = trimmed.find("```") {
        if let Some(end) = trimmed[start + 3..].find("```") {
            let inner = trimmed[start + 3..start + 3 + end].trim();
            if inner.starts_with('{') {
                return Some(inner);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => Some(&trimmed[start..=end]),
        _ => None,
    }
}

/// Recover the chunk payload embedded in a chunk prompt.
///
/// Used by scripted providers that answer based on the lines they were sent.
pub fn extract_chunk_payload(prompt: &str) -> Option<ChunkPayload> {
    let key_position = prompt.rfind("\"linesToTranslate\"")?;
    let start = prompt[..key_position].rfind('{')?;
    serde_json::Deserializer::from_str(&prompt[start..])
        .into_iter::<ChunkPayload>()
        .next()?
        .ok()
}
