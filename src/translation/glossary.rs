/*!
 * Glossary store for terminology consistency.
 *
 * The glossary maps an original term to the translation every chunk must use.
 * It is exchanged with the LLM (and with the operator) as a flat
 * comma-separated list of `original:translated` pairs.
 *
 * Parsing is permissive: suggestions come straight from model output, so
 * malformed pairs are dropped instead of failing the whole list.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

/// Pair delimiter. The full-width comma is left alone since translated
/// terms may contain it.
const PAIR_DELIMITER: char = ',';

/// Key/value delimiters accepted when parsing (ASCII and full-width colon)
const KEY_VALUE_DELIMITERS: [char; 2] = [':', '：'];

/// Delimiter used when serializing
const SERIALIZED_PAIR_DELIMITER: &str = ", ";

/// Original-term → translated-term mapping.
///
/// Backed by a `BTreeMap` so serialization is sorted and reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    terms: BTreeMap<String, String>,
}

impl Glossary {
    /// Create an empty glossary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a flat `original:translated, ...` list.
    ///
    /// Pairs that do not contain exactly one key/value delimiter are dropped,
    /// as are pairs whose original term is empty after trimming. When a key
    /// repeats, the last occurrence wins.
    pub fn parse(text: &str) -> Self {
        let mut glossary = Self::new();
        if text.trim().is_empty() {
            return glossary;
        }

        for pair in text.split(PAIR_DELIMITER) {
            let parts: Vec<&str> = pair.split(&KEY_VALUE_DELIMITERS[..]).collect();
            if parts.len() != 2 {
                if !pair.trim().is_empty() {
                    debug!("Dropping malformed glossary pair: {:?}", pair.trim());
                }
                continue;
            }

            glossary.insert(parts[0], parts[1]);
        }

        glossary
    }

    /// Render as `original:translated` pairs joined by `", "`.
    pub fn serialize(&self) -> String {
        self.terms
            .iter()
            .map(|(original, translated)| format!("{}:{}", original, translated))
            .collect::<Vec<_>>()
            .join(SERIALIZED_PAIR_DELIMITER)
    }

    /// Union of both glossaries; entries from `additions` win on collision.
    pub fn merge(&self, additions: &Glossary) -> Glossary {
        let mut merged = self.clone();
        for (original, translated) in &additions.terms {
            merged.terms.insert(original.clone(), translated.clone());
        }
        merged
    }

    /// Insert a term, trimming both sides. Empty originals are ignored.
    ///
    /// Returns `true` when the term was stored.
    pub fn insert(&mut self, original: &str, translated: &str) -> bool {
        let original = original.trim();
        if original.is_empty() {
            return false;
        }
        self.terms.insert(original.to_string(), translated.trim().to_string());
        true
    }

    /// Remove a term, returning its translation.
    pub fn remove(&mut self, original: &str) -> Option<String> {
        self.terms.remove(original.trim())
    }

    /// Translation for `original`, if present.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.terms.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate terms in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Glossary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Glossary {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Glossary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut glossary = Self::new();
        for (original, translated) in iter {
            glossary.insert(original.as_ref(), translated.as_ref());
        }
        glossary
    }
}
