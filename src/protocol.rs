use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::error::{read_config_file, GuardError, Result};
use crate::normalize::normalize;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// One protocol category: a stable identifier plus its exemplar phrases.
///
/// The name doubles as the display label and as the key in stored reports, so
/// renaming a category in the protocol file is a breaking change for history.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    name: String,
    phrases: Vec<String>,
    normalized: Vec<String>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exemplar phrases exactly as authored.
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn normalized_phrases(&self) -> &[String] {
        &self.normalized
    }

    /// Authored phrases whose normalized form occurs in `normalized_text`.
    pub fn matches_in<'a>(&'a self, normalized_text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.phrases
            .iter()
            .zip(&self.normalized)
            .filter(move |(_, norm)| normalized_text.contains(norm.as_str()))
            .map(|(phrase, _)| phrase.as_str())
    }

    pub fn has_exact_match(&self, normalized_text: &str) -> bool {
        self.normalized
            .iter()
            .any(|norm| normalized_text.contains(norm.as_str()))
    }
}

/// Validated, immutable category -> phrase list mapping in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolDefinition {
    categories: Vec<Category>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ProtocolDefinition {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = read_config_file(path)?;
        let protocol = Self::parse(&raw, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            categories = protocol.len(),
            phrases = protocol.phrase_count(),
            "protocol loaded"
        );
        Ok(protocol)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::parse(json, "<inline protocol>")
    }

    fn parse(json: &str, origin: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|source| GuardError::ConfigParse {
            origin: origin.to_string(),
            source,
        })?;
        Self::from_value(&value)
    }

    /// Validates a parsed JSON document. Every category is checked; the first
    /// problem aborts the load.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            GuardError::invalid("protocol file should contain an object of categories")
        })?;

        let mut pairs = Vec::with_capacity(object.len());
        for (name, phrases) in object {
            let list = phrases.as_array().ok_or_else(|| {
                GuardError::invalid(format!("category '{name}' should contain a list of phrases"))
            })?;
            let mut collected = Vec::with_capacity(list.len());
            for (idx, phrase) in list.iter().enumerate() {
                let text = phrase.as_str().ok_or_else(|| {
                    GuardError::invalid(format!(
                        "category '{name}' phrase #{idx} should be a string"
                    ))
                })?;
                collected.push(text.to_string());
            }
            pairs.push((name.clone(), collected));
        }
        Self::from_pairs(pairs)
    }

    pub fn from_pairs<I, N, P>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, Vec<P>)>,
        N: Into<String>,
        P: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut categories = Vec::new();

        for (name, phrases) in pairs {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(GuardError::invalid("category names must not be empty"));
            }
            if !seen.insert(name.clone()) {
                return Err(GuardError::invalid(format!("duplicate category '{name}'")));
            }
            if phrases.is_empty() {
                return Err(GuardError::invalid(format!(
                    "category '{name}' has an empty phrase list"
                )));
            }

            let phrases: Vec<String> = phrases.into_iter().map(Into::into).collect();
            let mut normalized = Vec::with_capacity(phrases.len());
            for phrase in &phrases {
                let norm = normalize(phrase);
                // An empty pattern would be contained in every transcript.
                if norm.is_empty() {
                    return Err(GuardError::invalid(format!(
                        "category '{name}' contains a phrase with no words: '{phrase}'"
                    )));
                }
                normalized.push(norm);
            }

            categories.push(Category {
                name,
                phrases,
                normalized,
            });
        }

        if categories.is_empty() {
            return Err(GuardError::invalid("protocol defines no categories"));
        }
        Ok(Self { categories })
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl ProtocolDefinition {
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn phrase_count(&self) -> usize {
        self.categories.iter().map(|c| c.phrases.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn keeps_document_order() {
        let p = ProtocolDefinition::from_json_str(
            r#"{"Zeta": ["z phrase"], "Alpha": ["a phrase"], "Mid": ["m phrase"]}"#,
        )
        .unwrap();
        let names: Vec<&str> = p.names().collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn rejects_scalar_category_value() {
        let err = ProtocolDefinition::from_json_str(
            r#"{"Greeting": ["hello"], "Broken": "not a list"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn rejects_non_object_top_level() {
        let err = ProtocolDefinition::from_json_str(r#"["hello"]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn rejects_punctuation_only_phrase() {
        let err = ProtocolDefinition::from_pairs(vec![("Greeting", vec!["hello", "!!!"])])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn matches_report_authored_phrase() {
        let p = ProtocolDefinition::from_pairs(vec![("Misbehavior", vec!["Don't yell", "shut up"])])
            .unwrap();
        let cat = p.get("Misbehavior").unwrap();
        let hits: Vec<&str> = cat.matches_in("please dont yell at me").collect();
        assert_eq!(hits, vec!["Don't yell"]);
    }
}
