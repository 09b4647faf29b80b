//! Structured-data extraction ("plucking")
//!
//! A rule set is configured once per run from a JSON string and applied to
//! every fetched page. Each rule names a CSS selector; the captures are
//! serialized into a JSON object keyed by rule name. An empty result is a
//! valid outcome and is reported as an empty string so the caller can apply
//! the require-extraction policy.

use crate::QuarryError;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One extraction rule from the rule-set string
#[derive(Debug, Clone, Deserialize)]
pub struct PluckRule {
    /// Key the captures are stored under in the result object
    pub name: String,

    /// CSS selector to match
    pub selector: String,

    /// Attribute to capture instead of the element text
    #[serde(default)]
    pub attribute: Option<String>,

    /// Capture only the first match instead of all of them
    #[serde(default)]
    pub first: bool,
}

/// A compiled extraction rule set
pub struct DataExtractor {
    rules: Vec<(PluckRule, Selector)>,
}

impl DataExtractor {
    /// Compiles a rule set from its JSON representation
    ///
    /// ```
    /// use quarry::extract::DataExtractor;
    ///
    /// let rules = r#"[{"name": "title", "selector": "h1", "first": true}]"#;
    /// let extractor = DataExtractor::from_rules(rules).unwrap();
    /// assert_eq!(extractor.len(), 1);
    /// ```
    pub fn from_rules(rules: &str) -> Result<Self, QuarryError> {
        let parsed: Vec<PluckRule> = serde_json::from_str(rules)
            .map_err(|e| QuarryError::ExtractionRules(e.to_string()))?;

        let mut compiled = Vec::with_capacity(parsed.len());
        for rule in parsed {
            let selector = Selector::parse(&rule.selector).map_err(|e| {
                QuarryError::ExtractionRules(format!(
                    "bad selector \"{}\" for rule \"{}\": {:?}",
                    rule.selector, rule.name, e
                ))
            })?;
            compiled.push((rule, selector));
        }

        Ok(Self { rules: compiled })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs the rule set against an HTML body
    ///
    /// Returns the serialized result object, or an empty string when no rule
    /// captured anything.
    pub fn run(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut result = Map::new();

        for (rule, selector) in &self.rules {
            let mut captures: Vec<String> = Vec::new();
            for element in document.select(selector) {
                let capture = match &rule.attribute {
                    Some(attr) => element.value().attr(attr).unwrap_or("").to_string(),
                    None => element.text().collect::<String>().trim().to_string(),
                };
                if capture.is_empty() {
                    continue;
                }
                captures.push(capture);
                if rule.first {
                    break;
                }
            }

            if captures.is_empty() {
                continue;
            }

            let value = if rule.first {
                Value::String(captures.remove(0))
            } else {
                Value::Array(captures.into_iter().map(Value::String).collect())
            };
            result.insert(rule.name.clone(), value);
        }

        if result.is_empty() {
            return String::new();
        }

        serde_json::to_string(&Value::Object(result)).unwrap_or_default()
    }
}
