//! Worksheet vocabulary: canonical labels, the placeholders they feed, and
//! the prompts the extractor and validator look for.
//!
//! A [`FieldSchema`] is compiled once from a [`SchemaDefinition`] (built-in
//! or loaded from disk) and then passed explicitly to every stage.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::info;

use crate::error::FillError;

mod defaults;
mod normalize;
mod schema;

pub use normalize::LabelNormalizer;
#[cfg(test)]
pub use schema::FieldDefinition;
pub use schema::{SchemaDefinition, SchemaError, SchemaFormat};

pub const CHECKED_BOX: char = '☒';

/// Question prompt shape shared by multiline termination and validation:
/// `Question 15...` or a strict numbered header such as `15.` followed by
/// whitespace or end of line. `1) Step one` is not a prompt.
pub const QUESTION_PROMPT_PATTERN: &str = r"^(?:Question\s+\d+\b|\d+\.(?:\s|$))";

/// Labels longer than this end a multiline value wherever they appear in a
/// line; shorter ones only when the line starts with them.
pub const MULTILINE_CONTAINS_MIN_CHARS: usize = 20;

const PLACEHOLDER_SHAPE: &str = r"^\{[^}]+\}$";

/// Ranking of a label match, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Contains,
    Prefix,
    Exact,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Prefix => "prefix",
            Self::Exact => "exact",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Normalized label.
    pub label: String,
    pub placeholder: String,
    pub multiline: bool,
    pattern: Regex,
}

impl FieldSpec {
    /// Text following the label in a raw line, with the separating colon
    /// and surrounding whitespace removed.
    pub fn inline_value(&self, raw: &str) -> Option<String> {
        let found = self.pattern.find(raw)?;
        let rest = raw[found.end()..]
            .trim_start_matches(|ch: char| ch == ':' || ch.is_whitespace())
            .trim();
        Some(rest.to_string())
    }

    /// TC numbers are a single token; only the first line of a value counts.
    pub fn is_tc_number(&self) -> bool {
        self.label.contains("TC number")
    }

    pub fn concerns_date(&self) -> bool {
        let lower = self.label.to_lowercase();
        lower.contains("date") || lower.contains("certification")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LabelMatch<'a> {
    pub field: &'a FieldSpec,
    pub kind: MatchKind,
}

#[derive(Debug, Clone)]
pub struct CheckboxOption {
    /// Option text with the checked glyph removed.
    pub label: String,
    pub value: String,
    pattern: Regex,
}

impl CheckboxOption {
    /// True when the option text directly follows a checked glyph.
    pub fn is_checked_in(&self, text: &str) -> bool {
        text.contains(CHECKED_BOX) && self.pattern.is_match(text)
    }
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    normalizer: LabelNormalizer,
    fields: Vec<FieldSpec>,
    checkbox_prompt: Regex,
    checkboxes: Vec<CheckboxOption>,
    question_prompt: Regex,
    pub project_type_placeholder: String,
    pub regulatory_part_placeholder: String,
    pub option_placeholder: String,
    pub docket_placeholder: String,
    pub notice_placeholder: String,
    pub mandatory_placeholders: Vec<String>,
    pub mandatory_questions: Vec<String>,
}

impl FieldSchema {
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_definition(defaults::definition())
    }

    /// Loads a JSON or TOML schema file.
    pub fn load(path: &Path) -> Result<Self, FillError> {
        if !path.is_file() {
            return Err(FillError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let invalid = |source: SchemaError| FillError::Schema {
            path: path.to_path_buf(),
            source,
        };

        let format = SchemaFormat::from_path(path).map_err(invalid)?;
        let text = fs::read_to_string(path).map_err(|source| FillError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let definition = SchemaDefinition::parse(&text, format).map_err(invalid)?;
        let schema = Self::from_definition(definition).map_err(invalid)?;

        info!(
            path = %path.display(),
            fields = schema.fields.len(),
            checkboxes = schema.checkboxes.len(),
            "loaded placeholder schema"
        );
        Ok(schema)
    }

    pub fn from_definition(definition: SchemaDefinition) -> Result<Self, SchemaError> {
        if definition.fields.is_empty() {
            return Err(SchemaError::NoFields);
        }

        let normalizer = LabelNormalizer::new()?;
        let placeholder_shape = Regex::new(PLACEHOLDER_SHAPE)?;
        let check_placeholder = |placeholder: &str| {
            if placeholder_shape.is_match(placeholder) {
                Ok(placeholder.to_string())
            } else {
                Err(SchemaError::BadPlaceholder(placeholder.to_string()))
            }
        };

        let mut fields: Vec<FieldSpec> = Vec::with_capacity(definition.fields.len());
        let mut raw_labels: Vec<&str> = Vec::with_capacity(definition.fields.len());
        for field in &definition.fields {
            let label = normalizer.normalize(&field.label);
            if label.is_empty() {
                return Err(SchemaError::EmptyLabel(field.label.clone()));
            }
            if let Some(index) = fields.iter().position(|known| known.label == label) {
                return Err(SchemaError::DuplicateLabel {
                    first: raw_labels[index].to_string(),
                    second: field.label.clone(),
                    normalized: label,
                });
            }

            let pattern = Regex::new(&LabelNormalizer::loose_pattern(&label))?;
            fields.push(FieldSpec {
                placeholder: check_placeholder(field.placeholder.as_str())?,
                label,
                multiline: field.multiline,
                pattern,
            });
            raw_labels.push(&field.label);
        }

        let mut checkboxes = Vec::new();
        for checkbox in definition.checkboxes() {
            let label = checkbox
                .label
                .replace(CHECKED_BOX, "")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if label.is_empty() {
                return Err(SchemaError::EmptyLabel(checkbox.label));
            }
            let pattern = Regex::new(&format!(
                r"{}\s*{}",
                regex::escape(&CHECKED_BOX.to_string()),
                LabelNormalizer::loose_pattern(&label)
            ))?;
            checkboxes.push(CheckboxOption {
                label,
                value: checkbox.value,
                pattern,
            });
        }

        let prompt = definition
            .checkbox_prompt()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let checkbox_prompt = Regex::new(&LabelNormalizer::loose_pattern(&prompt))?;

        Ok(Self {
            project_type_placeholder: check_placeholder(definition.project_type_placeholder())?,
            regulatory_part_placeholder: check_placeholder(
                definition.regulatory_part_placeholder(),
            )?,
            option_placeholder: check_placeholder(definition.option_placeholder())?,
            docket_placeholder: check_placeholder(definition.docket_placeholder())?,
            notice_placeholder: check_placeholder(definition.notice_placeholder())?,
            mandatory_placeholders: definition
                .mandatory_placeholders()
                .iter()
                .map(|placeholder| check_placeholder(placeholder.as_str()))
                .collect::<Result<_, _>>()?,
            mandatory_questions: definition.mandatory_questions(),
            question_prompt: Regex::new(QUESTION_PROMPT_PATTERN)?,
            checkbox_prompt,
            checkboxes,
            fields,
            normalizer,
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn checkboxes(&self) -> &[CheckboxOption] {
        &self.checkboxes
    }

    /// Every placeholder the extractor reports, field table order first.
    pub fn extracted_placeholders(&self) -> Vec<&str> {
        let mut placeholders: Vec<&str> = Vec::with_capacity(self.fields.len() + 2);
        let extra = [
            self.project_type_placeholder.as_str(),
            self.regulatory_part_placeholder.as_str(),
        ];
        for placeholder in self
            .fields
            .iter()
            .map(|field| field.placeholder.as_str())
            .chain(extra)
        {
            if !placeholders.contains(&placeholder) {
                placeholders.push(placeholder);
            }
        }
        placeholders
    }

    pub fn field_for_placeholder(&self, placeholder: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|field| field.placeholder == placeholder)
    }

    /// Best label for an already-normalized line: exact beats prefix beats
    /// contains, then the longer label, then table order.
    pub fn match_label(&self, normalized: &str) -> Option<LabelMatch<'_>> {
        if normalized.is_empty() {
            return None;
        }

        let mut best: Option<LabelMatch<'_>> = None;
        for field in &self.fields {
            let kind = if normalized == field.label {
                MatchKind::Exact
            } else if normalized.starts_with(&field.label) {
                MatchKind::Prefix
            } else if normalized.contains(&field.label) {
                MatchKind::Contains
            } else {
                continue;
            };

            let better = match best {
                None => true,
                Some(current) => {
                    (kind, field.label.len()) > (current.kind, current.field.label.len())
                }
            };
            if better {
                best = Some(LabelMatch { field, kind });
            }
        }
        best
    }

    pub fn is_checkbox_prompt(&self, text: &str) -> bool {
        self.checkbox_prompt.is_match(text)
    }

    pub fn is_question_prompt(&self, text: &str) -> bool {
        self.question_prompt.is_match(text.trim())
    }

    /// Whether `line` ends a multiline value: blank lines, question prompts,
    /// lines starting with a known label, and lines containing a long one.
    pub fn ends_multiline(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() || self.is_question_prompt(trimmed) {
            return true;
        }

        let normalized = self.normalize(trimmed);
        self.fields.iter().any(|field| {
            normalized.starts_with(&field.label)
                || (field.label.chars().count() > MULTILINE_CONTAINS_MIN_CHARS
                    && normalized.contains(&field.label))
        })
    }
}

#[cfg(test)]
mod tests;
