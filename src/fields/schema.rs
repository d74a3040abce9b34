use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::defaults;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unsupported schema format {0:?}, expected .json or .toml")]
    Format(String),

    #[error("failed to parse schema: {0}")]
    Parse(String),

    #[error("placeholder {0:?} must be a single {{Name}} token")]
    BadPlaceholder(String),

    #[error("label {0:?} normalizes to an empty key")]
    EmptyLabel(String),

    #[error("labels {first:?} and {second:?} both normalize to {normalized:?}")]
    DuplicateLabel {
        first: String,
        second: String,
        normalized: String,
    },

    #[error("schema defines no fields")]
    NoFields,

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Toml,
}

impl SchemaFormat {
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(SchemaError::Format(extension)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub label: String,
    pub placeholder: String,
    #[serde(default)]
    pub multiline: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckboxDefinition {
    pub label: String,
    pub value: String,
}

/// On-disk schema document. Optional keys fall back to the built-in
/// vocabulary when the schema is compiled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDefinition {
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub checkbox_prompt: Option<String>,
    #[serde(default)]
    pub project_type_placeholder: Option<String>,
    #[serde(default)]
    pub checkboxes: Option<Vec<CheckboxDefinition>>,
    #[serde(default)]
    pub regulatory_part_placeholder: Option<String>,
    #[serde(default)]
    pub option_placeholder: Option<String>,
    #[serde(default)]
    pub docket_placeholder: Option<String>,
    #[serde(default)]
    pub notice_placeholder: Option<String>,
    #[serde(default)]
    pub mandatory_placeholders: Option<Vec<String>>,
    #[serde(default)]
    pub mandatory_questions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Structured(SchemaDefinition),
    Flat(BTreeMap<String, String>),
}

impl SchemaDefinition {
    /// Parses either the structured form or a flat `label -> placeholder`
    /// mapping, in which every field is single-line.
    pub fn parse(text: &str, format: SchemaFormat) -> Result<Self, SchemaError> {
        let file: SchemaFile = match format {
            SchemaFormat::Json => {
                serde_json::from_str(text).map_err(|err| SchemaError::Parse(err.to_string()))?
            }
            SchemaFormat::Toml => {
                toml::from_str(text).map_err(|err| SchemaError::Parse(err.to_string()))?
            }
        };

        Ok(match file {
            SchemaFile::Structured(definition) => definition,
            SchemaFile::Flat(mapping) => Self {
                fields: mapping
                    .into_iter()
                    .map(|(label, placeholder)| FieldDefinition {
                        label,
                        placeholder,
                        multiline: false,
                    })
                    .collect(),
                ..Self::default()
            },
        })
    }

    pub(super) fn checkbox_prompt(&self) -> &str {
        self.checkbox_prompt
            .as_deref()
            .unwrap_or(defaults::CHECKBOX_PROMPT)
    }

    pub(super) fn project_type_placeholder(&self) -> &str {
        self.project_type_placeholder
            .as_deref()
            .unwrap_or(defaults::PROJECT_TYPE_PLACEHOLDER)
    }

    pub(super) fn regulatory_part_placeholder(&self) -> &str {
        self.regulatory_part_placeholder
            .as_deref()
            .unwrap_or(defaults::REGULATORY_PART_PLACEHOLDER)
    }

    pub(super) fn option_placeholder(&self) -> &str {
        self.option_placeholder
            .as_deref()
            .unwrap_or(defaults::OPTION_PLACEHOLDER)
    }

    pub(super) fn docket_placeholder(&self) -> &str {
        self.docket_placeholder
            .as_deref()
            .unwrap_or(defaults::DOCKET_PLACEHOLDER)
    }

    pub(super) fn notice_placeholder(&self) -> &str {
        self.notice_placeholder
            .as_deref()
            .unwrap_or(defaults::NOTICE_PLACEHOLDER)
    }

    pub(super) fn checkboxes(&self) -> Vec<CheckboxDefinition> {
        self.checkboxes.clone().unwrap_or_else(defaults::checkboxes)
    }

    pub(super) fn mandatory_placeholders(&self) -> Vec<String> {
        self.mandatory_placeholders.clone().unwrap_or_else(|| {
            defaults::MANDATORY_PLACEHOLDERS
                .iter()
                .map(|placeholder| (*placeholder).to_string())
                .collect()
        })
    }

    pub(super) fn mandatory_questions(&self) -> Vec<String> {
        self.mandatory_questions.clone().unwrap_or_else(|| {
            defaults::MANDATORY_QUESTIONS
                .iter()
                .map(|question| (*question).to_string())
                .collect()
        })
    }
}
