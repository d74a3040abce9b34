//! Worksheet extraction: label matching over body paragraphs, then over
//! two-column tables.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conditional::resolve_checkbox;
use crate::docx::{Document, Table};
use crate::error::FillError;
use crate::fields::{FieldSchema, FieldSpec, MatchKind};

const REGULATORY_PART_PATTERN: &str = r"(?:14\s*CFR\s*)?[Pp]art\s*:?\s*(\d+)";
const SCHEDULED_FOR_PATTERN: &str = r"scheduled for\s+(.+?)\.?\s*$";

/// Placeholder token to extracted value. Every known placeholder is present;
/// an empty string means "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedValues(BTreeMap<String, String>);

impl ExtractedValues {
    pub fn with_keys<'a>(placeholders: impl IntoIterator<Item = &'a str>) -> Self {
        Self(
            placeholders
                .into_iter()
                .map(|placeholder| (placeholder.to_string(), String::new()))
                .collect(),
        )
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.0.get(placeholder).map(String::as_str)
    }

    /// The value when it is present and not blank.
    pub fn resolved(&self, placeholder: &str) -> Option<&str> {
        self.get(placeholder).filter(|value| !value.trim().is_empty())
    }

    pub fn insert(&mut self, placeholder: impl Into<String>, value: impl Into<String>) {
        self.0.insert(placeholder.into(), value.into());
    }

    /// Stores `value` unless it is blank or the slot already holds a value.
    fn fill_if_blank(&mut self, placeholder: &str, value: String) -> bool {
        if value.trim().is_empty() || self.resolved(placeholder).is_some() {
            return false;
        }
        self.insert(placeholder, value);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(placeholder, value)| (placeholder.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn blank_keys(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(placeholder, _)| placeholder)
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtractedValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(placeholder, value)| (placeholder.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug)]
pub struct WorksheetExtractor<'s> {
    schema: &'s FieldSchema,
    regulatory_part: Regex,
    scheduled_for: Regex,
}

struct TableCandidate {
    exact: bool,
    value: String,
}

impl<'s> WorksheetExtractor<'s> {
    pub fn new(schema: &'s FieldSchema) -> Result<Self, FillError> {
        Ok(Self {
            schema,
            regulatory_part: Regex::new(REGULATORY_PART_PATTERN)?,
            scheduled_for: Regex::new(SCHEDULED_FOR_PATTERN)?,
        })
    }

    /// Reads every known field from `worksheet`. Missing fields degrade to
    /// empty strings; the document is not modified.
    pub fn extract(&self, worksheet: &Document) -> ExtractedValues {
        let mut values = ExtractedValues::with_keys(self.schema.extracted_placeholders());

        let paragraphs = worksheet.body_paragraph_texts();
        self.extract_paragraphs(&paragraphs, &mut values);

        let tables = worksheet.body_tables();
        self.extract_tables(&tables, &mut values);

        let regulatory_part = self.find_regulatory_part(&worksheet.all_paragraph_texts());
        if let Some(part) = regulatory_part {
            if values.fill_if_blank(&self.schema.regulatory_part_placeholder, part) {
                debug!("regulatory part taken from free text");
            }
        }

        let blank = values.blank_keys().len();
        info!(
            paragraphs = paragraphs.len(),
            tables = tables.len(),
            fields = values.len(),
            filled = values.len() - blank,
            blank,
            "extracted worksheet values"
        );
        values
    }

    fn extract_paragraphs(&self, paragraphs: &[String], values: &mut ExtractedValues) {
        let mut index = 0;
        while index < paragraphs.len() {
            let raw = paragraphs[index].trim();
            if raw.is_empty() {
                index += 1;
                continue;
            }

            if self.schema.is_checkbox_prompt(raw) {
                if let Some(choice) = resolve_checkbox(paragraphs, index + 1, self.schema.checkboxes())
                {
                    debug!(project_type = choice, "resolved checkbox block");
                    values.fill_if_blank(&self.schema.project_type_placeholder, choice.to_string());
                }
                index += 1;
                continue;
            }

            let normalized = self.schema.normalize(raw);
            let Some(found) = self.schema.match_label(&normalized) else {
                index += 1;
                continue;
            };
            let field = found.field;
            debug!(
                placeholder = %field.placeholder,
                kind = found.kind.as_str(),
                "matched worksheet label"
            );

            let inline = field
                .inline_value(raw)
                .unwrap_or_else(|| value_after_label(&normalized, &field.label));

            let (value, next) = if field.multiline {
                self.collect_multiline(paragraphs, index + 1, inline)
            } else {
                self.single_line_value(field, raw, inline, paragraphs, index + 1)
            };

            values.fill_if_blank(&field.placeholder, value);
            index = next;
        }
    }

    /// First `part NN` mention in document order, table cells, text boxes,
    /// headers and footers included.
    fn find_regulatory_part(&self, texts: &[String]) -> Option<String> {
        texts.iter().find_map(|text| {
            self.regulatory_part
                .captures(text)
                .and_then(|captures| captures.get(1))
                .map(|part| part.as_str().to_string())
        })
    }

    /// Lines after a multiline label up to the first terminator. Returns the
    /// joined value and the index of the terminator.
    fn collect_multiline(
        &self,
        paragraphs: &[String],
        start: usize,
        inline: String,
    ) -> (String, usize) {
        let mut lines = Vec::new();
        if !inline.is_empty() {
            lines.push(inline);
        }

        let mut index = start;
        while index < paragraphs.len() && !self.schema.ends_multiline(&paragraphs[index]) {
            lines.push(paragraphs[index].trim().to_string());
            index += 1;
        }
        (lines.join("\n"), index)
    }

    fn single_line_value(
        &self,
        field: &FieldSpec,
        raw: &str,
        inline: String,
        paragraphs: &[String],
        next: usize,
    ) -> (String, usize) {
        if !inline.is_empty() {
            let value = if field.is_tc_number() {
                first_line(&inline)
            } else {
                inline
            };
            return (value, next);
        }

        let following = paragraphs
            .get(next)
            .map(|text| text.trim())
            .filter(|text| !self.schema.ends_multiline(text));

        if field.is_tc_number() {
            if let Some(text) = following {
                return (first_line(text), next + 1);
            }
        }

        if field.concerns_date() {
            if let Some(date) = self.scheduled_date(raw) {
                return (date, next);
            }
            if let Some(date) = following.and_then(|text| self.scheduled_date(text)) {
                return (date, next + 1);
            }
        }

        (String::new(), next)
    }

    fn scheduled_date(&self, text: &str) -> Option<String> {
        self.scheduled_for
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|date| date.as_str().trim().to_string())
            .filter(|date| !date.is_empty())
    }

    /// Two-column rows: label in the first cell, value in the second. An
    /// exact label row beats partial rows; within a class the first
    /// non-empty row wins. Non-empty table values replace paragraph values.
    fn extract_tables(&self, tables: &[Table<'_>], values: &mut ExtractedValues) {
        let mut candidates: BTreeMap<&str, TableCandidate> = BTreeMap::new();

        for table in tables {
            let rows = table.rows();
            for (row_index, row) in rows.iter().enumerate() {
                let cells = row.cells();
                if cells.len() < 2 {
                    continue;
                }

                let normalized = self.schema.normalize(&cells[0].text());
                let Some(found) = self.schema.match_label(&normalized) else {
                    continue;
                };
                let field = found.field;
                let exact = found.kind == MatchKind::Exact;

                let mut value = clean_cell(&cells[1].text());
                if field.is_tc_number() {
                    value = first_line(&value);
                    if value.is_empty() {
                        value = rows
                            .get(row_index + 1)
                            .and_then(|next| next.cells().first().map(|cell| cell.text()))
                            .filter(|text| {
                                self.schema
                                    .match_label(&self.schema.normalize(text))
                                    .is_none()
                            })
                            .map(|text| first_line(&clean_cell(&text)))
                            .unwrap_or_default();
                    }
                }
                if value.is_empty() {
                    continue;
                }

                match candidates.entry(field.placeholder.as_str()) {
                    Entry::Vacant(slot) => {
                        slot.insert(TableCandidate { exact, value });
                    }
                    Entry::Occupied(mut slot) => {
                        if exact && !slot.get().exact {
                            slot.insert(TableCandidate { exact, value });
                        }
                    }
                }
            }
        }

        for (placeholder, candidate) in candidates {
            debug!(
                placeholder,
                exact = candidate.exact,
                "table value found"
            );
            values.insert(placeholder, candidate.value);
        }
    }
}

fn value_after_label(normalized: &str, label: &str) -> String {
    normalized
        .find(label)
        .map(|start| {
            normalized[start + label.len()..]
                .trim_start_matches(':')
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn clean_cell(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
