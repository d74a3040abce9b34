//! Completeness checks run between extraction and replacement.

use regex::Regex;
use tracing::{debug, info};

use crate::docx::Document;
use crate::error::{FillError, ValidationError};
use crate::extract::ExtractedValues;
use crate::fields::FieldSchema;

/// Regulatory parts a CFR override may name.
pub const ALLOWED_CFR_PARTS: [&str; 7] = ["23", "25", "27", "29", "31", "33", "35"];
const DOCKET_PATTERN: &str = r"^FAA-\d{4}-\d{4}$";
const NOTICE_PATTERN: &str = r"^\d{2}-\d{2}-\d{2}-SC$";

/// Values supplied on the command line that take precedence over the
/// worksheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub cfr_part: Option<String>,
    pub docket_no: Option<String>,
    pub notice_no: Option<String>,
}

#[derive(Debug)]
pub struct Validator<'s> {
    schema: &'s FieldSchema,
    prompts: Vec<(String, Regex)>,
    docket: Regex,
    notice: Regex,
}

impl<'s> Validator<'s> {
    pub fn new(schema: &'s FieldSchema) -> Result<Self, FillError> {
        let prompts: Vec<(String, Regex)> = schema
            .mandatory_questions
            .iter()
            .map(|question| {
                let number = regex::escape(question.trim());
                let pattern = format!(r"^(?:Question\s+{number}|{number}\.)(?:\D|$)");
                Regex::new(&pattern).map(|prompt| (question.clone(), prompt))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            schema,
            prompts,
            docket: Regex::new(DOCKET_PATTERN)?,
            notice: Regex::new(NOTICE_PATTERN)?,
        })
    }

    /// Fails on the first mandatory placeholder without a value, then on the
    /// first mandatory question without an answer.
    pub fn validate(
        &self,
        values: &ExtractedValues,
        paragraphs: &[String],
    ) -> Result<(), ValidationError> {
        for placeholder in &self.schema.mandatory_placeholders {
            if values.resolved(placeholder).is_none() {
                if let Some(field) = self.schema.field_for_placeholder(placeholder) {
                    debug!(label = %field.label, "worksheet label has no value");
                }
                return Err(ValidationError::MissingField {
                    placeholder: placeholder.clone(),
                });
            }
        }

        for (question, prompt) in &self.prompts {
            let answer = self.answer(prompt, paragraphs);
            debug!(question = %question, answered = answer.is_some(), "checked question");
            if answer.is_none() {
                return Err(ValidationError::MissingAnswer {
                    question: question.clone(),
                });
            }
        }

        info!(
            fields = self.schema.mandatory_placeholders.len(),
            questions = self.prompts.len(),
            "worksheet passed validation"
        );
        Ok(())
    }

    pub fn validate_document(
        &self,
        values: &ExtractedValues,
        worksheet: &Document,
    ) -> Result<(), ValidationError> {
        self.validate(values, &worksheet.body_paragraph_texts())
    }

    /// Answer to the first prompt matching `prompt`: the text after the
    /// first colon on the prompt line, else the next paragraph unless that
    /// paragraph is itself a question prompt.
    fn answer<'p>(&self, prompt: &Regex, paragraphs: &'p [String]) -> Option<&'p str> {
        let index = paragraphs
            .iter()
            .position(|text| prompt.is_match(text.trim()))?;

        let line = paragraphs[index].trim();
        if let Some((_, after)) = line.split_once(':') {
            let after = after.trim();
            if !after.is_empty() {
                return Some(after);
            }
        }

        paragraphs
            .get(index + 1)
            .map(|next| next.trim())
            .filter(|next| !next.is_empty() && !self.schema.is_question_prompt(next))
    }

    /// Rejects malformed overrides before any document is touched.
    pub fn check_overrides(&self, overrides: &Overrides) -> Result<(), ValidationError> {
        if let Some(cfr) = &overrides.cfr_part {
            let parts: Vec<&str> = cfr.split(',').map(str::trim).collect();
            if parts.iter().any(|part| !ALLOWED_CFR_PARTS.contains(part)) {
                return Err(ValidationError::InvalidOverride {
                    field: "cfr-part",
                    value: cfr.clone(),
                });
            }
        }
        if let Some(docket) = &overrides.docket_no {
            if !self.docket.is_match(docket.trim()) {
                return Err(ValidationError::InvalidOverride {
                    field: "docket-no",
                    value: docket.clone(),
                });
            }
        }
        if let Some(notice) = &overrides.notice_no {
            if !self.notice.is_match(notice.trim()) {
                return Err(ValidationError::InvalidOverride {
                    field: "notice-no",
                    value: notice.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FieldSchema {
        FieldSchema::builtin().expect("builtin schema compiles")
    }

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|text| text.to_string()).collect()
    }

    fn complete_values() -> ExtractedValues {
        [("{Applicant name}", "Foo"), ("{Airplane model}", "Bar")]
            .into_iter()
            .collect()
    }

    fn answered() -> Vec<String> {
        lines(&[
            "Question 15: yes",
            "16. What applies?",
            "Everything",
            "Question 17:",
            "1) Step one",
        ])
    }

    #[test]
    fn complete_worksheet_passes() {
        let schema = schema();
        let validator = Validator::new(&schema).expect("validator builds");
        validator
            .validate(&complete_values(), &answered())
            .expect("worksheet is complete");
    }

    #[test]
    fn blank_mandatory_field_is_named() {
        let schema = schema();
        let validator = Validator::new(&schema).expect("validator builds");
        let mut values = complete_values();
        values.insert("{Airplane model}", "  ");

        assert_eq!(
            validator.validate(&values, &answered()),
            Err(ValidationError::MissingField {
                placeholder: "{Airplane model}".to_string()
            })
        );
    }

    #[test]
    fn question_without_answer_is_named() {
        let schema = schema();
        let validator = Validator::new(&schema).expect("validator builds");

        let trailing = lines(&["Question 15:"]);
        assert_eq!(
            validator.validate(&complete_values(), &trailing),
            Err(ValidationError::MissingAnswer {
                question: "15".to_string()
            })
        );

        let followed_by_prompt = lines(&["Question 15:", "Question 16: yes", "17. yes"]);
        let err = validator
            .validate(&complete_values(), &followed_by_prompt)
            .expect_err("question 15 is unanswered");
        assert_eq!(err.to_string(), "question 15 answer missing");

        let blank_next = lines(&["Question 15:", "", "Question 16: a", "17: b"]);
        assert!(validator.validate(&complete_values(), &blank_next).is_err());
    }

    #[test]
    fn prompt_numbers_match_exactly() {
        let schema = schema();
        let validator = Validator::new(&schema).expect("validator builds");
        let texts = lines(&["Question 150: yes", "16. a", "17. b"]);

        assert_eq!(
            validator.validate(&complete_values(), &texts),
            Err(ValidationError::MissingAnswer {
                question: "15".to_string()
            })
        );
    }

    #[test]
    fn overrides_are_format_checked() {
        let schema = schema();
        let validator = Validator::new(&schema).expect("validator builds");

        let good = Overrides {
            cfr_part: Some("25, 33".to_string()),
            docket_no: Some("FAA-2024-0123".to_string()),
            notice_no: Some("25-01-02-SC".to_string()),
        };
        validator.check_overrides(&good).expect("overrides are valid");
        validator
            .check_overrides(&Overrides::default())
            .expect("no overrides is fine");

        let bad_cfr = Overrides {
            cfr_part: Some("25,99".to_string()),
            ..Overrides::default()
        };
        assert!(matches!(
            validator.check_overrides(&bad_cfr),
            Err(ValidationError::InvalidOverride { field: "cfr-part", .. })
        ));

        let bad_docket = Overrides {
            docket_no: Some("FAA-24-1".to_string()),
            ..Overrides::default()
        };
        assert!(matches!(
            validator.check_overrides(&bad_docket),
            Err(ValidationError::InvalidOverride { field: "docket-no", .. })
        ));

        let bad_notice = Overrides {
            notice_no: Some("25-01-02".to_string()),
            ..Overrides::default()
        };
        assert!(matches!(
            validator.check_overrides(&bad_notice),
            Err(ValidationError::InvalidOverride { field: "notice-no", .. })
        ));
    }
}
