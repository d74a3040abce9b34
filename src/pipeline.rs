//! One worksheet against one template: extract, validate, apply overrides,
//! replace placeholders, then prune conditional blocks.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::conditional::{ConditionalReport, OptionResolver};
use crate::docx::Document;
use crate::error::FillError;
use crate::extract::{ExtractedValues, WorksheetExtractor};
use crate::fields::FieldSchema;
use crate::model::{FillCounts, PlaceholderChange, PlaceholderDiff};
use crate::replace::{NeedSentinel, PlaceholderReplacer, ReplaceReport};
use crate::validate::{Overrides, Validator};

#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    pub overrides: Overrides,
    /// Active conditional choice; falls back to the worksheet's option field.
    pub active_option: Option<String>,
    pub skip_validation: bool,
}

#[derive(Debug, Clone)]
pub struct FillOutcome {
    pub values: ExtractedValues,
    pub active_option: Option<String>,
    pub replace: ReplaceReport,
    pub conditional: ConditionalReport,
}

impl FillOutcome {
    pub fn counts(&self) -> FillCounts {
        let fields_empty = self.values.blank_keys().len();
        FillCounts {
            fields_extracted: self.values.len() - fields_empty,
            fields_empty,
            units_visited: self.replace.units_visited,
            units_rewritten: self.replace.units_rewritten + self.conditional.units_rewritten,
            placeholders_resolved: self.replace.placeholders_resolved,
            placeholders_unresolved: self.replace.placeholders_unresolved,
            blocks_kept: self.conditional.blocks_kept,
            blocks_removed: self.conditional.blocks_removed,
            paragraphs_removed: self.conditional.paragraphs_removed,
        }
    }

    pub fn unresolved_placeholders(&self) -> Vec<String> {
        self.replace.unresolved.iter().cloned().collect()
    }
}

#[derive(Debug)]
pub struct FillEngine<'s> {
    schema: &'s FieldSchema,
    extractor: WorksheetExtractor<'s>,
    validator: Validator<'s>,
    replacer: PlaceholderReplacer,
    resolver: OptionResolver,
}

impl<'s> FillEngine<'s> {
    pub fn new(schema: &'s FieldSchema, need: NeedSentinel) -> Result<Self, FillError> {
        Ok(Self {
            schema,
            extractor: WorksheetExtractor::new(schema)?,
            validator: Validator::new(schema)?,
            replacer: PlaceholderReplacer::new(need)?,
            resolver: OptionResolver::new()?,
        })
    }

    /// Extracted worksheet values with command-line overrides applied on top.
    pub fn prepare_values(
        &self,
        worksheet: &Document,
        options: &FillOptions,
    ) -> Result<ExtractedValues, FillError> {
        self.validator.check_overrides(&options.overrides)?;

        let mut values = self.extractor.extract(worksheet);
        if options.skip_validation {
            warn!("worksheet validation skipped");
        } else {
            self.validator.validate_document(&values, worksheet)?;
        }

        let overrides = &options.overrides;
        let slots = [
            (
                &self.schema.regulatory_part_placeholder,
                overrides.cfr_part.as_ref(),
            ),
            (&self.schema.docket_placeholder, overrides.docket_no.as_ref()),
            (&self.schema.notice_placeholder, overrides.notice_no.as_ref()),
        ];
        for (placeholder, value) in slots {
            if let Some(value) = value {
                info!(placeholder = %placeholder, value = %value.trim(), "applied override");
                values.insert(placeholder.as_str(), value.trim());
            }
        }
        Ok(values)
    }

    pub fn active_option(&self, values: &ExtractedValues, options: &FillOptions) -> Option<String> {
        options
            .active_option
            .as_deref()
            .map(str::trim)
            .filter(|option| !option.is_empty())
            .or_else(|| values.resolved(&self.schema.option_placeholder).map(str::trim))
            .map(str::to_string)
    }

    /// Fills `template` in place from `worksheet`.
    pub fn fill(
        &self,
        template: &mut Document,
        worksheet: &Document,
        options: &FillOptions,
    ) -> Result<FillOutcome, FillError> {
        let values = self.prepare_values(worksheet, options)?;
        let active_option = self.active_option(&values, options);

        let replace = self.replacer.replace_document(template, &values);
        let conditional = match active_option.as_deref() {
            Some(active) => self.resolver.resolve_document(template, active),
            None => ConditionalReport::default(),
        };

        Ok(FillOutcome {
            values,
            active_option,
            replace,
            conditional,
        })
    }

    /// What each placeholder would become, for every extracted key and every
    /// token found in the template. Nothing is written.
    pub fn dry_run_diff(&self, template: &Document, values: &ExtractedValues) -> PlaceholderDiff {
        let mut tokens: BTreeSet<String> = values
            .iter()
            .map(|(placeholder, _)| placeholder.to_string())
            .collect();
        tokens.extend(self.replacer.template_placeholders(template));

        tokens
            .into_iter()
            .map(|token| {
                let (new, _) = self.replacer.render_value(&token, values);
                let change = PlaceholderChange {
                    old: token.clone(),
                    new,
                };
                (token, change)
            })
            .collect()
    }
}
