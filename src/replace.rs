//! Placeholder substitution over every paragraph of a template.
//!
//! Each paragraph is matched on its full text, so a `{Token}` split across
//! differently formatted runs is still found. The rewritten text goes back
//! through [`ParagraphMut::set_text`], which keeps the format of the first
//! text-bearing run and clears the others.

use std::borrow::Cow;
use std::collections::BTreeSet;

use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::docx::{Document, ParagraphMut};
use crate::error::FillError;
use crate::extract::ExtractedValues;

pub const DEFAULT_NEED_PREFIX: &str = "[[NEED:";
pub const DEFAULT_NEED_SUFFIX: &str = "]]";
pub const PLACEHOLDER_PATTERN: &str = r"\{[^}]+\}";

/// Marker written in place of a placeholder that has no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedSentinel {
    pub prefix: String,
    pub suffix: String,
}

impl Default for NeedSentinel {
    fn default() -> Self {
        Self::new(DEFAULT_NEED_PREFIX, DEFAULT_NEED_SUFFIX)
    }
}

impl NeedSentinel {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// `{Applicant name}` becomes `[[NEED:Applicant name]]` with the default
    /// prefix and suffix.
    pub fn render(&self, placeholder: &str) -> String {
        let name = placeholder
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or(placeholder)
            .trim();
        format!("{}{}{}", self.prefix, name, self.suffix)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceReport {
    pub units_visited: usize,
    pub units_rewritten: usize,
    pub placeholders_resolved: usize,
    pub placeholders_unresolved: usize,
    /// Distinct tokens rewritten to the need sentinel.
    pub unresolved: BTreeSet<String>,
}

#[derive(Debug)]
pub struct PlaceholderReplacer {
    placeholder: Regex,
    need: NeedSentinel,
}

impl PlaceholderReplacer {
    pub fn new(need: NeedSentinel) -> Result<Self, FillError> {
        Ok(Self {
            placeholder: Regex::new(PLACEHOLDER_PATTERN)?,
            need,
        })
    }

    /// Placeholder tokens present in `text`, in order of appearance.
    pub fn placeholders_in<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.placeholder
            .find_iter(text)
            .map(|found| found.as_str())
            .collect()
    }

    /// The text a placeholder turns into, and whether it was resolved.
    pub fn render_value(&self, placeholder: &str, values: &ExtractedValues) -> (String, bool) {
        match values.resolved(placeholder) {
            Some(value) => (value.to_string(), true),
            None => (self.need.render(placeholder), false),
        }
    }

    /// Substitutes every placeholder of `text` in one pass. Values are not
    /// scanned again, so a value that itself looks like a token stays as is.
    pub fn replace_text<'t>(
        &self,
        text: &'t str,
        values: &ExtractedValues,
        report: &mut ReplaceReport,
    ) -> Cow<'t, str> {
        if !text.contains('{') || !text.contains('}') {
            return Cow::Borrowed(text);
        }

        self.placeholder.replace_all(text, |captures: &Captures<'_>| {
            let token = &captures[0];
            let (rendered, resolved) = self.render_value(token, values);
            if resolved {
                report.placeholders_resolved += 1;
            } else {
                report.placeholders_unresolved += 1;
                if report.unresolved.insert(token.to_string()) {
                    warn!(placeholder = token, "no value for placeholder, writing need marker");
                }
            }
            rendered
        })
    }

    /// Rewrites every paragraph of `document`: body, table cells, text boxes,
    /// headers and footers.
    pub fn replace_document(
        &self,
        document: &mut Document,
        values: &ExtractedValues,
    ) -> ReplaceReport {
        let mut report = ReplaceReport::default();

        document.for_each_paragraph_mut(|part, mut paragraph: ParagraphMut<'_>| {
            report.units_visited += 1;
            let text = paragraph.text();
            let Cow::Owned(replaced) = self.replace_text(&text, values, &mut report) else {
                return;
            };
            if replaced == text {
                return;
            }

            let format = paragraph.set_text(&replaced);
            report.units_rewritten += 1;
            debug!(
                part,
                bold = format.bold,
                italic = format.italic,
                "rewrote paragraph placeholders"
            );
        });

        info!(
            units = report.units_visited,
            rewritten = report.units_rewritten,
            resolved = report.placeholders_resolved,
            unresolved = report.placeholders_unresolved,
            "replaced template placeholders"
        );
        report
    }

    /// Every distinct placeholder token the template contains.
    pub fn template_placeholders(&self, document: &Document) -> BTreeSet<String> {
        document
            .all_paragraph_texts()
            .iter()
            .flat_map(|text| {
                self.placeholders_in(text)
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixtures::{
        bold_run, content_control, document, document_with_parts, paragraph, paragraph_of, run,
        table, textbox_paragraph,
    };

    fn replacer() -> PlaceholderReplacer {
        PlaceholderReplacer::new(NeedSentinel::default()).expect("placeholder pattern compiles")
    }

    fn values(pairs: &[(&str, &str)]) -> ExtractedValues {
        pairs.iter().copied().collect()
    }

    #[test]
    fn need_sentinel_strips_braces() {
        let need = NeedSentinel::default();
        assert_eq!(need.render("{Applicant name}"), "[[NEED:Applicant name]]");
        assert_eq!(need.render("{ Spaced }"), "[[NEED:Spaced]]");
        assert_eq!(NeedSentinel::new("NEED: ", "").render("{X}"), "NEED: X");
    }

    #[test]
    fn resolvable_placeholder_is_substituted() {
        let mut doc = document(&paragraph("Applicant: {X}."));
        let report = replacer().replace_document(&mut doc, &values(&[("{X}", "V")]));

        assert_eq!(doc.body_paragraph_texts(), vec!["Applicant: V."]);
        assert_eq!(report.placeholders_resolved, 1);
        assert_eq!(report.units_rewritten, 1);
        assert!(report.unresolved.is_empty());
    }

    #[test]
    fn missing_and_blank_values_become_need_markers() {
        let mut doc = document(&paragraph("{Y} and {Z} and {Y}"));
        let report = replacer().replace_document(&mut doc, &values(&[("{Z}", "  ")]));

        let texts = doc.body_paragraph_texts();
        let text = &texts[0];
        assert_eq!(text, "[[NEED:Y]] and [[NEED:Z]] and [[NEED:Y]]");
        assert!(!text.contains("{Y}"));
        assert_eq!(report.placeholders_unresolved, 3);
        assert_eq!(
            report.unresolved.into_iter().collect::<Vec<_>>(),
            vec!["{Y}", "{Z}"]
        );
    }

    #[test]
    fn placeholder_inside_content_control_is_replaced() {
        let body = paragraph_of(&[
            run("Applicant: "),
            content_control(&[run("{Applicant name}")]),
        ]);
        let mut doc = document(&body);

        let report =
            replacer().replace_document(&mut doc, &values(&[("{Applicant name}", "Foo")]));

        assert_eq!(doc.body_paragraph_texts(), vec!["Applicant: Foo"]);
        assert_eq!(report.placeholders_resolved, 1);
        let xml = String::from_utf8(doc.parts()[0].tree.to_bytes().expect("serializes"))
            .expect("utf-8");
        assert!(!xml.contains("{Applicant name}"));
        assert!(xml.contains(r#"<w:tag w:val="field"/>"#));
    }

    #[test]
    fn placeholder_split_across_runs_keeps_sibling_text() {
        let body = paragraph_of(&[
            run("Dear {Appli"),
            bold_run("cant name}"),
            run(", welcome"),
        ]);
        let mut doc = document(&body);

        replacer().replace_document(&mut doc, &values(&[("{Applicant name}", "Foo Corp")]));

        assert_eq!(doc.body_paragraph_texts(), vec!["Dear Foo Corp, welcome"]);
        let surviving: Vec<(String, bool)> = doc.body_paragraphs()[0]
            .runs()
            .filter(|run| !run.text().is_empty())
            .map(|run| (run.text(), run.format().bold))
            .collect();
        assert_eq!(surviving, vec![("Dear Foo Corp, welcome".to_string(), false)]);
    }

    #[test]
    fn every_container_is_visited() {
        let body = format!(
            "{}{}{}",
            paragraph("{A}"),
            table(&[&["{B}", "x"]]),
            textbox_paragraph("{C}"),
        );
        let mut doc =
            document_with_parts(&body, Some(&paragraph("{D}")), Some(&paragraph("{E}")));
        let values = values(&[("{A}", "a"), ("{B}", "b"), ("{C}", "c"), ("{D}", "d")]);

        let report = replacer().replace_document(&mut doc, &values);

        let texts = doc.all_paragraph_texts();
        for expected in ["a", "b", "c", "d", "[[NEED:E]]"] {
            assert!(texts.iter().any(|text| text == expected), "{expected} in {texts:?}");
        }
        assert!(texts.iter().all(|text| !text.contains('{')));
        assert_eq!(report.placeholders_resolved, 4);
        assert_eq!(report.placeholders_unresolved, 1);
    }

    #[test]
    fn multiline_values_are_written_as_breaks() {
        let mut doc = document(&paragraph("{Summary}"));
        replacer().replace_document(&mut doc, &values(&[("{Summary}", "Line 1\nLine 2")]));
        assert_eq!(doc.body_paragraph_texts(), vec!["Line 1\nLine 2"]);
    }

    #[test]
    fn values_are_not_expanded_twice() {
        let mut report = ReplaceReport::default();
        let values = values(&[("{A}", "{B}"), ("{B}", "b")]);
        let text = replacer().replace_text("{A} {B}", &values, &mut report);
        assert_eq!(text, "{B} b");
    }

    #[test]
    fn text_without_braces_is_skipped() {
        let mut report = ReplaceReport::default();
        let text = replacer().replace_text("no tokens } here", &values(&[]), &mut report);
        assert!(matches!(text, Cow::Borrowed(_)));

        let mut doc = document(&paragraph("plain"));
        let report = replacer().replace_document(&mut doc, &values(&[]));
        assert_eq!(report.units_visited, 1);
        assert_eq!(report.units_rewritten, 0);
    }

    #[test]
    fn custom_sentinel_is_used() {
        let replacer = PlaceholderReplacer::new(NeedSentinel::new("<<", ">>"))
            .expect("placeholder pattern compiles");
        let mut doc = document(&paragraph("{Docket number}"));
        replacer.replace_document(&mut doc, &values(&[]));
        assert_eq!(doc.body_paragraph_texts(), vec!["<<Docket number>>"]);
    }

    #[test]
    fn template_placeholders_are_collected_from_all_parts() {
        let doc = document_with_parts(
            &paragraph("{A} {B}"),
            Some(&paragraph("{C} {A}")),
            None,
        );
        let found = replacer().template_placeholders(&doc);
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["{A}", "{B}", "{C}"]);
    }
}
