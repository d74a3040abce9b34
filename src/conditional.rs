//! Conditional content: the checkbox-style project type question in the
//! worksheet and `[[OPTION_n]]...[[/OPTION_n]]` blocks in the template.

use regex::Regex;
use tracing::{debug, info};

use crate::docx::{
    Document, PARAGRAPH, Paragraph, ParagraphMut, XmlElement, XmlNode, ensure_paragraph,
};
use crate::error::FillError;
use crate::fields::CheckboxOption;

const OPTION_START_PATTERN: &str = r"\[\[OPTION_(\d+)\]\]";
const OPTION_START_LINE_PATTERN: &str = r"^\s*\[\[OPTION_(\d+)\]\]\s*$";
const OPTION_END_LINE_PATTERN: &str = r"^\s*\[\[/OPTION_(\d+)\]\]\s*$";

/// Scans `paragraphs` from `start` and returns the value of the first option
/// whose text follows a checked box. Options are tried in schema order
/// within a paragraph.
pub fn resolve_checkbox<'a>(
    paragraphs: &[String],
    start: usize,
    options: &'a [CheckboxOption],
) -> Option<&'a str> {
    paragraphs.iter().skip(start).find_map(|text| {
        options
            .iter()
            .find(|option| option.is_checked_in(text))
            .map(|option| option.value.as_str())
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionalReport {
    pub blocks_kept: usize,
    pub blocks_removed: usize,
    pub paragraphs_removed: usize,
    pub units_rewritten: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedText {
    pub text: String,
    pub blocks_kept: usize,
    pub blocks_removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerLine<'t> {
    Start(&'t str),
    End(&'t str),
}

#[derive(Debug)]
pub struct OptionResolver {
    start: Regex,
    start_line: Regex,
    end_line: Regex,
}

impl OptionResolver {
    pub fn new() -> Result<Self, FillError> {
        Ok(Self {
            start: Regex::new(OPTION_START_PATTERN)?,
            start_line: Regex::new(OPTION_START_LINE_PATTERN)?,
            end_line: Regex::new(OPTION_END_LINE_PATTERN)?,
        })
    }

    /// Resolves every complete block in `text`: the active block collapses
    /// to its body, the others vanish, and lines left blank are dropped.
    /// Returns `None` when nothing changed or no choice is active.
    ///
    /// The end marker must repeat the start marker's number exactly, so
    /// `[[OPTION_1]]` never closes on `[[/OPTION_10]]`. A start marker with
    /// no matching end stays as plain text.
    pub fn resolve_text(&self, text: &str, active: &str) -> Option<ResolvedText> {
        let active = active.trim();
        if active.is_empty() || !text.contains("[[OPTION_") {
            return None;
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        let mut search_from = 0;
        let mut blocks_kept = 0;
        let mut blocks_removed = 0;

        while let Some(captures) = self.start.captures_at(text, search_from) {
            let (Some(marker), Some(number)) = (captures.get(0), captures.get(1)) else {
                break;
            };
            let end_marker = format!("[[/OPTION_{}]]", number.as_str());
            let body_start = marker.end();

            let Some(body_len) = text[body_start..].find(&end_marker) else {
                search_from = marker.end();
                continue;
            };

            out.push_str(&text[cursor..marker.start()]);
            if number.as_str() == active {
                out.push_str(&text[body_start..body_start + body_len]);
                blocks_kept += 1;
            } else {
                blocks_removed += 1;
            }
            cursor = body_start + body_len + end_marker.len();
            search_from = cursor;
        }

        if blocks_kept + blocks_removed == 0 {
            return None;
        }
        out.push_str(&text[cursor..]);

        let cleaned = out
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Some(ResolvedText {
            text: cleaned,
            blocks_kept,
            blocks_removed,
        })
    }

    /// Prunes every block of `document` against `active`. Blocks may sit
    /// inside one paragraph or span sibling paragraphs whose whole text is a
    /// marker. An empty choice leaves the document untouched.
    pub fn resolve_document(&self, document: &mut Document, active: &str) -> ConditionalReport {
        let mut report = ConditionalReport::default();
        let active = active.trim();
        if active.is_empty() {
            debug!("no active option, conditional blocks left as is");
            return report;
        }

        for part in document.parts_mut() {
            self.prune_paragraph_blocks(&mut part.tree.root, active, &mut report);
        }

        document.for_each_paragraph_mut(|part, mut paragraph: ParagraphMut<'_>| {
            let text = paragraph.text();
            if let Some(resolved) = self.resolve_text(&text, active) {
                debug!(
                    part,
                    kept = resolved.blocks_kept,
                    removed = resolved.blocks_removed,
                    "resolved inline option blocks"
                );
                paragraph.set_text(&resolved.text);
                report.blocks_kept += resolved.blocks_kept;
                report.blocks_removed += resolved.blocks_removed;
                report.units_rewritten += 1;
            }
        });

        info!(
            active,
            blocks_kept = report.blocks_kept,
            blocks_removed = report.blocks_removed,
            paragraphs_removed = report.paragraphs_removed,
            "resolved conditional blocks"
        );
        report
    }

    fn marker_line<'t>(&self, text: &'t str) -> Option<MarkerLine<'t>> {
        if let Some(number) = self.start_line.captures(text).and_then(|c| c.get(1)) {
            return Some(MarkerLine::Start(number.as_str()));
        }
        self.end_line
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|number| MarkerLine::End(number.as_str()))
    }

    fn prune_paragraph_blocks(
        &self,
        element: &mut XmlElement,
        active: &str,
        report: &mut ConditionalReport,
    ) {
        for child in element.child_elements_mut() {
            self.prune_paragraph_blocks(child, active, report);
        }

        let texts: Vec<Option<String>> = element
            .children
            .iter()
            .map(|node| {
                node.as_element()
                    .filter(|child| child.is(PARAGRAPH))
                    .map(|child| Paragraph::new(child).text())
            })
            .collect();
        let markers: Vec<(usize, MarkerLine<'_>)> = texts
            .iter()
            .enumerate()
            .filter_map(|(index, text)| {
                text.as_deref()
                    .and_then(|text| self.marker_line(text))
                    .map(|marker| (index, marker))
            })
            .collect();
        if markers.is_empty() {
            return;
        }

        let mut remove = vec![false; element.children.len()];
        let mut position = 0;
        while position < markers.len() {
            let (start, MarkerLine::Start(number)) = markers[position] else {
                position += 1;
                continue;
            };
            let Some(offset) = markers[position + 1..]
                .iter()
                .position(|(_, marker)| *marker == MarkerLine::End(number))
            else {
                position += 1;
                continue;
            };
            let end = markers[position + 1 + offset].0;

            if number == active {
                remove[start] = true;
                remove[end] = true;
                report.blocks_kept += 1;
            } else {
                remove[start..=end].iter_mut().for_each(|flag| *flag = true);
                report.blocks_removed += 1;
            }
            position += offset + 2;
        }

        if !remove.contains(&true) {
            return;
        }
        report.paragraphs_removed += remove
            .iter()
            .zip(&texts)
            .filter(|(removed, text)| **removed && text.is_some())
            .count();

        let mut flags = remove.into_iter();
        element
            .children
            .retain(|_: &XmlNode| !flags.next().unwrap_or(false));
        if ensure_paragraph(element) {
            debug!(container = %element.name, "restored empty paragraph in pruned container");
        }
    }
}
