use super::xml::{XmlElement, XmlNode};

pub const BODY: &str = "w:body";
pub const PARAGRAPH: &str = "w:p";
pub const RUN: &str = "w:r";
pub const RUN_PROPERTIES: &str = "w:rPr";
pub const TEXT: &str = "w:t";
pub const TAB: &str = "w:tab";
pub const BREAK: &str = "w:br";
pub const CARRIAGE_RETURN: &str = "w:cr";
pub const NO_BREAK_HYPHEN: &str = "w:noBreakHyphen";
pub const TABLE: &str = "w:tbl";
pub const TABLE_ROW: &str = "w:tr";
pub const TABLE_CELL: &str = "w:tc";
pub const TEXTBOX_CONTENT: &str = "w:txbxContent";

// Story containers whose schema requires at least one paragraph.
const PARAGRAPH_CONTAINERS: &[&str] = &[TABLE_CELL, TEXTBOX_CONTENT, "w:hdr", "w:ftr"];

// Paragraph-level wrappers whose runs belong to the paragraph text. Content
// controls hold their runs in `w:sdtContent`; `w:sdtPr` is never entered.
const INLINE_CONTAINERS: &[&str] = &[
    "w:hyperlink",
    "w:ins",
    "w:smartTag",
    "w:fldSimple",
    "w:customXml",
    "w:sdt",
    "w:sdtContent",
];

/// Minimal character formatting read from `w:rPr`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Run<'a> {
    element: &'a XmlElement,
}

impl<'a> Run<'a> {
    pub fn text(&self) -> String {
        run_text(self.element)
    }

    pub fn format(&self) -> RunFormat {
        let Some(properties) = self.element.child(RUN_PROPERTIES) else {
            return RunFormat::default();
        };

        RunFormat {
            bold: toggle_is_on(properties.child("w:b")),
            italic: toggle_is_on(properties.child("w:i")),
            underline: properties
                .child("w:u")
                .map(|underline| underline.attribute("w:val") != Some("none"))
                .unwrap_or(false),
        }
    }
}

/// Read view over a `w:p` element: the text unit used for matching.
#[derive(Debug, Clone, Copy)]
pub struct Paragraph<'a> {
    element: &'a XmlElement,
}

impl<'a> Paragraph<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    /// Runs in text order, including runs inside hyperlinks, insertions,
    /// simple fields and inline content controls.
    pub fn runs(self) -> impl Iterator<Item = Run<'a>> {
        let mut runs = Vec::new();
        collect_runs(self.element, &mut runs);
        runs.into_iter().map(|element| Run { element })
    }

    /// Concatenation of every run's text, in order.
    pub fn text(&self) -> String {
        self.runs().map(|run| run.text()).collect()
    }
}

/// Write view over a `w:p` element.
#[derive(Debug)]
pub struct ParagraphMut<'a> {
    element: &'a mut XmlElement,
}

impl<'a> ParagraphMut<'a> {
    pub fn new(element: &'a mut XmlElement) -> Self {
        Self { element }
    }

    pub fn text(&self) -> String {
        Paragraph::new(&*self.element).text()
    }

    /// Rewrites the unit text with the one-run-wins policy: the first run
    /// carrying text keeps its `w:rPr` and receives `text`, every other run
    /// loses its text (drawings, field characters and properties stay).
    /// Returns the format the rewritten text ends up with.
    pub fn set_text(&mut self, text: &str) -> RunFormat {
        let mut runs = Vec::new();
        collect_runs_mut(&mut *self.element, &mut runs);

        if runs.is_empty() {
            drop(runs);
            if !text.is_empty() {
                let mut run = XmlElement::new(RUN);
                set_run_text(&mut run, text);
                self.element.children.push(XmlNode::Element(run));
            }
            return RunFormat::default();
        }

        let anchor = runs
            .iter()
            .position(|run| !run_text(run).is_empty())
            .unwrap_or(0);

        let mut format = RunFormat::default();
        for (index, run) in runs.into_iter().enumerate() {
            if index == anchor {
                set_run_text(run, text);
                format = Run { element: &*run }.format();
            } else {
                clear_run_text(run);
            }
        }
        format
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    element: &'a XmlElement,
}

impl<'a> Table<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    pub fn rows(&self) -> Vec<TableRow<'a>> {
        self.element
            .children_named(TABLE_ROW)
            .map(|element| TableRow { element })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    element: &'a XmlElement,
}

impl<'a> TableRow<'a> {
    pub fn cells(&self) -> Vec<TableCell<'a>> {
        self.element
            .children_named(TABLE_CELL)
            .map(|element| TableCell { element })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableCell<'a> {
    element: &'a XmlElement,
}

impl<'a> TableCell<'a> {
    pub fn paragraphs(self) -> impl Iterator<Item = Paragraph<'a>> {
        self.element.children_named(PARAGRAPH).map(Paragraph::new)
    }

    /// Cell paragraphs joined with `\n`.
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(|paragraph| paragraph.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Visits every `w:p` under `element` in document order, including the ones
/// nested in tables and text boxes.
pub fn walk_paragraphs<'a>(element: &'a XmlElement, visit: &mut impl FnMut(Paragraph<'a>)) {
    if element.is(PARAGRAPH) {
        visit(Paragraph::new(element));
    }
    for child in element.child_elements() {
        walk_paragraphs(child, visit);
    }
}

pub fn walk_paragraphs_mut(element: &mut XmlElement, visit: &mut impl FnMut(ParagraphMut<'_>)) {
    if element.is(PARAGRAPH) {
        visit(ParagraphMut::new(element));
    }
    for child in element.child_elements_mut() {
        walk_paragraphs_mut(child, visit);
    }
}

/// Appends an empty paragraph to a story container left without one.
/// Returns whether a paragraph was added.
pub fn ensure_paragraph(container: &mut XmlElement) -> bool {
    if !PARAGRAPH_CONTAINERS.contains(&container.name.as_str())
        || container.children_named(PARAGRAPH).next().is_some()
    {
        return false;
    }
    container
        .children
        .push(XmlNode::Element(XmlElement::new(PARAGRAPH)));
    true
}

fn collect_runs<'e>(element: &'e XmlElement, out: &mut Vec<&'e XmlElement>) {
    for child in element.child_elements() {
        if child.is(RUN) {
            out.push(child);
        } else if INLINE_CONTAINERS.contains(&child.name.as_str()) {
            collect_runs(child, out);
        }
    }
}

fn collect_runs_mut<'e>(element: &'e mut XmlElement, out: &mut Vec<&'e mut XmlElement>) {
    for child in element.child_elements_mut() {
        if child.is(RUN) {
            out.push(child);
        } else if INLINE_CONTAINERS.contains(&child.name.as_str()) {
            collect_runs_mut(child, out);
        }
    }
}

pub fn run_text(run: &XmlElement) -> String {
    let mut out = String::new();
    for child in run.child_elements() {
        match child.name.as_str() {
            TEXT => out.push_str(&child.text()),
            TAB => out.push('\t'),
            BREAK if is_line_break(child) => out.push('\n'),
            CARRIAGE_RETURN => out.push('\n'),
            NO_BREAK_HYPHEN => out.push('-'),
            _ => {}
        }
    }
    out
}

fn set_run_text(run: &mut XmlElement, text: &str) {
    let insert_at = run
        .children
        .iter()
        .position(is_text_bearing)
        .unwrap_or(run.children.len());
    clear_run_text(run);
    let insert_at = insert_at.min(run.children.len());
    run.children.splice(insert_at..insert_at, text_nodes(text));
}

fn clear_run_text(run: &mut XmlElement) {
    run.children.retain(|node| !is_text_bearing(node));
}

/// Page and column breaks are layout, not text, and survive rewrites.
fn is_text_bearing(node: &XmlNode) -> bool {
    node.as_element().is_some_and(|element| match element.name.as_str() {
        TEXT | TAB | CARRIAGE_RETURN | NO_BREAK_HYPHEN => true,
        BREAK => is_line_break(element),
        _ => false,
    })
}

fn is_line_break(element: &XmlElement) -> bool {
    matches!(element.attribute("w:type"), None | Some("textWrapping"))
}

fn text_nodes(text: &str) -> Vec<XmlNode> {
    let mut nodes = Vec::new();
    for (line_index, line) in text.split('\n').enumerate() {
        if line_index > 0 {
            nodes.push(XmlNode::Element(XmlElement::new(BREAK)));
        }
        for (segment_index, segment) in line.split('\t').enumerate() {
            if segment_index > 0 {
                nodes.push(XmlNode::Element(XmlElement::new(TAB)));
            }
            if !segment.is_empty() {
                nodes.push(XmlNode::Element(
                    XmlElement::new(TEXT)
                        .with_attribute("xml:space", "preserve")
                        .with_text(segment),
                ));
            }
        }
    }
    nodes
}

fn toggle_is_on(toggle: Option<&XmlElement>) -> bool {
    match toggle {
        Some(element) => !matches!(element.attribute("w:val"), Some("0" | "false" | "off")),
        None => false,
    }
}
