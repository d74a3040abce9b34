use regex::Regex;

/// Canonicalizes worksheet labels so spelling variants share one key.
///
/// Whitespace runs collapse to one space, a leading enumeration token
/// (`a.`, `6.`, `12.`, with or without a following space) is dropped, every colon cluster (`" : :"`) becomes a
/// single `:`, and one trailing `:` is stripped. The steps repeat until the
/// text stops changing, so `normalize` is idempotent.
#[derive(Debug, Clone)]
pub struct LabelNormalizer {
    whitespace: Regex,
    enumeration: Regex,
    colon_cluster: Regex,
}

impl LabelNormalizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            whitespace: Regex::new(r"\s+")?,
            enumeration: Regex::new(r"^(?:[A-Za-z]|\d+)\.\s*")?,
            colon_cluster: Regex::new(r"\s*:[\s:]*")?,
        })
    }

    pub fn normalize(&self, label: &str) -> String {
        let mut current = self.normalize_once(label);
        loop {
            let next = self.normalize_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn normalize_once(&self, label: &str) -> String {
        let collapsed = self.whitespace.replace_all(label.trim(), " ");
        let without_enumeration = self.enumeration.replace(&collapsed, "");
        let colons = self
            .colon_cluster
            .replace_all(without_enumeration.trim(), ":");
        let trimmed = colons.trim();
        trimmed
            .strip_suffix(':')
            .unwrap_or(trimmed)
            .trim_end()
            .to_string()
    }

    /// Regex source matching `normalized` inside raw, un-normalized text:
    /// spaces accept any whitespace run and colons accept colon clusters.
    pub fn loose_pattern(normalized: &str) -> String {
        let mut pattern = String::with_capacity(normalized.len() * 2);
        for ch in normalized.chars() {
            match ch {
                ' ' => pattern.push_str(r"\s+"),
                ':' => pattern.push_str(r"\s*:[\s:]*"),
                other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        pattern
    }
}
