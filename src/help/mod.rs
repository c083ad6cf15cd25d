use serde::Deserialize;
use std::sync::OnceLock;

/// Token in titles and content that the renderer replaces with the product name
pub const APP_NAME_PLACEHOLDER: &str = "{{APP_NAME}}";

const SECTIONS_JSON: &str = include_str!("../../data/help_sections.json");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HelpSection {
    pub id: String,
    pub emoji: String,
    pub title: String,
    /// HTML with `{{APP_NAME}}` placeholders
    pub content: String,
    #[serde(default)]
    pub items: Vec<HelpItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HelpItem {
    pub id: String,
    pub emoji: String,
    pub title: String,
    pub content: String,
}

/// A section or one of its items, as returned by [`find_entry`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HelpEntry<'a> {
    Section(&'a HelpSection),
    Item(&'a HelpItem),
}

impl HelpEntry<'_> {
    pub fn title(&self) -> &str {
        match self {
            HelpEntry::Section(s) => &s.title,
            HelpEntry::Item(i) => &i.title,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            HelpEntry::Section(s) => &s.content,
            HelpEntry::Item(i) => &i.content,
        }
    }
}

fn parse_sections(json: &str) -> Vec<HelpSection> {
    match serde_json::from_str(json) {
        Ok(sections) => sections,
        Err(e) => {
            tracing::warn!("Failed to parse help content: {}", e);
            Vec::new()
        }
    }
}

/// The help manual, in display order
pub fn sections() -> &'static [HelpSection] {
    static SECTIONS: OnceLock<Vec<HelpSection>> = OnceLock::new();
    SECTIONS.get_or_init(|| parse_sections(SECTIONS_JSON))
}

/// Look up a section or item by id
pub fn find_entry(id: &str) -> Option<HelpEntry<'static>> {
    for section in sections() {
        if section.id == id {
            return Some(HelpEntry::Section(section));
        }
        if let Some(item) = section.items.iter().find(|i| i.id == id) {
            return Some(HelpEntry::Item(item));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_shipped_content_parses() {
        let parsed: Vec<HelpSection> = serde_json::from_str(SECTIONS_JSON).unwrap();
        assert_eq!(parsed.len(), sections().len());
        assert!(!sections().is_empty());
    }

    #[test]
    fn test_sections_keep_declaration_order() {
        let ids: Vec<&str> = sections().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["sec1", "sec2", "sec3", "sec4", "sec5", "sec6", "sec7"]
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let mut seen = HashSet::new();
        for section in sections() {
            assert!(seen.insert(section.id.as_str()), "duplicate {}", section.id);
            for item in &section.items {
                assert!(seen.insert(item.id.as_str()), "duplicate {}", item.id);
            }
        }
    }

    #[test]
    fn test_placeholder_is_left_for_the_renderer() {
        let entry = find_entry("sec1a").unwrap();
        assert!(entry.title().contains(APP_NAME_PLACEHOLDER));
        assert!(entry.content().contains(APP_NAME_PLACEHOLDER));
    }

    #[test]
    fn test_find_entry() {
        assert!(matches!(find_entry("sec2"), Some(HelpEntry::Section(_))));
        assert!(matches!(find_entry("sec7b"), Some(HelpEntry::Item(_))));
        assert!(find_entry("sec99").is_none());
    }

    #[test]
    fn test_invalid_json_yields_empty_table() {
        assert!(parse_sections("{not json").is_empty());
    }
}
