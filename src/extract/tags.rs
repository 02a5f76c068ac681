// src/extract/tags.rs
// =============================================================================
// Declarative "extra tag" selection.
//
// An extra tag is a (tag-name, source) pair: either the element's text
// ("strong") or the value of one attribute ("img[alt]"). The set is plain
// data passed into the extractor, so adding a tag to the report is a config
// change, not a new branch in the extractor.
//
// Selectors are compiled once, when the CrawlConfig is built; a selector that
// does not compile is a ConfigError.
// =============================================================================

use scraper::Selector;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// What to collect for one kind of tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSelector {
    pub tag: String,
    /// `None` collects the element text; `Some(attr)` collects that attribute.
    pub attribute: Option<String>,
}

impl TagSelector {
    pub fn text(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attribute: None,
        }
    }

    pub fn attr(tag: &str, attribute: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attribute: Some(attribute.to_ascii_lowercase()),
        }
    }

    /// The key used in reports, also the CSS selector: "strong", "img[alt]".
    pub fn label(&self) -> String {
        match &self.attribute {
            Some(attr) => format!("{}[{}]", self.tag, attr),
            None => self.tag.clone(),
        }
    }

    pub fn compile(&self) -> Result<CompiledTag, ConfigError> {
        let label = self.label();
        let css = Selector::parse(&label).map_err(|_| ConfigError::InvalidSelector {
            selector: label.clone(),
        })?;
        Ok(CompiledTag {
            label,
            attribute: self.attribute.clone(),
            css,
        })
    }
}

impl fmt::Display for TagSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// Accepts "tag" or "tag[attr]", the same form label() produces.
impl FromStr for TagSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidSelector {
            selector: s.to_string(),
        };
        let s = s.trim();

        let (tag, attribute) = match s.split_once('[') {
            Some((tag, rest)) => {
                let attr = rest.strip_suffix(']').ok_or_else(invalid)?;
                (tag, Some(attr))
            }
            None => (s, None),
        };

        let is_name = |name: &str| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
        };
        if !is_name(tag) || !attribute.map_or(true, is_name) {
            return Err(invalid());
        }

        Ok(match attribute {
            Some(attr) => TagSelector::attr(tag, attr),
            None => TagSelector::text(tag),
        })
    }
}

/// A TagSelector with its CSS selector already parsed.
#[derive(Debug, Clone)]
pub struct CompiledTag {
    pub label: String,
    pub attribute: Option<String>,
    pub css: Selector,
}

/// The extra tags collected when no other set is configured.
pub fn default_extra_tags() -> Vec<TagSelector> {
    vec![
        TagSelector::attr("img", "alt"),
        TagSelector::attr("a", "rel"),
        TagSelector::text("strong"),
        TagSelector::text("b"),
        TagSelector::text("em"),
    ]
}
