//! Selector subset for the memory document.
//!
//! Supported: comma-separated groups of descendant chains, where each
//! compound is an optional tag (or `*`) followed by any number of `.class`,
//! `#id`, `[attr]`, `[attr="value"]` and `[attr^="prefix"]`. Attribute values
//! may not contain commas or whitespace.

use crate::error::{Error, Result};
use crate::types::ElementId;

/// What the matcher needs to know about a tree of elements.
pub trait SelectorTarget {
    fn tag_name(&self, element: ElementId) -> Option<&str>;
    fn attribute_value(&self, element: ElementId, name: &str) -> Option<&str>;
    fn has_class_name(&self, element: ElementId, class: &str) -> bool;
    fn parent_of(&self, element: ElementId) -> Option<ElementId>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    op: AttrOp,
}

impl AttrMatch {
    fn parse(inner: &str) -> Option<Self> {
        let (name, op) = if let Some((name, value)) = inner.split_once("^=") {
            (name, AttrOp::Prefix(unquote(value)))
        } else if let Some((name, value)) = inner.split_once('=') {
            (name, AttrOp::Equals(unquote(value)))
        } else {
            (inner, AttrOp::Exists)
        };

        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_ascii_lowercase(),
            op,
        })
    }

    fn matches<T: SelectorTarget + ?Sized>(&self, tree: &T, element: ElementId) -> bool {
        let Some(value) = tree.attribute_value(element, &self.name) else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(expected) => value == expected,
            AttrOp::Prefix(prefix) => value.starts_with(prefix.as_str()),
        }
    }
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    value.to_string()
}

fn is_ident(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// One compound selector: `tag.class#id[attr]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn parse(part: &str) -> Option<Self> {
        let is_delimiter = |c: char| matches!(c, '.' | '#' | '[');
        let mut compound = Self::default();

        let tag_len = part.find(is_delimiter).unwrap_or(part.len());
        let tag = &part[..tag_len];
        if !tag.is_empty() && tag != "*" {
            if !is_ident(tag) {
                return None;
            }
            compound.tag = Some(tag.to_ascii_lowercase());
        }

        let mut rest = &part[tag_len..];
        while let Some(first) = rest.chars().next() {
            match first {
                '.' | '#' => {
                    let body = &rest[1..];
                    let end = body.find(is_delimiter).unwrap_or(body.len());
                    let name = &body[..end];
                    if !is_ident(name) {
                        return None;
                    }
                    let name = name.to_string();
                    if first == '.' {
                        compound.classes.push(name);
                    } else {
                        compound.ids.push(name);
                    }
                    rest = &body[end..];
                }
                '[' => {
                    let close = rest.find(']')?;
                    compound.attrs.push(AttrMatch::parse(&rest[1..close])?);
                    rest = &rest[close + 1..];
                }
                _ => return None,
            }
        }

        Some(compound)
    }

    fn matches<T: SelectorTarget + ?Sized>(&self, tree: &T, element: ElementId) -> bool {
        if let Some(tag) = &self.tag {
            match tree.tag_name(element) {
                Some(actual) if actual.eq_ignore_ascii_case(tag) => {}
                _ => return false,
            }
        }
        self.ids
            .iter()
            .all(|id| tree.attribute_value(element, "id") == Some(id.as_str()))
            && self.classes.iter().all(|class| tree.has_class_name(element, class))
            && self.attrs.iter().all(|attr| attr.matches(tree, element))
    }
}

/// A parsed selector list, e.g. `.project-card, section[id]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    /// Each group is a descendant chain, outermost first.
    groups: Vec<Vec<Compound>>,
}

impl SelectorList {
    /// Parse a selector list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] for empty groups or syntax outside
    /// the supported subset (combinators other than descendant, pseudo-classes).
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidSelector(input.to_string());
        let mut groups = Vec::new();

        for group in input.split(',') {
            let chain = group
                .split_whitespace()
                .map(Compound::parse)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(invalid)?;
            if chain.is_empty() {
                return Err(invalid());
            }
            groups.push(chain);
        }

        Ok(Self { groups })
    }

    /// True if any group matches `element`.
    pub fn matches<T: SelectorTarget + ?Sized>(&self, tree: &T, element: ElementId) -> bool {
        self.groups
            .iter()
            .any(|chain| chain_matches(tree, element, chain))
    }
}

fn chain_matches<T: SelectorTarget + ?Sized>(
    tree: &T,
    element: ElementId,
    chain: &[Compound],
) -> bool {
    let Some((last, mut remaining)) = chain.split_last() else {
        return false;
    };
    if !last.matches(tree, element) {
        return false;
    }

    // Descendant combinator only: greedily match each outer compound on the
    // nearest qualifying ancestor.
    let mut cursor = tree.parent_of(element);
    while let Some((outer, rest)) = remaining.split_last() {
        loop {
            let Some(node) = cursor else {
                return false;
            };
            cursor = tree.parent_of(node);
            if outer.matches(tree, node) {
                break;
            }
        }
        remaining = rest;
    }
    true
}
