//! Attribute reading: which nodes want a tooltip and how it is configured.
//!
//! Attribute keys are data-attribute names in camelCase (`tip`,
//! `tipPlace`). The markup spelling (`data-tip-place`) is only used for
//! display.

use std::fmt;

use crate::host::Tree;
use crate::widget::TooltipOptions;

/// Matches elements carrying a given attribute, like `[data-tooltip]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    key: String,
}

impl Selector {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Presence is enough to match, even with an empty value.
    pub fn matches<T: Tree>(&self, tree: &T, node: T::Node) -> bool {
        tree.is_element(node) && tree.attribute(node, &self.key).is_some()
    }

    /// Every matching descendant of `root` (excluding `root`) in document
    /// order.
    pub fn select_all<T: Tree>(&self, tree: &T, root: T::Node) -> Vec<T::Node> {
        descendants(tree, root)
            .into_iter()
            .filter(|n| self.matches(tree, *n))
            .collect()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[data-{}]", kebab_case(&self.key))
    }
}

/// Pre-order descendants of `root`, excluding `root` itself.
pub fn descendants<T: Tree>(tree: &T, root: T::Node) -> Vec<T::Node> {
    let mut out = Vec::new();
    let mut stack: Vec<T::Node> = tree.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(tree.children(node).into_iter().rev());
    }
    out
}

/// Attribute carrying the per-node override of a widget option.
///
/// A trailing `Class` is dropped from the option name before it is
/// capitalized: `option_attribute("tip", "effectClass") == "tipEffect"`.
pub fn option_attribute(key: &str, option: &str) -> String {
    let name = option.strip_suffix("Class").unwrap_or(option);
    format!("{key}{}", capitalize(name))
}

/// Widget options for one node: `defaults` overlaid with every non-empty
/// `{key}{Option}` attribute found for the option names in `option_keys`.
pub fn read_options<T, K>(
    tree: &T,
    node: T::Node,
    key: &str,
    defaults: &TooltipOptions,
    option_keys: K,
) -> TooltipOptions
where
    T: Tree,
    K: IntoIterator,
    K::Item: AsRef<str>,
{
    let overrides: TooltipOptions = option_keys
        .into_iter()
        .filter_map(|option| {
            let option = option.as_ref();
            tree.attribute(node, &option_attribute(key, option))
                .filter(|value| !value.is_empty())
                .map(|value| (option.to_string(), value))
        })
        .collect();
    defaults.merged_with(&overrides)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn kebab_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if c.is_uppercase() {
            out.push('-');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
