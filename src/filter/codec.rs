//! The bracketed filter grammar used in legacy deck files.
//!
//! ```text
//! filter := leaf | group
//! leaf   := "<" code ":" mode operand ">"  |  "<" code ">"
//! group  := "<" ("AND" | "OR") (ws filter)+ ">"
//! ```
//!
//! Parsing tracks bracket depth and splits a group's children at depth zero.
//! Operand text escapes `\`, `<` and `>` with a backslash, so brackets in a
//! search string never affect the depth. Any grammar violation is an error;
//! there is no best-effort parse.

use std::fmt;
use std::str::FromStr;

use super::escape;
use super::leaf::FilterLeaf;
use super::mode::GroupMode;
use super::tree::{Filter, FilterGroup};
use crate::error::{FilterError, FilterResult};

impl Filter {
    /// Parse the bracketed grammar.
    pub fn parse(text: &str) -> FilterResult<Self> {
        parse_node(text, text)
    }

    fn write_grammar(&self, out: &mut String) {
        match self {
            Filter::Leaf(leaf) => leaf.write_grammar(out),
            Filter::Group(group) => {
                out.push('<');
                out.push_str(group.mode().keyword());
                for child in group.children() {
                    out.push(' ');
                    child.write_grammar(out);
                }
                out.push('>');
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_grammar(&mut out);
        f.write_str(&out)
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_node(text: &str, input: &str) -> FilterResult<Filter> {
    let body = enclosed(text.trim(), input)?;
    let head_end = body.find(char::is_whitespace).unwrap_or(body.len());

    match GroupMode::from_keyword(&body[..head_end]) {
        Some(mode) => {
            let children = split_children(&body[head_end..], input)?;
            if children.is_empty() {
                return Err(FilterError::malformed(input, "group has no filters"));
            }
            let children = children
                .into_iter()
                .map(|child| parse_node(child, input))
                .collect::<FilterResult<Vec<_>>>()?;
            FilterGroup::new(mode, children).map(Filter::Group)
        }
        None => FilterLeaf::parse_grammar(body, input).map(Filter::Leaf),
    }
}

/// Strip the outer brackets, requiring the first `<` to close at the end.
fn enclosed<'a>(text: &'a str, input: &str) -> FilterResult<&'a str> {
    if !text.starts_with('<') {
        return Err(FilterError::malformed(input, "expected '<'"));
    }
    let mut depth = 0usize;
    for (i, c) in escape::unescaped_chars(text) {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return if i + 1 == text.len() {
                        Ok(&text[1..i])
                    } else {
                        Err(FilterError::malformed(input, "unexpected text after closing '>'"))
                    };
                }
            }
            _ => {}
        }
    }
    Err(FilterError::malformed(input, "unbalanced '<' and '>'"))
}

/// Split a group body into its bracketed children.
fn split_children<'a>(body: &'a str, input: &str) -> FilterResult<Vec<&'a str>> {
    let mut children = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if depth == 0 && c != '<' && !c.is_whitespace() {
            return Err(FilterError::malformed(
                input,
                format!("unexpected '{c}' between filters"),
            ));
        }
        match c {
            '\\' => escaped = true,
            '<' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '>' => {
                depth -= 1;
                if depth == 0 {
                    children.push(&body[start..=i]);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(FilterError::malformed(input, "unbalanced '<' and '>'"));
    }
    Ok(children)
}
