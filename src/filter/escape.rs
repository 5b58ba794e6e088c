//! Backslash escaping for operand text inside the filter grammar.
//!
//! Inside a leaf, `\`, `<` and `>` are always escaped so that operand text
//! never disturbs bracket depth tracking. Elements of a `{a,b}` set also
//! escape `,`, `{` and `}`. Line breaks and tabs are always written as
//! `\n`, `\r` and `\t` so escaped text stays on one line. Unescaping maps
//! those back and removes the backslash in front of any other character.

/// Characters escaped anywhere inside a leaf.
pub(crate) const GRAMMAR: &[char] = &['\\', '<', '>'];

/// Characters escaped inside set elements.
pub(crate) const ELEMENT: &[char] = &['\\', '<', '>', ',', '{', '}'];

/// Escape every character of `text` that appears in `specials`.
pub(crate) fn escape(text: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => {
                if specials.contains(&c) {
                    out.push('\\');
                }
                out.push(c);
            }
        }
    }
    out
}

/// Remove escaping backslashes. A trailing lone backslash is kept.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Iterate over `(byte_index, char)` pairs that are not escaped.
pub(crate) fn unescaped_chars(text: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut escaped = false;
    text.char_indices().filter_map(move |(i, c)| {
        if escaped {
            escaped = false;
            None
        } else if c == '\\' {
            escaped = true;
            None
        } else {
            Some((i, c))
        }
    })
}

/// Byte index of the first unescaped occurrence of `target`.
pub(crate) fn find_unescaped(text: &str, target: char) -> Option<usize> {
    unescaped_chars(text).find(|&(_, c)| c == target).map(|(i, _)| i)
}

/// Split on unescaped occurrences of `separator`.
pub(crate) fn split_unescaped(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in unescaped_chars(text) {
        if c == separator {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trip() {
        let text = r"a <b> \c";
        let escaped = escape(text, GRAMMAR);
        assert_eq!(escaped, r"a \<b\> \\c");
        assert_eq!(unescape(&escaped), text);
    }

    #[test]
    fn test_line_breaks_stay_on_one_line() {
        let text = "draw\r\nflying\t\\n";
        let escaped = escape(text, GRAMMAR);
        assert_eq!(escaped, r"draw\r\nflying\t\\n");
        assert!(!escaped.contains(['\n', '\r', '\t']));
        assert_eq!(unescape(&escaped), text);
    }

    #[test]
    fn test_element_escaping() {
        let escaped = escape("x,{y}", ELEMENT);
        assert_eq!(escaped, r"x\,\{y\}");
        assert_eq!(split_unescaped(&escaped, ',').len(), 1);
        assert_eq!(split_unescaped("a,b,,c", ','), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_find_skips_escaped() {
        assert_eq!(find_unescaped(r"\}}", '}'), Some(2));
        assert_eq!(find_unescaped(r"\}", '}'), None);
        assert_eq!(find_unescaped(r"\\}", '}'), Some(2));
    }
}
