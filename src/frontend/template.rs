//! String templates
//!
//! Every string literal is a template. `$name` and `${name}` are
//! placeholders, `$$` is a literal dollar sign, and any other `$` is kept
//! as text.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(String),
    Placeholder {
        name: &'a str,
        /// Byte offset of the `$` within the literal
        offset: usize,
    },
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a literal into text and placeholder segments
pub fn parse(source: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c != '$' {
            text.push(c);
            continue;
        }
        let rest = &source[offset + 1..];
        match rest.chars().next() {
            Some('$') => {
                chars.next();
                text.push('$');
            }
            Some('{') => {
                let name_len = rest[1..].find(|ch: char| !is_ident_char(ch)).unwrap_or(rest.len() - 1);
                let name = &rest[1..1 + name_len];
                let closed = rest[1 + name_len..].starts_with('}');
                if closed && name.starts_with(is_ident_start) {
                    flush(&mut segments, &mut text);
                    segments.push(Segment::Placeholder { name, offset });
                    // `{`, the name and `}` are all ASCII
                    for _ in 0..name_len + 2 {
                        chars.next();
                    }
                } else {
                    text.push('$');
                }
            }
            Some(ch) if is_ident_start(ch) => {
                let name_len = rest.find(|ch: char| !is_ident_char(ch)).unwrap_or(rest.len());
                flush(&mut segments, &mut text);
                segments.push(Segment::Placeholder { name: &rest[..name_len], offset });
                for _ in 0..name_len {
                    chars.next();
                }
            }
            _ => text.push('$'),
        }
    }
    flush(&mut segments, &mut text);
    segments
}

fn flush(segments: &mut Vec<Segment<'_>>, text: &mut String) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

/// Names referenced by a literal, in order of appearance
pub fn placeholders(source: &str) -> impl Iterator<Item = (&str, usize)> {
    parse(source).into_iter().filter_map(|s| match s {
        Segment::Placeholder { name, offset } => Some((name, offset)),
        Segment::Text(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Segment<'static> {
        Segment::Text(s.to_string())
    }

    #[test]
    fn test_simple_placeholders() {
        assert_eq!(
            parse("Name: $name, Age: $age"),
            vec![
                text("Name: "),
                Segment::Placeholder { name: "name", offset: 6 },
                text(", Age: "),
                Segment::Placeholder { name: "age", offset: 18 },
            ]
        );
    }

    #[test]
    fn test_braced_placeholder_and_escapes() {
        assert_eq!(
            parse("${name}s cost $$5 or $ 3"),
            vec![Segment::Placeholder { name: "name", offset: 0 }, text("s cost $5 or $ 3")]
        );
    }

    #[test]
    fn test_lone_dollars_are_text() {
        assert_eq!(parse("$"), vec![text("$")]);
        assert_eq!(parse("$1"), vec![text("$1")]);
        assert_eq!(parse("${1x}"), vec![text("${1x}")]);
        assert_eq!(parse("${open"), vec![text("${open")]);
        assert_eq!(parse("plain"), vec![text("plain")]);
    }

    #[test]
    fn test_placeholder_names_in_order() {
        let names: Vec<&str> = placeholders("Hello, $name! ($age)").map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "age"]);
    }
}
