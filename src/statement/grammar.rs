use winnow::combinator::{alt, cut_err, opt, preceded, repeat, separated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, none_of, take_while};

// -- Rule names -------------------------------------------------------------

fn identifier<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1, |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// `identifier ('.' identifier)*`
pub(super) fn rule_name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (identifier, repeat::<_, _, (), _, _>(0.., ('.', identifier)))
        .take()
        .parse_next(input)
}

// -- Arguments (CSV with single-quote enclosure and backslash escapes) -------

fn escaped(input: &mut &str) -> ModalResult<char> {
    preceded('\\', cut_err(any)).parse_next(input)
}

fn quoted(input: &mut &str) -> ModalResult<String> {
    '\''.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any)
            .context(StrContext::Expected(StrContextValue::CharLiteral('\'')))
            .parse_next(input)?;
        match ch {
            '\'' => {
                if opt('\'').parse_next(input)?.is_some() {
                    s.push('\'');
                } else {
                    return Ok(s);
                }
            }
            '\\' => s.push(cut_err(any).parse_next(input)?),
            c => s.push(c),
        }
    }
}

fn field(input: &mut &str) -> ModalResult<String> {
    let head = opt(quoted).parse_next(input)?;
    let tail: String = repeat(0.., alt((escaped, none_of(',')))).parse_next(input)?;
    Ok(match head {
        Some(mut head) => {
            head.push_str(&tail);
            head
        }
        None => tail,
    })
}

pub(super) fn arguments(input: &mut &str) -> ModalResult<Vec<String>> {
    separated(1.., field, ',').parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str) -> Option<Vec<String>> {
        arguments.parse(input).ok()
    }

    #[test]
    fn plain_fields() {
        assert_eq!(args("1,2,abc").unwrap(), ["1", "2", "abc"]);
    }

    #[test]
    fn empty_fields_are_kept() {
        assert_eq!(args("a,,b").unwrap(), ["a", "", "b"]);
        assert_eq!(args(",").unwrap(), ["", ""]);
    }

    #[test]
    fn quoted_fields_protect_commas() {
        assert_eq!(args("'a,b',c").unwrap(), ["a,b", "c"]);
    }

    #[test]
    fn escapes_inside_and_outside_quotes() {
        assert_eq!(args(r"'it\'s',x\,y").unwrap(), ["it's", "x,y"]);
        assert_eq!(args("'it''s'").unwrap(), ["it's"]);
        assert_eq!(args(r"'a\\b'").unwrap(), [r"a\b"]);
    }

    #[test]
    fn quote_inside_bare_field_is_literal() {
        assert_eq!(args("it's").unwrap(), ["it's"]);
    }

    #[test]
    fn unterminated_quote_fails() {
        assert_eq!(args("'abc"), None);
        assert_eq!(args(r"abc\"), None);
    }

    #[test]
    fn rule_names() {
        assert_eq!(rule_name.parse("string").ok(), Some("string"));
        assert_eq!(rule_name.parse("string.charset").ok(), Some("string.charset"));
        assert_eq!(rule_name.parse("_x1").ok(), Some("_x1"));
        assert!(rule_name.parse("1abc").is_err());
        assert!(rule_name.parse("a..b").is_err());
        assert!(rule_name.parse("a.").is_err());
    }
}
