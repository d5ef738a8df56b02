use winnow::combinator::{alt, delimited, fail, opt, preceded, repeat};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{any, none_of, one_of, rest, take_till, take_until, take_while};

/// Characters that end a statement: the bitwise connectives and grouping.
const SEPARATORS: [char; 6] = ['&', '|', '^', '~', '(', ')'];
/// Deepest `[..]`/`{..}` nesting protected as one literal.
const MAX_LITERAL_DEPTH: usize = 32;

// -- Quoted spans -----------------------------------------------------------

/// `"..."` with backslash escapes. An unterminated literal runs to the end.
fn double_quoted<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        '"',
        repeat::<_, _, (), _, _>(
            0..,
            alt((preceded('\\', any).void(), none_of(['"', '\\']).void())),
        ),
        opt('"'),
    )
        .take()
        .parse_next(input)
}

/// `'...'` with backslash escapes and `''` for a literal quote.
fn single_quoted<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        '\'',
        repeat::<_, _, (), _, _>(
            0..,
            alt((
                preceded('\\', any).void(),
                "''".void(),
                none_of(['\'', '\\']).void(),
            )),
        ),
        opt('\''),
    )
        .take()
        .parse_next(input)
}

/// A `:` or `,` and the single-quoted argument it may open.
///
/// A single quote anywhere else is an ordinary character (`equals:it's`).
fn argument_start(input: &mut &str) -> ModalResult<()> {
    (
        one_of([':', ',']),
        take_while(0.., char::is_whitespace),
        opt(single_quoted),
    )
        .void()
        .parse_next(input)
}

// -- Cleaning ---------------------------------------------------------------

fn line_comment(input: &mut &str) -> ModalResult<()> {
    (alt(("#", "//")), take_till(0.., '\n'))
        .void()
        .parse_next(input)
}

/// `/* ... */`; an unterminated comment runs to the end.
fn block_comment(input: &mut &str) -> ModalResult<()> {
    (
        "/*",
        alt(((take_until(0.., "*/"), "*/").void(), rest.void())),
    )
        .void()
        .parse_next(input)
}

fn whitespace(input: &mut &str) -> ModalResult<()> {
    take_while(1.., char::is_whitespace)
        .void()
        .parse_next(input)
}

/// Text to keep, or `None` for a comment or a whitespace run.
pub(super) fn clean_piece<'i>(input: &mut &'i str) -> ModalResult<Option<&'i str>> {
    alt((
        double_quoted.map(Some),
        alt((line_comment, block_comment, whitespace)).value(None),
        any.take().map(Some),
    ))
    .parse_next(input)
}

// -- Statements -------------------------------------------------------------

/// A balanced `[..]` or `{..}` literal, quotes respected inside.
fn literal(input: &mut &str, depth: usize) -> ModalResult<()> {
    if depth >= MAX_LITERAL_DEPTH {
        return fail(input);
    }
    let close = match one_of(['[', '{']).parse_next(input)? {
        '[' => ']',
        _ => '}',
    };
    repeat::<_, _, (), _, _>(0.., |i: &mut &str| literal_part(i, depth)).parse_next(input)?;
    close.void().parse_next(input)
}

fn literal_part(input: &mut &str, depth: usize) -> ModalResult<()> {
    alt((
        double_quoted.void(),
        argument_start,
        |i: &mut &str| literal(i, depth + 1),
        none_of(['[', ']', '{', '}']).void(),
    ))
    .parse_next(input)
}

fn statement_part(input: &mut &str) -> ModalResult<()> {
    alt((
        double_quoted.void(),
        argument_start,
        |i: &mut &str| literal(i, 0),
        none_of(SEPARATORS).void(),
    ))
    .parse_next(input)
}

/// Raw statement text up to the next separator outside quotes and literals.
/// An unbalanced bracket is an ordinary character.
pub(super) fn fragment<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    repeat::<_, _, (), _, _>(0.., statement_part)
        .take()
        .parse_next(input)
}

pub(super) fn separator(input: &mut &str) -> ModalResult<char> {
    one_of(SEPARATORS).parse_next(input)
}

// -- Macro references -------------------------------------------------------

pub(super) enum MacroPiece<'i> {
    Verbatim(&'i str),
    Reference(&'i str),
}

/// `[name]` with a rule-name shaped `name`.
fn macro_reference<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited(
        '[',
        (
            take_while(1, |c: char| c.is_ascii_alphabetic() || c == '_'),
            take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
        )
            .take(),
        ']',
    )
    .parse_next(input)
}

pub(super) fn macro_piece<'i>(input: &mut &'i str) -> ModalResult<MacroPiece<'i>> {
    alt((
        double_quoted.map(MacroPiece::Verbatim),
        argument_start.take().map(MacroPiece::Verbatim),
        macro_reference.map(MacroPiece::Reference),
        any.take().map(MacroPiece::Verbatim),
    ))
    .parse_next(input)
}
