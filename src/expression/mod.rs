//! Cleaning and tokenizing of validation expressions.
//!
//! An expression such as `?string & min:3 | null # comment` is cleaned
//! (comments and whitespace removed), stripped of its behavior marker and split
//! into ordered [`Token`]s, one per rule statement occurrence.

mod clean;
mod grammar;
mod tokenize;

use std::ops::Range;
use std::sync::Arc;

use winnow::combinator::repeat;
use winnow::Parser;

use crate::cache::{content_key, Caches, ContentCache, ContentKey};
use crate::types::Behavior;

/// One rule statement occurrence inside an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub(crate) name: String,
    pub(crate) statement: String,
    pub(crate) span: Range<usize>,
}

impl Token {
    /// Rule name: the statement text before its first `:`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full statement text, e.g. `min:3`.
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Byte range of the statement in [`ParsedExpression::body()`].
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

/// A cleaned expression split into its behavior, body and statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    behavior: Behavior,
    body: Arc<str>,
    tokens: Arc<[Token]>,
}

impl ParsedExpression {
    #[must_use]
    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Cleaned expression text without its behavior marker.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Statement texts in order of appearance.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.statement.as_str())
    }
}

/// Strip comments and whitespace outside double-quoted literals, memoized by
/// content hash. Idempotent.
pub fn clean(text: &str, cache: &ContentCache<ContentKey, Arc<str>>) -> Arc<str> {
    cache.get_or_insert_with(content_key(text), || Arc::from(clean::clean(text)))
}

/// Clean an expression, read its behavior marker and tokenize the rest.
pub fn parse(text: &str, caches: &Caches) -> ParsedExpression {
    let cleaned = clean(text, &caches.cleaned);
    let (behavior, body) = Behavior::strip(&cleaned);
    let tokens = caches
        .tokens
        .get_or_insert_with(content_key(body), || Arc::from(tokenize::tokenize(body)));
    ParsedExpression {
        behavior,
        body: Arc::from(body),
        tokens,
    }
}

/// One pass replacing `[name]` references outside quoted arguments.
///
/// References `lookup` does not know are kept verbatim.
pub(crate) fn replace_macro_references<'a>(
    text: &str,
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> String {
    repeat::<_, _, (), _, _>(0.., grammar::macro_piece)
        .fold(String::new, |mut out, piece| {
            match piece {
                grammar::MacroPiece::Verbatim(raw) => out.push_str(raw),
                grammar::MacroPiece::Reference(name) => match lookup(name) {
                    Some(expansion) => out.push_str(expansion),
                    None => {
                        out.push('[');
                        out.push_str(name);
                        out.push(']');
                    }
                },
            }
            out
        })
        .parse(text)
        .unwrap_or_else(|_| text.to_owned())
}
