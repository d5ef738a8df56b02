use winnow::Parser;

use super::{grammar, Token};

/// Split a cleaned, marker-free expression into its rule statements, left to
/// right, each with its byte span in `text`.
///
/// Connectives inside quoted arguments and balanced `[..]`/`{..}` literals do
/// not split.
pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut input = text;
    loop {
        let start = text.len() - input.len();
        let Ok(raw) = grammar::fragment.parse_next(&mut input) else {
            break;
        };
        push_fragment(raw, start, &mut tokens);
        if grammar::separator.parse_next(&mut input).is_err() {
            break;
        }
    }
    tokens
}

fn push_fragment(raw: &str, start: usize, tokens: &mut Vec<Token>) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let offset = start + (raw.len() - raw.trim_start().len());
    let name = trimmed.split_once(':').map_or(trimmed, |(name, _)| name);
    tokens.push(Token {
        name: name.to_owned(),
        statement: trimmed.to_owned(),
        span: offset..offset + trimmed.len(),
    });
}
