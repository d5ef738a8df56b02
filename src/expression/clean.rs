use winnow::combinator::repeat;
use winnow::Parser;

use super::grammar;

/// One pass of comment and whitespace removal outside double-quoted literals.
fn clean_once(text: &str) -> String {
    repeat::<_, _, (), _, _>(0.., grammar::clean_piece)
        .fold(String::new, |mut out, piece| {
            if let Some(kept) = piece {
                out.push_str(kept);
            }
            out
        })
        .parse(text)
        .unwrap_or_else(|_| text.to_owned())
}

/// Strip `#`/`//` line comments, `/* */` block comments and whitespace that sit
/// outside double-quoted literals.
///
/// Removal can splice new comment openers together (`/ /x`), so passes repeat
/// until the text stops changing; the result is therefore a fixpoint.
pub(crate) fn clean(text: &str) -> String {
    let mut current = clean_once(text);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
