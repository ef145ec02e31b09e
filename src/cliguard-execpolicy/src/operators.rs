//! Shell operator recognition.
//!
//! Two scanners live here. [`find_first_operator`] ignores quoting entirely
//! and is used to reject operators when they are disabled: anything that
//! looks like an operator counts. [`split_segments`] is quote-aware and turns
//! a command line into an ordered list of [`Item`]s when operators are
//! enabled.

use std::fmt;

use crate::error::Violation;

/// The fixed operator vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellOperator {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `>>`
    Append,
    /// `<<`
    HereDoc,
    /// `|`
    Pipe,
    /// `>`
    Redirect,
    /// `<`
    Input,
    /// `;`
    Sequence,
}

impl ShellOperator {
    /// All operators, two-character forms before their one-character prefixes.
    pub const ALL: [ShellOperator; 8] = [
        Self::And,
        Self::Or,
        Self::Append,
        Self::HereDoc,
        Self::Pipe,
        Self::Redirect,
        Self::Input,
        Self::Sequence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Append => ">>",
            Self::HereDoc => "<<",
            Self::Pipe => "|",
            Self::Redirect => ">",
            Self::Input => "<",
            Self::Sequence => ";",
        }
    }

    /// Matches the longest operator at the start of `text`.
    pub fn match_prefix(text: &str) -> Option<ShellOperator> {
        Self::ALL
            .into_iter()
            .find(|op| text.starts_with(op.as_str()))
    }
}

impl fmt::Display for ShellOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a scanned command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item<'a> {
    /// Text between operators, still carrying its quotes.
    Segment(&'a str),
    Operator(ShellOperator),
}

/// Returns the operator that occurs first in `raw`, quoting ignored.
pub fn find_first_operator(raw: &str) -> Option<ShellOperator> {
    raw.char_indices()
        .find_map(|(idx, _)| ShellOperator::match_prefix(&raw[idx..]))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Splits `raw` on unquoted operators.
///
/// Empty and whitespace-only segments are dropped. The text is later handed
/// to a shell verbatim, so anything the shell would expand after validation
/// is rejected: unquoted newlines, a lone `&`, backticks, `$(...)`, `$'...'`,
/// parameter expansion (`$VAR`, `${VAR}`, `$?` and friends, also inside
/// double quotes) and unquoted glob, brace or tilde characters.
pub fn split_segments(raw: &str) -> Result<Vec<Item<'_>>, Violation> {
    let mut items = Vec::new();
    let mut quote = Quote::None;
    let mut start = 0;
    let mut chars = raw.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match quote {
            Quote::Single => {
                if ch == '\'' {
                    quote = Quote::None;
                }
            }
            Quote::Double => match ch {
                '\\' => {
                    chars.next();
                }
                '"' => quote = Quote::None,
                '`' => return Err(Violation::invalid_syntax("command substitution")),
                '$' if raw[idx + 1..].starts_with('(') => {
                    return Err(Violation::invalid_syntax("command substitution"));
                }
                '$' if starts_parameter(&raw[idx + 1..]) => {
                    return Err(Violation::invalid_syntax("parameter expansion"));
                }
                _ => {}
            },
            Quote::None => match ch {
                '\\' => {
                    chars.next();
                }
                '\'' => quote = Quote::Single,
                '"' => quote = Quote::Double,
                '`' => return Err(Violation::invalid_syntax("command substitution")),
                '$' if raw[idx + 1..].starts_with('(') => {
                    return Err(Violation::invalid_syntax("command substitution"));
                }
                '$' if raw[idx + 1..].starts_with('\'') => {
                    return Err(Violation::invalid_syntax("ANSI-C quoting"));
                }
                '$' if starts_parameter(&raw[idx + 1..]) => {
                    return Err(Violation::invalid_syntax("parameter expansion"));
                }
                '*' | '?' | '[' => return Err(Violation::invalid_syntax("unquoted glob pattern")),
                '{' => return Err(Violation::invalid_syntax("unquoted brace expansion")),
                '~' => return Err(Violation::invalid_syntax("unquoted tilde expansion")),
                '\n' => return Err(Violation::invalid_syntax("unquoted newline")),
                _ => {
                    if let Some(op) = ShellOperator::match_prefix(&raw[idx..]) {
                        push_segment(&mut items, &raw[start..idx]);
                        items.push(Item::Operator(op));
                        // Skip the second character of two-character operators.
                        for _ in 1..op.as_str().len() {
                            chars.next();
                        }
                        start = idx + op.as_str().len();
                    } else if ch == '&' {
                        return Err(Violation::invalid_syntax(
                            "background operator '&' is not supported",
                        ));
                    }
                }
            },
        }
    }

    if quote != Quote::None {
        return Err(Violation::invalid_syntax("unterminated quote"));
    }
    push_segment(&mut items, &raw[start..]);
    Ok(items)
}

/// Whether the text after a `$` names a parameter: an identifier, a
/// positional digit, `{` or one of the special parameters.
fn starts_parameter(rest: &str) -> bool {
    rest.chars().next().is_some_and(|c| {
        c.is_ascii_alphanumeric()
            || matches!(c, '_' | '{' | '@' | '*' | '#' | '?' | '$' | '!' | '-')
    })
}

fn push_segment<'a>(items: &mut Vec<Item<'a>>, text: &'a str) {
    if !text.trim().is_empty() {
        items.push(Item::Segment(text));
    }
}
