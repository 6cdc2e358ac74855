//! Tokenizer for raw command text.
//!
//! `add "two words" 3` becomes the action name `add` and the arguments
//! `["two words", "3", ""]`. Double quotes group words and are dropped,
//! `\"` produces a literal quote, and the argument list always ends with the
//! text left over after the last separator, which is empty for well-formed
//! input.

use serde::Serialize;

/// A tokenized chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedMessage {
    pub action_name: String,
    /// Never empty: the final element is the trailing remainder token.
    pub arguments: Vec<String>,
}

impl ParsedMessage {
    /// Number of arguments the user actually supplied.
    ///
    /// The trailing remainder token is not counted when it is empty, so a bare
    /// `add` supplies zero arguments and `add 1 2` supplies two.
    #[must_use]
    pub fn supplied_count(&self) -> usize {
        match self.arguments.last() {
            Some(last) if last.is_empty() => self.arguments.len() - 1,
            _ => self.arguments.len(),
        }
    }

    /// The first argument, or `None` when it is empty.
    #[must_use]
    pub fn first_argument(&self) -> Option<&str> {
        self.arguments
            .first()
            .map(String::as_str)
            .filter(|a| !a.is_empty())
    }
}

/// Split `text` into an action name and its arguments.
#[must_use]
pub fn parse(text: &str) -> ParsedMessage {
    let text = text.trim();
    let (action_name, rest) = text.split_once(' ').unwrap_or((text, ""));

    let mut arguments = Vec::new();
    let mut current = String::new();
    // Set once the current token has consumed any input, so `""` still counts
    // as an argument while runs of separators do not.
    let mut started = false;
    let mut in_string = false;

    let mut chars = rest.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            ' ' if !in_string => {
                if started {
                    arguments.push(std::mem::take(&mut current));
                    started = false;
                }
            },
            '\\' => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                    started = true;
                }
            },
            '"' => {
                in_string = !in_string;
                started = true;
            },
            other => {
                current.push(other);
                started = true;
            },
        }
    }

    // End of input terminates the last argument unless a quote is still open,
    // in which case the unterminated text becomes the remainder token.
    if started && !in_string {
        arguments.push(std::mem::take(&mut current));
    }
    arguments.push(current);

    ParsedMessage {
        action_name: action_name.to_string(),
        arguments,
    }
}
