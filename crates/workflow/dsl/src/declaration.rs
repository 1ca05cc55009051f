//! Declaration parser: splits `Name` / `Name(arg, ...)` into its parts
//!
//! Names are (possibly dotted) identifiers made of ASCII letters, digits,
//! `_`, `.` and `$`. Arguments are literal strings separated by commas with
//! surrounding whitespace trimmed. A comma can not be escaped, so no argument
//! ever contains one.

use workflow_types::{WorkflowError, WorkflowResult};

/// A parsed strategy declaration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Registered strategy name
    pub name: String,
    /// Positional arguments; `None` when no parenthesis group was written
    pub args: Option<Vec<String>>,
}

impl Declaration {
    /// Parse a declaration string
    pub fn parse(input: &str) -> WorkflowResult<Self> {
        let text = input.trim();
        let invalid = || WorkflowError::InvalidStrategyPattern(input.to_string());

        let (name, args) = match text.find('(') {
            None => (text, None),
            Some(open) => {
                let inner = text[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
                if inner.contains(|c: char| c == '(' || c == ')') || inner.trim().is_empty() {
                    return Err(invalid());
                }
                let args = inner.split(',').map(|a| a.trim().to_string()).collect();
                (text[..open].trim_end(), Some(args))
            }
        };

        if !is_valid_name(name) {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            args,
        })
    }

    /// Argument count; a bare name has none
    pub fn arity(&self) -> usize {
        self.args.as_ref().map_or(0, Vec::len)
    }

    pub fn arg_slice(&self) -> &[String] {
        self.args.as_deref().unwrap_or(&[])
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$'))
}
