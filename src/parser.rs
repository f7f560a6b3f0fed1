use crate::ast::{ArgToken, CallExpression};
use crate::error::{Error, Result};

pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    fn err<T>(&self, reason: &str) -> Result<T> {
        Err(Error::malformed(self.input, reason))
    }

    /// `identifier "(" [token ("," token)*] ")"`, whitespace around tokens trimmed
    pub fn parse(&mut self) -> Result<CallExpression> {
        let text = self.input.trim();
        let open = match text.find('(') {
            Some(i) => i,
            None => return self.err("missing '('"),
        };
        let name = text[..open].trim();
        if name.is_empty() {
            return self.err("function name is empty");
        }
        if !is_identifier(name) {
            return self.err("function name must be an identifier");
        }
        let rest = &text[open + 1..];
        let inner = match rest.strip_suffix(')') {
            Some(inner) => inner,
            None => return self.err("missing closing ')'"),
        };
        if inner.contains('(') || inner.contains(')') {
            return self.err("unbalanced or nested parentheses");
        }

        let mut args = Vec::new();
        if inner.trim().is_empty() {
            return Ok(CallExpression { name: name.to_string(), args });
        }
        for (i, raw) in inner.split(',').enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                return self.err(&format!("argument {} is empty", i));
            }
            let token = ArgToken::classify(raw);
            if token.name().is_empty() {
                return self.err(&format!("argument {} is a reference without a name", i));
            }
            args.push(token);
        }
        Ok(CallExpression { name: name.to_string(), args })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
