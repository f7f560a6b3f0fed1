use std::fmt::{Display, Formatter};

/// Marker for a reference to a value computed earlier in the same document
pub const INDIRECT_MARKER: char = '@';

/// One unresolved argument of a call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgToken {
    /// Numeric text such as `0` or `-1.5`
    Literal(String),
    /// Key into the document
    DirectKey(String),
    /// `@name`: stored without the marker
    IndirectKey(String),
}

impl ArgToken {
    pub fn classify(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(INDIRECT_MARKER) {
            ArgToken::IndirectKey(name.to_string())
        } else if raw.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
            && raw.parse::<f64>().is_ok()
        {
            ArgToken::Literal(raw.to_string())
        } else {
            ArgToken::DirectKey(raw.to_string())
        }
    }

    /// Token text without the indirect marker
    pub fn name(&self) -> &str {
        match self {
            ArgToken::Literal(s) | ArgToken::DirectKey(s) | ArgToken::IndirectKey(s) => s,
        }
    }
}

impl Display for ArgToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgToken::IndirectKey(name) => write!(f, "{}{}", INDIRECT_MARKER, name),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// A parsed `name(arg0,arg1,...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpression {
    pub name: String,
    pub args: Vec<ArgToken>,
}

impl Display for CallExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}
