use crate::ast::{ArgToken, INDIRECT_MARKER};
use crate::types::{self, Document};
use serde_json::{Map, Value};

/// An argument token together with the document value it resolved to.
///
/// Resolution never fails: an absent key leaves `value` empty and the
/// handler decides what absence means.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub token: ArgToken,
    pub value: Option<Value>,
}

impl Argument {
    /// Token text as written, minus any indirect marker
    pub fn raw(&self) -> &str {
        self.token.name()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn as_bool(&self) -> bool {
        types::coerce_bool(self.value())
    }

    pub fn as_i32(&self) -> i32 {
        types::coerce_i32(self.value())
    }

    pub fn as_i64(&self) -> i64 {
        types::coerce_i64(self.value())
    }

    pub fn as_f32(&self) -> f32 {
        types::coerce_f32(self.value())
    }

    pub fn as_f64(&self) -> f64 {
        types::coerce_f64(self.value())
    }

    pub fn as_text(&self) -> Option<String> {
        types::text_form(self.value())
    }

    pub fn as_array(&self) -> Option<Vec<Value>> {
        types::coerce_array(self.value())
    }

    pub fn as_object(&self) -> Option<Map<String, Value>> {
        types::coerce_object(self.value())
    }

    /// Integer position: the token itself when it parses as an integer,
    /// otherwise the resolved value coerced leniently.
    pub fn position(&self) -> i32 {
        match &self.token {
            ArgToken::Literal(text) => text.parse::<i32>().unwrap_or_else(|_| self.as_i32()),
            _ => self.as_i32(),
        }
    }

    /// Key name: the resolved value in string form, the token when absent or null.
    pub fn key_name(&self) -> String {
        types::text_form(self.value()).unwrap_or_else(|| self.raw().to_string())
    }
}

/// Bind each token to its value in `document`.
pub fn resolve(tokens: &[ArgToken], document: &Document) -> Vec<Argument> {
    tokens
        .iter()
        .map(|token| Argument {
            token: token.clone(),
            value: lookup(token, document).cloned(),
        })
        .collect()
}

fn lookup<'d>(token: &ArgToken, document: &'d Document) -> Option<&'d Value> {
    match token {
        ArgToken::IndirectKey(name) => document
            .get(&format!("{}{}", INDIRECT_MARKER, name))
            .or_else(|| document.get(name)),
        ArgToken::DirectKey(key) | ArgToken::Literal(key) => document.get(key),
    }
}
