// refdq-core/src/domain/compiler/template.rs

// Check definitions carry SQL with `{name}` placeholders. A template is parsed once,
// when the definition is loaded, so the set of variables it needs is known before any
// session starts. Binding it to a scope is a pure function.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::domain::error::DomainError;

fn re_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTemplate {
    source: String,
    segments: Vec<Segment>,
    variables: Vec<String>,
}

impl SqlTemplate {
    /// Parses `source`. `context` names the owner of the template in error messages
    /// (e.g. "check 'unique'").
    pub fn parse(source: &str, context: &str) -> Result<Self, DomainError> {
        let mut segments = Vec::new();
        let mut variables: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut field = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(malformed(context, "'{' inside a placeholder")),
                            other => field.push(other),
                        }
                    }
                    if !closed {
                        return Err(malformed(context, "unclosed '{'"));
                    }
                    let name = field.trim();
                    if !re_placeholder().is_match(name) {
                        return Err(malformed(
                            context,
                            &format!("invalid placeholder '{{{}}}'", field),
                        ));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    if !variables.iter().any(|v| v == name) {
                        variables.push(name.to_string());
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                }
                '}' => return Err(malformed(context, "single '}' encountered")),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
            variables,
        })
    }

    /// Required variable names, in order of first appearance.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, scope: &VariableScope, context: &str) -> Result<RenderedQuery, DomainError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match scope.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(DomainError::MissingVariable {
                            variable: name.clone(),
                            context: context.to_string(),
                        });
                    }
                },
            }
        }
        Ok(RenderedQuery(out))
    }
}

fn malformed(context: &str, reason: &str) -> DomainError {
    DomainError::MalformedTemplate {
        context: context.to_string(),
        reason: reason.to_string(),
    }
}

/// Two-layer variable lookup: invocation arguments shadow general variables.
#[derive(Debug, Clone, Default)]
pub struct VariableScope {
    general: BTreeMap<String, String>,
    invocation: BTreeMap<String, String>,
}

impl VariableScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_general(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.general.insert(name.into(), value.into());
        self
    }

    pub fn with_invocation<I, K, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.invocation
            .extend(args.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.invocation
            .get(name)
            .or_else(|| self.general.get(name))
            .map(String::as_str)
    }
}

/// Fully substituted SQL, ready to hand to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderedQuery(String);

impl RenderedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RenderedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
