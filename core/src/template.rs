//! RFC 6570 URI template expansion.
//!
//! Supports all four levels: the `+ # . / ; ? &` operators, the explode
//! modifier and prefix lengths. Missing and null variables, empty lists and
//! empty maps are undefined and expand to nothing. A `{` without a matching
//! `}` is copied through as literal text.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::types::{Parameters, Value};

/// Expands a URI template against a set of parameters.
pub trait TemplateExpander: Send + Sync {
    fn expand(&self, template: &str, parameters: &Parameters) -> String;
}

impl<F> TemplateExpander for F
where
    F: Fn(&str, &Parameters) -> String + Send + Sync,
{
    fn expand(&self, template: &str, parameters: &Parameters) -> String {
        self(template, parameters)
    }
}

/// The default expander.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc6570;

impl TemplateExpander for Rfc6570 {
    fn expand(&self, template: &str, parameters: &Parameters) -> String {
        expand(template, parameters)
    }
}

/// Everything except ALPHA / DIGIT / "-" / "." / "_" / "~".
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Additionally lets reserved characters through, for `+` and `#`.
const RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

struct Operator {
    first: &'static str,
    separator: &'static str,
    named: bool,
    if_empty: &'static str,
    reserved: bool,
}

impl Operator {
    const fn new(
        first: &'static str,
        separator: &'static str,
        named: bool,
        if_empty: &'static str,
        reserved: bool,
    ) -> Self {
        Operator {
            first,
            separator,
            named,
            if_empty,
            reserved,
        }
    }

    fn from_expression(expression: &str) -> (Self, &str) {
        let op = match expression.chars().next() {
            Some('+') => Operator::new("", ",", false, "", true),
            Some('#') => Operator::new("#", ",", false, "", true),
            Some('.') => Operator::new(".", ".", false, "", false),
            Some('/') => Operator::new("/", "/", false, "", false),
            Some(';') => Operator::new(";", ";", true, "", false),
            Some('?') => Operator::new("?", "&", true, "=", false),
            Some('&') => Operator::new("&", "&", true, "=", false),
            _ => return (Operator::new("", ",", false, "", false), expression),
        };
        (op, &expression[1..])
    }

    /// Percent-encode `s`. Reserved expansion keeps existing `%XX` triplets.
    fn encode(&self, s: &str) -> String {
        if !self.reserved {
            return utf8_percent_encode(s, UNRESERVED).to_string();
        }

        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(at) = rest.find('%') {
            out.extend(utf8_percent_encode(&rest[..at], RESERVED));
            match rest.get(at..at + 3) {
                Some(triplet) if triplet[1..].bytes().all(|b| b.is_ascii_hexdigit()) => {
                    out.push_str(triplet);
                    rest = &rest[at + 3..];
                }
                _ => {
                    out.push_str("%25");
                    rest = &rest[at + 1..];
                }
            }
        }
        out.extend(utf8_percent_encode(rest, RESERVED));
        out
    }
}

struct VarSpec<'a> {
    name: &'a str,
    explode: bool,
    prefix: Option<usize>,
}

impl<'a> VarSpec<'a> {
    fn parse(spec: &'a str) -> Self {
        let spec = spec.trim();
        if let Some(name) = spec.strip_suffix('*') {
            return VarSpec {
                name,
                explode: true,
                prefix: None,
            };
        }
        match spec.split_once(':') {
            Some((name, length)) => VarSpec {
                name,
                explode: false,
                prefix: length.parse().ok(),
            },
            None => VarSpec {
                name: spec,
                explode: false,
                prefix: None,
            },
        }
    }
}

/// Expand `template` with the default RFC 6570 rules.
pub fn expand(template: &str, parameters: &Parameters) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                expand_expression(&after[..close], parameters, &mut out);
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn expand_expression(expression: &str, parameters: &Parameters, out: &mut String) {
    let (op, variables) = Operator::from_expression(expression);
    let mut first = true;

    for spec in variables.split(',').map(VarSpec::parse) {
        let Some(piece) = parameters
            .get(spec.name)
            .and_then(|value| expand_value(&op, &spec, value))
        else {
            continue;
        };
        out.push_str(if first { op.first } else { op.separator });
        out.push_str(&piece);
        first = false;
    }
}

fn expand_value(op: &Operator, spec: &VarSpec<'_>, value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Array(items) => {
            let items: Vec<String> = items.iter().filter_map(scalar).collect();
            Some(expand_list(op, spec, &items))
        }
        Value::Object(map) => {
            let pairs: Vec<(&str, String)> = map
                .iter()
                .filter_map(|(key, value)| scalar(value).map(|value| (key.as_str(), value)))
                .collect();
            Some(expand_pairs(op, spec, &pairs))
        }
        scalar_value => {
            let mut value = scalar(scalar_value)?;
            if let Some(length) = spec.prefix {
                value = value.chars().take(length).collect();
            }
            Some(named(op, spec.name, &op.encode(&value)))
        }
    }
}

fn expand_list(op: &Operator, spec: &VarSpec<'_>, items: &[String]) -> String {
    if spec.explode {
        items
            .iter()
            .map(|item| named(op, spec.name, &op.encode(item)))
            .collect::<Vec<_>>()
            .join(op.separator)
    } else {
        let joined = items
            .iter()
            .map(|item| op.encode(item))
            .collect::<Vec<_>>()
            .join(",");
        named(op, spec.name, &joined)
    }
}

fn expand_pairs(op: &Operator, spec: &VarSpec<'_>, pairs: &[(&str, String)]) -> String {
    if spec.explode {
        pairs
            .iter()
            .map(|(key, value)| {
                let key = op.encode(key);
                if op.named {
                    named(op, &key, &op.encode(value))
                } else {
                    format!("{key}={}", op.encode(value))
                }
            })
            .collect::<Vec<_>>()
            .join(op.separator)
    } else {
        let joined = pairs
            .iter()
            .map(|(key, value)| format!("{},{}", op.encode(key), op.encode(value)))
            .collect::<Vec<_>>()
            .join(",");
        named(op, spec.name, &joined)
    }
}

/// Prefix `encoded` with `name=` for the named operators.
fn named(op: &Operator, name: &str, encoded: &str) -> String {
    if !op.named {
        encoded.to_string()
    } else if encoded.is_empty() {
        format!("{name}{}", op.if_empty)
    } else {
        format!("{name}={encoded}")
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
