// Parser for redis.conf-style configuration text
//
//   # comment
//   lock-stripes 128
//   loglevel "debug"

use anyhow::{bail, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl ConfigValue {
    /// Classify a raw directive argument.
    pub fn parse(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return ConfigValue::Int(i);
        }
        match raw.to_lowercase().as_str() {
            "yes" | "true" => ConfigValue::Bool(true),
            "no" | "false" => ConfigValue::Bool(false),
            _ => ConfigValue::String(raw.to_string()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{}", s),
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Bool(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
        }
    }
}

pub struct ConfigParser<'a> {
    content: &'a str,
}

impl<'a> ConfigParser<'a> {
    pub fn new(content: &'a str) -> Self {
        Self { content }
    }

    /// Parse every directive in order. Keys are lowercased; a later
    /// directive for the same key is returned after the earlier one.
    pub fn parse(&self) -> Result<Vec<(String, ConfigValue)>> {
        let mut directives = Vec::new();

        for (index, raw_line) in self.content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, rest)) = line.split_once(char::is_whitespace) else {
                bail!("line {}: directive '{}' has no value", index + 1, line);
            };
            let value = unquote(rest.trim())
                .ok_or_else(|| anyhow::anyhow!("line {}: unbalanced quotes", index + 1))?;

            directives.push((key.to_lowercase(), ConfigValue::parse(value)));
        }

        Ok(directives)
    }
}

fn unquote(value: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote) {
            return inner.strip_suffix(quote);
        }
    }
    Some(value)
}
