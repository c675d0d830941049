//! Rewrite rules applied to outbound text before it is injected.
//!
//! Rules come from a line-oriented file (default `hot-rule.txt`):
//!
//! ```text
//! # comment
//! (?i)teh = the
//! (\d+)rmb = \1 CNY
//! ```
//!
//! Each line is split once on an `=` surrounded by whitespace. Replacement
//! templates use `\1` / `\g<name>` group references, which are translated once at
//! load time into the regex crate's `${1}` / `${name}` syntax.

use anyhow::{Context, Result};
use camino::Utf8Path;
use regex::Regex;
use std::fs;
use std::sync::LazyLock;
use thiserror::Error;

static DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+=\s+").expect("Invalid rule delimiter regex"));

/// Why a rule line was rejected.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("line {line}: expected 'pattern = replacement'")]
    MissingDelimiter { line: usize },

    #[error("line {line}: pattern and replacement must both be non-empty")]
    EmptyPart { line: usize },

    #[error("line {line}: invalid pattern: {source}")]
    InvalidPattern {
        line: usize,
        #[source]
        source: regex::Error,
    },

    #[error("line {line}: invalid replacement: {reason}")]
    InvalidReplacement { line: usize, reason: String },
}

/// A compiled `(pattern, replacement)` pair.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    /// Replacement in regex-crate expansion syntax.
    replacement: String,
    /// Replacement as written in the rule file.
    template: String,
}

impl RewriteRule {
    /// Compile a rule. `line` is only used for error reporting.
    pub fn new(pattern: &str, template: &str, line: usize) -> Result<Self, RuleError> {
        let compiled =
            Regex::new(pattern).map_err(|source| RuleError::InvalidPattern { line, source })?;
        let replacement = translate_template(template, &compiled)
            .map_err(|reason| RuleError::InvalidReplacement { line, reason })?;

        Ok(Self {
            pattern: compiled,
            replacement,
            template: template.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Ordered, immutable set of rewrite rules.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<RewriteRule>,
    skipped: usize,
}

impl RuleStore {
    /// A store with no rules; `apply` is the identity.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<RewriteRule>) -> Self {
        Self { rules, skipped: 0 }
    }

    /// Load rules from a file. A missing file yields an empty store.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Rule file not found at {}, no rewrite rules loaded", path);
            return Ok(Self::empty());
        }

        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file: {}", path))?;

        let store = Self::parse(&source);
        tracing::info!(
            "Loaded {} rewrite rules from {} ({} skipped)",
            store.len(),
            path,
            store.skipped
        );
        Ok(store)
    }

    /// Parse rules from in-memory text, skipping malformed lines.
    pub fn parse(source: &str) -> Self {
        let mut store = Self::empty();

        for (index, raw_line) in source.lines().enumerate() {
            match parse_line(raw_line, index + 1) {
                Ok(Some(rule)) => {
                    tracing::debug!("Loaded rule: {} -> {}", rule.pattern(), rule.template());
                    store.rules.push(rule);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping rewrite rule, {}", e);
                    store.skipped += 1;
                }
            }
        }

        store
    }

    /// Run every rule once, in order, each on the previous rule's output.
    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of malformed lines skipped while parsing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn parse_line(raw_line: &str, line: usize) -> Result<Option<RewriteRule>, RuleError> {
    let trimmed = raw_line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut parts = DELIMITER.splitn(trimmed, 2);
    let (pattern, template) = match (parts.next(), parts.next()) {
        (Some(pattern), Some(template)) => (pattern.trim(), template.trim()),
        _ => return Err(RuleError::MissingDelimiter { line }),
    };

    if pattern.is_empty() || template.is_empty() {
        return Err(RuleError::EmptyPart { line });
    }

    RewriteRule::new(pattern, template, line).map(Some)
}

/// Translate a `\1` / `\g<name>` style template into `${1}` / `${name}` expansion syntax.
///
/// `$` is literal in the source syntax and gets escaped as `$$`.
fn translate_template(template: &str, pattern: &Regex) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => {
                let Some(next) = chars.next() else {
                    return Err("trailing backslash".to_string());
                };
                match next {
                    '1'..='9' => {
                        let mut digits = next.to_string();
                        if let Some(d) = chars.next_if(|d| d.is_ascii_digit()) {
                            digits.push(d);
                        }
                        push_group(&mut out, &digits, pattern)?;
                    }
                    'g' => {
                        if chars.next() != Some('<') {
                            return Err("expected '<' after \\g".to_string());
                        }
                        let mut name = String::new();
                        loop {
                            match chars.next() {
                                Some('>') => break,
                                Some(ch) => name.push(ch),
                                None => return Err("unterminated group name".to_string()),
                            }
                        }
                        push_group(&mut out, &name, pattern)?;
                    }
                    '0' => out.push('\0'),
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '\\' => out.push('\\'),
                    other if other.is_ascii_alphabetic() => {
                        return Err(format!("bad escape \\{}", other));
                    }
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn push_group(out: &mut String, group: &str, pattern: &Regex) -> Result<(), String> {
    let known = match group.parse::<usize>() {
        Ok(index) => index < pattern.captures_len(),
        Err(_) => pattern.capture_names().flatten().any(|name| name == group),
    };
    if !known {
        return Err(format!("unknown group '{}'", group));
    }
    out.push_str("${");
    out.push_str(group);
    out.push('}');
    Ok(())
}
