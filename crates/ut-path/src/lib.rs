//! Structural element paths.
//!
//! A path is a `/`-separated list of segments walked top-down through the
//! host UI tree:
//!
//! - `Files` matches a node labelled exactly `Files`;
//! - `*.txt`, `item?` are glob patterns over the label (`*` and `?`);
//! - `**` skips any number of intermediate nodes, including none;
//! - a `[kind]` suffix such as `Open[button]` also requires the node kind.
//!
//! A leading `/` makes the path absolute so it ignores any base reference.
//! `\` escapes the next character (`a\/b`, `\*`, `\[`).

use std::fmt;

use regex::Regex;
use ut_core::{NodeKind, UiNode, UiTestError};

#[derive(Debug, Clone)]
pub enum LabelPattern {
    Any,
    Literal(String),
    Glob(Regex),
}

impl LabelPattern {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Literal(expected) => expected == label,
            Self::Glob(regex) => regex.is_match(label),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Segment {
    /// `**`: any depth of intermediate nodes.
    Deep,
    Node {
        label: LabelPattern,
        kind: Option<NodeKind>,
    },
}

impl Segment {
    pub fn is_deep(&self) -> bool {
        matches!(self, Self::Deep)
    }

    pub fn matches(&self, node: &UiNode) -> bool {
        match self {
            Self::Deep => true,
            Self::Node { label, kind } => {
                kind.map_or(true, |kind| kind == node.kind) && label.matches(&node.label)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElementPath {
    raw: String,
    absolute: bool,
    segments: Vec<Segment>,
}

impl ElementPath {
    pub fn parse(raw: &str) -> Result<Self, UiTestError> {
        if raw.trim().is_empty() {
            return Err(UiTestError::invalid_path(raw, "path is empty"));
        }

        let (absolute, body) = match raw.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let mut segments: Vec<Segment> = Vec::new();
        for tokens in split_segments(body)? {
            let segment = parse_segment(raw, &tokens)?;
            if segment.is_deep() && segments.last().is_some_and(Segment::is_deep) {
                continue;
            }
            segments.push(segment);
        }

        if segments.last().map_or(true, Segment::is_deep) {
            return Err(UiTestError::invalid_path(
                raw,
                "path must end with a label segment",
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            absolute,
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolves `relative` against `self` the way a base reference is
    /// applied: absolute paths replace the base, relative ones extend it.
    pub fn join(&self, relative: &ElementPath) -> ElementPath {
        if relative.absolute {
            return relative.clone();
        }
        let mut segments = self.segments.clone();
        for segment in &relative.segments {
            if segment.is_deep() && segments.last().is_some_and(Segment::is_deep) {
                continue;
            }
            segments.push(segment.clone());
        }
        ElementPath {
            raw: format!("{}/{}", self.raw.trim_end_matches('/'), relative.raw),
            absolute: self.absolute,
            segments,
        }
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for ElementPath {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ElementPath {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    Escaped(char),
}

impl Token {
    fn ch(self) -> char {
        match self {
            Self::Char(ch) | Self::Escaped(ch) => ch,
        }
    }
}

fn split_segments(body: &str) -> Result<Vec<Vec<Token>>, UiTestError> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let Some(next) = chars.next() else {
                    return Err(UiTestError::invalid_path(body, "dangling escape"));
                };
                current.push(Token::Escaped(next));
            }
            '/' => segments.push(std::mem::take(&mut current)),
            _ => current.push(Token::Char(ch)),
        }
    }
    segments.push(current);

    if segments.iter().any(Vec::is_empty) {
        return Err(UiTestError::invalid_path(body, "empty segment"));
    }
    Ok(segments)
}

fn parse_segment(raw: &str, tokens: &[Token]) -> Result<Segment, UiTestError> {
    if tokens == [Token::Char('*'), Token::Char('*')] {
        return Ok(Segment::Deep);
    }

    let (label_tokens, kind) = split_kind_suffix(raw, tokens)?;
    if label_tokens.is_empty() {
        return Ok(Segment::Node {
            label: LabelPattern::Any,
            kind,
        });
    }
    if label_tokens == [Token::Char('*')] {
        return Ok(Segment::Node {
            label: LabelPattern::Any,
            kind,
        });
    }

    let is_glob = label_tokens
        .iter()
        .any(|token| matches!(token, Token::Char('*') | Token::Char('?')));
    if !is_glob {
        let literal = label_tokens.iter().map(|token| token.ch()).collect();
        return Ok(Segment::Node {
            label: LabelPattern::Literal(literal),
            kind,
        });
    }

    let mut pattern = String::from("^");
    for token in label_tokens {
        match token {
            Token::Char('*') => pattern.push_str(".*"),
            Token::Char('?') => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.ch().to_string())),
        }
    }
    pattern.push('$');
    let regex = Regex::new(&pattern)
        .map_err(|error| UiTestError::invalid_path(raw, error.to_string()))?;
    Ok(Segment::Node {
        label: LabelPattern::Glob(regex),
        kind,
    })
}

fn split_kind_suffix<'a>(
    raw: &str,
    tokens: &'a [Token],
) -> Result<(&'a [Token], Option<NodeKind>), UiTestError> {
    if tokens.last() != Some(&Token::Char(']')) {
        return Ok((tokens, None));
    }
    let Some(open) = tokens.iter().rposition(|token| *token == Token::Char('[')) else {
        return Err(UiTestError::invalid_path(raw, "unbalanced ']' in segment"));
    };
    let name: String = tokens[open + 1..tokens.len() - 1]
        .iter()
        .map(|token| token.ch())
        .collect();
    let kind = NodeKind::from_name(&name)
        .ok_or_else(|| UiTestError::invalid_path(raw, format!("unknown kind \"{}\"", name)))?;
    Ok((&tokens[..open], Some(kind)))
}
