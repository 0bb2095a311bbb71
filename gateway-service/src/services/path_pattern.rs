//! URI templates used to match advertised APIs and whitelisted routes.
//!
//! Supported syntax, per `/`-separated segment:
//! - literal text, compared exactly
//! - `{name}` - any single non-empty segment
//! - `*` and `?` inside a segment - glob over the segment's characters
//! - `**` or `{*name}` as the last segment - zero or more remaining segments
//!
//! A single trailing slash on the matched path is ignored.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Pattern must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("Malformed variable segment '{segment}' in pattern {pattern}")]
    InvalidVariable { pattern: String, segment: String },

    #[error("Catch-all must be the last segment: {0}")]
    CatchAllNotLast(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
    Glob(String),
    CatchAll,
}

/// Compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let body = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

        let raw: Vec<&str> = body.split('/').collect();
        let last = raw.len() - 1;
        let mut segments = Vec::with_capacity(raw.len());

        for (i, seg) in raw.iter().enumerate() {
            let parsed = parse_segment(pattern, seg)?;
            if parsed == Segment::CatchAll && i != last {
                return Err(PatternError::CatchAllNotLast(pattern.to_string()));
            }
            segments.push(parsed);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if `path` is matched by this pattern. Paths without a leading
    /// slash never match.
    pub fn matches(&self, path: &str) -> bool {
        let Some(mut body) = path.strip_prefix('/') else {
            return false;
        };
        if !self.source.ends_with('/') {
            body = body.strip_suffix('/').unwrap_or(body);
        }

        let mut parts = body.split('/');
        for segment in &self.segments {
            if *segment == Segment::CatchAll {
                return true;
            }
            let Some(part) = parts.next() else {
                return false;
            };
            let ok = match segment {
                Segment::Literal(lit) => lit == part,
                Segment::Variable(_) => !part.is_empty(),
                Segment::Glob(glob) => !part.is_empty() && glob_match(glob, part),
                Segment::CatchAll => true,
            };
            if !ok {
                return false;
            }
        }
        parts.next().is_none()
    }

    /// Names of the `{name}` variables, in order.
    pub fn variables(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segment(pattern: &str, seg: &str) -> Result<Segment, PatternError> {
    if seg == "**" {
        return Ok(Segment::CatchAll);
    }
    if !seg.contains(['{', '}']) {
        return Ok(if seg.contains(['*', '?']) {
            Segment::Glob(seg.to_string())
        } else {
            Segment::Literal(seg.to_string())
        });
    }

    let invalid = || PatternError::InvalidVariable {
        pattern: pattern.to_string(),
        segment: seg.to_string(),
    };
    let inner = seg
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(invalid)?;
    if inner.contains(['{', '}']) {
        return Err(invalid());
    }
    match inner.strip_prefix('*') {
        Some(name) if !name.is_empty() => Ok(Segment::CatchAll),
        Some(_) => Err(invalid()),
        None if inner.is_empty() => Err(invalid()),
        None => Ok(Segment::Variable(inner.to_string())),
    }
}

/// `*` matches any run of characters, `?` exactly one.
fn glob_match(glob: &str, text: &str) -> bool {
    let g: Vec<char> = glob.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut gi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if gi < g.len() && (g[gi] == '?' || g[gi] == t[ti]) {
            gi += 1;
            ti += 1;
        } else if gi < g.len() && g[gi] == '*' {
            star = Some((gi, ti));
            gi += 1;
        } else if let Some((sg, st)) = star {
            gi = sg + 1;
            ti = st + 1;
            star = Some((sg, st + 1));
        } else {
            return false;
        }
    }
    g[gi..].iter().all(|c| *c == '*')
}
