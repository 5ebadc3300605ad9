//! Path template compilation and URL matching.

use std::collections::HashMap;

use crate::error::PatternError;

/// Reserved by the query-string capture; not usable as a parameter name.
const QUERY_CAPTURE: &str = "query";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path template such as `/tasks/:id`.
///
/// Matching is anchored at both ends: a URL with extra trailing segments does
/// not match. The query string (text after the first `?`) is split off before
/// structural matching and returned raw.
#[derive(Debug, Clone)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

/// A successful match: captured path parameters plus the raw query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    pub params: HashMap<String, String>,
    pub query: Option<String>,
}

impl PathPattern {
    /// Parse `template` into literal and `:name` parameter segments.
    /// Parameter names are one or more ASCII letters, unique per template.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();
        for part in template.split('/') {
            match part.strip_prefix(':') {
                Some(name) => {
                    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
                        return Err(PatternError::InvalidParamName(name.to_string()));
                    }
                    if name == QUERY_CAPTURE {
                        return Err(PatternError::ReservedParam);
                    }
                    if names.contains(&name) {
                        return Err(PatternError::DuplicateParam(name.to_string()));
                    }
                    names.push(name);
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }
        Ok(Self { segments })
    }

    /// Test `url` (path plus optional `?query`) against the template and
    /// extract the named captures.
    pub fn matches(&self, url: &str) -> Option<UrlMatch> {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (url, None),
        };

        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() || !part.chars().all(is_param_char) {
                        return None;
                    }
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(UrlMatch { params, query })
    }
}

/// Characters a captured parameter value may consist of.
fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
