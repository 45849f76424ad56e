use super::NegotiationError;
use std::fmt;
use std::str::FromStr;

/// A parsed media type or media range: `type/subtype; name=value ...`.
///
/// Type, subtype and parameter names are lower-cased; parameter values keep
/// their case with surrounding quotes removed. Either half may be `*` when the
/// value is used as a range (`*/*`, `text/*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    main: String,
    sub: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    pub fn parse(input: &str) -> Result<Self, NegotiationError> {
        let invalid = || NegotiationError::InvalidMediaType(input.to_string());

        let mut parts = input.split(';');
        let essence = parts.next().map(str::trim).unwrap_or_default();
        let (main, sub) = essence.split_once('/').ok_or_else(invalid)?;
        let (main, sub) = (main.trim(), sub.trim());
        if !is_token(main) || !is_token(sub) || (main == "*" && sub != "*") {
            return Err(invalid());
        }

        let mut params = Vec::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (name, value) = param.split_once('=').ok_or_else(invalid)?;
            let name = name.trim();
            if !is_token(name) {
                return Err(invalid());
            }
            let value = value.trim().trim_matches('"');
            params.push((name.to_ascii_lowercase(), value.to_string()));
        }

        Ok(Self {
            main: main.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
            params,
        })
    }

    #[must_use]
    pub fn main_type(&self) -> &str {
        &self.main
    }

    #[must_use]
    pub fn sub_type(&self) -> &str {
        &self.sub
    }

    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.main == "*" || self.sub == "*"
    }

    pub(crate) fn remove_param(&mut self, name: &str) -> Option<String> {
        let index = self.params.iter().position(|(n, _)| n == name)?;
        Some(self.params.remove(index).1)
    }

    /// Whether `self`, read as a range, covers `other`.
    ///
    /// Every parameter of the range must appear on `other` with an equal
    /// (case-insensitive) value; extra parameters on `other` are fine.
    #[must_use]
    pub fn matches(&self, other: &MediaType) -> bool {
        let main_ok = self.main == "*" || self.main == other.main;
        let sub_ok = self.sub == "*" || self.sub == other.sub;
        main_ok
            && sub_ok
            && self.params.iter().all(|(name, value)| {
                other
                    .param(name)
                    .is_some_and(|v| v.eq_ignore_ascii_case(value))
            })
    }

    /// Precedence of a range: `*/*` < `type/*` < `type/subtype` < with parameters.
    #[must_use]
    pub fn specificity(&self) -> u8 {
        match (self.main.as_str(), self.sub.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ if self.params.is_empty() => 2,
            _ => 3,
        }
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
        })
}

impl FromStr for MediaType {
    type Err = NegotiationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)?;
        for (name, value) in &self.params {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}
