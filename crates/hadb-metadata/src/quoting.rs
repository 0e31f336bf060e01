//! Identifier quoting
//!
//! [`DialectFacts`] captures everything a backend reports that bears on
//! whether an identifier needs quoting. It is computed once per connection
//! and then answers every quoting decision without touching the backend.

use crate::reserved::is_standard_reserved;
use hadb_core::{DatabaseMetaData, Error, Result};
use regex::Regex;
use std::collections::HashSet;

/// How a backend treats the case of identifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CasePolicy {
    /// Unquoted mixed-case identifiers are stored as written
    pub mixed_case: bool,
    /// Quoted mixed-case identifiers are stored as written
    pub mixed_case_quoted: bool,
    /// Unquoted identifiers are folded to lower case
    pub stores_lower: bool,
    /// Unquoted identifiers are folded to upper case
    pub stores_upper: bool,
}

impl CasePolicy {
    /// Whether folding would change `identifier`, in a backend where quoting preserves it
    fn requires_quoting(&self, identifier: &str) -> bool {
        if self.mixed_case || !self.mixed_case_quoted {
            return false;
        }
        (self.stores_lower && identifier.chars().any(|c| c.is_ascii_uppercase()))
            || (self.stores_upper && identifier.chars().any(|c| c.is_ascii_lowercase()))
    }
}

/// Reserved words, identifier character rules and case policy of one backend
#[derive(Debug, Clone)]
pub struct DialectFacts {
    quote: String,
    /// Backend keywords beyond the SQL standard set, lower-cased
    keywords: HashSet<String>,
    identifier_pattern: Regex,
    case_policy: CasePolicy,
}

impl DialectFacts {
    /// Build facts from explicit values
    ///
    /// `keywords` are merged with the SQL standard reserved words; matching
    /// is case-insensitive.
    pub fn new<I, S>(quote: impl Into<String>, keywords: I, extra_name_characters: &str, case_policy: CasePolicy) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: HashSet<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty() && !is_standard_reserved(k))
            .collect();

        let extra: String = extra_name_characters
            .chars()
            .map(|c| regex::escape(&c.to_string()))
            .collect();
        let identifier_pattern = Regex::new(&format!("^[A-Za-z0-9_{}]+$", extra)).map_err(|e| {
            Error::message(format!(
                "Invalid extra name characters {:?}: {}",
                extra_name_characters, e
            ))
        })?;

        Ok(Self {
            quote: quote.into(),
            keywords,
            identifier_pattern,
            case_policy,
        })
    }

    /// Read the facts a backend reports about itself
    pub async fn load(metadata: &dyn DatabaseMetaData) -> Result<Self> {
        let quote = metadata.identifier_quote_string().await?;
        let keywords = metadata.sql_keywords().await?;
        let extra = metadata.extra_name_characters().await?;
        let case_policy = CasePolicy {
            mixed_case: metadata.supports_mixed_case_identifiers().await?,
            mixed_case_quoted: metadata.supports_mixed_case_quoted_identifiers().await?,
            stores_lower: metadata.stores_lower_case_identifiers().await?,
            stores_upper: metadata.stores_upper_case_identifiers().await?,
        };

        tracing::debug!(
            quote = %quote,
            keywords = keywords.len(),
            extra_name_characters = %extra,
            "Loaded dialect facts"
        );

        Self::new(quote, keywords, &extra, case_policy)
    }

    pub fn quote_string(&self) -> &str {
        &self.quote
    }

    pub fn case_policy(&self) -> CasePolicy {
        self.case_policy
    }

    /// Whether `identifier` is reserved, ignoring case
    pub fn is_reserved(&self, identifier: &str) -> bool {
        let lower = identifier.to_lowercase();
        is_standard_reserved(&lower) || self.keywords.contains(&lower)
    }

    /// Return `identifier` in the form safe to embed in SQL for this backend
    ///
    /// Identifiers the driver already quoted come back unchanged. Otherwise an
    /// identifier is quoted when it is reserved, contains characters outside
    /// the backend's unquoted identifier alphabet, or would be case-folded by
    /// a backend that preserves case only when quoted.
    pub fn quote(&self, identifier: &str) -> String {
        if identifier.starts_with(&self.quote) {
            return identifier.to_string();
        }

        let requires_quoting = self.is_reserved(identifier)
            || !self.identifier_pattern.is_match(identifier)
            || self.case_policy.requires_quoting(identifier);

        if requires_quoting {
            format!("{}{}{}", self.quote, identifier, self.quote)
        } else {
            identifier.to_string()
        }
    }
}
