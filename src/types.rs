//! Core data types: registry entries, query filters, and pager position.

use serde::{Deserialize, Serialize};

/// One entry from the state-registration registry.
///
/// All fields are opaque strings as rendered by the registry, except `cnpj`,
/// which is normalized to digits only (the site sometimes renders it with
/// punctuation). Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// CNPJ, digits only.
    pub cnpj: String,
    /// State registration number (Inscrição Estadual).
    pub ie: String,
    /// Legal name (razão social).
    pub razao_social: String,
    /// State code (UF).
    pub uf: String,
    /// Registration status code as rendered by the registry.
    pub situacao: String,
}

/// Number of columns a grid row must yield to form a [`Registration`].
pub const RECORD_FIELD_COUNT: usize = 5;

/// Caller-supplied query filters. Unset fields mean "match all":
/// empty CNPJ/IE/UF, and status `"99"` (all statuses).
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    /// CNPJ to look up; normalized to digits before submission.
    pub cnpj: Option<String>,
    /// State registration number; normalized to digits before submission.
    pub ie: Option<String>,
    /// State code filter (e.g. "BA"). Opaque remote code.
    pub uf: Option<String>,
    /// Status code filter. Opaque remote code; `"99"` means all.
    pub situacao: Option<String>,
}

impl QueryFilters {
    /// Filter on state registration number only.
    pub fn by_ie(ie: &str) -> Self {
        Self {
            ie: Some(ie.to_string()),
            ..Self::default()
        }
    }

    /// Filter on CNPJ only.
    pub fn by_cnpj(cnpj: &str) -> Self {
        Self {
            cnpj: Some(cnpj.to_string()),
            ..Self::default()
        }
    }
}

/// Pager position reported by one response: current page and total pages,
/// both >= 1. When the grid renders no pager row (single-page result sets),
/// the position is the implicit `(1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerPosition {
    pub current: u32,
    pub total: u32,
}

impl PagerPosition {
    /// The implicit single-page position.
    pub const SINGLE: Self = Self {
        current: 1,
        total: 1,
    };

    /// True when no further pages exist.
    pub fn is_last(&self) -> bool {
        self.current >= self.total
    }
}

/// Strip every non-digit character.
///
/// Applied at both boundaries: filter values going into the form payload
/// (the remote form expects digit strings) and identifier cells coming out
/// of parsed rows.
pub fn only_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_digits_strips_punctuation() {
        assert_eq!(only_digits("08.408.316/6"), "084083166");
        assert_eq!(only_digits("12.345.678/0001-90"), "12345678000190");
        assert_eq!(only_digits(""), "");
        assert_eq!(only_digits("abc"), "");
    }

    #[test]
    fn test_pager_is_last() {
        assert!(PagerPosition::SINGLE.is_last());
        assert!(PagerPosition {
            current: 3,
            total: 3
        }
        .is_last());
        assert!(!PagerPosition {
            current: 1,
            total: 2
        }
        .is_last());
    }

    #[test]
    fn test_default_filters_match_all() {
        let f = QueryFilters::default();
        assert!(f.cnpj.is_none() && f.ie.is_none() && f.uf.is_none() && f.situacao.is_none());
    }
}
