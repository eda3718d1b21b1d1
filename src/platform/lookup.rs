//! Found / not-found outcomes for collaborator lookups.

use super::error::{EntityKind, PlatformError, PlatformResult};

/// Result of looking something up where absence is an ordinary answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Convert into an `Option`.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
        }
    }

    /// Treat absence as an error naming what was missing.
    pub fn require(self, kind: EntityKind, name: impl Into<String>) -> PlatformResult<T> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(PlatformError::not_found(kind, name)),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_found() {
        let lookup = Lookup::Found(7);
        assert_eq!(lookup.require(EntityKind::Catalog, "templates").unwrap(), 7);
    }

    #[test]
    fn test_require_not_found() {
        let lookup: Lookup<u32> = Lookup::NotFound;
        let err = lookup.require(EntityKind::CatalogItem, "image.ova").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "catalog item 'image.ova' not found");
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Lookup::from(Some(1)).found(), Some(1));
        assert!(!Lookup::<u32>::from(None).is_found());
        assert_eq!(Lookup::Found(2).map(|v| v * 2), Lookup::Found(4));
    }
}
