use thiserror::Error;

use crate::references::Relation;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Entity not found: {entity}")]
    NotFound { entity: String },

    #[error("Uniqueness conflict: {field}")]
    Uniqueness { field: String },

    #[error("Forbidden action")]
    Forbidden,

    #[error("Invalid {kind} value: {value:?}")]
    InvalidEnumValue { kind: &'static str, value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    ReferenceLoad(#[from] ReferenceLoadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure reported by a persistence port.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{collection} {id} not found")]
    NotFound { collection: String, id: String },

    #[error("{collection} {id} already exists")]
    AlreadyExists { collection: String, id: String },

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Cannot decode stored document: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// One relation that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFailure {
    pub relation: Relation,
    pub source: StoreError,
}

/// Every non-NotFound failure collected while resolving relations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load references: {}", describe(.failures))]
pub struct ReferenceLoadError {
    failures: Vec<ReferenceFailure>,
}

impl ReferenceLoadError {
    pub(crate) fn from_failures(failures: Vec<ReferenceFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[ReferenceFailure] {
        &self.failures
    }

    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        self.failures.iter().map(|failure| failure.relation)
    }
}

fn describe(failures: &[ReferenceFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{} ({})", failure.relation, failure.source))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_load_error_lists_each_relation() {
        let err = ReferenceLoadError::from_failures(vec![
            ReferenceFailure {
                relation: Relation::Payment,
                source: StoreError::Backend("timeout".to_string()),
            },
            ReferenceFailure {
                relation: Relation::PartnerPharmacy,
                source: StoreError::Decode("missing name".to_string()),
            },
        ])
        .unwrap();

        assert_eq!(
            err.to_string(),
            "failed to load references: paymentInfo (Store backend error: timeout); \
             partnerPharmacy (Cannot decode stored document: missing name)"
        );
        assert_eq!(
            err.relations().collect::<Vec<_>>(),
            vec![Relation::Payment, Relation::PartnerPharmacy]
        );
    }

    #[test]
    fn test_no_failures_means_no_error() {
        assert!(ReferenceLoadError::from_failures(Vec::new()).is_none());
    }

    #[test]
    fn test_not_found_predicate() {
        assert!(StoreError::not_found("address", "a1").is_not_found());
        assert!(!StoreError::Backend("boom".to_string()).is_not_found());
    }
}
