//! Investors: onboarded once, immutable thereafter.

use serde::Serialize;

use crate::errors::DomainResult;
use crate::types::{InvestorId, InvestorName};

/// An investor who owns deposits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Investor {
    id: InvestorId,
    name: InvestorName,
}

impl Investor {
    /// Creates a new investor with a fresh identifier.
    pub fn new(name: InvestorName) -> Self {
        Self {
            id: InvestorId::generate(),
            name,
        }
    }

    /// Reconstructs an investor from persisted state.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`](crate::errors::DomainError) if the
    /// identifier is malformed or the name is blank.
    pub fn parse(id: &str, name: &str) -> DomainResult<Self> {
        Ok(Self {
            id: InvestorId::parse(id)?,
            name: InvestorName::try_new(name)?,
        })
    }

    /// The investor's unique identifier.
    pub const fn id(&self) -> InvestorId {
        self.id
    }

    /// The investor's name.
    pub const fn name(&self) -> &InvestorName {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DomainError;

    #[test]
    fn new_investor_keeps_the_validated_name() {
        let investor = Investor::new(InvestorName::try_new("Grace Hopper").unwrap());
        assert_eq!(investor.name().as_ref(), "Grace Hopper");
    }

    #[test]
    fn blank_names_are_rejected_at_construction() {
        assert!(matches!(
            DomainError::from(InvestorName::try_new("").unwrap_err()),
            DomainError::BlankName { field: "name" }
        ));
    }

    #[test]
    fn parse_roundtrips() {
        let investor = Investor::new(InvestorName::try_new("Ada").unwrap());
        let parsed = Investor::parse(&investor.id().to_string(), "Ada").unwrap();
        assert_eq!(investor, parsed);
    }
}
