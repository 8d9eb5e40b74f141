//! Mail domains offered by the provider.

use serde::{Deserialize, Serialize};

use super::DomainId;

/// Substrings that mark a domain as academic-looking.
const ACADEMIC_MARKERS: [&str; 2] = [".edu", ".ac"];

/// A domain under which disposable addresses can be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Provider identifier.
    pub id: DomainId,
    /// Domain name, e.g. `uni.edu`.
    pub domain: String,
    /// Whether the domain is reserved for a specific customer.
    #[serde(default)]
    pub is_private: bool,
    /// Whether new accounts may currently be created under it.
    #[serde(default)]
    pub is_active: bool,
}

impl Domain {
    /// Creates an active, public domain.
    pub fn new(id: impl Into<DomainId>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            is_private: false,
            is_active: true,
        }
    }

    /// Returns true if the name contains an academic marker.
    pub fn is_academic(&self) -> bool {
        ACADEMIC_MARKERS
            .iter()
            .any(|marker| self.domain.contains(marker))
    }
}

/// Picks the domain to pre-select from a provider listing.
///
/// The first academic domain wins; otherwise the first entry. Returns `None`
/// for an empty listing.
pub fn preferred_domain(domains: &[Domain]) -> Option<&Domain> {
    domains
        .iter()
        .find(|d| d.is_academic())
        .or_else(|| domains.first())
}
