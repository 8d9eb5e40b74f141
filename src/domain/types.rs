//! Identifier types for provider-assigned entities.
//!
//! The mail provider hands out opaque string identifiers. Wrapping them keeps a
//! message id from being passed where a domain id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Returns true if no identifier has been assigned yet.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

string_id!(
    /// Provider identifier of a disposable account.
    ///
    /// Empty until the provider has assigned one; the generator flow commits
    /// sessions with an empty id.
    AccountId
);

string_id!(
    /// Provider identifier of a mail domain.
    DomainId
);

string_id!(
    /// Provider identifier of a received message.
    MessageId
);
