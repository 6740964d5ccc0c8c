//! Typed ID wrappers for library entities.
//!
//! Each ID is a newtype over a v4 `Uuid`, rendered as its hyphenated string
//! on the wire and in the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Generate a newtype ID wrapper over `Uuid`.
///
/// Besides the usual conversions, every ID gets a `parse` that turns an
/// empty or malformed path segment into [`Error::InvalidRequest`].
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident => $label:literal),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl $name {
                /// Create a new random ID.
                #[must_use]
                pub fn new() -> Self {
                    Self(Uuid::new_v4())
                }

                /// Return the inner UUID value.
                #[must_use]
                pub fn as_uuid(&self) -> &Uuid {
                    &self.0
                }

                /// Parse a caller-supplied identifier.
                pub fn parse(raw: &str) -> Result<Self> {
                    let raw = raw.trim();
                    if raw.is_empty() {
                        return Err(Error::InvalidRequest(
                            concat!("missing ", $label, " id").into(),
                        ));
                    }
                    Uuid::parse_str(raw).map(Self).map_err(|_| {
                        Error::InvalidRequest(format!(concat!("invalid ", $label, " id: {}"), raw))
                    })
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = uuid::Error;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    Uuid::parse_str(s).map(Self)
                }
            }

            impl From<Uuid> for $name {
                fn from(uuid: Uuid) -> Self {
                    Self(uuid)
                }
            }

            impl From<$name> for Uuid {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

typed_id! {
    /// Identifier of a show (series).
    ShowId => "show",
    /// Identifier of an episode belonging to a show.
    EpisodeId => "episode",
    /// Identifier of a movie.
    MovieId => "movie",
    /// Identifier of a cover image.
    CoverId => "cover",
}
