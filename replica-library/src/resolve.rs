// SPDX-License-Identifier: GPL-3.0-only

//! Turning user input into a library identifier
//!
//! Input that parses as a UUID is taken as is. Anything else is looked up as
//! a registered shortname. When the lookup finds nothing, or the registry
//! cannot be read, the input itself is used as the identifier. The variant
//! returned says which of these happened so callers can report it.

use replica_contracts::UserConfigSource;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Input was already a UUID
    Uuid(String),
    /// Input matched a registered shortname
    Shortname { short: String, id: String },
    /// Nothing matched; the input is used verbatim
    Literal(String),
}

impl Resolution {
    pub fn id(&self) -> &str {
        match self {
            Resolution::Uuid(id) | Resolution::Literal(id) => id,
            Resolution::Shortname { id, .. } => id,
        }
    }

    pub fn is_literal_fallback(&self) -> bool {
        matches!(self, Resolution::Literal(_))
    }
}

pub fn resolve_library_id(input: &str, registry: &dyn UserConfigSource) -> Resolution {
    if Uuid::parse_str(input).is_ok() {
        return Resolution::Uuid(input.to_string());
    }

    match registry.resolve_shortname(input) {
        Ok(Some(id)) => {
            debug!("Resolved shortname '{}' to '{}'", input, id);
            Resolution::Shortname {
                short: input.to_string(),
                id,
            }
        }
        Ok(None) => Resolution::Literal(input.to_string()),
        Err(error) => {
            warn!(
                "Could not resolve '{}': {}. Using it directly as a library id.",
                input, error
            );
            Resolution::Literal(input.to_string())
        }
    }
}
