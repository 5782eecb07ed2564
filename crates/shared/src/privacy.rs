//! The privacy filter (spec §4.4): a single canonical projection
//! predicate keyed by [`AccessMode`]. All query paths permitted to
//! filter by privacy must consume [`access_mode_allows`] to avoid
//! drift (spec §9 "Privacy projection").

use serde::{Deserialize, Serialize};

use crate::models::PrivacyLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessMode {
    All,
    InternalAndPublic,
    PublicOnly,
}

impl Default for AccessMode {
    /// Single-user system has full access by default (spec §4.6).
    fn default() -> Self {
        Self::All
    }
}

/// The one predicate every privacy-aware reader must call.
pub fn access_mode_allows(mode: AccessMode, level: PrivacyLevel) -> bool {
    match mode {
        AccessMode::All => true,
        AccessMode::InternalAndPublic => {
            matches!(level, PrivacyLevel::Internal | PrivacyLevel::Public)
        }
        AccessMode::PublicOnly => matches!(level, PrivacyLevel::Public),
    }
}

pub fn allowed_levels(mode: AccessMode) -> &'static [PrivacyLevel] {
    match mode {
        AccessMode::All => &[
            PrivacyLevel::Public,
            PrivacyLevel::Internal,
            PrivacyLevel::Private,
        ],
        AccessMode::InternalAndPublic => &[PrivacyLevel::Public, PrivacyLevel::Internal],
        AccessMode::PublicOnly => &[PrivacyLevel::Public],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_mode_admits_every_level() {
        for level in [
            PrivacyLevel::Public,
            PrivacyLevel::Internal,
            PrivacyLevel::Private,
        ] {
            assert!(access_mode_allows(AccessMode::All, level));
        }
    }

    #[test]
    fn public_only_excludes_internal_and_private() {
        assert!(access_mode_allows(AccessMode::PublicOnly, PrivacyLevel::Public));
        assert!(!access_mode_allows(AccessMode::PublicOnly, PrivacyLevel::Internal));
        assert!(!access_mode_allows(AccessMode::PublicOnly, PrivacyLevel::Private));
    }

    #[test]
    fn internal_and_public_excludes_private() {
        assert!(access_mode_allows(
            AccessMode::InternalAndPublic,
            PrivacyLevel::Internal
        ));
        assert!(!access_mode_allows(
            AccessMode::InternalAndPublic,
            PrivacyLevel::Private
        ));
    }

    #[test]
    fn default_access_mode_is_all() {
        assert_eq!(AccessMode::default(), AccessMode::All);
    }
}
