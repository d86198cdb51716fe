//! Permission grants and the capabilities they confer.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// One row of the permission store: the flags a user holds over a bucket.
///
/// Several rows may exist for the same (user, bucket) pair. Consumers must
/// fold them with [`CapabilitySet::from_grants`] rather than pick one.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct PermissionGrant {
    pub id: i64,
    pub user_id: i64,
    pub bucket_id: i64,
    pub can_view: bool,
    pub can_upload: bool,
    pub can_delete: bool,
}

/// An operation a caller may need on a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    View,
    Upload,
    Delete,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::View => "view",
            Capability::Upload => "upload",
            Capability::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// The effective capabilities of one user over one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    pub view: bool,
    pub upload: bool,
    pub delete: bool,
}

impl CapabilitySet {
    /// Union of all grants: a flag is set if any grant sets it.
    pub fn from_grants<'a>(grants: impl IntoIterator<Item = &'a PermissionGrant>) -> Self {
        grants.into_iter().fold(Self::default(), |acc, g| Self {
            view: acc.view || g.can_view,
            upload: acc.upload || g.can_upload,
            delete: acc.delete || g.can_delete,
        })
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::View => self.view,
            Capability::Upload => self.upload,
            Capability::Delete => self.delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(view: bool, upload: bool, delete: bool) -> PermissionGrant {
        PermissionGrant {
            id: 0,
            user_id: 1,
            bucket_id: 1,
            can_view: view,
            can_upload: upload,
            can_delete: delete,
        }
    }

    #[test]
    fn no_grants_deny_everything() {
        let caps = CapabilitySet::from_grants(std::iter::empty::<&PermissionGrant>());
        assert_eq!(caps, CapabilitySet::default());
        assert!(!caps.allows(Capability::View));
        assert!(!caps.allows(Capability::Upload));
        assert!(!caps.allows(Capability::Delete));
    }

    #[test]
    fn divergent_grants_are_unioned() {
        let grants = [grant(true, false, false), grant(false, false, true)];
        let caps = CapabilitySet::from_grants(&grants);
        assert!(caps.allows(Capability::View));
        assert!(!caps.allows(Capability::Upload));
        assert!(caps.allows(Capability::Delete));
    }

    #[test]
    fn capability_display_is_lowercase() {
        assert_eq!(Capability::Upload.to_string(), "upload");
    }
}
