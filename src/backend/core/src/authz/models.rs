//! Authorization data models: identifiers, raw authorization records and the
//! identity a resolution runs for.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Sentinel resource id meaning "every resource of the category".
pub const ALL_RESOURCES: &str = "*";

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Strongly-typed user identifier.
    UserId
);

string_id!(
    /// Strongly-typed group identifier.
    GroupId
);

string_id!(
    /// Identifier of one connected upstream engine.
    EngineAlias
);

string_id!(
    /// Opaque tag for the class of protected resource, e.g. `process-definition`.
    ResourceCategory
);

string_id!(
    /// Opaque permission token, e.g. `READ` or `ACCESS`.
    Permission
);

// ═══════════════════════════════════════════════════════════════════════════════
// Authorization Record
// ═══════════════════════════════════════════════════════════════════════════════

/// Kind of an authorization record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationKind {
    /// Platform-wide rule, not scoped to a user or group.
    Global,
    /// Additive rule for a user or group.
    Grant,
    /// Subtractive rule for a user or group.
    Revoke,
}

impl fmt::Display for AuthorizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "GLOBAL"),
            Self::Grant => write!(f, "GRANT"),
            Self::Revoke => write!(f, "REVOKE"),
        }
    }
}

/// One raw authorization rule as delivered by an upstream engine.
///
/// `kind` and `resource_category` are optional because upstream data may be
/// incomplete; such records are kept but never applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRecord {
    pub engine_alias: EngineAlias,
    #[serde(default)]
    pub kind: Option<AuthorizationKind>,
    #[serde(default)]
    pub resource_category: Option<ResourceCategory>,
    /// Target resource, [`ALL_RESOURCES`], or empty for "no target".
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub permissions: HashSet<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_group_id: Option<GroupId>,
}

impl AuthorizationRecord {
    /// Create a record without subject or permissions.
    pub fn new(
        engine_alias: impl Into<EngineAlias>,
        kind: AuthorizationKind,
        resource_category: impl Into<ResourceCategory>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            engine_alias: engine_alias.into(),
            kind: Some(kind),
            resource_category: Some(resource_category.into()),
            resource_id: resource_id.into(),
            permissions: HashSet::new(),
            subject_user_id: None,
            subject_group_id: None,
        }
    }

    /// A global rule.
    pub fn global(
        engine_alias: impl Into<EngineAlias>,
        resource_category: impl Into<ResourceCategory>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::new(engine_alias, AuthorizationKind::Global, resource_category, resource_id)
    }

    /// A grant rule; scope it with [`for_user`](Self::for_user) or
    /// [`for_group`](Self::for_group).
    pub fn grant(
        engine_alias: impl Into<EngineAlias>,
        resource_category: impl Into<ResourceCategory>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::new(engine_alias, AuthorizationKind::Grant, resource_category, resource_id)
    }

    /// A revoke rule; scope it with [`for_user`](Self::for_user) or
    /// [`for_group`](Self::for_group).
    pub fn revoke(
        engine_alias: impl Into<EngineAlias>,
        resource_category: impl Into<ResourceCategory>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::new(engine_alias, AuthorizationKind::Revoke, resource_category, resource_id)
    }

    /// Add permission tokens.
    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Scope this record to a user.
    pub fn for_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.subject_user_id = Some(user_id.into());
        self
    }

    /// Scope this record to a group.
    pub fn for_group(mut self, group_id: impl Into<GroupId>) -> Self {
        self.subject_group_id = Some(group_id.into());
        self
    }

    /// Whether both `kind` and `resource_category` are present.
    pub fn is_well_formed(&self) -> bool {
        self.kind.is_some() && self.resource_category.is_some()
    }

    /// Whether the record targets every resource of its category.
    pub fn targets_all_resources(&self) -> bool {
        self.resource_id == ALL_RESOURCES
    }

    /// The targeted resource id, if the record names one specific resource.
    pub fn specific_resource(&self) -> Option<&str> {
        if self.resource_id.is_empty() || self.targets_all_resources() {
            None
        } else {
            Some(&self.resource_id)
        }
    }

    /// Whether this record takes part in resolving `category` for a check
    /// that cares about `relevant_permissions`.
    ///
    /// Malformed records are never applicable.
    pub fn is_applicable(
        &self,
        category: &ResourceCategory,
        relevant_permissions: &HashSet<Permission>,
    ) -> bool {
        self.kind.is_some()
            && self.resource_category.as_ref() == Some(category)
            && !self.permissions.is_disjoint(relevant_permissions)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════════════

/// A user and its group memberships, captured when resolution starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityContext {
    pub user_id: UserId,
    #[serde(default)]
    pub group_ids: HashSet<GroupId>,
}

impl IdentityContext {
    /// An identity without any group memberships.
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            group_ids: HashSet::new(),
        }
    }

    /// Add group memberships.
    pub fn with_groups<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<GroupId>,
    {
        self.group_ids.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn is_member_of(&self, group_id: &GroupId) -> bool {
        self.group_ids.contains(group_id)
    }
}
