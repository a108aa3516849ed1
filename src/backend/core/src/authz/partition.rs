//! Splits raw records into the three precedence layers for one identity.

use tracing::warn;

use super::models::{AuthorizationKind, AuthorizationRecord, IdentityContext};

/// Records of one batch, split by precedence layer.
///
/// Borrowed from the raw batch; built fresh for every resolution.
#[derive(Debug, Clone, Default)]
pub struct PartitionedRecords<'a> {
    /// `GLOBAL` records.
    pub global: Vec<&'a AuthorizationRecord>,
    /// `GRANT`/`REVOKE` records for a group the identity belongs to.
    pub group_relevant: Vec<&'a AuthorizationRecord>,
    /// `GRANT`/`REVOKE` records for the identity's user.
    pub user_relevant: Vec<&'a AuthorizationRecord>,
}

impl<'a> PartitionedRecords<'a> {
    /// Partition `records` for `identity`.
    ///
    /// A subject record naming both the user and one of its groups lands in
    /// both layers. Records without a kind belong to no layer.
    pub fn split(records: &'a [AuthorizationRecord], identity: &IdentityContext) -> Self {
        let mut partitions = Self::default();
        let mut malformed = 0usize;

        for record in records {
            match record.kind {
                Some(AuthorizationKind::Global) => partitions.global.push(record),
                Some(AuthorizationKind::Grant | AuthorizationKind::Revoke) => {
                    if record
                        .subject_group_id
                        .as_ref()
                        .is_some_and(|group| identity.is_member_of(group))
                    {
                        partitions.group_relevant.push(record);
                    }
                    if record.subject_user_id.as_ref() == Some(&identity.user_id) {
                        partitions.user_relevant.push(record);
                    }
                }
                None => malformed += 1,
            }

            if record.kind.is_some() && record.resource_category.is_none() {
                malformed += 1;
            }
        }

        if malformed > 0 {
            warn!(
                user_id = %identity.user_id,
                malformed,
                "Ignoring authorization records without kind or resource category"
            );
        }

        partitions
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.group_relevant.len() + self.user_relevant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition `records` for `identity`.
pub fn partition<'a>(
    records: &'a [AuthorizationRecord],
    identity: &IdentityContext,
) -> PartitionedRecords<'a> {
    PartitionedRecords::split(records, identity)
}
