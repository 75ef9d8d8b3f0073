//! Bounty document. Pure data.
//!
//! `userId` carries a unique index, so an account can hold at most one
//! bounty at a time. `transcriptionId` is unique too, but only among bounties
//! that have one: missing or null values never collide here, whereas the
//! legacy MongoDB index (not sparse) rejected a second bounty without a
//! transcription.
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::store::{oid_hex, Document, IndexSpec};

/// Collection name for bounties
pub const BOUNTY_COLLECTION: &str = "bounties";

/// A request for a transcription, paid in karma points
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bounty {
    #[serde(rename = "_id", default, with = "oid_hex", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub has_uploaded: bool,

    #[serde(default)]
    pub fulfilled: bool,

    /// Transcription that fulfils the bounty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription_id: Option<String>,

    #[serde(default)]
    pub num_points: i64,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub album: String,

    #[serde(default)]
    pub artist: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, with = "oid_hex", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,
}

impl Bounty {
    pub fn new(title: impl Into<String>, num_points: i64, user_id: ObjectId) -> Self {
        Self {
            title: title.into(),
            num_points,
            user_id: Some(user_id),
            ..Self::default()
        }
    }
}

impl Document for Bounty {
    const COLLECTION: &'static str = BOUNTY_COLLECTION;

    fn object_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_object_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::unique("transcriptionId"),
            IndexSpec::ascending("title"),
            IndexSpec::ascending("album"),
            IndexSpec::ascending("artist"),
            IndexSpec::unique("userId"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::{Collection, MemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_one_bounty_per_user() {
        let bounties: Collection<Bounty> = Collection::new(Arc::new(MemoryStore::new()));
        let owner = ObjectId::new();

        let mut first = Bounty::new("Blackbird", 10, owner);
        bounties.save(&mut first).await.unwrap();
        assert_eq!(first.id().map(|id| id.len()), Some(24));

        let mut second = Bounty::new("Yesterday", 5, owner);
        let err = bounties.save(&mut second).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey { ref field, .. } if field == "userId"));

        // unfulfilled bounties have no transcriptionId and never collide on it
        let mut other = Bounty::new("Yesterday", 5, ObjectId::new());
        bounties.save(&mut other).await.unwrap();
    }
}
