//! Transcription document. Pure data.
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::store::{oid_hex, Document, IndexSpec};

/// Collection name for transcriptions
pub const TRANSCRIPTION_COLLECTION: &str = "transcriptions";

/// An uploaded transcription of a song
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    #[serde(rename = "_id", default, with = "oid_hex", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub album: String,

    #[serde(default)]
    pub artist: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Where the uploaded file is stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_location: Option<String>,

    #[serde(default)]
    pub up_votes: i64,

    /// Uploading account
    #[serde(default, with = "oid_hex", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,
}

impl Transcription {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, user_id: ObjectId) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            user_id: Some(user_id),
            ..Self::default()
        }
    }
}

impl Document for Transcription {
    const COLLECTION: &'static str = TRANSCRIPTION_COLLECTION;

    fn object_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_object_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::ascending("title"),
            IndexSpec::ascending("album"),
            IndexSpec::ascending("artist"),
            IndexSpec::ascending("userId"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let owner = ObjectId::new();
        let mut t = Transcription::new("Blackbird", "The Beatles", owner);
        t.file_location = Some("uploads/blackbird.pdf".to_string());
        t.up_votes = 3;

        let value = serde_json::to_value(&t).unwrap();
        assert_eq!(value["fileLocation"], "uploads/blackbird.pdf");
        assert_eq!(value["upVotes"], 3);
        assert_eq!(value["userId"], owner.to_hex());
        assert!(value.get("_id").is_none());

        let back: Transcription = serde_json::from_value(value).unwrap();
        assert_eq!(back, t);
    }
}
