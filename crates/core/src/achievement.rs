//! Achievements and the medals they reference.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AchievementId, DeckId};

/// Host-defined medal descriptor.
///
/// Persisted achievements reference a medal by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medal {
    pub name: String,
    /// Display image reference (path or URL, host-defined).
    pub medal_image: String,
}

impl Medal {
    pub fn new(name: impl Into<String>, medal_image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            medal_image: medal_image.into(),
        }
    }
}

/// Source of every medal the host knows how to display.
pub trait MedalCatalog: Send + Sync {
    fn medals(&self) -> Vec<Medal>;
}

/// Fixed, in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticMedalCatalog {
    medals: Vec<Medal>,
}

impl StaticMedalCatalog {
    pub fn new(medals: Vec<Medal>) -> Self {
        Self { medals }
    }
}

impl MedalCatalog for StaticMedalCatalog {
    fn medals(&self) -> Vec<Medal> {
        self.medals.clone()
    }
}

/// An achievement about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAchievement {
    pub medal_id: String,
    pub deck_id: DeckId,
    pub created_at: DateTime<Utc>,
}

impl NewAchievement {
    pub fn new(medal_id: impl Into<String>, deck_id: DeckId, created_at: DateTime<Utc>) -> Self {
        Self {
            medal_id: medal_id.into(),
            deck_id,
            created_at,
        }
    }

    /// Stamp the achievement with the current instant.
    pub fn now(medal_id: impl Into<String>, deck_id: DeckId) -> Self {
        Self::new(medal_id, deck_id, Utc::now())
    }
}

/// A stored achievement row.
///
/// Serializes to the batch upload shape `{id_, medal_id, created_at, deck_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAchievement {
    #[serde(rename = "id_")]
    pub id: AchievementId,
    pub medal_id: String,
    pub created_at: DateTime<Utc>,
    pub deck_id: DeckId,
}

impl PersistedAchievement {
    pub fn with_medal(self, medal: Medal) -> EnrichedAchievement {
        EnrichedAchievement {
            achievement: self,
            medal,
        }
    }
}

/// A stored achievement joined with its medal descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedAchievement {
    pub achievement: PersistedAchievement,
    pub medal: Medal,
}

impl EnrichedAchievement {
    pub fn id(&self) -> AchievementId {
        self.achievement.id
    }

    pub fn medal_name(&self) -> &str {
        &self.medal.name
    }

    pub fn medal_img_src(&self) -> &str {
        &self.medal.medal_image
    }
}

/// Join persisted rows to catalog medals on `medal_id == medal.name`.
///
/// Row order is preserved. Rows with no matching medal are omitted; they are
/// returned separately so callers can report them.
pub fn join_medals(
    medals: Vec<Medal>,
    rows: Vec<PersistedAchievement>,
) -> (Vec<EnrichedAchievement>, Vec<PersistedAchievement>) {
    let mut by_name: HashMap<String, Medal> = HashMap::with_capacity(medals.len());
    for medal in medals {
        by_name.entry(medal.name.clone()).or_insert(medal);
    }

    let mut joined = Vec::with_capacity(rows.len());
    let mut unmatched = Vec::new();

    for row in rows {
        match by_name.get(&row.medal_id) {
            Some(medal) => {
                let medal = medal.clone();
                joined.push(row.with_medal(medal));
            }
            None => unmatched.push(row),
        }
    }

    (joined, unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(id: i64, medal_id: &str) -> PersistedAchievement {
        PersistedAchievement {
            id: AchievementId::new(id),
            medal_id: medal_id.to_string(),
            created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            deck_id: DeckId::new(1),
        }
    }

    #[test]
    fn join_keeps_row_order_and_splits_unmatched() {
        let medals = vec![
            Medal::new("Double Kill", "double.png"),
            Medal::new("Triple Kill", "triple.png"),
        ];
        let rows = vec![row(1, "Triple Kill"), row(2, "Unknown"), row(3, "Double Kill")];

        let (joined, unmatched) = join_medals(medals, rows);

        let ids: Vec<i64> = joined.iter().map(|a| a.id().get()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(joined[0].medal_img_src(), "triple.png");
        assert_eq!(joined[1].medal_name(), "Double Kill");
        assert_eq!(unmatched, vec![row(2, "Unknown")]);
    }

    #[test]
    fn duplicate_catalog_names_do_not_duplicate_rows() {
        let medals = vec![
            Medal::new("Killing Spree", "a.png"),
            Medal::new("Killing Spree", "b.png"),
        ];

        let (joined, _) = join_medals(medals, vec![row(1, "Killing Spree")]);

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].medal_img_src(), "a.png");
    }

    #[test]
    fn persisted_rows_serialize_to_upload_shape() {
        let value = serde_json::to_value(row(7, "Double Kill")).unwrap();
        assert_eq!(value["id_"], 7);
        assert_eq!(value["medal_id"], "Double Kill");
        assert_eq!(value["deck_id"], 1);
        assert!(value.get("medal").is_none());
        assert!(value.get("id").is_none());
    }
}
