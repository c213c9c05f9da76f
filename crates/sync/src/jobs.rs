//! Work items of the sync queue.

use killstreaks_core::PersistedAchievement;
use killstreaks_infra::Job;

/// A deferred network call, handled by [`SyncEngine`](crate::SyncEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncJob {
    /// Upload one freshly created achievement.
    PostAchievement(PersistedAchievement),
    /// Upload everything created since the last server-side sync.
    SyncAchievements,
}

impl Job for SyncJob {
    fn kind(&self) -> &'static str {
        match self {
            SyncJob::PostAchievement(_) => "post_achievement",
            SyncJob::SyncAchievements => "sync_achievements",
        }
    }
}
