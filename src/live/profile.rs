//! The session user's profile

use std::sync::Arc;

use super::{LiveCollection, Snapshot};
use crate::backend::{to_row, Backend, BackendError, BackendResult, ChannelSpec, Query};
use crate::model::{Profile, ProfilePatch, Table};
use crate::session::Session;

/// Live view of a single profile row
pub struct LiveProfile {
    rows: LiveCollection<Profile>,
    backend: Arc<dyn Backend>,
    session: Option<Session>,
}

impl LiveProfile {
    pub async fn mount(backend: Arc<dyn Backend>, session: Option<&Session>) -> Self {
        let rows = match session {
            Some(session) => {
                let me = session.user_id.to_string();
                let query = Query::new().eq("id", me.clone());
                let channel =
                    ChannelSpec::table("profile_changes", Table::Profiles).filtered("id", me);
                LiveCollection::mount(Arc::clone(&backend), Table::Profiles, query, channel).await
            }
            None => LiveCollection::empty(),
        };

        Self {
            rows,
            backend,
            session: session.cloned(),
        }
    }

    /// The profile, if loaded
    pub async fn profile(&self) -> Option<Profile> {
        self.rows.items().await.into_iter().next()
    }

    pub async fn snapshot(&self) -> Snapshot<Profile> {
        self.rows.snapshot().await
    }

    pub async fn refetch(&self) {
        self.rows.refetch().await
    }

    /// Apply a partial update, then re-read the row
    pub async fn update_profile(&self, patch: &ProfilePatch) -> BackendResult<Option<Profile>> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| BackendError::PermissionDenied("No user logged in".to_string()))?;

        self.backend
            .update(Table::Profiles, session.user_id, to_row(patch)?)
            .await?;
        tracing::info!(user_id = %session.user_id, "Profile updated");

        self.rows.refetch().await;
        Ok(self.profile().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_update_profile_rereads() {
        let store = MemoryBackend::new();
        let session = Session::new(Uuid::new_v4()).email("ana@example.com");
        store
            .ensure_profile(session.user_id, "ana@example.com")
            .await
            .unwrap();
        let backend: Arc<dyn Backend> = Arc::new(store.as_user(session.user_id));

        let live = LiveProfile::mount(backend, Some(&session)).await;
        assert_eq!(live.profile().await.unwrap().full_name(), "User");

        let patch = ProfilePatch {
            first_name: Some("Ana".to_string()),
            last_name: Some("Reyes".to_string()),
            ..Default::default()
        };
        let updated = live.update_profile(&patch).await.unwrap().unwrap();
        assert_eq!(updated.full_name(), "Ana Reyes");
        assert_eq!(updated.initials(), "AR");
    }

    #[tokio::test]
    async fn test_signed_out_update_fails() {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
        let live = LiveProfile::mount(backend, None).await;

        assert!(live.profile().await.is_none());
        let err = live
            .update_profile(&ProfilePatch::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No user logged in"));
    }
}
