//! Cache key layout.
//!
//! All pipeline entries live under a `project:{id}:` prefix so related
//! entries group together when inspecting the cache.

use vermeer_core::ProjectId;

/// Key holding the generated text summary for a project.
pub fn summary_key(project_id: &ProjectId) -> String {
    format!("project:{project_id}:summary")
}

/// Key holding the source-text hash the cached summary was computed from.
pub fn hash_key(project_id: &ProjectId) -> String {
    format!("project:{project_id}:hash")
}

/// Key holding the cached recommendation list for a project.
pub fn recommendations_key(project_id: &ProjectId) -> String {
    format!("project:{project_id}:recommendations")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_share_the_project_prefix() {
        let id = ProjectId::new();
        let prefix = format!("project:{id}:");
        assert!(summary_key(&id).starts_with(&prefix));
        assert!(hash_key(&id).starts_with(&prefix));
        assert!(recommendations_key(&id).starts_with(&prefix));
        assert!(summary_key(&id).ends_with(":summary"));
        assert!(hash_key(&id).ends_with(":hash"));
        assert!(recommendations_key(&id).ends_with(":recommendations"));
    }
}
