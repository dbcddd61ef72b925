//! Resolve the names people type into canonical mention form.

use std::sync::Arc;

use tracing::debug;

use crate::error::RotaResult;
use crate::traits::UserDirectory;
use crate::types::mention;

/// Words that refer to whoever sent the message.
const SELF_REFERENCES: &[&str] = &["i", "me", "my", "mine", "myself"];

/// Resolves a raw name token to `<@USERID>`.
///
/// Resolution order: self-reference, already-canonical mention, directory match on
/// any space-separated part of a display name. When the directory has no match the
/// token is echoed back capitalised. That fallback is a best-effort heuristic, not a
/// lookup guarantee: callers may get back something that is not a user id.
pub struct NameResolver {
    directory: Arc<dyn UserDirectory>,
}

impl NameResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve `name` as typed by `requesting_user`.
    ///
    /// Fails only when the directory itself cannot be reached.
    pub async fn resolve(&self, name: &str, requesting_user: &str) -> RotaResult<String> {
        let name = name.trim();

        if is_self_reference(name) {
            debug!(name, "Resolved self reference");
            return Ok(mention(requesting_user));
        }

        if let Some(canonical) = repair_mention(name) {
            debug!(name, "Name already in mention form");
            return Ok(canonical);
        }

        let users = self.directory.list_users().await?;
        let wanted = name.to_lowercase();
        let found = users.iter().find(|user| {
            user.display_name
                .split(' ')
                .any(|part| !part.is_empty() && part.to_lowercase() == wanted)
        });

        match found {
            Some(user) => {
                debug!(name, user_id = %user.id, "Resolved name from directory");
                Ok(mention(&user.id))
            }
            None => {
                debug!(name, "No directory match, echoing name");
                Ok(capitalize(name))
            }
        }
    }
}

/// Whether the token is a first-person reference.
pub fn is_self_reference(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    SELF_REFERENCES.iter().any(|word| *word == name)
}

/// Return the token as a well-formed mention if it is one.
///
/// The classifier sometimes drops the closing `>`; that is put back.
pub fn repair_mention(name: &str) -> Option<String> {
    if !name.starts_with("<@") {
        return None;
    }
    if name.ends_with('>') {
        Some(name.to_string())
    } else {
        Some(format!("{}>", name))
    }
}

fn capitalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RotaError;
    use crate::traits::MockUserDirectory;
    use crate::types::DirectoryUser;

    fn directory() -> MockUserDirectory {
        let mut dir = MockUserDirectory::new();
        dir.expect_list_users().returning(|| {
            Ok(vec![
                DirectoryUser::new("U1", "Alice Smith"),
                DirectoryUser::new("U2", "Bob Jones"),
                DirectoryUser::new("U3", "Carol Smith"),
            ])
        });
        dir
    }

    fn unused_directory() -> MockUserDirectory {
        let mut dir = MockUserDirectory::new();
        dir.expect_list_users().never();
        dir
    }

    #[tokio::test]
    async fn test_self_reference() {
        let resolver = NameResolver::new(Arc::new(unused_directory()));
        assert_eq!(resolver.resolve("I", "U9").await.unwrap(), "<@U9>");
        assert_eq!(resolver.resolve("my", "U9").await.unwrap(), "<@U9>");
        assert_eq!(resolver.resolve("Me", "U9").await.unwrap(), "<@U9>");
    }

    #[tokio::test]
    async fn test_mention_passthrough_and_repair() {
        let resolver = NameResolver::new(Arc::new(unused_directory()));
        assert_eq!(resolver.resolve("<@U2>", "U9").await.unwrap(), "<@U2>");
        assert_eq!(resolver.resolve("<@U2", "U9").await.unwrap(), "<@U2>");
    }

    #[tokio::test]
    async fn test_directory_match_any_name_part() {
        let resolver = NameResolver::new(Arc::new(directory()));
        assert_eq!(resolver.resolve("jones", "U9").await.unwrap(), "<@U2>");
        assert_eq!(resolver.resolve("ALICE", "U9").await.unwrap(), "<@U1>");
        // First match wins
        assert_eq!(resolver.resolve("smith", "U9").await.unwrap(), "<@U1>");
    }

    #[tokio::test]
    async fn test_directory_match_ignores_unicode_case() {
        let mut dir = MockUserDirectory::new();
        dir.expect_list_users()
            .returning(|| Ok(vec![DirectoryUser::new("U9", "Émile Ørsted")]));
        let resolver = NameResolver::new(Arc::new(dir));
        assert_eq!(resolver.resolve("émile", "U1").await.unwrap(), "<@U9>");
        assert_eq!(resolver.resolve("ØRSTED", "U1").await.unwrap(), "<@U9>");
        assert_eq!(resolver.resolve("ørsted", "U1").await.unwrap(), "<@U9>");
    }

    #[tokio::test]
    async fn test_no_match_echoes_capitalized() {
        let resolver = NameResolver::new(Arc::new(directory()));
        assert_eq!(resolver.resolve("dAVE", "U9").await.unwrap(), "Dave");
    }

    #[tokio::test]
    async fn test_directory_failure_propagates() {
        let mut dir = MockUserDirectory::new();
        dir.expect_list_users()
            .returning(|| Err(RotaError::directory("connection refused")));
        let resolver = NameResolver::new(Arc::new(dir));
        let err = resolver.resolve("alice", "U9").await.unwrap_err();
        assert!(matches!(err, RotaError::DirectoryUnavailable { .. }));
    }
}
