//! The follow graph.

use std::sync::Arc;

use patente_core::Clock;
use patente_core::model::{Follow, FollowId, User, UserId, UserProfile};
use storage::repository::{FollowRepository, StorageError, TokenRepository, UserRepository};

use crate::auth::resolve_user;
use crate::error::SocialServiceError;

/// Use-case layer for following and listing followers.
///
/// Edge writes and the denormalized counts on both accounts are applied as
/// one atomic storage operation.
#[derive(Clone)]
pub struct SocialService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
    tokens: Arc<dyn TokenRepository>,
}

impl SocialService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        follows: Arc<dyn FollowRepository>,
        tokens: Arc<dyn TokenRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            follows,
            tokens,
        }
    }

    /// Follows `target`, bumping both follower counts.
    ///
    /// # Errors
    ///
    /// Returns [`SocialServiceError::SelfFollow`] for the caller's own id,
    /// [`SocialServiceError::UserNotFound`] when the target does not exist,
    /// [`SocialServiceError::AlreadyFollowing`] for a duplicate edge, an
    /// authorization error, or storage errors.
    pub async fn follow(&self, token: &str, target: UserId) -> Result<Follow, SocialServiceError> {
        let user = self.resolve(token).await?;
        if user.id == target {
            return Err(SocialServiceError::SelfFollow);
        }
        match self.users.get_user(target).await {
            Ok(_) => {}
            Err(StorageError::NotFound) => return Err(SocialServiceError::UserNotFound),
            Err(err) => return Err(err.into()),
        }
        if self.follows.find_follow(user.id, target).await?.is_some() {
            return Err(SocialServiceError::AlreadyFollowing);
        }

        let edge = Follow::link(FollowId::generate(), user.id, target, self.clock.now());
        match self.follows.create_follow(&edge).await {
            Ok(()) => {}
            Err(StorageError::Conflict) => return Err(SocialServiceError::AlreadyFollowing),
            Err(StorageError::NotFound) => return Err(SocialServiceError::UserNotFound),
            Err(err) => return Err(err.into()),
        }
        tracing::info!(follower = %user.username, target = %target.value(), "follow created");
        Ok(edge)
    }

    /// Unfollows `target`, decrementing both counts.
    ///
    /// # Errors
    ///
    /// Returns [`SocialServiceError::NotFollowing`] when no edge exists, an
    /// authorization error, or storage errors.
    pub async fn unfollow(&self, token: &str, target: UserId) -> Result<(), SocialServiceError> {
        let user = self.resolve(token).await?;
        match self.follows.delete_follow(user.id, target).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound) => Err(SocialServiceError::NotFollowing),
            Err(err) => Err(err.into()),
        }
    }

    /// Whether the caller follows `target`.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn is_following(
        &self,
        token: &str,
        target: UserId,
    ) -> Result<bool, SocialServiceError> {
        let user = self.resolve(token).await?;
        let edge = self.follows.find_follow(user.id, target).await?;
        Ok(edge.is_some())
    }

    /// Profiles of the accounts following `user`, oldest follow first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn followers(&self, user: UserId) -> Result<Vec<UserProfile>, SocialServiceError> {
        let users = self.follows.followers_of(user).await?;
        Ok(users.iter().map(User::profile).collect())
    }

    /// Profiles of the accounts `user` follows, oldest follow first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn following(&self, user: UserId) -> Result<Vec<UserProfile>, SocialServiceError> {
        let users = self.follows.following_of(user).await?;
        Ok(users.iter().map(User::profile).collect())
    }

    async fn resolve(&self, token: &str) -> Result<User, SocialServiceError> {
        let user = resolve_user(
            self.users.as_ref(),
            self.tokens.as_ref(),
            token,
            self.clock.now(),
        )
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patente_core::model::{UserDraft, Username};
    use patente_core::time::{fixed_clock, fixed_now};
    use storage::repository::Storage;

    use crate::auth::issue_token;

    fn build_service(storage: &Storage) -> SocialService {
        build_service_at(storage, fixed_clock())
    }

    fn build_service_at(storage: &Storage, clock: Clock) -> SocialService {
        SocialService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.follows),
            Arc::clone(&storage.tokens),
        )
    }

    async fn seed_user(storage: &Storage, first: &str, email: &str) -> (User, String) {
        let user = UserDraft {
            first_name: first.to_string(),
            last_name: "Haddad".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
        }
        .validate()
        .unwrap()
        .into_user(
            UserId::generate(),
            Username::with_suffix(first, "Haddad", 1),
            "hash".to_string(),
            fixed_now(),
        );
        storage.users.insert_user(&user).await.unwrap();
        let token = issue_token(user.id, fixed_now());
        storage.tokens.insert_token(&token).await.unwrap();
        (user, token.token)
    }

    #[tokio::test]
    async fn test_follow_links_and_counts_both_sides() {
        let storage = Storage::in_memory();
        let service = build_service(&storage);
        let (sara, sara_token) = seed_user(&storage, "Sara", "sara@example.com").await;
        let (rami, _) = seed_user(&storage, "Rami", "rami@example.com").await;

        let edge = service.follow(&sara_token, rami.id).await.unwrap();
        assert_eq!(edge.follower_id, sara.id);
        assert_eq!(edge.following_id, rami.id);

        let sara_stored = storage.users.get_user(sara.id).await.unwrap();
        let rami_stored = storage.users.get_user(rami.id).await.unwrap();
        assert_eq!(sara_stored.following_count, 1);
        assert_eq!(sara_stored.followers_count, 0);
        assert_eq!(rami_stored.followers_count, 1);

        assert!(service.is_following(&sara_token, rami.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_rejects_self_duplicates_and_ghosts() {
        let storage = Storage::in_memory();
        let service = build_service(&storage);
        let (sara, sara_token) = seed_user(&storage, "Sara", "sara@example.com").await;
        let (rami, _) = seed_user(&storage, "Rami", "rami@example.com").await;

        let err = service.follow(&sara_token, sara.id).await.unwrap_err();
        assert!(matches!(err, SocialServiceError::SelfFollow));

        service.follow(&sara_token, rami.id).await.unwrap();
        let err = service.follow(&sara_token, rami.id).await.unwrap_err();
        assert!(matches!(err, SocialServiceError::AlreadyFollowing));

        let err = service
            .follow(&sara_token, UserId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, SocialServiceError::UserNotFound));
    }

    #[tokio::test]
    async fn test_unfollow_requires_an_edge_and_decrements() {
        let storage = Storage::in_memory();
        let service = build_service(&storage);
        let (sara, sara_token) = seed_user(&storage, "Sara", "sara@example.com").await;
        let (rami, _) = seed_user(&storage, "Rami", "rami@example.com").await;

        let err = service.unfollow(&sara_token, rami.id).await.unwrap_err();
        assert!(matches!(err, SocialServiceError::NotFollowing));

        service.follow(&sara_token, rami.id).await.unwrap();
        service.unfollow(&sara_token, rami.id).await.unwrap();

        let sara_stored = storage.users.get_user(sara.id).await.unwrap();
        let rami_stored = storage.users.get_user(rami.id).await.unwrap();
        assert_eq!(sara_stored.following_count, 0);
        assert_eq!(rami_stored.followers_count, 0);
        assert!(!service.is_following(&sara_token, rami.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_listings_join_profiles_in_edge_order() {
        let storage = Storage::in_memory();
        let service = build_service(&storage);
        let (sara, sara_token) = seed_user(&storage, "Sara", "sara@example.com").await;
        let (rami, rami_token) = seed_user(&storage, "Rami", "rami@example.com").await;
        let (lina, lina_token) = seed_user(&storage, "Lina", "lina@example.com").await;

        // Distinct edge timestamps pin the listing order.
        let later = build_service_at(
            &storage,
            Clock::fixed(fixed_now() + chrono::Duration::minutes(5)),
        );
        service.follow(&rami_token, sara.id).await.unwrap();
        later.follow(&lina_token, sara.id).await.unwrap();
        later.follow(&sara_token, lina.id).await.unwrap();

        let followers = service.followers(sara.id).await.unwrap();
        let names: Vec<&str> = followers.iter().map(|p| p.first_name.as_str()).collect();
        assert_eq!(names, ["Rami", "Lina"]);
        // Counts come from the joined records, not the edge set.
        assert_eq!(followers[0].following_count, 1);

        let following = service.following(sara.id).await.unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].id, lina.id);
        assert_eq!(following[0].followers_count, 1);
    }
}
