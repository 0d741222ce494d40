use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patente_core::model::{
    AuthToken, Comment, CommentId, EmailKind, EmailStatus, Follow, FollowId, Like, LikeId,
    PollTally, PollVote, Post, PostId, User, UserId, VoteId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of one simulated email delivery.
///
/// `id` is assigned by the store on append; records are never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailLogRecord {
    pub id: Option<i64>,
    pub user_id: Option<UserId>,
    pub email: String,
    pub kind: EmailKind,
    pub sent_at: DateTime<Utc>,
    pub status: EmailStatus,
}

/// Repository contract for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the id, email, or username is
    /// already taken, or other storage errors.
    async fn insert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Persist the current state of an existing account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the account does not exist, or
    /// other storage errors.
    async fn put_user(&self, user: &User) -> Result<(), StorageError>;

    /// Fetch an account by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_user(&self, id: UserId) -> Result<User, StorageError>;

    /// Look up an account by normalized email.
    ///
    /// # Errors
    ///
    /// Returns storage errors; a missing account is `Ok(None)`.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// Look up an account by username.
    ///
    /// # Errors
    ///
    /// Returns storage errors; a missing account is `Ok(None)`.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
}

/// Repository contract for the follow graph.
///
/// Creating or deleting an edge also adjusts the denormalized counts on both
/// user records; implementations must apply edge and counts as one atomic
/// update.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Insert a follow edge and bump both counts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the pair is already linked,
    /// `StorageError::NotFound` when either account is missing, or other
    /// storage errors.
    async fn create_follow(&self, follow: &Follow) -> Result<(), StorageError>;

    /// Delete the edge `follower → following` and decrement both counts
    /// (saturating at zero).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the edge does not exist, or
    /// other storage errors.
    async fn delete_follow(&self, follower: UserId, following: UserId)
    -> Result<(), StorageError>;

    /// Fetch the edge `follower → following` if present.
    ///
    /// # Errors
    ///
    /// Returns storage errors; a missing edge is `Ok(None)`.
    async fn find_follow(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<Option<Follow>, StorageError>;

    /// Accounts following `user`, oldest edge first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    async fn followers_of(&self, user: UserId) -> Result<Vec<User>, StorageError>;

    /// Accounts `user` follows, oldest edge first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    async fn following_of(&self, user: UserId) -> Result<Vec<User>, StorageError>;
}

/// Repository contract for the community feed: posts plus their dependent
/// comments, likes, and poll votes.
///
/// Every dependent insert also adjusts a denormalized value on the post
/// (comment count, like count, vote tally); implementations must apply both
/// as one atomic update.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` on id collision, or other storage
    /// errors.
    async fn insert_post(&self, post: &Post) -> Result<(), StorageError>;

    /// Fetch a post by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_post(&self, id: PostId) -> Result<Post, StorageError>;

    /// A user's posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    async fn posts_by_user(&self, user: UserId) -> Result<Vec<Post>, StorageError>;

    /// Insert a comment and bump the post's comment count.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the post is missing, or other
    /// storage errors.
    async fn add_comment(&self, comment: &Comment) -> Result<(), StorageError>;

    /// Comments under a post, oldest first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    async fn comments_for_post(&self, post: PostId) -> Result<Vec<Comment>, StorageError>;

    /// Record a poll vote and bump the tally bucket matching the poll's
    /// answer. Returns the updated tally.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the post is missing or not a
    /// poll, `StorageError::Conflict` when the voter already voted, or other
    /// storage errors.
    async fn record_vote(&self, vote: &PollVote) -> Result<PollTally, StorageError>;

    /// The vote `user` cast on `post`, if any.
    ///
    /// # Errors
    ///
    /// Returns storage errors; a missing vote is `Ok(None)`.
    async fn vote_of(&self, post: PostId, user: UserId) -> Result<Option<PollVote>, StorageError>;

    /// Insert a like and bump the post's like count.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the post is missing,
    /// `StorageError::Conflict` when the user already liked it, or other
    /// storage errors.
    async fn add_like(&self, like: &Like) -> Result<(), StorageError>;

    /// Remove `user`'s like from `post` and decrement the count (saturating
    /// at zero).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when no such like exists, or other
    /// storage errors.
    async fn remove_like(&self, post: PostId, user: UserId) -> Result<(), StorageError>;

    /// Rewrite the author avatar snapshot on all of `user`'s posts and
    /// comments in one atomic update. Returns the number of records touched.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    async fn set_author_avatar(&self, user: UserId, avatar: &str) -> Result<u64, StorageError>;
}

/// Repository contract for session tokens, keyed by the opaque token string.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Store an issued token pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` on token collision, or other storage
    /// errors.
    async fn insert_token(&self, token: &AuthToken) -> Result<(), StorageError>;

    /// Fetch a token record.
    ///
    /// # Errors
    ///
    /// Returns storage errors; a missing token is `Ok(None)`.
    async fn get_token(&self, token: &str) -> Result<Option<AuthToken>, StorageError>;

    /// Remove a token. Removing an unknown token is not an error, so logout
    /// stays idempotent.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    async fn delete_token(&self, token: &str) -> Result<(), StorageError>;
}

/// Repository contract for the append-only email log.
#[async_trait]
pub trait EmailLogRepository: Send + Sync {
    /// Append a record, returning the assigned id.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    async fn append_email_log(&self, record: &EmailLogRecord) -> Result<i64, StorageError>;

    /// Records for a recipient address, oldest first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    async fn logs_for_email(&self, email: &str) -> Result<Vec<EmailLogRecord>, StorageError>;
}

// ─── In-Memory Implementation ──────────────────────────────────────────────────

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    follows: HashMap<FollowId, Follow>,
    posts: HashMap<PostId, Post>,
    comments: HashMap<CommentId, Comment>,
    likes: HashMap<LikeId, Like>,
    votes: HashMap<VoteId, PollVote>,
    tokens: HashMap<String, AuthToken>,
    email_logs: Vec<EmailLogRecord>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// One mutex guards the whole record set, so the multi-record updates the
/// traits promise as atomic really are.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let taken = inner.users.contains_key(&user.id)
            || inner.users.values().any(|existing| {
                existing.email == user.email || existing.username == user.username
            });
        if taken {
            return Err(StorageError::Conflict);
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn put_user(&self, user: &User) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if !inner.users.contains_key(&user.id) {
            return Err(StorageError::NotFound);
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, StorageError> {
        let inner = self.lock()?;
        inner.users.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .values()
            .find(|u| u.username.as_str() == username)
            .cloned())
    }
}

#[async_trait]
impl FollowRepository for InMemoryRepository {
    async fn create_follow(&self, follow: &Follow) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if !inner.users.contains_key(&follow.follower_id)
            || !inner.users.contains_key(&follow.following_id)
        {
            return Err(StorageError::NotFound);
        }
        let linked = inner.follows.values().any(|f| {
            f.follower_id == follow.follower_id && f.following_id == follow.following_id
        });
        if linked {
            return Err(StorageError::Conflict);
        }
        let follower = inner
            .users
            .get_mut(&follow.follower_id)
            .ok_or(StorageError::NotFound)?;
        follower.following_count = follower.following_count.saturating_add(1);
        let following = inner
            .users
            .get_mut(&follow.following_id)
            .ok_or(StorageError::NotFound)?;
        following.followers_count = following.followers_count.saturating_add(1);
        inner.follows.insert(follow.id, follow.clone());
        Ok(())
    }

    async fn delete_follow(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let edge_id = inner
            .follows
            .iter()
            .find(|(_, f)| f.follower_id == follower && f.following_id == following)
            .map(|(id, _)| *id)
            .ok_or(StorageError::NotFound)?;
        inner.follows.remove(&edge_id);
        let follower_user = inner
            .users
            .get_mut(&follower)
            .ok_or(StorageError::NotFound)?;
        follower_user.following_count = follower_user.following_count.saturating_sub(1);
        let following_user = inner
            .users
            .get_mut(&following)
            .ok_or(StorageError::NotFound)?;
        following_user.followers_count = following_user.followers_count.saturating_sub(1);
        Ok(())
    }

    async fn find_follow(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<Option<Follow>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .follows
            .values()
            .find(|f| f.follower_id == follower && f.following_id == following)
            .cloned())
    }

    async fn followers_of(&self, user: UserId) -> Result<Vec<User>, StorageError> {
        let inner = self.lock()?;
        let mut edges: Vec<&Follow> = inner
            .follows
            .values()
            .filter(|f| f.following_id == user)
            .collect();
        edges.sort_by_key(|f| f.created_at);
        Ok(edges
            .iter()
            .filter_map(|f| inner.users.get(&f.follower_id).cloned())
            .collect())
    }

    async fn following_of(&self, user: UserId) -> Result<Vec<User>, StorageError> {
        let inner = self.lock()?;
        let mut edges: Vec<&Follow> = inner
            .follows
            .values()
            .filter(|f| f.follower_id == user)
            .collect();
        edges.sort_by_key(|f| f.created_at);
        Ok(edges
            .iter()
            .filter_map(|f| inner.users.get(&f.following_id).cloned())
            .collect())
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository {
    async fn insert_post(&self, post: &Post) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if inner.posts.contains_key(&post.id) {
            return Err(StorageError::Conflict);
        }
        inner.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn get_post(&self, id: PostId) -> Result<Post, StorageError> {
        let inner = self.lock()?;
        inner.posts.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn posts_by_user(&self, user: UserId) -> Result<Vec<Post>, StorageError> {
        let inner = self.lock()?;
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|p| p.author_id == user)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn add_comment(&self, comment: &Comment) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let post = inner
            .posts
            .get_mut(&comment.post_id)
            .ok_or(StorageError::NotFound)?;
        post.comments_count = post.comments_count.saturating_add(1);
        inner.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn comments_for_post(&self, post: PostId) -> Result<Vec<Comment>, StorageError> {
        let inner = self.lock()?;
        let mut comments: Vec<Comment> = inner
            .comments
            .values()
            .filter(|c| c.post_id == post)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn record_vote(&self, vote: &PollVote) -> Result<PollTally, StorageError> {
        let mut inner = self.lock()?;
        if !inner.posts.contains_key(&vote.post_id) {
            return Err(StorageError::NotFound);
        }
        let voted = inner
            .votes
            .values()
            .any(|v| v.post_id == vote.post_id && v.voter_id == vote.voter_id);
        if voted {
            return Err(StorageError::Conflict);
        }
        let tally = {
            let post = inner
                .posts
                .get_mut(&vote.post_id)
                .ok_or(StorageError::NotFound)?;
            let poll = post.poll.as_mut().ok_or(StorageError::NotFound)?;
            poll.tally.record(vote.answer == poll.correct_answer);
            poll.tally
        };
        inner.votes.insert(vote.id, vote.clone());
        Ok(tally)
    }

    async fn vote_of(&self, post: PostId, user: UserId) -> Result<Option<PollVote>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .votes
            .values()
            .find(|v| v.post_id == post && v.voter_id == user)
            .cloned())
    }

    async fn add_like(&self, like: &Like) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if !inner.posts.contains_key(&like.post_id) {
            return Err(StorageError::NotFound);
        }
        let liked = inner
            .likes
            .values()
            .any(|l| l.post_id == like.post_id && l.user_id == like.user_id);
        if liked {
            return Err(StorageError::Conflict);
        }
        let post = inner
            .posts
            .get_mut(&like.post_id)
            .ok_or(StorageError::NotFound)?;
        post.likes_count = post.likes_count.saturating_add(1);
        inner.likes.insert(like.id, like.clone());
        Ok(())
    }

    async fn remove_like(&self, post: PostId, user: UserId) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let like_id = inner
            .likes
            .iter()
            .find(|(_, l)| l.post_id == post && l.user_id == user)
            .map(|(id, _)| *id)
            .ok_or(StorageError::NotFound)?;
        inner.likes.remove(&like_id);
        let record = inner.posts.get_mut(&post).ok_or(StorageError::NotFound)?;
        record.likes_count = record.likes_count.saturating_sub(1);
        Ok(())
    }

    async fn set_author_avatar(&self, user: UserId, avatar: &str) -> Result<u64, StorageError> {
        let mut inner = self.lock()?;
        let mut touched = 0u64;
        for post in inner.posts.values_mut().filter(|p| p.author_id == user) {
            post.author_avatar = avatar.to_string();
            touched += 1;
        }
        for comment in inner.comments.values_mut().filter(|c| c.author_id == user) {
            comment.author_avatar = avatar.to_string();
            touched += 1;
        }
        Ok(touched)
    }
}

#[async_trait]
impl TokenRepository for InMemoryRepository {
    async fn insert_token(&self, token: &AuthToken) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if inner.tokens.contains_key(&token.token) {
            return Err(StorageError::Conflict);
        }
        inner.tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_token(&self, token: &str) -> Result<Option<AuthToken>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.tokens.get(token).cloned())
    }

    async fn delete_token(&self, token: &str) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.tokens.remove(token);
        Ok(())
    }
}

#[async_trait]
impl EmailLogRepository for InMemoryRepository {
    async fn append_email_log(&self, record: &EmailLogRecord) -> Result<i64, StorageError> {
        let mut inner = self.lock()?;
        let id = i64::try_from(inner.email_logs.len() + 1)
            .map_err(|_| StorageError::Serialization("email log id overflow".into()))?;
        let mut stored = record.clone();
        stored.id = Some(id);
        inner.email_logs.push(stored);
        Ok(id)
    }

    async fn logs_for_email(&self, email: &str) -> Result<Vec<EmailLogRecord>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .email_logs
            .iter()
            .filter(|r| r.email == email)
            .cloned()
            .collect())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub email_logs: Arc<dyn EmailLogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let follows: Arc<dyn FollowRepository> = Arc::new(repo.clone());
        let posts: Arc<dyn PostRepository> = Arc::new(repo.clone());
        let tokens: Arc<dyn TokenRepository> = Arc::new(repo.clone());
        let email_logs: Arc<dyn EmailLogRepository> = Arc::new(repo);
        Self {
            users,
            follows,
            posts,
            tokens,
            email_logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patente_core::model::{CommentDraft, PollDraft, PostDraft, UserDraft, Username};
    use patente_core::time::fixed_now;

    fn build_user(first: &str, last: &str, suffix: u16) -> User {
        UserDraft {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            password: "secret1".to_string(),
        }
        .validate()
        .unwrap()
        .into_user(
            UserId::generate(),
            Username::with_suffix(first, last, suffix),
            "hash".to_string(),
            fixed_now(),
        )
    }

    fn build_post(author: &User) -> Post {
        PostDraft {
            content: "road sign question".to_string(),
            image: None,
        }
        .validate()
        .unwrap()
        .into_post(PostId::generate(), author, fixed_now())
    }

    fn build_poll(author: &User) -> Post {
        PollDraft {
            question: "Right of way goes to the right?".to_string(),
            correct_answer: true,
            explanation: "At an unmarked crossing the vehicle on the right passes first."
                .to_string(),
        }
        .validate()
        .unwrap()
        .into_post(PostId::generate(), author, fixed_now())
    }

    #[tokio::test]
    async fn round_trips_user() {
        let repo = InMemoryRepository::new();
        let mut user = build_user("Sara", "Haddad", 1);
        repo.insert_user(&user).await.unwrap();

        user.record_quiz(8, 2, fixed_now().date_naive());
        repo.put_user(&user).await.unwrap();

        let fetched = repo.get_user(user.id).await.unwrap();
        assert_eq!(fetched.progress.total_quizzes, 1);
        assert!(fetched.is_locked());
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let repo = InMemoryRepository::new();
        let first = build_user("Sara", "Haddad", 1);
        repo.insert_user(&first).await.unwrap();

        let mut second = build_user("Sara", "Haddad", 2);
        second.email = first.email.clone();
        assert!(matches!(
            repo.insert_user(&second).await,
            Err(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn find_by_email_and_username() {
        let repo = InMemoryRepository::new();
        let user = build_user("Sara", "Haddad", 1);
        repo.insert_user(&user).await.unwrap();

        let by_email = repo.find_by_email("sara@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
        let by_username = repo.find_by_username(user.username.as_str()).await.unwrap();
        assert_eq!(by_username.map(|u| u.id), Some(user.id));
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn follow_updates_both_counts_atomically() {
        let repo = InMemoryRepository::new();
        let a = build_user("Sara", "Haddad", 1);
        let b = build_user("Omar", "Said", 2);
        repo.insert_user(&a).await.unwrap();
        repo.insert_user(&b).await.unwrap();

        let edge = Follow::link(FollowId::generate(), a.id, b.id, fixed_now());
        repo.create_follow(&edge).await.unwrap();

        assert_eq!(repo.get_user(a.id).await.unwrap().following_count, 1);
        assert_eq!(repo.get_user(b.id).await.unwrap().followers_count, 1);

        // Duplicate edges are rejected without touching the counts.
        let duplicate = Follow::link(FollowId::generate(), a.id, b.id, fixed_now());
        assert!(matches!(
            repo.create_follow(&duplicate).await,
            Err(StorageError::Conflict)
        ));
        assert_eq!(repo.get_user(a.id).await.unwrap().following_count, 1);

        repo.delete_follow(a.id, b.id).await.unwrap();
        assert_eq!(repo.get_user(a.id).await.unwrap().following_count, 0);
        assert_eq!(repo.get_user(b.id).await.unwrap().followers_count, 0);
    }

    #[tokio::test]
    async fn unfollow_without_edge_is_not_found() {
        let repo = InMemoryRepository::new();
        let a = build_user("Sara", "Haddad", 1);
        let b = build_user("Omar", "Said", 2);
        repo.insert_user(&a).await.unwrap();
        repo.insert_user(&b).await.unwrap();

        assert!(matches!(
            repo.delete_follow(a.id, b.id).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn follower_listings_join_users() {
        let repo = InMemoryRepository::new();
        let a = build_user("Sara", "Haddad", 1);
        let b = build_user("Omar", "Said", 2);
        let c = build_user("Lina", "Nasser", 3);
        for user in [&a, &b, &c] {
            repo.insert_user(user).await.unwrap();
        }
        repo.create_follow(&Follow::link(FollowId::generate(), a.id, c.id, fixed_now()))
            .await
            .unwrap();
        repo.create_follow(&Follow::link(FollowId::generate(), b.id, c.id, fixed_now()))
            .await
            .unwrap();

        let followers = repo.followers_of(c.id).await.unwrap();
        assert_eq!(followers.len(), 2);
        let following = repo.following_of(a.id).await.unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].id, c.id);
    }

    #[tokio::test]
    async fn comment_bumps_post_count() {
        let repo = InMemoryRepository::new();
        let author = build_user("Sara", "Haddad", 1);
        let post = build_post(&author);
        repo.insert_post(&post).await.unwrap();

        let comment = CommentDraft {
            content: "good question".to_string(),
        }
        .validate()
        .unwrap()
        .into_comment(CommentId::generate(), post.id, &author, fixed_now());
        repo.add_comment(&comment).await.unwrap();

        assert_eq!(repo.get_post(post.id).await.unwrap().comments_count, 1);
        let comments = repo.comments_for_post(post.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "good question");
    }

    #[tokio::test]
    async fn vote_tallies_by_correctness_and_rejects_second_vote() {
        let repo = InMemoryRepository::new();
        let author = build_user("Sara", "Haddad", 1);
        let voter = build_user("Omar", "Said", 2);
        let poll = build_poll(&author);
        repo.insert_post(&poll).await.unwrap();

        let vote = PollVote {
            id: VoteId::generate(),
            post_id: poll.id,
            voter_id: voter.id,
            answer: true,
            created_at: fixed_now(),
        };
        let tally = repo.record_vote(&vote).await.unwrap();
        assert_eq!(tally.correct, 1);
        assert_eq!(tally.incorrect, 0);

        let again = PollVote {
            id: VoteId::generate(),
            answer: false,
            ..vote.clone()
        };
        assert!(matches!(
            repo.record_vote(&again).await,
            Err(StorageError::Conflict)
        ));

        let stored = repo.vote_of(poll.id, voter.id).await.unwrap().unwrap();
        assert!(stored.answer);
    }

    #[tokio::test]
    async fn vote_on_regular_post_is_not_found() {
        let repo = InMemoryRepository::new();
        let author = build_user("Sara", "Haddad", 1);
        let post = build_post(&author);
        repo.insert_post(&post).await.unwrap();

        let vote = PollVote {
            id: VoteId::generate(),
            post_id: post.id,
            voter_id: author.id,
            answer: true,
            created_at: fixed_now(),
        };
        assert!(matches!(
            repo.record_vote(&vote).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn like_and_unlike_maintain_count() {
        let repo = InMemoryRepository::new();
        let author = build_user("Sara", "Haddad", 1);
        let fan = build_user("Omar", "Said", 2);
        let post = build_post(&author);
        repo.insert_post(&post).await.unwrap();

        let like = Like {
            id: LikeId::generate(),
            post_id: post.id,
            user_id: fan.id,
            created_at: fixed_now(),
        };
        repo.add_like(&like).await.unwrap();
        assert_eq!(repo.get_post(post.id).await.unwrap().likes_count, 1);

        let second = Like {
            id: LikeId::generate(),
            ..like.clone()
        };
        assert!(matches!(
            repo.add_like(&second).await,
            Err(StorageError::Conflict)
        ));

        repo.remove_like(post.id, fan.id).await.unwrap();
        assert_eq!(repo.get_post(post.id).await.unwrap().likes_count, 0);
        assert!(matches!(
            repo.remove_like(post.id, fan.id).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn avatar_propagates_to_posts_and_comments() {
        let repo = InMemoryRepository::new();
        let author = build_user("Sara", "Haddad", 1);
        let post = build_post(&author);
        repo.insert_post(&post).await.unwrap();
        let comment = CommentDraft {
            content: "mine too".to_string(),
        }
        .validate()
        .unwrap()
        .into_comment(CommentId::generate(), post.id, &author, fixed_now());
        repo.add_comment(&comment).await.unwrap();

        let touched = repo
            .set_author_avatar(author.id, "data:image/png;base64,xyz")
            .await
            .unwrap();
        assert_eq!(touched, 2);
        assert_eq!(
            repo.get_post(post.id).await.unwrap().author_avatar,
            "data:image/png;base64,xyz"
        );
        assert_eq!(
            repo.comments_for_post(post.id).await.unwrap()[0].author_avatar,
            "data:image/png;base64,xyz"
        );
    }

    #[tokio::test]
    async fn tokens_store_fetch_delete() {
        let repo = InMemoryRepository::new();
        let user = build_user("Sara", "Haddad", 1);
        let token = AuthToken {
            token: "aa".repeat(32),
            refresh_token: "bb".repeat(32),
            user_id: user.id,
            created_at: fixed_now(),
            expires_at: fixed_now() + chrono::Duration::days(30),
        };
        repo.insert_token(&token).await.unwrap();
        assert!(repo.get_token(&token.token).await.unwrap().is_some());

        repo.delete_token(&token.token).await.unwrap();
        assert!(repo.get_token(&token.token).await.unwrap().is_none());
        // Deleting again stays silent.
        repo.delete_token(&token.token).await.unwrap();
    }

    #[tokio::test]
    async fn email_log_appends_with_ids() {
        let repo = InMemoryRepository::new();
        let record = EmailLogRecord {
            id: None,
            user_id: None,
            email: "sara@example.com".to_string(),
            kind: EmailKind::Registration,
            sent_at: fixed_now(),
            status: EmailStatus::Sent,
        };
        let first = repo.append_email_log(&record).await.unwrap();
        let second = repo.append_email_log(&record).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let logs = repo.logs_for_email("sara@example.com").await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, Some(1));
    }
}
