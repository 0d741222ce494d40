//! The community feed: posts, polls, comments, likes.

use std::sync::Arc;

use serde::Serialize;

use patente_core::Clock;
use patente_core::model::{
    Comment, CommentDraft, CommentId, Like, LikeId, PollDraft, PollTally, PollVote, Post,
    PostDraft, PostId, User, UserId, VoteId,
};
use storage::repository::{PostRepository, StorageError, TokenRepository, UserRepository};

use crate::auth::resolve_user;
use crate::error::CommunityServiceError;

/// What a voter learns the moment their answer lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    /// Whether the submitted answer matched the poll's correct answer.
    pub correct: bool,
    pub tally: PollTally,
}

/// Use-case layer for the community feed.
///
/// Posts carry a snapshot of the author's name and avatar taken at creation
/// time; dependent writes (comments, likes, votes) and their denormalized
/// counters are applied atomically by the persistence layer.
#[derive(Clone)]
pub struct CommunityService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    tokens: Arc<dyn TokenRepository>,
}

impl CommunityService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        tokens: Arc<dyn TokenRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            posts,
            tokens,
        }
    }

    /// Publishes a regular post.
    ///
    /// # Errors
    ///
    /// Returns [`CommunityServiceError::Validation`] for empty or oversized
    /// content, an authorization error, or storage errors.
    pub async fn create_post(
        &self,
        token: &str,
        draft: PostDraft,
    ) -> Result<Post, CommunityServiceError> {
        let user = self.resolve(token).await?;
        let validated = draft.validate()?;
        let post = validated.into_post(PostId::generate(), &user, self.clock.now());
        self.posts.insert_post(&post).await?;
        tracing::info!(author = %user.username, post = %post.id.value(), "post created");
        Ok(post)
    }

    /// Publishes a true/false poll. The explanation becomes the post content
    /// and the tally starts at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CommunityServiceError::Validation`] for empty or oversized
    /// question/explanation, an authorization error, or storage errors.
    pub async fn create_poll_post(
        &self,
        token: &str,
        draft: PollDraft,
    ) -> Result<Post, CommunityServiceError> {
        let user = self.resolve(token).await?;
        let validated = draft.validate()?;
        let post = validated.into_post(PostId::generate(), &user, self.clock.now());
        self.posts.insert_post(&post).await?;
        tracing::info!(author = %user.username, post = %post.id.value(), "poll created");
        Ok(post)
    }

    /// A user's posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn posts_of(&self, user: UserId) -> Result<Vec<Post>, CommunityServiceError> {
        let posts = self.posts.posts_by_user(user).await?;
        Ok(posts)
    }

    /// Comments under a post and bumps its comment counter.
    ///
    /// # Errors
    ///
    /// Returns [`CommunityServiceError::Validation`] for empty or oversized
    /// content, [`CommunityServiceError::PostNotFound`] for a missing post,
    /// an authorization error, or storage errors.
    pub async fn create_comment(
        &self,
        token: &str,
        post: PostId,
        draft: CommentDraft,
    ) -> Result<Comment, CommunityServiceError> {
        let user = self.resolve(token).await?;
        let validated = draft.validate()?;
        let comment = validated.into_comment(CommentId::generate(), post, &user, self.clock.now());
        match self.posts.add_comment(&comment).await {
            Ok(()) => Ok(comment),
            Err(StorageError::NotFound) => Err(CommunityServiceError::PostNotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// Comments under a post, oldest first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn comments_of(&self, post: PostId) -> Result<Vec<Comment>, CommunityServiceError> {
        let comments = self.posts.comments_for_post(post).await?;
        Ok(comments)
    }

    /// Casts the caller's answer on a poll, one vote per account.
    ///
    /// The reply says whether the answer was right and carries the updated
    /// tally, so the result screen needs no second read.
    ///
    /// # Errors
    ///
    /// Returns [`CommunityServiceError::PostNotFound`] when the post is
    /// missing or not a poll, [`CommunityServiceError::AlreadyVoted`] on a
    /// second vote, an authorization error, or storage errors.
    pub async fn vote_poll(
        &self,
        token: &str,
        post: PostId,
        answer: bool,
    ) -> Result<VoteOutcome, CommunityServiceError> {
        let user = self.resolve(token).await?;
        let stored = match self.posts.get_post(post).await {
            Ok(stored) => stored,
            Err(StorageError::NotFound) => return Err(CommunityServiceError::PostNotFound),
            Err(err) => return Err(err.into()),
        };
        let Some(poll) = stored.poll else {
            return Err(CommunityServiceError::PostNotFound);
        };

        let vote = PollVote {
            id: VoteId::generate(),
            post_id: post,
            voter_id: user.id,
            answer,
            created_at: self.clock.now(),
        };
        let tally = match self.posts.record_vote(&vote).await {
            Ok(tally) => tally,
            Err(StorageError::Conflict) => return Err(CommunityServiceError::AlreadyVoted),
            Err(StorageError::NotFound) => return Err(CommunityServiceError::PostNotFound),
            Err(err) => return Err(err.into()),
        };
        Ok(VoteOutcome {
            correct: answer == poll.correct_answer,
            tally,
        })
    }

    /// The answer the caller already gave on a poll, if any.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn poll_vote_of(
        &self,
        token: &str,
        post: PostId,
    ) -> Result<Option<bool>, CommunityServiceError> {
        let user = self.resolve(token).await?;
        let vote = self.posts.vote_of(post, user.id).await?;
        Ok(vote.map(|v| v.answer))
    }

    /// Likes a post, once per account.
    ///
    /// # Errors
    ///
    /// Returns [`CommunityServiceError::PostNotFound`] for a missing post,
    /// [`CommunityServiceError::AlreadyLiked`] on a repeat, an authorization
    /// error, or storage errors.
    pub async fn like_post(&self, token: &str, post: PostId) -> Result<(), CommunityServiceError> {
        let user = self.resolve(token).await?;
        let like = Like {
            id: LikeId::generate(),
            post_id: post,
            user_id: user.id,
            created_at: self.clock.now(),
        };
        match self.posts.add_like(&like).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound) => Err(CommunityServiceError::PostNotFound),
            Err(StorageError::Conflict) => Err(CommunityServiceError::AlreadyLiked),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes the caller's like from a post.
    ///
    /// # Errors
    ///
    /// Returns [`CommunityServiceError::NotLiked`] when there is nothing to
    /// remove, an authorization error, or storage errors.
    pub async fn unlike_post(
        &self,
        token: &str,
        post: PostId,
    ) -> Result<(), CommunityServiceError> {
        let user = self.resolve(token).await?;
        match self.posts.remove_like(post, user.id).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound) => Err(CommunityServiceError::NotLiked),
            Err(err) => Err(err.into()),
        }
    }

    async fn resolve(&self, token: &str) -> Result<User, CommunityServiceError> {
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
