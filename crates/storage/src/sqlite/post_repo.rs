use patente_core::model::{Comment, Like, PollTally, PollVote, Post, PostId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{count_u32, map_comment_row, map_post_row, map_vote_row, ser, write_error};
use crate::repository::{PostRepository, StorageError};

const POST_COLUMNS: &str = "id, author_id, author_name, author_avatar, content, image, \
     likes_count, comments_count, created_at, updated_at, poll_question, poll_correct_answer, \
     poll_votes_correct, poll_votes_incorrect";

const COMMENT_COLUMNS: &str =
    "id, post_id, author_id, author_name, author_avatar, content, created_at";

#[async_trait::async_trait]
impl PostRepository for SqliteRepository {
    async fn insert_post(&self, post: &Post) -> Result<(), StorageError> {
        let (poll_question, poll_correct_answer, votes_correct, votes_incorrect) = match &post.poll
        {
            Some(poll) => (
                Some(poll.question.clone()),
                Some(poll.correct_answer),
                i64::from(poll.tally.correct),
                i64::from(poll.tally.incorrect),
            ),
            None => (None, None, 0, 0),
        };

        sqlx::query(
            r"
            INSERT INTO posts (id, author_id, author_name, author_avatar, content, image,
                likes_count, comments_count, created_at, updated_at, poll_question,
                poll_correct_answer, poll_votes_correct, poll_votes_incorrect)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ",
        )
        .bind(post.id.value().to_string())
        .bind(post.author_id.value().to_string())
        .bind(&post.author_name)
        .bind(&post.author_avatar)
        .bind(&post.content)
        .bind(&post.image)
        .bind(i64::from(post.likes_count))
        .bind(i64::from(post.comments_count))
        .bind(post.created_at)
        .bind(post.updated_at)
        .bind(poll_question)
        .bind(poll_correct_answer)
        .bind(votes_correct)
        .bind(votes_incorrect)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn get_post(&self, id: PostId) -> Result<Post, StorageError> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"))
            .bind(id.value().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_post_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn posts_by_user(&self, user: UserId) -> Result<Vec<Post>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(user.value().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in &rows {
            posts.push(map_post_row(row)?);
        }
        Ok(posts)
    }

    async fn add_comment(&self, comment: &Comment) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO comments (id, post_id, author_id, author_name, author_avatar, content,
                created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(comment.id.value().to_string())
        .bind(comment.post_id.value().to_string())
        .bind(comment.author_id.value().to_string())
        .bind(&comment.author_name)
        .bind(&comment.author_avatar)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        sqlx::query("UPDATE posts SET comments_count = comments_count + 1 WHERE id = ?1")
            .bind(comment.post_id.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn comments_for_post(&self, post: PostId) -> Result<Vec<Comment>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ?1 ORDER BY created_at ASC"
        ))
        .bind(post.value().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in &rows {
            comments.push(map_comment_row(row)?);
        }
        Ok(comments)
    }

    async fn record_vote(&self, vote: &PollVote) -> Result<PollTally, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let row = sqlx::query("SELECT poll_correct_answer FROM posts WHERE id = ?1")
            .bind(vote.post_id.value().to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let Some(row) = row else {
            return Err(StorageError::NotFound);
        };
        // A regular post has no correct answer; voting on it is the same as
        // voting on a missing poll.
        let correct_answer = row
            .try_get::<Option<bool>, _>("poll_correct_answer")
            .map_err(ser)?
            .ok_or(StorageError::NotFound)?;

        sqlx::query(
            "INSERT INTO poll_votes (id, post_id, voter_id, answer, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(vote.id.value().to_string())
        .bind(vote.post_id.value().to_string())
        .bind(vote.voter_id.value().to_string())
        .bind(vote.answer)
        .bind(vote.created_at)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        let bucket = if vote.answer == correct_answer {
            "poll_votes_correct"
        } else {
            "poll_votes_incorrect"
        };
        sqlx::query(&format!("UPDATE posts SET {bucket} = {bucket} + 1 WHERE id = ?1"))
            .bind(vote.post_id.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let tally_row = sqlx::query(
            "SELECT poll_votes_correct, poll_votes_incorrect FROM posts WHERE id = ?1",
        )
        .bind(vote.post_id.value().to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        let tally = PollTally {
            correct: count_u32(&tally_row, "poll_votes_correct")?,
            incorrect: count_u32(&tally_row, "poll_votes_incorrect")?,
        };

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(tally)
    }

    async fn vote_of(&self, post: PostId, user: UserId) -> Result<Option<PollVote>, StorageError> {
        let row = sqlx::query(
            "SELECT id, post_id, voter_id, answer, created_at
             FROM poll_votes WHERE post_id = ?1 AND voter_id = ?2",
        )
        .bind(post.value().to_string())
        .bind(user.value().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_vote_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn add_like(&self, like: &Like) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            "INSERT INTO likes (id, post_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(like.id.value().to_string())
        .bind(like.post_id.value().to_string())
        .bind(like.user_id.value().to_string())
        .bind(like.created_at)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        sqlx::query("UPDATE posts SET likes_count = likes_count + 1 WHERE id = ?1")
            .bind(like.post_id.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn remove_like(&self, post: PostId, user: UserId) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query("DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2")
            .bind(post.value().to_string())
            .bind(user.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query("UPDATE posts SET likes_count = MAX(likes_count - 1, 0) WHERE id = ?1")
            .bind(post.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn set_author_avatar(&self, user: UserId, avatar: &str) -> Result<u64, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let posts = sqlx::query("UPDATE posts SET author_avatar = ?2 WHERE author_id = ?1")
            .bind(user.value().to_string())
            .bind(avatar)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let comments = sqlx::query("UPDATE comments SET author_avatar = ?2 WHERE author_id = ?1")
            .bind(user.value().to_string())
            .bind(avatar)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(posts.rows_affected() + comments.rows_affected())
    }
}
