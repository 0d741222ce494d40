use patente_core::model::{
    AuthToken, Comment, CommentId, EmailAddress, EmailKind, EmailStatus, Follow, FollowId, Like,
    LikeId, PollDetails, PollTally, PollVote, Post, PostId, User, UserId, UserRole, Username,
    VoteId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{EmailLogRecord, StorageError};

/// Column list for queries that feed [`map_user_row`].
pub const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, \
     avatar, role, admin_permissions, is_verified, is_banned, created_at, last_login, \
     personal_info, progress, settings, following_count, followers_count";

pub fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Map constraint failures onto the storage error space: unique violations
/// become `Conflict`, foreign key violations become `NotFound`.
pub fn write_error(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn json_field<T: serde::de::DeserializeOwned>(
    row: &SqliteRow,
    column: &str,
) -> Result<T, StorageError> {
    let raw: String = row.try_get(column).map_err(ser)?;
    serde_json::from_str(&raw).map_err(ser)
}

pub fn count_u32(row: &SqliteRow, column: &str) -> Result<u32, StorageError> {
    let value: i64 = row.try_get(column).map_err(ser)?;
    u32::try_from(value).map_err(ser)
}

fn user_id(row: &SqliteRow, column: &str) -> Result<UserId, StorageError> {
    row.try_get::<String, _>(column)
        .map_err(ser)?
        .parse::<UserId>()
        .map_err(ser)
}

fn post_id(row: &SqliteRow, column: &str) -> Result<PostId, StorageError> {
    row.try_get::<String, _>(column)
        .map_err(ser)?
        .parse::<PostId>()
        .map_err(ser)
}

pub fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let role_raw: String = row.try_get("role").map_err(ser)?;
    let role = UserRole::parse(&role_raw)
        .ok_or_else(|| StorageError::Serialization(format!("invalid role: {role_raw}")))?;
    let admin_permissions = match row
        .try_get::<Option<String>, _>("admin_permissions")
        .map_err(ser)?
    {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(ser)?),
        None => None,
    };
    let email_raw: String = row.try_get("email").map_err(ser)?;
    let username_raw: String = row.try_get("username").map_err(ser)?;
    Ok(User {
        id: user_id(row, "id")?,
        email: EmailAddress::parse(&email_raw).map_err(ser)?,
        password_hash: row.try_get("password_hash").map_err(ser)?,
        first_name: row.try_get("first_name").map_err(ser)?,
        last_name: row.try_get("last_name").map_err(ser)?,
        username: Username::parse(&username_raw).map_err(ser)?,
        avatar: row.try_get("avatar").map_err(ser)?,
        role,
        admin_permissions,
        is_verified: row.try_get("is_verified").map_err(ser)?,
        is_banned: row.try_get("is_banned").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        last_login: row.try_get("last_login").map_err(ser)?,
        personal_info: json_field(row, "personal_info")?,
        progress: json_field(row, "progress")?,
        settings: json_field(row, "settings")?,
        following_count: count_u32(row, "following_count")?,
        followers_count: count_u32(row, "followers_count")?,
    })
}

pub fn map_post_row(row: &SqliteRow) -> Result<Post, StorageError> {
    // A post is a poll exactly when poll_question is set.
    let poll = match row
        .try_get::<Option<String>, _>("poll_question")
        .map_err(ser)?
    {
        Some(question) => {
            let correct_answer = row
                .try_get::<Option<bool>, _>("poll_correct_answer")
                .map_err(ser)?
                .ok_or_else(|| {
                    StorageError::Serialization("poll row without correct answer".into())
                })?;
            Some(PollDetails {
                question,
                correct_answer,
                tally: PollTally {
                    correct: count_u32(row, "poll_votes_correct")?,
                    incorrect: count_u32(row, "poll_votes_incorrect")?,
                },
            })
        }
        None => None,
    };
    Ok(Post {
        id: post_id(row, "id")?,
        author_id: user_id(row, "author_id")?,
        author_name: row.try_get("author_name").map_err(ser)?,
        author_avatar: row.try_get("author_avatar").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        image: row.try_get("image").map_err(ser)?,
        likes_count: count_u32(row, "likes_count")?,
        comments_count: count_u32(row, "comments_count")?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
        poll,
    })
}

pub fn map_comment_row(row: &SqliteRow) -> Result<Comment, StorageError> {
    Ok(Comment {
        id: row
            .try_get::<String, _>("id")
            .map_err(ser)?
            .parse::<CommentId>()
            .map_err(ser)?,
        post_id: post_id(row, "post_id")?,
        author_id: user_id(row, "author_id")?,
        author_name: row.try_get("author_name").map_err(ser)?,
        author_avatar: row.try_get("author_avatar").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub fn map_follow_row(row: &SqliteRow) -> Result<Follow, StorageError> {
    Ok(Follow {
        id: row
            .try_get::<String, _>("id")
            .map_err(ser)?
            .parse::<FollowId>()
            .map_err(ser)?,
        follower_id: user_id(row, "follower_id")?,
        following_id: user_id(row, "following_id")?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub fn map_vote_row(row: &SqliteRow) -> Result<PollVote, StorageError> {
    Ok(PollVote {
        id: row
            .try_get::<String, _>("id")
            .map_err(ser)?
            .parse::<VoteId>()
            .map_err(ser)?,
        post_id: post_id(row, "post_id")?,
        voter_id: user_id(row, "voter_id")?,
        answer: row.try_get("answer").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub fn map_like_row(row: &SqliteRow) -> Result<Like, StorageError> {
    Ok(Like {
        id: row
            .try_get::<String, _>("id")
            .map_err(ser)?
            .parse::<LikeId>()
            .map_err(ser)?,
        post_id: post_id(row, "post_id")?,
        user_id: user_id(row, "user_id")?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub fn map_token_row(row: &SqliteRow) -> Result<AuthToken, StorageError> {
    Ok(AuthToken {
        token: row.try_get("token").map_err(ser)?,
        refresh_token: row.try_get("refresh_token").map_err(ser)?,
        user_id: user_id(row, "user_id")?,
        created_at: row.try_get("created_at").map_err(ser)?,
        expires_at: row.try_get("expires_at").map_err(ser)?,
    })
}

pub fn map_email_log_row(row: &SqliteRow) -> Result<EmailLogRecord, StorageError> {
    let kind_raw: String = row.try_get("kind").map_err(ser)?;
    let kind = EmailKind::parse(&kind_raw)
        .ok_or_else(|| StorageError::Serialization(format!("invalid email kind: {kind_raw}")))?;
    let status_raw: String = row.try_get("status").map_err(ser)?;
    let status = EmailStatus::parse(&status_raw).ok_or_else(|| {
        StorageError::Serialization(format!("invalid email status: {status_raw}"))
    })?;
    let user_id = match row.try_get::<Option<String>, _>("user_id").map_err(ser)? {
        Some(raw) => Some(raw.parse::<UserId>().map_err(ser)?),
        None => None,
    };
    Ok(EmailLogRecord {
        id: Some(row.try_get("id").map_err(ser)?),
        user_id,
        email: row.try_get("email").map_err(ser)?,
        kind,
        sent_at: row.try_get("sent_at").map_err(ser)?,
        status,
    })
}
