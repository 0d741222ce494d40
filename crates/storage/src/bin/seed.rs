use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use patente_core::model::{
    CommentDraft, CommentId, Follow, FollowId, Gender, ItalianLevel, LessonId, Like, LikeId,
    PersonalInfo, PollDraft, PollVote, PostDraft, PostId, TopicId, UserDraft, UserId, Username,
    VoteId,
};
use storage::repository::Storage;

/// Salted digest of "passw0rd"; every seeded account logs in with it.
const SEED_PASSWORD_HASH: &str =
    "7d89d32686f3deae0d9aee9dbbb8e23ac47a1ac378aa13e95161d9ec85001423";

const ROSTER: [(&str, &str); 5] = [
    ("Marco", "De Luca"),
    ("Sara", "Haddad"),
    ("Omar", "Said"),
    ("Lina", "Nasser"),
    ("Karim", "Aloui"),
];

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    users: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUsers { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUsers { raw } => write!(f, "invalid --users value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PATENTE_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut users = std::env::var("PATENTE_SEED_USERS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--users" => {
                    let value = require_value(&mut args, "--users")?;
                    users = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidUsers { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, users, now })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --users <n>               Number of demo accounts to create (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  PATENTE_DB_URL, PATENTE_SEED_USERS");
    eprintln!();
    eprintln!("All seeded accounts use the password: passw0rd");
}

#[allow(clippy::too_many_lines)]
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);
    let today = now.date_naive();

    let mut users = Vec::new();
    for i in 0..args.users {
        let (first, last) = ROSTER[(i as usize) % ROSTER.len()];
        let draft = UserDraft {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}{i}@example.com", first.to_lowercase()),
            password: "passw0rd".to_string(),
        };
        let validated = draft.validate()?;
        let username =
            Username::with_suffix(first, last, u16::try_from(i % 10_000).unwrap_or_default());
        let mut user = validated.into_user(
            UserId::generate(),
            username,
            SEED_PASSWORD_HASH.to_string(),
            now,
        );

        if i == 0 {
            // One account with real study history and finished onboarding.
            user.record_quiz(40, 10, today);
            for n in 1..=12 {
                user.complete_lesson(LessonId::new(format!("lesson-{n:02}")), today);
            }
            for n in 1..=4 {
                user.complete_topic(TopicId::new(format!("topic-{n:02}")), today);
            }
            let mut info = PersonalInfo::empty();
            info.birth_date = NaiveDate::from_ymd_opt(1995, 4, 12);
            info.country = "Italia".to_string();
            info.state = "Lombardia".to_string();
            info.gender = Some(Gender::Male);
            info.phone = "3331234567".to_string();
            info.italian_level = Some(ItalianLevel::Good);
            user.update_personal_info(info);
        } else if i == 1 {
            // One account that started studying without onboarding, so the
            // content lock is visible in seeded data.
            user.record_quiz(6, 4, today);
        }

        storage.users.insert_user(&user).await?;
        users.push(user);
    }

    let mut follows = 0u32;
    for user in users.iter().skip(1) {
        let edge = Follow::link(FollowId::generate(), user.id, users[0].id, now);
        storage.follows.create_follow(&edge).await?;
        follows += 1;
    }

    let mut posts = 0u32;
    if let Some(author) = users.first() {
        let post = PostDraft {
            content: "Quale segnale indica il diritto di precedenza?".to_string(),
            image: None,
        }
        .validate()?
        .into_post(PostId::generate(), author, now);
        storage.posts.insert_post(&post).await?;
        posts += 1;

        if let Some(commenter) = users.get(1) {
            let comment = CommentDraft {
                content: "Il segnale bianco a losanga gialla.".to_string(),
            }
            .validate()?
            .into_comment(CommentId::generate(), post.id, commenter, now);
            storage.posts.add_comment(&comment).await?;

            let like = Like {
                id: LikeId::generate(),
                post_id: post.id,
                user_id: commenter.id,
                created_at: now,
            };
            storage.posts.add_like(&like).await?;
        }

        let poll = PollDraft {
            question: "In autostrada il limite per le auto e 130 km/h?".to_string(),
            correct_answer: true,
            explanation: "Con asciutto e visibilita normale il limite autostradale e 130 km/h."
                .to_string(),
        }
        .validate()?
        .into_post(PostId::generate(), author, now);
        storage.posts.insert_post(&poll).await?;
        posts += 1;

        for (n, voter) in users.iter().skip(1).enumerate() {
            let vote = PollVote {
                id: VoteId::generate(),
                post_id: poll.id,
                voter_id: voter.id,
                answer: n % 2 == 0,
                created_at: now,
            };
            storage.posts.record_vote(&vote).await?;
        }
    }

    println!(
        "Seeded {} users, {follows} follows and {posts} posts into {}",
        users.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
