use async_trait::async_trait;
use rand::seq::IndexedRandom;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db::{profile_from_row, Profile, ProfileRow}, session::{USER_EMAIL, USER_ID, USER_NAME}, AppResult};

/// Works out who is making the request.
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// `None` means nobody is signed in.
    async fn current_profile(&self, session: &Session) -> AppResult<Option<Profile>>;
}

/// Trusts the `user_id` the authentication layer left in the session and
/// gives every new user a profile on first sight.
#[derive(Clone)]
pub struct SessionProfileResolver {
    db_pool: SqlitePool,
}

impl SessionProfileResolver {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProfileResolver for SessionProfileResolver {
    async fn current_profile(&self, session: &Session) -> AppResult<Option<Profile>> {
        let Some(user_id) = session.get::<String>(USER_ID).await? else {
            return Ok(None);
        };

        if let Some(profile) = find_profile(&self.db_pool, &user_id).await? {
            return Ok(Some(profile));
        }

        let name = session.get::<String>(USER_NAME).await?;
        let email = session.get::<String>(USER_EMAIL).await?;
        Ok(Some(create_profile(&self.db_pool, &user_id, name, email).await?))
    }
}

pub(crate) async fn find_profile(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>("SELECT id,user_id,name,image_url,email FROM profiles WHERE user_id=?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?
        .map(profile_from_row)
        .transpose()
}

pub(crate) async fn create_profile(
    db_pool: &SqlitePool,
    user_id: &str,
    name: Option<String>,
    email: Option<String>,
) -> AppResult<Profile> {
    let name = match name {
        Some(name) if !name.trim().is_empty() => name.trim().to_owned(),
        _ => random_alias(),
    };

    let profile = Profile {
        id: Uuid::now_v7(),
        user_id: user_id.to_owned(),
        name,
        image_url: None,
        email,
    };

    // two first requests can race here; the loser reads the winner's row
    let inserted = sqlx::query("INSERT INTO profiles (id,user_id,name,image_url,email) VALUES (?,?,?,?,?) ON CONFLICT(user_id) DO NOTHING")
        .bind(profile.id.to_string())
        .bind(&profile.user_id)
        .bind(&profile.name)
        .bind(&profile.image_url)
        .bind(&profile.email)
        .execute(db_pool)
        .await?
        .rows_affected();

    if inserted == 0 {
        return find_profile(db_pool, user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("profile for {user_id} vanished").into());
    }

    tracing::info!("created profile {} ({}) for user {user_id}", profile.id, profile.name);
    Ok(profile)
}

fn random_alias() -> String {
    let adjectives = [
        "Quick", "Lazy", "Mysterious", "Jolly", "Brave", "Silent", "Witty", "Fierce",
        "Clever", "Gentle", "Wild", "Calm", "Bold", "Shy", "Proud", "Happy",
        "Eager", "Fancy", "Rusty", "Golden", "Silver", "Bright", "Lucky",
    ];
    let nouns = [
        "Fox", "Bear", "Eagle", "Wolf", "Dragon", "Tiger", "Lion", "Owl", "Rabbit",
        "Falcon", "Hawk", "Shark", "Panda", "Kitten", "Phoenix", "Griffin",
        "Turtle", "Dolphin", "Whale", "Otter",
    ];

    let mut rng = rand::rng();
    format!(
        "{} {}",
        adjectives.choose(&mut rng).copied().unwrap_or("Nameless"),
        nouns.choose(&mut rng).copied().unwrap_or("User"),
    )
}
