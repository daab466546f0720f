use std::{fmt, str::FromStr};

use anyhow::anyhow;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

use crate::{config::Config, include_res, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: String,

    pub name: String,
    pub image_url: Option<String>,
    pub email: Option<String>,

    // unique: id
    // unique: user_id
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub invite_code: Uuid,

    /// The profile that created it.
    pub profile_id: Uuid,

    // unique: id
    // unique: invite_code
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Admin,
    Moderator,
    Guest,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        use MemberRole::*;
        match self {
            Admin => "ADMIN",
            Moderator => "MODERATOR",
            Guest => "GUEST",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use MemberRole::*;
        match s {
            "ADMIN" => Ok(Admin),
            "MODERATOR" => Ok(Moderator),
            "GUEST" => Ok(Guest),
            _ => Err(anyhow!("unknown member role {s:?}")),
        }
    }
}

/// Links a profile to a server. A profile may have any number of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: Uuid,
    pub role: MemberRole,
    pub profile_id: Uuid,
    pub server_id: Uuid,

    // unique: id
    // unique: profile_id, server_id
}

pub(crate) type ProfileRow = (String, String, String, Option<String>, Option<String>);
pub(crate) type ServerRow = (String, String, Option<String>, String, String);

pub(crate) fn profile_from_row((id, user_id, name, image_url, email): ProfileRow) -> AppResult<Profile> {
    Ok(Profile {
        id: Uuid::parse_str(&id)?,
        user_id,
        name,
        image_url,
        email,
    })
}

pub(crate) fn server_from_row((id, name, image_url, invite_code, profile_id): ServerRow) -> AppResult<Server> {
    Ok(Server {
        id: Uuid::parse_str(&id)?,
        name,
        image_url,
        invite_code: Uuid::parse_str(&invite_code)?,
        profile_id: Uuid::parse_str(&profile_id)?,
    })
}

pub async fn connect(config: &Config) -> AppResult<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}

pub async fn migrate(db_pool: &SqlitePool) -> AppResult<()> {
    sqlx::raw_sql(include_res!(str, "/schema.sql"))
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Single-connection in-memory database. Every pooled connection to
/// `sqlite::memory:` would otherwise get its own empty database.
pub async fn memory() -> AppResult<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}
