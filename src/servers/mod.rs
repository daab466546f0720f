mod new;
mod page;

use async_trait::async_trait;
use axum::{routing::{get, post}, Router};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db::{profile_from_row, server_from_row, Member, MemberRole, Profile, Server, ServerRow}, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(new::new_server))
        .route("/{uuid}", get(page::server))
}

/// Read/write access to servers and their members.
#[async_trait]
pub trait ServerRepository: Send + Sync {
    /// Any server the profile is a member of. Earliest created wins.
    async fn first_for_profile(&self, profile_id: Uuid) -> AppResult<Option<Server>>;

    /// Creates the server with `owner` as its only member, an admin.
    async fn create(&self, owner: &Profile, name: &str, image_url: Option<&str>) -> AppResult<Server>;

    /// The server, but only if `profile_id` belongs to it.
    async fn find_for_member(&self, server_id: Uuid, profile_id: Uuid) -> AppResult<Option<Server>>;

    async fn roster(&self, server_id: Uuid) -> AppResult<Vec<(Member, Profile)>>;
}

#[derive(Clone)]
pub struct SqliteServerRepository {
    db_pool: SqlitePool,
}

impl SqliteServerRepository {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ServerRepository for SqliteServerRepository {
    async fn first_for_profile(&self, profile_id: Uuid) -> AppResult<Option<Server>> {
        sqlx::query_as::<_, ServerRow>(
            "SELECT s.id,s.name,s.image_url,s.invite_code,s.profile_id FROM servers s
             WHERE EXISTS (SELECT 1 FROM members m WHERE m.server_id=s.id AND m.profile_id=?)
             ORDER BY s.rowid LIMIT 1",
        )
            .bind(profile_id.to_string())
            .fetch_optional(&self.db_pool)
            .await?
            .map(server_from_row)
            .transpose()
    }

    async fn create(&self, owner: &Profile, name: &str, image_url: Option<&str>) -> AppResult<Server> {
        let server = Server {
            id: Uuid::now_v7(),
            name: name.to_owned(),
            image_url: image_url.map(str::to_owned),
            invite_code: Uuid::new_v4(),
            profile_id: owner.id,
        };

        let mut tx = self.db_pool.begin().await?;
        sqlx::query("INSERT INTO servers (id,name,image_url,invite_code,profile_id) VALUES (?,?,?,?,?)")
            .bind(server.id.to_string())
            .bind(&server.name)
            .bind(&server.image_url)
            .bind(server.invite_code.to_string())
            .bind(owner.id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO members (id,role,profile_id,server_id) VALUES (?,?,?,?)")
            .bind(Uuid::now_v7().to_string())
            .bind(MemberRole::Admin.as_str())
            .bind(owner.id.to_string())
            .bind(server.id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("profile {} created server {} ({})", owner.id, server.id, server.name);
        Ok(server)
    }

    async fn find_for_member(&self, server_id: Uuid, profile_id: Uuid) -> AppResult<Option<Server>> {
        sqlx::query_as::<_, ServerRow>(
            "SELECT s.id,s.name,s.image_url,s.invite_code,s.profile_id FROM servers s
             JOIN members m ON m.server_id=s.id
             WHERE s.id=? AND m.profile_id=?",
        )
            .bind(server_id.to_string())
            .bind(profile_id.to_string())
            .fetch_optional(&self.db_pool)
            .await?
            .map(server_from_row)
            .transpose()
    }

    async fn roster(&self, server_id: Uuid) -> AppResult<Vec<(Member, Profile)>> {
        let rows: Vec<(String, String, String, String, String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT m.id,m.role,p.id,p.user_id,p.name,p.image_url,p.email FROM members m
             JOIN profiles p ON p.id=m.profile_id
             WHERE m.server_id=?
             ORDER BY m.rowid",
        )
            .bind(server_id.to_string())
            .fetch_all(&self.db_pool)
            .await?;

        let mut roster = Vec::with_capacity(rows.len());
        for (member_id, role, profile_id, user_id, name, image_url, email) in rows {
            let profile = profile_from_row((profile_id, user_id, name, image_url, email))?;
            let member = Member {
                id: Uuid::parse_str(&member_id)?,
                role: role.parse()?,
                profile_id: profile.id,
                server_id,
            };
            roster.push((member, profile));
        }
        Ok(roster)
    }
}
