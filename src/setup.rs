use std::sync::Arc;

use axum::{debug_handler, extract::{FromRef, State}, response::{Html, IntoResponse, Redirect, Response}};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{config::Config, db::Profile, include_res, profiles::ProfileResolver, res, servers::ServerRepository, AppResult, AppState};

/// What the landing page should do for the current visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setup {
    SignIn,
    /// Already a member somewhere, go there.
    Existing(Uuid),
    /// Not a member anywhere yet, offer to create a server.
    Create(Profile),
}

/// Sends visitors to a server they belong to, or asks them to make one.
#[derive(Clone)]
pub struct SetupRouter {
    profiles: Arc<dyn ProfileResolver>,
    servers: Arc<dyn ServerRepository>,
}

impl FromRef<AppState> for SetupRouter {
    fn from_ref(state: &AppState) -> Self {
        SetupRouter::new(state.profiles.clone(), state.servers.clone())
    }
}

impl SetupRouter {
    pub fn new(profiles: Arc<dyn ProfileResolver>, servers: Arc<dyn ServerRepository>) -> Self {
        Self { profiles, servers }
    }

    pub async fn route(&self, session: &Session) -> AppResult<Setup> {
        let Some(profile) = self.profiles.current_profile(session).await? else {
            return Ok(Setup::SignIn);
        };

        match self.servers.first_for_profile(profile.id).await? {
            Some(server) => {
                tracing::debug!("profile {} already in server {}", profile.id, server.id);
                Ok(Setup::Existing(server.id))
            }
            None => {
                tracing::debug!("profile {} has no server yet", profile.id);
                Ok(Setup::Create(profile))
            }
        }
    }
}

impl Setup {
    pub fn respond(self, config: &Config) -> Response {
        match self {
            Setup::SignIn => Redirect::to(&config.sign_in_redirect("/")).into_response(),
            Setup::Existing(server_id) => Redirect::to(&format!("/servers/{server_id}")).into_response(),
            Setup::Create(profile) => Html(
                include_res!(str, "/pages/setup.html")
                    .replace("{name}", &res::text(&profile.name))
            ).into_response(),
        }
    }
}

#[debug_handler(state = AppState)]
pub async fn setup(
    State(router): State<SetupRouter>,
    State(config): State<Arc<Config>>,
    session: Session,
) -> AppResult<Response> {
    Ok(router.route(&session).await?.respond(&config))
}
