use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{config::Config, profiles::ProfileResolver, AppResult, AppState};

use super::ServerRepository;

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct NewServerForm {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

impl NewServerForm {
    /// Trimmed name and image url, or why they were rejected.
    fn validate(&self) -> Result<(&str, Option<&str>), &'static str> {
        let name = self.name.as_deref().unwrap_or_default().trim();
        if name.is_empty() {
            return Err("Server name is required");
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err("Server name is too long");
        }

        let image_url = self.image_url.as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());
        Ok((name, image_url))
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_server(
    State(config): State<Arc<Config>>,
    State(profiles): State<Arc<dyn ProfileResolver>>,
    State(servers): State<Arc<dyn ServerRepository>>,
    session: Session,

    Form(form): Form<NewServerForm>,
) -> AppResult<Response> {
    let Some(profile) = profiles.current_profile(&session).await? else {
        return Ok(Redirect::to(&config.sign_in_redirect("/")).into_response());
    };

    let (name, image_url) = match form.validate() {
        Ok(valid) => valid,
        Err(reason) => {
            tracing::debug!("rejected server from profile {}: {reason}", profile.id);
            return Ok((StatusCode::BAD_REQUEST, reason).into_response());
        }
    };

    let server = servers.create(&profile, name, image_url).await?;

    Ok(Redirect::to(&format!("/servers/{}", server.id)).into_response())
}
