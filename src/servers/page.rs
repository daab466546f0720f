use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, response::{Html, IntoResponse, Redirect, Response}};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{config::Config, include_res, profiles::ProfileResolver, res, AppResult, AppState};

use super::ServerRepository;

#[debug_handler(state = AppState)]
pub(crate) async fn server(
    Path(server_id): Path<String>,
    State(config): State<Arc<Config>>,
    State(profiles): State<Arc<dyn ProfileResolver>>,
    State(servers): State<Arc<dyn ServerRepository>>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = profiles.current_profile(&session).await? else {
        return Ok(Redirect::to(&config.sign_in_redirect(&format!("/servers/{server_id}"))).into_response());
    };

    let Ok(server_id) = Uuid::parse_str(&server_id) else {
        return res::sorry("server");
    };

    // non-members get the same page as a missing server
    let Some(server) = servers.find_for_member(server_id, profile.id).await? else {
        return res::sorry("server");
    };

    let mut members = String::new();
    for (member, member_profile) in servers.roster(server.id).await? {
        members += &include_res!(str, "/pages/servers/member_item.html")
            .replace("{profile_id}", &member.profile_id.to_string())
            .replace("{role}", member.role.as_str())
            .replace("{name}", &res::text(&member_profile.name));
    }

    let server_image = match &server.image_url {
        Some(url) => format!(r#"<img src="{}" alt="" width="64" height="64">"#, res::attribute(url)),
        None => String::new(),
    };

    Ok(Html(
        include_res!(str, "/pages/servers/server.html")
            .replace("{invite_code}", &server.invite_code.to_string())
            .replace("{server_image}", &server_image)
            .replace("{members}", &members)
            .replace("{server_name}", &res::text(&server.name))
    ).into_response())
}
