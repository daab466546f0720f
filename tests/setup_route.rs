use axum::{
    Router,
    body::Body,
    extract::Path,
    http::{header, Request, Response, StatusCode},
    routing::get,
};
use guildhall::{app, config::Config, db, session::USER_ID, session_layer, AppState};
use tower::ServiceExt;
use tower_sessions::Session;

/// Stands in for the authentication layer.
async fn sign_in(Path(user_id): Path<String>, session: Session) -> StatusCode {
    session.insert(USER_ID, user_id).await.unwrap();
    StatusCode::NO_CONTENT
}

async fn test_app() -> Router {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_owned()),
        "SIGN_IN_URL" => Some("/sign-in".to_owned()),
        _ => None,
    }).unwrap();
    let db_pool = db::memory().await.unwrap();

    app(AppState::new(config.clone(), db_pool))
        .merge(Router::new().route("/test/sign-in/{user_id}", get(sign_in)))
        .layer(session_layer(&config))
}

fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn signed_in(app: &Router, user_id: &str) -> String {
    let response = app.clone()
        .oneshot(request("GET", &format!("/test/sign-in/{user_id}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_sign_in() {
    let app = test_app().await;

    let response = app.oneshot(request("GET", "/", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/sign-in?return_url=%2F");
}

#[tokio::test]
async fn new_user_sees_setup_view() {
    let app = test_app().await;
    let cookie = signed_in(&app, "u1").await;

    for _ in 0..2 {
        let response = app.clone().oneshot(request("GET", "/", Some(&cookie), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#"<form method="post" action="/servers">"#));
    }
}

#[tokio::test]
async fn creating_a_server_makes_setup_redirect_there() {
    let app = test_app().await;
    let cookie = signed_in(&app, "u2").await;

    let response = app.clone()
        .oneshot(request("POST", "/servers", Some(&cookie), Some("name=Rust+Club&image_url=")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let server_url = location(&response).to_owned();
    assert!(server_url.starts_with("/servers/"));

    for _ in 0..2 {
        let response = app.clone().oneshot(request("GET", "/", Some(&cookie), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), server_url);
    }

    let response = app.clone().oneshot(request("GET", &server_url, Some(&cookie), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Rust Club"));
    assert!(body.contains("ADMIN"));
}

#[tokio::test]
async fn blank_server_name_is_rejected() {
    let app = test_app().await;
    let cookie = signed_in(&app, "u3").await;

    let response = app.clone()
        .oneshot(request("POST", "/servers", Some(&cookie), Some("name=++")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(request("GET", "/", Some(&cookie), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn strangers_cannot_see_a_server() {
    let app = test_app().await;
    let owner = signed_in(&app, "owner").await;
    let stranger = signed_in(&app, "stranger").await;

    let response = app.clone()
        .oneshot(request("POST", "/servers", Some(&owner), Some("name=Secret")))
        .await
        .unwrap();
    let server_url = location(&response).to_owned();

    let response = app.clone().oneshot(request("GET", &server_url, Some(&stranger), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(request("GET", &server_url, None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/sign-in?return_url={}", urlencoding::encode(&server_url)));
}

#[tokio::test]
async fn missing_server_name_is_a_bad_request() {
    let app = test_app().await;
    let cookie = signed_in(&app, "u5").await;

    let response = app.clone()
        .oneshot(request("POST", "/servers", Some(&cookie), Some("image_url=")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Server name is required");
}

#[tokio::test]
async fn anonymous_server_creation_is_sent_to_sign_in() {
    let app = test_app().await;

    let response = app.oneshot(request("POST", "/servers", None, Some("image_url="))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/sign-in?return_url=%2F");
}

#[tokio::test]
async fn malformed_server_id_gets_the_sorry_page() {
    let app = test_app().await;
    let cookie = signed_in(&app, "u6").await;

    let response = app.oneshot(request("GET", "/servers/not-a-uuid", Some(&cookie), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("go home"));
}

#[tokio::test]
async fn server_name_cannot_pull_in_other_slots() {
    let app = test_app().await;
    let cookie = signed_in(&app, "u7").await;

    let response = app.clone()
        .oneshot(request("POST", "/servers", Some(&cookie), Some("name=%7Bmembers%7D")))
        .await
        .unwrap();
    let server_url = location(&response).to_owned();

    let response = app.oneshot(request("GET", &server_url, Some(&cookie), None)).await.unwrap();
    let body = body_text(response).await;
    assert_eq!(body.matches("ADMIN").count(), 1);
    assert!(body.contains("<title>&#123;members&#125;</title>"));
}
