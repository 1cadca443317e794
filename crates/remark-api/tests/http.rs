use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use remark_api::auth::{OAUTH_STATE_COOKIE, SESSION_COOKIE, create_token};
use remark_api::github::{ExternalIdentity, IdentityProvider};
use remark_api::state::{AppState, AppStateInner};
use remark_db::Database;
use remark_db::models::UserRow;

const SECRET: &str = "integration-secret";

struct FakeGitHub;

#[async_trait]
impl IdentityProvider for FakeGitHub {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> Result<String> {
        Ok(format!("https://github.test/authorize?state={}&redirect_uri={}", state, redirect_uri))
    }

    async fn exchange(&self, code: &str, _redirect_uri: &str) -> Result<ExternalIdentity> {
        match code {
            "good" => Ok(ExternalIdentity {
                id: "583231".into(),
                login: "octocat".into(),
            }),
            _ => Err(anyhow::anyhow!("bad verification code")),
        }
    }
}

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            session_secret: SECRET.into(),
            origin_url: "https://remark.test".into(),
            identity: Box::new(FakeGitHub),
        });
        Self {
            router: remark_api::router(state.clone()),
            state,
        }
    }

    fn user(&self, external_id: &str, login: &str) -> UserRow {
        self.state.db.upsert_user(external_id, login).unwrap()
    }

    fn cookie_for(&self, user: &UserRow) -> String {
        format!("{}={}", SESSION_COOKIE, create_token(SECRET, user).unwrap())
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        (status, headers, bytes.to_vec())
    }

    async fn json(&self, method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send(method, uri, cookie, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

#[tokio::test]
async fn status_reports_session() {
    let app = TestApp::new();
    let alice = app.user("1", "alice");

    let (status, body) = app.json("GET", "/api", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user_id": "Not logged in", "logged_in": false }));

    let cookie = app.cookie_for(&alice);
    let (_, body) = app.json("GET", "/api", Some(&cookie), None).await;
    assert_eq!(body, json!({ "user_id": "alice", "logged_in": true }));

    let forged = format!("{}=not-a-jwt", SESSION_COOKIE);
    let (_, body) = app.json("GET", "/api", Some(&forged), None).await;
    assert_eq!(body["logged_in"], false);
}

#[tokio::test]
async fn status_answers_with_trailing_slash() {
    let app = TestApp::new();
    let alice = app.user("1", "alice");
    let cookie = app.cookie_for(&alice);

    let (status, body) = app.json("GET", "/api/", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user_id": "alice", "logged_in": true }));

    let (status, body) = app.json("GET", "/api/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logged_in"], false);
}

#[tokio::test]
async fn comment_flow_with_reactions() {
    let app = TestApp::new();
    let alice = app.user("1", "alice");
    let bob = app.user("2", "bob");
    let carol = app.user("3", "carol");
    let dave = app.user("4", "dave");
    let (alice_c, bob_c, carol_c, dave_c) = (
        app.cookie_for(&alice),
        app.cookie_for(&bob),
        app.cookie_for(&carol),
        app.cookie_for(&dave),
    );

    let (status, body) = app.json("GET", "/api/user/alice/comments", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = app
        .json("POST", "/api/user/alice/comments", Some(&bob_c), Some(json!({ "content": "hello" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .json("POST", "/api/user/alice/comments", Some(&bob_c), Some(json!({ "content": "again" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "user already has a comment");

    let (_, body) = app.json("GET", "/api/user/alice/comments", None, None).await;
    let comment_id = body[0]["id"].as_i64().unwrap();

    for cookie in [&carol_c, &dave_c] {
        let uri = format!("/api/like/like/{}", comment_id);
        let (status, body) = app.json("POST", &uri, Some(cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Comment liked");
    }

    let (_, body) = app.json("GET", "/api/user/alice/comments", Some(&bob_c), None).await;
    assert_eq!(body[0]["author"], "bob");
    assert_eq!(body[0]["content"], "hello");
    assert_eq!(body[0]["likes"], 2);
    assert_eq!(body[0]["dislikes"], 0);
    assert_eq!(body[0]["is_mine"], true);
    assert_eq!(body[0]["is_owner_liked"], false);

    let (_, body) = app.json("GET", "/api/user/alice/comments", Some(&carol_c), None).await;
    assert_eq!(body[0]["is_liked"], true);
    assert_eq!(body[0]["is_mine"], false);

    // Opposite kind while liked is a conflict naming the like.
    let (status, body) = app
        .json("POST", &format!("/api/like/dislike/{}", comment_id), Some(&carol_c), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "you have already liked this comment");

    // Author can't react to their own comment.
    let (status, _) = app
        .json("POST", &format!("/api/like/like/{}", comment_id), Some(&bob_c), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Removing a reaction that isn't there.
    let (status, body) = app
        .json("POST", &format!("/api/like/remove-dislike/{}", comment_id), Some(&carol_c), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "comment not disliked");

    let (status, body) = app
        .json("GET", &format!("/api/comments/{}/counts", comment_id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "likes": 2, "dislikes": 0 }));

    // Only the receiver may acknowledge, and only once.
    let owner_like = format!("/api/like/owner-like/{}", comment_id);
    let (status, _) = app.json("POST", &owner_like, Some(&carol_c), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.json("POST", &owner_like, Some(&alice_c), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.json("POST", &owner_like, Some(&alice_c), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.json("GET", "/api/user/alice/comments", None, None).await;
    assert_eq!(body[0]["is_owner_liked"], true);

    // Delete cascades.
    let (status, _) = app.json("DELETE", "/api/user/alice/comments", Some(&bob_c), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.json("GET", "/api/user/alice/comments", None, None).await;
    assert_eq!(body, json!([]));
    let (status, _) = app
        .json("GET", &format!("/api/comments/{}/counts", comment_id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json("DELETE", "/api/user/alice/comments", Some(&bob_c), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn writes_require_a_session() {
    let app = TestApp::new();
    let alice = app.user("1", "alice");
    let bob = app.user("2", "bob");
    let comment = app.state.db.create_comment(bob.id, alice.id, "hello").unwrap();

    let (status, body) = app
        .json("POST", "/api/user/alice/comments", None, Some(json!({ "content": "hi" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    for uri in [
        format!("/api/like/like/{}", comment.id),
        format!("/api/like/owner-like/{}", comment.id),
    ] {
        let (status, _) = app.json("POST", &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = app.json("DELETE", "/api/user/alice/comments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_receiver_and_bad_content() {
    let app = TestApp::new();
    let bob = app.user("2", "bob");
    app.user("1", "alice");
    let bob_c = app.cookie_for(&bob);

    let (status, body) = app.json("GET", "/api/user/nobody/comments", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "GitHub user not found");

    let (status, _) = app
        .json("POST", "/api/user/nobody/comments", Some(&bob_c), Some(json!({ "content": "hi" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .json("POST", "/api/user/alice/comments", Some(&bob_c), Some(json!({ "content": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "content not provided");

    let (status, body) = app
        .json(
            "POST",
            "/api/user/alice/comments",
            Some(&bob_c),
            Some(json!({ "content": "z\u{0351}\u{0352}a\u{0353}" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid content");
}

#[tokio::test]
async fn control_characters_never_reach_the_badge() {
    let app = TestApp::new();
    app.user("1", "alice");
    let bob = app.user("2", "bob");
    let bob_c = app.cookie_for(&bob);

    let (status, body) = app
        .json(
            "POST",
            "/api/user/alice/comments",
            Some(&bob_c),
            Some(json!({ "content": "hi\u{1}\u{1b}[31m\u{8}" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid content");

    let (status, _, bytes) = app.send("GET", "/api/user/alice/svg", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let svg = String::from_utf8(bytes).unwrap();
    assert!(!svg.chars().any(|c| c.is_control() && c != '\n' && c != '\t'));
    assert!(svg.contains(r#"height="95""#));
}

#[tokio::test]
async fn set_reaction_endpoint_swaps() {
    let app = TestApp::new();
    let alice = app.user("1", "alice");
    let bob = app.user("2", "bob");
    let carol_c = {
        let carol = app.user("3", "carol");
        app.cookie_for(&carol)
    };
    let comment = app.state.db.create_comment(bob.id, alice.id, "hello").unwrap();
    let uri = format!("/api/comments/{}/reaction", comment.id);

    let (status, body) = app.json("PUT", &uri, Some(&carol_c), Some(json!({ "kind": "like" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "kind": "like" }));

    let (status, _) = app.json("PUT", &uri, Some(&carol_c), Some(json!({ "kind": "dislike" }))).await;
    assert_eq!(status, StatusCode::OK);
    let counts = app.state.db.counts_for(comment.id).unwrap();
    assert_eq!((counts.likes, counts.dislikes), (0, 1));

    let (status, _) = app.json("PUT", &uri, Some(&carol_c), Some(json!({ "kind": "dislike" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.json("PUT", &uri, Some(&carol_c), Some(json!({ "kind": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "kind": null }));
}

#[tokio::test]
async fn badge_renders_svg() {
    let app = TestApp::new();
    let alice = app.user("1", "alice");
    let bob = app.user("2", "bob");

    let (status, headers, bytes) = app.send("GET", "/api/user/alice/svg", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    let svg = String::from_utf8(bytes).unwrap();
    assert!(svg.contains(r#"height="95""#));

    app.state.db.create_comment(bob.id, alice.id, "<3 this").unwrap();
    let (_, _, bytes) = app.send("GET", "/api/user/alice/svg?theme=dark", None, None).await;
    let svg = String::from_utf8(bytes).unwrap();
    assert!(svg.contains(r#"height="130""#));
    assert!(svg.contains("bob: &lt;3 this"));
    assert!(svg.contains(r#"fill="black""#));

    let (status, _, _) = app.send("GET", "/api/user/nobody/svg", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_are_listed() {
    let app = TestApp::new();
    app.user("1", "alice");
    app.user("2", "bob");

    let (status, body) = app.json("GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["github_login"], "alice");
    assert_eq!(body[1]["github_id"], "2");
}

#[tokio::test]
async fn oauth_login_and_callback() {
    let app = TestApp::new();

    let (status, headers, _) = app.send("GET", "/api/auth/login?current=/alice", None, None).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    let location = headers[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://github.test/authorize?state="));

    let state_cookie = headers[header::SET_COOKIE].to_str().unwrap();
    let state_value = state_cookie
        .strip_prefix(&format!("{}=", OAUTH_STATE_COOKIE))
        .and_then(|rest| rest.split(';').next())
        .unwrap()
        .to_string();
    let cookie = format!("{}={}", OAUTH_STATE_COOKIE, state_value);

    // Wrong state is rejected before any exchange.
    let (status, _, _) = app
        .send("GET", "/api/auth/callback?code=good&state=forged", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Failed exchange.
    let uri = format!("/api/auth/callback?code=bad&state={}", state_value);
    let (status, _, _) = app.send("GET", &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/auth/callback?code=good&state={}&current=/alice", state_value);
    let (status, headers, _) = app.send("GET", &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "https://remark.test/alice");

    let session = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", SESSION_COOKIE)))
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string();

    let user = app.state.db.get_user_by_login("octocat").unwrap().unwrap();
    assert_eq!(user.external_id, "583231");

    let (_, body) = app.json("GET", "/api", Some(&session), None).await;
    assert_eq!(body, json!({ "user_id": "octocat", "logged_in": true }));
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let app = TestApp::new();
    let alice = app.user("1", "alice");
    let cookie = app.cookie_for(&alice);

    let (status, headers, _) = app.send("GET", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with(&format!("{}=;", SESSION_COOKIE)));
    assert!(set_cookie.contains("Max-Age=0"));
}
