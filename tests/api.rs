//! End-to-end HTTP tests over in-memory collections.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use baas_sdk::{
    api_routes, password::MIN_COST, user_auth_required, user_fetched, AppState, AuthGuard, CurrentUser,
    DocumentCollection, MemoryCollection, ObjectsDataProvider, SchemasDataProvider, SessionStore, SignUpConfig,
    UsersDataProvider,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct Harness {
    state: AppState,
    objects: Arc<MemoryCollection>,
    schemas: Arc<MemoryCollection>,
}

fn harness_with(sign_up: SignUpConfig) -> Harness {
    let objects = Arc::new(MemoryCollection::new());
    let schemas = Arc::new(MemoryCollection::new());
    let users = Arc::new(MemoryCollection::new());
    let state = AppState {
        objects: Arc::new(ObjectsDataProvider::new(objects.clone())),
        schemas: Arc::new(SchemasDataProvider::new(schemas.clone())),
        users: Arc::new(
            UsersDataProvider::new(users)
                .with_cost(MIN_COST)
                .with_unique_field(sign_up.login_field.clone()),
        ),
        sessions: Arc::new(SessionStore::new("baas.sid")),
        sign_up,
    };
    Harness { state, objects, schemas }
}

fn harness() -> Harness {
    harness_with(SignUpConfig::default())
}

fn app(h: &Harness) -> Router {
    api_routes(h.state.clone())
}

fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `name=value` part of a `Set-Cookie` header.
fn session_cookie(response: &Response) -> Option<String> {
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    Some(raw.split(';').next()?.to_string())
}

async fn sign_up(h: &Harness, email: &str, password: &str) -> (String, String) {
    let response = app(h)
        .oneshot(request(
            Method::POST,
            "/users",
            None,
            Some(json!({"data": {"type": "users", "attributes": {"email": email, "password": password}}})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response).unwrap();
    let body = json_body(response).await;
    (body["data"][0]["id"].as_str().unwrap().to_string(), cookie)
}

#[tokio::test]
async fn sign_up_sets_session_and_reports_iso_created_at() {
    let h = harness();
    let response = app(&h)
        .oneshot(request(
            Method::POST,
            "/users",
            None,
            Some(json!({"data": {"attributes": {"email": "a@b.com", "password": "x"}}})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.api+json"
    );
    let cookie = session_cookie(&response).unwrap();
    assert!(cookie.starts_with("baas.sid="));
    assert_eq!(h.state.sessions.len(), 1);

    let body = json_body(response).await;
    assert_eq!(body["data"][0]["type"], json!("users"));
    let created_at = body["data"][0]["attributes"]["created_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
}

#[tokio::test]
async fn sign_up_without_auto_login_sets_no_cookie() {
    let h = harness_with(SignUpConfig {
        login_if_success: false,
        ..SignUpConfig::default()
    });
    let response = app(&h)
        .oneshot(request(
            Method::POST,
            "/users",
            None,
            Some(json!({"data": {"attributes": {"email": "a@b.com", "password": "x"}}})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(h.state.sessions.is_empty());
}

#[tokio::test]
async fn empty_class_lists_as_empty_data() {
    let h = harness();
    let response = app(&h)
        .oneshot(request(Method::GET, "/classes/Note", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"data": []}));
}

#[tokio::test]
async fn object_lifecycle() {
    let h = harness();
    let (user_id, cookie) = sign_up(&h, "a@b.com", "x").await;

    let response = app(&h)
        .oneshot(request(
            Method::POST,
            "/classes/Note",
            Some(&cookie),
            Some(json!({"data": {"type": "object_Note", "attributes": {"title": "first", "tag": "a"}}})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["data"]["type"], json!("object_Note"));
    let object_id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/classes/Note/{object_id}");

    let fetched = json_body(app(&h).oneshot(request(Method::GET, &uri, None, None)).await.unwrap()).await;
    assert_eq!(fetched["data"]["id"], json!(object_id));
    let attributes = &fetched["data"]["attributes"];
    assert_eq!(attributes["title"], json!("first"));
    assert_eq!(attributes["className"], json!("Note"));
    assert_eq!(attributes["createdBy"], json!(user_id));
    assert!(attributes["createdAt"].is_string());
    assert!(attributes.get("objectId").is_none());

    let response = app(&h)
        .oneshot(request(
            Method::PATCH,
            &uri,
            None,
            Some(json!({"data": {"type": "object_Note", "attributes": {"title": "second"}}})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["data"]["id"], json!(object_id));
    assert!(updated["data"]["attributes"]["updatedAt"].is_string());

    let listed = json_body(
        app(&h)
            .oneshot(request(Method::GET, "/classes/Note?filter%5Btitle%5D=second", None, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed["data"][0]["id"], json!(object_id));

    let response = app(&h).oneshot(request(Method::DELETE, &uri, None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let deleted = json_body(response).await;
    assert_eq!(deleted["data"]["type"], json!("object_Note"));
    assert!(deleted["data"]["attributes"]["deletedAt"].is_string());

    // Soft delete keeps the record.
    assert_eq!(h.objects.len(), 1);
    let fetched = json_body(app(&h).oneshot(request(Method::GET, &uri, None, None)).await.unwrap()).await;
    assert!(fetched["data"]["attributes"]["deletedAt"].is_string());
}

#[tokio::test]
async fn list_filters_and_pages() {
    let h = harness();
    for (title, tag) in [("a", "x"), ("b", "x"), ("c", "y")] {
        h.state
            .objects
            .create_object("Note", json!({"title": title, "tag": tag}).as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    let by_tag = json_body(
        app(&h)
            .oneshot(request(Method::GET, "/classes/Note?filter%5Btag%5D=x", None, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(by_tag["data"].as_array().unwrap().len(), 2);

    let sigil = json_body(
        app(&h)
            .oneshot(request(Method::GET, "/classes/Note?filter%5B$where%5D=1", None, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(sigil["data"].as_array().unwrap().len(), 3);

    let page = json_body(
        app(&h)
            .oneshot(request(Method::GET, "/classes/Note?page%5Boffset%5D=1&page%5Blimit%5D=1", None, None))
            .await
            .unwrap(),
    )
    .await;
    let page = page["data"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["attributes"]["title"], json!("b"));
}

#[tokio::test]
async fn unknown_object_is_404_with_error_list() {
    let h = harness();
    let uri = format!("/classes/Note/{}", uuid::Uuid::new_v4());
    let response = app(&h).oneshot(request(Method::GET, &uri, None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({"errors": [{"title": "entry is not found", "source": {"parameter": "objectId"}}]})
    );
}

#[tokio::test]
async fn schema_fetch_uses_class_name_as_id() {
    let h = harness();
    h.schemas
        .insert(json!({"className": "Note", "fields": {"title": "string"}}).as_object().cloned().unwrap())
        .await
        .unwrap();
    let response = app(&h)
        .oneshot(request(Method::GET, "/schemas/Note", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["type"], json!("schema"));
    assert_eq!(body["data"]["id"], json!("Note"));
    assert_eq!(body["data"]["attributes"]["fields"], json!({"title": "string"}));
}

#[tokio::test]
async fn login_fetch_logout() {
    let h = harness();
    let (user_id, _) = sign_up(&h, "a@b.com", "secret").await;

    let response = app(&h)
        .oneshot(request(Method::GET, "/users/login?email=a@b.com&password=wrong", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"errors": [{"title": "Invalid login or password", "source": {"parameter": "email"}}]})
    );

    let response = app(&h)
        .oneshot(request(Method::GET, "/users/login?email=a@b.com&password=secret", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["id"], json!(user_id));
    assert_eq!(body["data"]["attributes"]["email"], json!("a@b.com"));
    assert!(body["data"]["attributes"].get("password").is_none());

    let me = json_body(
        app(&h)
            .oneshot(request(Method::GET, "/users/me", Some(&cookie), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(me["data"]["id"], json!(user_id));
    assert!(me["data"]["attributes"].get("password").is_none());

    let by_id = json_body(
        app(&h)
            .oneshot(request(Method::GET, &format!("/users/{user_id}"), None, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(by_id["data"]["attributes"]["email"], json!("a@b.com"));

    let response = app(&h)
        .oneshot(request(Method::POST, "/users/logout", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"data": {"type": "users", "id": user_id}}));

    let response = app(&h)
        .oneshot(request(Method::POST, "/users/logout", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"errors": [{"title": "The user is not logged in yet"}]})
    );

    let response = app(&h)
        .oneshot(request(Method::GET, "/users/me", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_sign_up_is_conflict() {
    let h = harness();
    sign_up(&h, "a@b.com", "x").await;
    let response = app(&h)
        .oneshot(request(
            Method::POST,
            "/users",
            None,
            Some(json!({"data": {"attributes": {"email": "a@b.com", "password": "y"}}})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(response).await,
        json!({"errors": [{"title": "The user is already existing", "source": {"parameter": "email"}}]})
    );
}

#[tokio::test]
async fn guarded_route_sees_current_user() {
    let h = harness();
    let (user_id, cookie) = sign_up(&h, "a@b.com", "x").await;
    let guarded = Router::new()
        .route(
            "/account",
            get(|Extension(me): Extension<CurrentUser>| async move { Json(me.0) }),
        )
        .layer(middleware::from_fn_with_state(h.state.clone(), user_fetched))
        .layer(middleware::from_fn_with_state(
            AuthGuard::new(h.state.sessions.clone()),
            user_auth_required,
        ));

    let response = guarded
        .clone()
        .oneshot(request(Method::GET, "/account", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = guarded
        .oneshot(request(Method::GET, "/account", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = json_body(response).await;
    assert_eq!(me["objectId"], json!(user_id));
    assert_eq!(me["email"], json!("a@b.com"));
    assert!(me.get("password").is_none());
}

#[tokio::test]
async fn current_user_is_empty_when_anonymous() {
    let h = harness();
    let open = Router::new()
        .route(
            "/whoami",
            get(|Extension(me): Extension<CurrentUser>| async move { Json(me.is_anonymous()) }),
        )
        .layer(middleware::from_fn_with_state(h.state.clone(), user_fetched));
    let response = open.oneshot(request(Method::GET, "/whoami", None, None)).await.unwrap();
    assert_eq!(json_body(response).await, json!(true));
}

#[tokio::test]
async fn health_and_ready() {
    let h = harness();
    let response = app(&h).oneshot(request(Method::GET, "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app(&h).oneshot(request(Method::GET, "/ready", None, None)).await.unwrap();
    assert_eq!(json_body(response).await, json!({"status": "ok", "store": "ok"}));
}
