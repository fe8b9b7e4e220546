use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use slicehouse_api::app::{AppServices, build_app};
use slicehouse_auth::Argon2Passwords;

const JWT_SECRET: &str = "test-secret";
const ADMIN_EMAIL: &str = "a@jwt.com";
const ADMIN_PASSWORD: &str = "admin";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an in-memory store, bound to an ephemeral port.
        let passwords = Arc::new(Argon2Passwords::with_params(8, 1, 1).expect("argon2 params"));
        let services = AppServices::in_memory(JWT_SECRET, passwords);
        services
            .sessions
            .ensure_admin("Pizza Admin", ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("failed to seed admin");

        let app = build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(client: &reqwest::Client, srv: &TestServer, email: &str) -> (i64, String) {
    let res = client
        .post(srv.url("/api/auth"))
        .json(&json!({ "name": "pizza diner", "email": email, "password": "diner" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    (body["user"]["id"].as_i64().unwrap(), body["token"].as_str().unwrap().to_string())
}

async fn login(client: &reqwest::Client, srv: &TestServer, email: &str, password: &str) -> String {
    let res = client
        .put(srv.url("/api/auth"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

fn forge_jwt(secret: &str, sub: i64) -> String {
    let now = Utc::now();
    let claims = json!({
        "sub": sub,
        "jti": "0190c6a2-7f3e-7a8b-9c4d-5e6f7a8b9c0d",
        "iat": now.timestamp(),
        "exp": (now + ChronoDuration::minutes(10)).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn welcome_and_unknown_endpoint() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["version"].is_string());

    let res = client.get(srv.url("/api/nothing-here")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "unknown endpoint");
}

#[tokio::test]
async fn register_login_logout_round() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/auth"))
        .json(&json!({ "name": "pizza diner", "email": "d@jwt.com", "password": "diner" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "d@jwt.com");
    assert_eq!(body["user"]["roles"], json!([{ "role": "diner" }]));
    assert!(body["user"].get("password").is_none());

    let token = login(&client, &srv, "d@jwt.com", "diner").await;

    let res = client.get(srv.url("/api/order")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.delete(srv.url("/api/auth")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "logout successful");

    // revoked token no longer authenticates
    let res = client.get(srv.url("/api/order")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // logging out twice is still fine
    let res = client.delete(srv.url("/api/auth")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/order")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.delete(srv.url("/api/auth")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/api/franchise"))
        .json(&json!({ "name": "pizzaPocket", "admins": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (_, token) = register(&client, &srv, "d@jwt.com").await;

    let res = client
        .post(srv.url("/api/order"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());

    // missing franchiseId
    let res = client
        .post(srv.url("/api/order"))
        .bearer_auth(&token)
        .json(&json!({ "storeId": 1, "items": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client
        .put(srv.url("/api/auth"))
        .body(r#"{"email":"d@jwt.com","password":"diner"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn forged_and_garbage_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (id, _) = register(&client, &srv, "d@jwt.com").await;

    let forged = forge_jwt("not-the-server-secret", id);
    let res = client.get(srv.url("/api/order")).bearer_auth(&forged).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // right key, but never issued by the server
    let unissued = forge_jwt(JWT_SECRET, id);
    let res = client.get(srv.url("/api/order")).bearer_auth(&unissued).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(srv.url("/api/order")).bearer_auth("garbage").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_credentials_and_duplicates() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv, "d@jwt.com").await;

    for (email, password) in [("d@jwt.com", "wrong"), ("ghost@jwt.com", "diner")] {
        let res = client
            .put(srv.url("/api/auth"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "unknown user");
    }

    let res = client
        .post(srv.url("/api/auth"))
        .json(&json!({ "name": "again", "email": "D@jwt.com", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url("/api/auth"))
        .json(&json!({ "email": "nameless@jwt.com", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_update_only_themselves() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (alice, alice_token) = register(&client, &srv, "alice@jwt.com").await;
    let (bob, _) = register(&client, &srv, "bob@jwt.com").await;

    let res = client
        .put(srv.url(&format!("/api/auth/{bob}")))
        .bearer_auth(&alice_token)
        .json(&json!({ "name": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(srv.url(&format!("/api/auth/{alice}")))
        .bearer_auth(&alice_token)
        .json(&json!({ "name": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Alice");

    let res = client
        .put(srv.url("/api/auth/not-a-number"))
        .bearer_auth(&alice_token)
        .json(&json!({ "name": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn franchise_lifecycle_and_role_scoping() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (franchisee_id, franchisee) = register(&client, &srv, "f@jwt.com").await;
    let (_, diner) = register(&client, &srv, "d@jwt.com").await;

    // diners cannot create franchises
    let res = client
        .post(srv.url("/api/franchise"))
        .bearer_auth(&diner)
        .json(&json!({ "name": "mine", "admins": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // unknown admin e-mail
    let res = client
        .post(srv.url("/api/franchise"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "pizzaPocket", "admins": [{ "email": "nobody@jwt.com" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/api/franchise"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "pizzaPocket", "admins": [{ "email": "f@jwt.com" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let franchise: Value = res.json().await.unwrap();
    let franchise_id = franchise["id"].as_i64().unwrap();
    assert_eq!(franchise["admins"][0]["id"], franchisee_id);

    // the franchisee's existing token picks up the new role
    let res = client
        .post(srv.url(&format!("/api/franchise/{franchise_id}/store")))
        .bearer_auth(&franchisee)
        .json(&json!({ "name": "SLC" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let store: Value = res.json().await.unwrap();
    assert_eq!(store["franchiseId"], franchise_id);
    let store_id = store["id"].as_i64().unwrap();

    let res = client
        .post(srv.url(&format!("/api/franchise/{franchise_id}/store")))
        .bearer_auth(&diner)
        .json(&json!({ "name": "Provo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // public listing hides admins, admin listing shows them
    let res = client.get(srv.url("/api/franchise")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let public: Value = res.json().await.unwrap();
    assert!(public[0].get("admins").is_none());
    assert_eq!(public[0]["stores"][0]["id"], store_id);

    let res = client.get(srv.url("/api/franchise")).bearer_auth(&admin).send().await.unwrap();
    let full: Value = res.json().await.unwrap();
    assert_eq!(full[0]["admins"][0]["email"], "f@jwt.com");

    let res = client
        .get(srv.url(&format!("/api/franchise/{franchisee_id}")))
        .bearer_auth(&franchisee)
        .send()
        .await
        .unwrap();
    let mine: Value = res.json().await.unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url(&format!("/api/franchise/{franchisee_id}")))
        .bearer_auth(&diner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let snooped: Value = res.json().await.unwrap();
    assert!(snooped.as_array().unwrap().is_empty());

    let res = client
        .delete(srv.url(&format!("/api/franchise/{franchise_id}/store/{store_id}")))
        .bearer_auth(&franchisee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(srv.url(&format!("/api/franchise/{franchise_id}")))
        .bearer_auth(&franchisee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(srv.url(&format!("/api/franchise/{franchise_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn menu_and_orders() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (diner_id, diner) = register(&client, &srv, "d@jwt.com").await;

    let item = json!({
        "title": "Student",
        "description": "No topping, no sauce, just carbs",
        "image": "pizza9.png",
        "price": 0.0001
    });

    let res = client
        .put(srv.url("/api/order/menu"))
        .bearer_auth(&diner)
        .json(&item)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(srv.url("/api/order/menu"))
        .bearer_auth(&admin)
        .json(&item)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let menu: Value = res.json().await.unwrap();
    let menu_id = menu[0]["id"].as_i64().unwrap();

    let res = client.get(srv.url("/api/order/menu")).send().await.unwrap();
    let public_menu: Value = res.json().await.unwrap();
    assert_eq!(public_menu, menu);

    let res = client
        .post(srv.url("/api/franchise"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "pizzaPocket", "admins": [] }))
        .send()
        .await
        .unwrap();
    let franchise_id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();
    let res = client
        .post(srv.url(&format!("/api/franchise/{franchise_id}/store")))
        .bearer_auth(&admin)
        .json(&json!({ "name": "SLC" }))
        .send()
        .await
        .unwrap();
    let store_id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let res = client
        .post(srv.url("/api/order"))
        .bearer_auth(&diner)
        .json(&json!({
            "franchiseId": franchise_id,
            "storeId": store_id,
            "items": [{ "menuId": menu_id, "description": "Student", "price": 0.0001 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let placed: Value = res.json().await.unwrap();
    assert!(placed["jwt"].is_string());
    assert_eq!(placed["order"]["dinerId"], diner_id);

    let res = client
        .get(srv.url("/api/order?page=1"))
        .bearer_auth(&diner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["dinerId"], diner_id);
    assert_eq!(page["page"], 1);
    assert_eq!(page["orders"].as_array().unwrap().len(), 1);

    let res = client
        .post(srv.url("/api/order"))
        .bearer_auth(&diner)
        .json(&json!({ "franchiseId": franchise_id, "storeId": 9999, "items": [
            { "menuId": menu_id, "description": "Student", "price": 0.0001 }
        ] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
