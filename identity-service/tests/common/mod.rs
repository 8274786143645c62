use std::sync::Arc;

use auth::Authenticator;
use auth::HashingParams;
use auth::JwtHandler;
use chrono::Duration;
use identity_service::domain::credential::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryCredentialStore;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server backed by the in-memory store
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub jwt_handler: JwtHandler,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        // Cheap hashing costs keep the suite fast in debug builds
        let authenticator = Arc::new(
            Authenticator::new(TEST_SECRET, Duration::days(7))
                .expect("Failed to create authenticator")
                .with_hashing_params(HashingParams {
                    memory_kib: 1024,
                    iterations: 1,
                    parallelism: 1,
                })
                .expect("Invalid hashing params"),
        );

        let store = Arc::new(InMemoryCredentialStore::new());
        let auth_service = Arc::new(AuthService::new(store, authenticator));

        let router = create_router(auth_service);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        let jwt_handler =
            JwtHandler::new(TEST_SECRET, Duration::days(7)).expect("Failed to create JWT handler");

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            jwt_handler,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register a user and return the login token
    pub async fn register_and_login(&self, username: &str, password: &str) -> String {
        let body = serde_json::json!({ "username": username, "password": password });

        let response = self
            .post("/api/authentication/register")
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let response = self
            .post("/api/authentication/login")
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("token missing from login response")
            .to_string()
    }
}
