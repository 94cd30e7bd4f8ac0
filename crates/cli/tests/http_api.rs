mod support;

use cmc_auth::CredentialStore;
use cmc_cli::{build_router, AppConfig, AppState, Workbench};
use pretty_assertions::assert_eq;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

struct TestServer {
    base: String,
    client: Client,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let users_path = support::write_users(dir.path());
        let config = AppConfig {
            knowledge_base_path: dir.path().join("output/kb.csv"),
            users_path: users_path.clone(),
            ..AppConfig::default()
        };
        let credentials = CredentialStore::load(&users_path).unwrap();
        let workbench = Workbench::open(config).unwrap();
        let app = build_router(AppState::new(workbench, credentials));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: Client::new(),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn login(&self, (username, password): (&str, &str)) -> Value {
        let resp = self
            .client
            .post(self.url("/api/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }

    async fn token(&self, user: (&str, &str)) -> String {
        self.login(user).await["token"].as_str().unwrap().to_string()
    }

    async fn ingest(&self, token: &str, query: &str, body: Vec<u8>) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url(&format!("/api/ingest{query}")))
            .bearer_auth(token)
            .body(body)
            .send()
            .await
            .unwrap();
        (resp.status(), resp.json().await.unwrap())
    }

    async fn get_json(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        (resp.status(), resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::start().await;
    let body: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let server = TestServer::start().await;
    let mut messages = Vec::new();
    for (username, password) in [("qa_admin", "wrong"), ("nobody", "admin-pass")] {
        let resp = server
            .client
            .post(server.url("/api/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "unauthorized");
        messages.push(body["error"]["message"].as_str().unwrap().to_string());
    }
    assert_eq!(messages[0], "Invalid username or password");
    assert_eq!(messages[0], messages[1]);
}

#[tokio::test]
async fn api_requires_a_session() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .get(server.url("/api/options"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers()["www-authenticate"], "Bearer");

    let (status, body) = server.get_json("not-a-session", "/api/options").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn admin_ingests_queries_and_exports() {
    let server = TestServer::start().await;
    let session = server.login(support::ADMIN).await;
    assert_eq!(session["role"], "admin");
    assert_eq!(session["display_name"], "QA Admin");
    assert_eq!(session["views"], json!(["query", "ingest", "knowledge_base"]));
    let token = session["token"].as_str().unwrap().to_string();

    let pdf = support::pdf_with_text("Drug substance purity and potency must be controlled");
    let (status, body) = server
        .ingest(&token, "?modality=mAb&phase=Phase%201", pdf)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], 2);
    assert_eq!(body["message"], "Ingestion complete. 2 new records added!");

    let (status, body) = server
        .get_json(&token, "/api/query?modality=mab&phase=phase%201")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["rows"],
        json!([
            {
                "CQA": "Potency",
                "Test Methods": "Bioassay, Cell-based Assay",
                "Control Action": "Specification",
                "Justification": "AI Extracted",
                "Reference": "PDF-LLM"
            },
            {
                "CQA": "Purity",
                "Test Methods": "HPLC, SEC",
                "Control Action": "Specification",
                "Justification": "AI Extracted",
                "Reference": "PDF-LLM"
            }
        ])
    );

    let (_, options) = server.get_json(&token, "/api/options").await;
    assert_eq!(options, json!({ "modalities": ["mAb"], "phases": ["Phase 1"] }));

    let resp = server
        .client
        .get(server.url("/api/query.pdf?modality=mAb&phase=Phase%201&title=Batch%20Review"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("reasoning_results.pdf"));
    assert!(resp.bytes().await.unwrap().starts_with(b"%PDF"));

    let (status, kb) = server.get_json(&token, "/api/knowledge-base").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kb["rows"].as_array().unwrap().len(), 2);
    assert_eq!(kb["rows"][0]["Regulatory Source"], "PDF-LLM");

    let resp = server
        .client
        .get(server.url("/api/knowledge-base.csv"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("CQA_KnowledgeBase_Master.csv"));
    let csv = resp.text().await.unwrap();
    assert!(csv.starts_with(
        "Modality,Phase,CQA,Test Methods,Justification,Regulatory Source,Control Action"
    ));
    assert_eq!(csv.lines().count(), 3);
}

#[tokio::test]
async fn absent_combination_returns_the_sentinel_row() {
    let server = TestServer::start().await;
    let token = server.token(support::ANALYST).await;
    let (status, body) = server
        .get_json(&token, "/api/query?modality=ADC&phase=Phase%203")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
    assert_eq!(body["rows"][0]["CQA"], "No data found");
}

#[tokio::test]
async fn query_needs_modality_and_phase() {
    let server = TestServer::start().await;
    let token = server.token(support::ANALYST).await;
    let (status, body) = server.get_json(&token, "/api/query?modality=mAb").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn plain_users_cannot_open_admin_views() {
    let server = TestServer::start().await;
    let session = server.login(support::ANALYST).await;
    assert_eq!(session["views"], json!(["query"]));
    assert_eq!(session["view"], "query");
    let token = session["token"].as_str().unwrap().to_string();

    let (status, body) = server
        .ingest(&token, "?modality=mAb&phase=Phase%201", support::pdf_with_text("purity"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");

    let (status, _) = server.get_json(&token, "/api/knowledge-base").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let resp = server
        .client
        .post(server.url("/api/session/view"))
        .bearer_auth(&token)
        .json(&json!({ "view": "knowledge_base" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_can_switch_views() {
    let server = TestServer::start().await;
    let token = server.token(support::ADMIN).await;
    let resp = server
        .client
        .post(server.url("/api/session/view"))
        .bearer_auth(&token)
        .json(&json!({ "view": "ingest" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, session) = server.get_json(&token, "/api/session").await;
    assert_eq!(session["view"], "ingest");
    assert_eq!(session["username"], "qa_admin");
}

#[tokio::test]
async fn ingest_rejects_bad_input() {
    let server = TestServer::start().await;
    let token = server.token(support::ADMIN).await;

    let (status, body) = server
        .ingest(&token, "?phase=Phase%201", support::pdf_with_text("purity"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
    assert_eq!(
        body["error"]["message"],
        "Please upload a PDF and fill modality and phase."
    );

    let (status, body) = server
        .ingest(&token, "?modality=mAb&phase=Phase%201", Vec::new())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");

    let (status, body) = server
        .ingest(&token, "?modality=mAb&phase=Phase%201", b"plain text".to_vec())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "malformed_document");

    let (status, body) = server
        .ingest(
            &token,
            "?modality=mAb&phase=Phase%201",
            support::pdf_with_text("Table of contents"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], 0);
    assert_eq!(body["message"], "No extractable data found in PDF.");

    let (_, kb) = server.get_json(&token, "/api/knowledge-base").await;
    assert_eq!(kb["rows"], json!([]));
}

#[tokio::test]
async fn logout_discards_the_session() {
    let server = TestServer::start().await;
    let token = server.token(support::ANALYST).await;

    let resp = server
        .client
        .post(server.url("/api/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, _) = server.get_json(&token, "/api/session").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[test]
fn session_idle_timeout_comes_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let users_path = support::write_users(dir.path());
    let config = AppConfig {
        knowledge_base_path: dir.path().join("kb.csv"),
        users_path: users_path.clone(),
        session_idle_minutes: 30,
        ..AppConfig::default()
    };
    let state = AppState::new(
        Workbench::open(config).unwrap(),
        CredentialStore::load(&users_path).unwrap(),
    );
    assert_eq!(
        state.sessions().idle_timeout(),
        std::time::Duration::from_secs(30 * 60)
    );
}
