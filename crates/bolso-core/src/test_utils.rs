//! Test utilities for bolso-core
//!
//! A mock completion server speaking both the Ollama and the
//! OpenAI-compatible APIs. Replies come from `MockBackend`, so
//! classification and extraction prompts get valid JSON and everything
//! else gets a fixed sentence.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

use crate::ai::{AIBackend, CompletionRequest, MockBackend};

/// Mock completion server for testing and development
pub struct MockCompletionServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockCompletionServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockCompletionServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn scripted_reply(system: Option<String>, prompt: String) -> String {
    let mut request = CompletionRequest::new(&prompt);
    request.system = system;
    MockBackend::new()
        .complete(&request)
        .await
        .unwrap_or_default()
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 2_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let response = scripted_reply(request.system, request.prompt).await;
    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

/// OpenAI-compatible model list (health check)
async fn handle_models() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "object": "list",
        "data": [{"id": "gpt-4o-mini", "object": "model"}]
    }))
}

/// OpenAI-compatible chat completions endpoint
async fn handle_chat(Json(request): Json<ChatRequest>) -> Json<serde_json::Value> {
    let system = request
        .messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.clone());
    let prompt = request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.clone())
        .unwrap_or_default();

    let content = scripted_reply(system, prompt).await;
    Json(serde_json::json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": request.model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(default)]
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::ai::{AIClient, OllamaBackend, OpenAICompatibleBackend, TaskRunner};
    use crate::db::Database;
    use crate::model_router::{ModelRouter, RouterConfig};
    use crate::models::IntentType;
    use crate::prompts::PromptLibrary;
    use crate::router::IntentRouter;

    const PHONE: &str = "whatsapp:+5511988887777";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn router(client: AIClient) -> (Arc<Database>, IntentRouter) {
        let db = Database::in_memory().unwrap();
        db.seed_categories().unwrap();
        let db = Arc::new(db);
        let runner = TaskRunner::with_parts(
            client,
            ModelRouter::with_config(RouterConfig::default()),
            PromptLibrary::embedded_only(),
        );
        (db.clone(), IntentRouter::new(db, Some(runner)))
    }

    #[tokio::test]
    async fn test_pipeline_through_ollama_api() {
        let server = MockCompletionServer::start().await;
        let client = AIClient::Ollama(OllamaBackend::new(&server.url(), "llama3.2"));
        assert!(client.health_check().await);

        let (db, router) = router(client);
        let response = router.handle(PHONE, "gastei 25 no uber", today()).await;
        assert_eq!(response.intent.kind, IntentType::Expense);
        assert!(response.replies[0].contains("📂 Categoria: Transporte"));
        assert!(response.replies[0].contains("📅 Data: 20/05/2024"));

        let user = db.get_user_by_phone(PHONE).unwrap().unwrap();
        assert_eq!(db.list_user_expenses(user.id, None, None).unwrap().len(), 1);

        let analysis = router
            .handle(PHONE, "como está minha saúde financeira?", today())
            .await;
        assert_eq!(analysis.intent.kind, IntentType::Analysis);
        assert_eq!(
            analysis.replies,
            vec![crate::ai::MOCK_NARRATIVE_REPLY.to_string()]
        );
    }

    #[tokio::test]
    async fn test_pipeline_through_openai_compatible_api() {
        let server = MockCompletionServer::start().await;
        let client = AIClient::OpenAICompatible(OpenAICompatibleBackend::new(
            &server.url(),
            "gpt-4o-mini",
        ));
        assert!(client.health_check().await);

        let (_, router) = router(client);
        router
            .handle(PHONE, "comprei remédio por 80", today())
            .await;
        let report = router.handle(PHONE, "resumo", today()).await;

        assert_eq!(report.intent.kind, IntentType::Report);
        assert!(report.replies[0].contains("💊 Saúde: R$ 80.00 (100.0%)"));
        assert!(report.replies[0].contains("1. comprei remédio por - R$ 80.00"));
    }

    #[tokio::test]
    async fn test_stopped_server_falls_back() {
        let mut server = MockCompletionServer::start().await;
        let url = server.url();
        server.stop();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let client = AIClient::Ollama(OllamaBackend::new(&url, "llama3.2"));
        let (_, router) = router(client);

        let response = router.handle(PHONE, "gastei 40 no mercado", today()).await;
        assert_eq!(response.intent.kind, IntentType::Expense);
        assert!(response.replies[0].contains("📂 Categoria: Alimentação"));

        let help = router.handle(PHONE, "ajuda", today()).await;
        assert_eq!(help.intent.kind, IntentType::Help);
    }
}
