//! HTTP chat server using Axum

use axum::{
    Form, Json, Router,
    extract::{State, rejection::FormRejection},
    response::Html,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use docqa_core::{LLMProvider, RAGEngine, Result};

use crate::answer::AnswerGenerator;
use crate::config::ServerConfig;

/// Shared state for the chat server
pub struct AppState<L: LLMProvider, R: RAGEngine> {
    pub generator: AnswerGenerator<L, R>,
}

/// Form posted by the chat page
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub user_question: Option<String>,
}

async fn index_page() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn chat<L, R>(
    State(state): State<Arc<AppState<L, R>>>,
    form: std::result::Result<Form<ChatForm>, FormRejection>,
) -> Json<Value>
where
    L: LLMProvider + 'static,
    R: RAGEngine + 'static,
{
    // A body that is not a urlencoded form carries no question
    let question = match form {
        Ok(Form(form)) => form.user_question.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!("Unreadable chat form: {}", rejection);
            String::new()
        }
    };
    if question.trim().is_empty() {
        return Json(json!({ "error": "No question provided." }));
    }

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);
    let response = async {
        tracing::info!("💬 Question received ({} chars)", question.chars().count());
        state.generator.answer(&question).await
    }
    .instrument(span)
    .await;

    Json(json!({ "response": response }))
}

async fn health<L, R>(State(state): State<Arc<AppState<L, R>>>) -> Json<Value>
where
    L: LLMProvider + 'static,
    R: RAGEngine + 'static,
{
    Json(json!({
        "status": "ok",
        "index_ready": state.generator.is_ready(),
    }))
}

/// Build the Axum router with all routes.
pub fn build_router<L, R>(generator: AnswerGenerator<L, R>) -> Router
where
    L: LLMProvider + 'static,
    R: RAGEngine + 'static,
{
    let shared = Arc::new(AppState { generator });

    Router::new()
        .route("/", get(index_page))
        .route("/chat", post(chat::<L, R>))
        .route("/health", get(health::<L, R>))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn serve(config: &ServerConfig, router: Router) -> Result<()> {
    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Chat server listening on http://{}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}
