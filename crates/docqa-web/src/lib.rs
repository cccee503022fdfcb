//! Answer generation and the HTTP chat interface for DocQA

mod answer;
mod config;
mod server;


pub use answer::{AnswerGenerator, build_prompt, ANSWER_TEMPERATURE, NO_MATCHES, NO_RESPONSE};
pub use config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
pub use server::{build_router, serve, AppState, ChatForm};
