//! Answer generation: retrieve context for a question and ask the model

use std::sync::Arc;

use docqa_core::{GenerationConfig, LLMProvider, RAGEngine, RAGQuery, Result};

/// Returned without calling the model when retrieval finds nothing
pub const NO_MATCHES: &str = "No matches found.";

/// Returned when the model answers with empty text
pub const NO_RESPONSE: &str = "No response generated.";

/// Low temperature keeps answers close to the retrieved text
pub const ANSWER_TEMPERATURE: f32 = 0.3;

/// Answers questions from the indexed documents using an LLM
pub struct AnswerGenerator<L: LLMProvider, R: RAGEngine> {
    llm: Arc<L>,
    rag: Arc<R>,
}

impl<L: LLMProvider, R: RAGEngine> AnswerGenerator<L, R> {
    /// Create a new answer generator
    pub fn new(llm: Arc<L>, rag: Arc<R>) -> Self {
        Self { llm, rag }
    }

    /// Answer a question, turning any failure into a user-facing message
    pub async fn answer(&self, question: &str) -> String {
        match self.try_answer(question).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error answering question: {}", e);
                format!("An error occurred: {}", e)
            }
        }
    }

    /// Answer a question, propagating retrieval and generation errors
    pub async fn try_answer(&self, question: &str) -> Result<String> {
        let query = RAGQuery::new(question, self.rag.default_top_k());
        let retrieved = self.rag.retrieve(&query).await?;
        tracing::debug!(documents = retrieved.documents.len(), "Retrieved context");

        if retrieved.documents.is_empty() {
            return Ok(NO_MATCHES.to_string());
        }

        let prompt = build_prompt(&retrieved.context, question);
        let config = GenerationConfig {
            model_id: self.llm.model_id().to_string(),
            temperature: Some(ANSWER_TEMPERATURE),
            ..Default::default()
        };

        let result = self.llm.generate_with_config(&prompt, &config).await?;
        tracing::debug!(
            tokens_used = ?result.tokens_used,
            finish_reason = ?result.finish_reason,
            "Generated response"
        );

        if result.text.trim().is_empty() {
            return Ok(NO_RESPONSE.to_string());
        }
        Ok(result.text)
    }

    /// Whether the underlying index can be queried
    pub fn is_ready(&self) -> bool {
        self.rag.is_ready()
    }
}

/// Fill the legal assistant prompt with retrieved context and the question
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an expert Indian legal assistant with deep knowledge of Indian laws, regulations, and legal procedures. When responding to legal queries:\n\
        \n\
        1. Start with a clear humanised explanation based on the user's concern or query\n\
        2. Provide accurate information based on current Indian laws and regulations\n\
        3. Explain legal concepts in simple, easy-to-understand language\n\
        4. Include relevant sections of acts/laws when applicable\n\
        5. Suggest practical next steps or procedures the user should follow\n\
        6. Mention any important deadlines or time limitations\n\
        7. If relevant, explain which court or authority has jurisdiction\n\
        8. Clarify if any documentation or evidence would be required\n\
        9. Try to list down some important points as bullet points one below the other when necessary and not like paragraphs.\n\
        \n\
        Remember to maintain a professional yet approachable tone, and always emphasize that while you provide legal information, users should consult a practicing lawyer for specific legal advice.\n\
        Context: {}\n\
        Question: {}\n\
        Response:",
        context, question
    )
}
