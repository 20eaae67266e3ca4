//! Retrieve, augment, generate

use serde::Serialize;
use tracing::{error, info, warn};

use super::prompt::{build_context, render_prompt, unavailable_context};
use super::retriever::Retriever;
use super::similarity::ScoredChunk;
use crate::error::Error;
use crate::llm::{ChatModel, Embedder, Message};

/// Answer shown in place of a reply the model returned empty
pub const EMPTY_RESPONSE: &str = "No response generated";

/// Outcome of one question, whatever went wrong along the way
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub question: String,
    pub passages: Vec<ScoredChunk>,
    pub answer: String,
}

pub struct RagPipeline<E, C> {
    retriever: Retriever<E>,
    chat: C,
}

impl<E: Embedder, C: ChatModel> RagPipeline<E, C> {
    pub fn new(retriever: Retriever<E>, chat: C) -> Self {
        Self { retriever, chat }
    }

    /// Run the full pipeline. Failures end up inside the answer text.
    pub async fn answer(&self, question: &str, k: usize) -> RagAnswer {
        info!(question = %question, k = k, "Answering question");

        let (context, passages) = match self.retriever.retrieve(question, k).await {
            Ok(passages) => (build_context(&passages), passages),
            Err(e) => {
                error!(error = %e, "Retrieval failed");
                (unavailable_context(&e), Vec::new())
            }
        };

        let prompt = render_prompt(&context, question);
        let answer = match self.chat.chat(vec![Message::user(prompt)]).await {
            Ok(reply) if reply.trim().is_empty() => EMPTY_RESPONSE.to_string(),
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, code = e.code(), "Generation failed");
                generation_error(&e)
            }
        };

        RagAnswer {
            question: question.to_string(),
            passages,
            answer,
        }
    }
}

/// Placeholder answer for a failed chat call
pub fn generation_error(err: &Error) -> String {
    format!("API ERROR ({}): Unable to generate response", err.kind())
}
