//! Ordering assistant route handler.
//!
//! The conversation is kept in the session under a per-browser chat session
//! id. The assistant never produces an error page: backend failures turn into
//! a friendly agent reply.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use hfc_core::ChatSender;
use hfc_core::messages::{ChatMessage, ChatRequest, HistoryEntry};

use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::models::session::{load_chat, save_chat};
use crate::state::AppState;

/// Reply used when the backend answered with an error status.
pub const SERVER_ERROR_ANSWER: &str = "Sorry, there was an error communicating with the server.";

/// Reply used when the backend could not be reached.
pub const CONNECTION_ERROR_ANSWER: &str =
    "I'm having trouble connecting right now. Please check if the server is running.";

/// Question for the assistant.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// The assistant's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

fn fallback_answer(err: &BackendError) -> &'static str {
    match err {
        BackendError::Unreachable(_) => CONNECTION_ERROR_ANSWER,
        BackendError::Rejected { .. } | BackendError::Parse(_) => SERVER_ERROR_ANSWER,
    }
}

fn message(sender: ChatSender, text: String) -> ChatMessage {
    ChatMessage {
        sender,
        text,
        timestamp: Some(Utc::now()),
    }
}

/// Ask the ordering assistant a question.
#[instrument(skip(state, session, request))]
pub async fn ask(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let question = request.question.trim().to_owned();
    if question.is_empty() {
        return Err(AppError::BadRequest("Please type a question".to_string()));
    }

    let mut chat = load_chat(&session).await?;

    // History is everything said before this question.
    let backend_request = ChatRequest {
        session_id: chat.session_id.clone(),
        question: question.clone(),
        chat_history: chat.messages.iter().map(HistoryEntry::from).collect(),
    };

    let answer = match state.backend().ask_assistant(&backend_request).await {
        Ok(reply) => reply.answer,
        Err(err) => {
            tracing::warn!(error = %err, "Assistant request failed");
            fallback_answer(&err).to_string()
        }
    };

    chat.messages.push(message(ChatSender::User, question));
    chat.messages.push(message(ChatSender::Agent, answer.clone()));
    save_chat(&session, &chat).await?;

    Ok(Json(AskResponse { answer }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_answers() {
        assert_eq!(
            fallback_answer(&BackendError::Unreachable("refused".into())),
            CONNECTION_ERROR_ANSWER
        );
        assert_eq!(
            fallback_answer(&BackendError::Rejected {
                status: 500,
                detail: None
            }),
            SERVER_ERROR_ANSWER
        );
    }
}
