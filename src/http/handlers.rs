use super::messages::{ErrorResponse, ListenResponse, MessageResponse, TtsQuery, TtsResponse};
use super::state::AppState;
use crate::services::TurnError;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use tracing::{error, info, warn};

fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

/// POST /listenUser
/// Transcribe the uploaded recording, generate a reply, and synthesize it
pub async fn listen_user(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!(%request_id, "Upload is not multipart: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, ErrorResponse::new("No file provided"));
        }
    };
    let mut audio: Option<Vec<u8>> = None;
    let mut instruction = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(%request_id, "Failed to read multipart: {}", e);
                return error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(format!("Failed to read multipart: {}", e)),
                );
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => match field.bytes().await {
                Ok(bytes) => audio = Some(bytes.to_vec()),
                Err(e) => {
                    warn!(%request_id, "Failed to read uploaded file: {}", e);
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        ErrorResponse::new(format!("Failed to read file: {}", e)),
                    );
                }
            },
            Some("current_instruction") => {
                instruction = field.text().await.unwrap_or_default();
            }
            _ => {}
        }
    }

    let Some(audio) = audio else {
        return error_response(StatusCode::BAD_REQUEST, ErrorResponse::new("No file provided"));
    };

    info!(%request_id, bytes = audio.len(), "Processing user turn");

    match state.pipeline.handle_turn(&audio, &instruction).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ListenResponse {
                recognized_text: outcome.recognized_text,
                chatgpt_response: outcome.reply,
                wav_base64: Some(base64::engine::general_purpose::STANDARD.encode(&outcome.audio)),
            }),
        )
            .into_response(),
        Err(TurnError::NothingRecognized) => {
            warn!(%request_id, "Nothing recognized in upload");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "STT failed".to_string(),
                    recognized_text: Some(String::new()),
                    chatgpt_response: None,
                },
            )
        }
        Err(TurnError::Synthesis {
            recognized_text,
            reply,
            message,
        }) => {
            error!(%request_id, "Reply synthesis failed: {}", message);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "TTS failed".to_string(),
                    recognized_text: Some(recognized_text),
                    chatgpt_response: Some(reply),
                },
            )
        }
    }
}

/// GET /ttsBytes?prompt=...
/// Synthesize any text
pub async fn tts_bytes(State(state): State<AppState>, Query(query): Query<TtsQuery>) -> Response {
    let prompt = match query.prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt,
        _ => {
            return error_response(StatusCode::BAD_REQUEST, ErrorResponse::new("No prompt provided"))
        }
    };

    match state.pipeline.speak(&prompt).await {
        Ok(audio) => (
            StatusCode::OK,
            Json(TtsResponse {
                wav_base64: base64::engine::general_purpose::STANDARD.encode(&audio),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("TTS failed for prompt {:?}: {:#}", prompt, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new("TTS failed"))
        }
    }
}

/// GET /startScenario
/// Reset the conversation history
pub async fn start_scenario(State(state): State<AppState>) -> impl IntoResponse {
    state.pipeline.reset().await;

    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Scenario started.".to_string(),
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
