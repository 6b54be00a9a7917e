//! Error types for legis-web
//!
//! Handlers return [`WebResult`]; failures render as HTML pages with the
//! matching status code.

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::html::{escape, page};

/// Realm announced with 401 responses
pub const AUTH_REALM: &str = "Monitor Legislativo";

#[derive(Debug, Error)]
pub enum WebError {
    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or wrong credentials (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated but not allowed (403)
    #[error("Forbidden")]
    Forbidden,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// legis-common error
    #[error("Common error: {0}")]
    Common(#[from] legis_common::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} não encontrado(a).", what)),
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            WebError::Unauthorized => {
                let body = page("Acesso restrito", "<p>Faça login para acessar esta página.</p>");
                return (
                    StatusCode::UNAUTHORIZED,
                    [(
                        header::WWW_AUTHENTICATE,
                        format!("Basic realm=\"{}\", charset=\"UTF-8\"", AUTH_REALM),
                    )],
                    Html(body),
                )
                    .into_response();
            }
            WebError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Você não tem permissão para acessar esta página.".to_string(),
            ),
            WebError::Common(legis_common::Error::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("{} não encontrado(a).", what))
            }
            WebError::Common(legis_common::Error::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg),
            WebError::Common(legis_common::Error::Unauthorized) => return WebError::Unauthorized.into_response(),
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro interno. Tente novamente mais tarde.".to_string(),
                )
            }
        };

        let title = match status {
            StatusCode::NOT_FOUND => "Página não encontrada",
            StatusCode::BAD_REQUEST => "Requisição inválida",
            StatusCode::FORBIDDEN => "Acesso negado",
            _ => "Erro",
        };
        let body = page(title, &format!("<p>{}</p>", escape(&message)));
        (status, Html(body)).into_response()
    }
}

/// Result type for page handlers
pub type WebResult<T> = Result<T, WebError>;
