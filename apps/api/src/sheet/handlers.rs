use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::auth::{AuthSession, Session};
use crate::characters::ensure_owner;
use crate::errors::AppError;
use crate::models::RecordId;
use crate::sheet::cache::RenderTicket;
use crate::sheet::SheetDocument;
use crate::state::AppState;

pub const PAGES_HEADER: &str = "x-sheet-pages";
pub const OVERFLOW_HEADER: &str = "x-sheet-overflow";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

/// Fetches character, skills and spells together, then renders or reuses
/// the cached sheet. A request that fails before storing a render releases
/// its cache entry.
pub async fn load_sheet(
    state: &AppState,
    session: &Session,
    id: &RecordId,
) -> Result<Arc<SheetDocument>, AppError> {
    let cache = state.sheets.cache();
    let ticket = cache.begin(id);
    let result = render_with_ticket(state, session, id, &ticket).await;
    if result.is_err() {
        cache.cancel(&ticket);
    }
    result
}

async fn render_with_ticket(
    state: &AppState,
    session: &Session,
    id: &RecordId,
    ticket: &RenderTicket,
) -> Result<Arc<SheetDocument>, AppError> {
    let cache = state.sheets.cache();
    let backend = state.backend.as_ref();
    let (character, skills, spells) = tokio::try_join!(
        backend.get_character(id),
        backend.list_skills(id),
        backend.list_spells(id),
    )?;
    let character = character.ok_or_else(|| AppError::NotFound(format!("character {id}")))?;
    ensure_owner(&character, session)?;

    if let Some(document) = cache.get(id) {
        debug!(character_id = %id, "Serving cached sheet");
        return Ok(document);
    }

    let document = Arc::new(
        state
            .sheets
            .render_blocking(character, skills, spells)
            .await?,
    );
    if !cache.store(ticket, document.clone()) {
        debug!(character_id = %id, "Character changed during render, result not cached");
    }
    Ok(document)
}

/// Percent-encodes a file name for the RFC 5987 `filename*` parameter.
fn encode_rfc5987(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

pub fn content_disposition(disposition: Disposition, filename: &str) -> String {
    let kind = match disposition {
        Disposition::Inline => "inline",
        Disposition::Attachment => "attachment",
    };
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() && c != '"' { c } else { '_' })
        .collect();
    if ascii == filename {
        format!("{kind}; filename=\"{filename}\"")
    } else {
        format!(
            "{kind}; filename=\"{ascii}\"; filename*=UTF-8''{}",
            encode_rfc5987(filename)
        )
    }
}

pub fn pdf_response(document: &SheetDocument, disposition: Disposition) -> Result<Response, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(disposition, &document.filename))
            .map_err(|e| anyhow::anyhow!("invalid content disposition: {e}"))?,
    );
    headers.insert(PAGES_HEADER, HeaderValue::from(document.page_count));
    if !document.overflowed_regions.is_empty() {
        let regions = document.overflowed_regions.join(", ");
        if let Ok(value) = HeaderValue::from_str(&regions) {
            headers.insert(OVERFLOW_HEADER, value);
        }
    }
    Ok((StatusCode::OK, headers, document.bytes.clone()).into_response())
}

/// GET /api/v1/characters/:id/sheet
pub async fn handle_sheet_preview(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let document = load_sheet(&state, &session, &RecordId(id)).await?;
    pdf_response(&document, Disposition::Inline)
}

/// GET /api/v1/characters/:id/sheet/download
pub async fn handle_sheet_download(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let document = load_sheet(&state, &session, &RecordId(id)).await?;
    pdf_response(&document, Disposition::Attachment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_disposition() {
        assert_eq!(
            content_disposition(Disposition::Attachment, "Thrain_HojaDePersonaje.pdf"),
            "attachment; filename=\"Thrain_HojaDePersonaje.pdf\""
        );
        assert_eq!(
            content_disposition(Disposition::Inline, "Thrain_HojaDePersonaje.pdf"),
            "inline; filename=\"Thrain_HojaDePersonaje.pdf\""
        );
    }

    #[test]
    fn test_non_ascii_disposition_adds_encoded_name() {
        let value = content_disposition(Disposition::Attachment, "Año_HojaDePersonaje.pdf");
        assert!(value.starts_with("attachment; filename=\"A_o_HojaDePersonaje.pdf\""));
        assert!(value.ends_with("filename*=UTF-8''A%C3%B1o_HojaDePersonaje.pdf"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }
}
