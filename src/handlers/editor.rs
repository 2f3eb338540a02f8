use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::handlers::SessionContext;
use crate::models::{DownloadTicket, EditRequest};
use crate::services::export::TextDownload;
use crate::services::session::Event;
use crate::services::store::SessionStore;
use crate::services::text::TextTransform;

async fn apply(req: &HttpRequest, store: &SessionStore, event: Event) -> AppResult<HttpResponse> {
    let ctx = SessionContext::from_request(req, store).await;
    let name = event.name();
    let view = {
        let mut session = ctx.session.lock().await;
        session.dispatch(event)?;
        session.view()
    };
    log::debug!("Session {} applied {}", ctx.id, name);
    Ok(ctx.view(view))
}

pub async fn edit_text(
    req: HttpRequest,
    body: web::Json<EditRequest>,
    store: web::Data<SessionStore>,
) -> AppResult<HttpResponse> {
    let EditRequest { text, seq } = body.into_inner();
    let Some(seq) = seq else {
        return apply(&req, &store, Event::Edit(text)).await;
    };

    let ctx = SessionContext::from_request(&req, store.get_ref()).await;
    let view = {
        let mut session = ctx.session.lock().await;
        if !session.edit_in_order(text, seq)? {
            log::debug!("Session {} dropped stale edit {}", ctx.id, seq);
        }
        session.view()
    };
    Ok(ctx.view(view))
}

pub async fn transform_text(
    req: HttpRequest,
    kind: web::Path<String>,
    store: web::Data<SessionStore>,
) -> AppResult<HttpResponse> {
    let transform: TextTransform = kind.parse().map_err(AppError::BadRequest)?;
    apply(&req, &store, Event::Transform(transform)).await
}

pub async fn toggle_original(
    req: HttpRequest,
    store: web::Data<SessionStore>,
) -> AppResult<HttpResponse> {
    apply(&req, &store, Event::ToggleOriginal).await
}

pub async fn dismiss_error(
    req: HttpRequest,
    store: web::Data<SessionStore>,
) -> AppResult<HttpResponse> {
    apply(&req, &store, Event::DismissError).await
}

pub async fn clear_all(req: HttpRequest, store: web::Data<SessionStore>) -> AppResult<HttpResponse> {
    apply(&req, &store, Event::ClearAll).await
}

/// Hands out a one-shot URL for the current text.
pub async fn create_download(
    req: HttpRequest,
    store: web::Data<SessionStore>,
) -> AppResult<HttpResponse> {
    let ctx = SessionContext::from_request(&req, store.get_ref()).await;
    let text = ctx.session.lock().await.extracted_text().to_string();
    if text.is_empty() {
        return Err(AppError::BadRequest("There is no text to download".to_string()));
    }

    let download = TextDownload::new(&text, Utc::now());
    let url = store
        .registry()
        .create_one_shot(download.mime(), download.bytes, &download.file_name);
    log::info!("Session {} prepared {}", ctx.id, download.file_name);

    Ok(ctx.respond(HttpResponse::Ok()).json(DownloadTicket {
        url,
        file_name: download.file_name,
    }))
}
