use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::AppResult;
use crate::handlers::SessionContext;
use crate::services::session::{Event, SessionError};
use crate::services::store::SessionStore;
use crate::services::{ExtractionBackend, ExtractionError, HttpExtractionClient};

pub async fn perform_ocr(
    req: HttpRequest,
    store: web::Data<SessionStore>,
    backend: web::Data<dyn ExtractionBackend>,
) -> AppResult<HttpResponse> {
    let ctx = SessionContext::from_request(&req, store.get_ref()).await;

    let file = {
        let mut session = ctx.session.lock().await;
        let file = session
            .selected_file()
            .cloned()
            .ok_or(SessionError::NoFile)?;
        session.dispatch(Event::ExtractStarted)?;
        file
    };

    log::info!(
        "Session {} extracting {} via {}",
        ctx.id,
        file.name,
        backend.backend_id()
    );

    // Runs detached so a dropped connection cannot leave the session loading.
    let session = ctx.session.clone();
    let task = actix_web::rt::spawn(async move {
        let outcome = backend.extract(&file).await;
        let mut session = session.lock().await;
        session.dispatch(Event::ExtractFinished(outcome))?;
        Ok::<_, SessionError>(session.view())
    });

    let view = match task.await {
        Ok(result) => result?,
        Err(join_err) => {
            log::error!("Extraction task failed: {}", join_err);
            let mut session = ctx.session.lock().await;
            if session.is_loading() {
                session.dispatch(Event::ExtractFinished(Err(ExtractionError::Transport {
                    endpoint: String::new(),
                    unreachable: false,
                    detail: join_err.to_string(),
                })))?;
            }
            session.view()
        }
    };

    if let Some(error) = &view.error {
        log::warn!("Session {} extraction failed: {}", ctx.id, error);
    } else {
        log::info!(
            "Session {} extracted {} characters",
            ctx.id,
            view.stats.characters
        );
    }

    Ok(ctx.view(view))
}

pub async fn backend_status(client: web::Data<HttpExtractionClient>) -> HttpResponse {
    match client.backend_status().await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => {
            log::warn!("Backend status check failed: {}", e);
            HttpResponse::BadGateway().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}
