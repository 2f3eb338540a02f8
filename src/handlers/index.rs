use actix_web::{web, HttpRequest, HttpResponse};
use tera::{Context, Tera};

use crate::constants::MAX_FILE_SIZE;
use crate::error::AppResult;
use crate::handlers::SessionContext;
use crate::services::preview::format_file_size;
use crate::services::store::SessionStore;

pub async fn index(
    req: HttpRequest,
    tmpl: web::Data<Tera>,
    store: web::Data<SessionStore>,
) -> AppResult<HttpResponse> {
    let ctx = SessionContext::from_request(&req, &store).await;
    let view = ctx.session.lock().await.view();

    let mut context = Context::new();
    context.insert("state", &view);
    context.insert("max_size_label", &format_file_size(MAX_FILE_SIZE));
    context.insert("max_size_bytes", &MAX_FILE_SIZE);

    let rendered = tmpl.render("index.html", &context).map_err(|e| {
        log::error!("Template error: {}", e);
        e
    })?;

    Ok(ctx
        .respond(HttpResponse::Ok())
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

pub async fn get_state(req: HttpRequest, store: web::Data<SessionStore>) -> HttpResponse {
    SessionContext::from_request(&req, &store)
        .await
        .current_view()
        .await
}
