use actix_web::http::header;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::export::attachment_disposition;
use crate::services::store::SessionStore;

/// Blobs hold user-supplied bytes; nothing in them may run on this origin.
const BLOB_CSP: &str = "default-src 'none'; img-src 'self'; style-src 'unsafe-inline'; sandbox";

/// Serves an object URL; one-shot downloads are revoked by this call.
pub async fn get_blob(
    path: web::Path<String>,
    store: web::Data<SessionStore>,
) -> AppResult<HttpResponse> {
    let id: Uuid = path
        .parse()
        .map_err(|_| AppError::NotFound(format!("object URL {}", path.as_str())))?;

    let blob = store
        .registry()
        .resolve(&id)
        .ok_or_else(|| AppError::NotFound(format!("object URL {}", id)))?;

    let mut response = HttpResponse::Ok();
    response
        .content_type(blob.mime.as_str())
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .insert_header((header::CONTENT_SECURITY_POLICY, BLOB_CSP));
    if let Some(file_name) = &blob.file_name {
        response.insert_header((
            header::CONTENT_DISPOSITION,
            attachment_disposition(file_name),
        ));
    }

    Ok(response.body(blob.bytes))
}
