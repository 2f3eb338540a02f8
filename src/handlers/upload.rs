use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::constants::{FILE_NAME_HEADER, MAX_FILE_SIZE};
use crate::error::AppResult;
use crate::handlers::SessionContext;
use crate::services::acquisition::{acquire, check_size, AcquisitionError};
use crate::services::session::Event;
use crate::services::store::SessionStore;

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Receives a picked or dropped image as a raw request body.
///
/// The declared length is checked before anything is read, and the body is
/// read with a cap so a missing or lying `Content-Length` still cannot push
/// more than the limit into memory.
pub async fn upload_file(
    req: HttpRequest,
    payload: web::Payload,
    store: web::Data<SessionStore>,
) -> AppResult<HttpResponse> {
    let declared = header_str(&req, header::CONTENT_LENGTH.as_str())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(declared) = declared {
        check_size(declared)?;
    }

    let body = payload
        .to_bytes_limited(MAX_FILE_SIZE as usize)
        .await
        .map_err(|_| AcquisitionError::TooLarge(MAX_FILE_SIZE + 1))?
        .map_err(|e| AcquisitionError::Unreadable(e.to_string()))?;

    let mime = header_str(&req, header::CONTENT_TYPE.as_str()).unwrap_or("");
    let name = header_str(&req, FILE_NAME_HEADER)
        .and_then(|raw| urlencoding::decode(raw).ok())
        .map(|decoded| decoded.into_owned())
        .unwrap_or_default();

    let file = acquire(&name, mime, body.to_vec()).map_err(|e| {
        log::warn!("Rejected upload {:?}: {}", name, e);
        e
    })?;

    let ctx = SessionContext::from_request(&req, store.get_ref()).await;
    let preview = store.registry().create(&file.mime, file.bytes.clone());
    log::info!(
        "Session {} selected {} ({} bytes)",
        ctx.id,
        file.name,
        file.size()
    );

    let view = {
        let mut session = ctx.session.lock().await;
        session.dispatch(Event::Select {
            file,
            preview: Some(preview),
        })?;
        session.view()
    };

    Ok(ctx.view(view))
}
