pub mod editor;
pub mod index;
pub mod ocr;
pub mod preview;
pub mod upload;

pub use editor::*;
pub use index::*;
pub use ocr::*;
pub use preview::*;
pub use upload::*;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder};
use uuid::Uuid;

use crate::constants::SESSION_COOKIE;
use crate::models::SessionView;
use crate::services::store::{SessionStore, SharedSession};

/// Session resolved from the request cookie.
pub struct SessionContext {
    pub id: Uuid,
    pub session: SharedSession,
    created: bool,
}

impl SessionContext {
    pub async fn from_request(req: &HttpRequest, store: &SessionStore) -> Self {
        let cookie_id = req
            .cookie(SESSION_COOKIE)
            .and_then(|c| c.value().parse::<Uuid>().ok());
        let (id, session, created) = store.resolve(cookie_id).await;
        Self {
            id,
            session,
            created,
        }
    }

    /// Attaches the session cookie when the session was just created.
    pub fn respond(&self, mut builder: HttpResponseBuilder) -> HttpResponseBuilder {
        if self.created {
            builder.cookie(
                Cookie::build(SESSION_COOKIE, self.id.to_string())
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .finish(),
            );
        }
        builder
    }

    pub fn view(&self, view: SessionView) -> HttpResponse {
        self.respond(HttpResponse::Ok()).json(view)
    }

    pub async fn current_view(&self) -> HttpResponse {
        let view = self.session.lock().await.view();
        self.view(view)
    }
}
