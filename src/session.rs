//! Session cookie and request guards
//!
//! The store holds one operator session. A browser is part of that session
//! when its `cv-session` cookie carries the id of the store's current user.

use actix_web::{FromRequest, HttpRequest};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::web::Data;
use futures::future::LocalBoxFuture;
use log::trace;

use crate::error::{Error, Result};
use crate::model::User;
use crate::store::SharedStore;


/// Name of the cookie holding the session's user id
pub const SESSION_COOKIE: &str = "cv-session";

/// Page that unauthenticated page requests are sent to
pub const LOGIN_PATH: &str = "/login";


/// Returns the signed-in user if `req` belongs to the current session
///
/// Expires a stale session first.
pub async fn current_user(req: &HttpRequest) -> Option<User> {

    let store = req.app_data::<Data<SharedStore>>()?;

    let mut store = store.write().await;
    store.initialize();

    let cookie = req.cookie(SESSION_COOKIE)?;
    let user = store.current_user()
        .filter(|user| user.id == cookie.value())
        .cloned();

    if user.is_none() {
        trace!("session cookie does not match the current session");
    }

    user
}


/// Cookie that binds a browser to `user`'s session
pub fn session_cookie(user: &User) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, user.id.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}


/// Cookie that clears the session cookie from a browser
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .finish();
    cookie.make_removal();
    cookie
}


/// Extractor for pages that require a session
///
/// Requests without one are redirected to the login page.
pub struct PageSession(pub User);

impl FromRequest for PageSession {

    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            current_user(&req).await
                .map(PageSession)
                .ok_or_else(|| Error::Redirect(LOGIN_PATH.into()))
        })
    }
}


/// Extractor for API endpoints that require a session
///
/// Requests without one are answered with 401.
pub struct ApiSession(pub User);

impl FromRequest for ApiSession {

    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            current_user(&req).await
                .map(ApiSession)
                .ok_or_else(|| Error::Web(StatusCode::UNAUTHORIZED, "not signed in".into()))
        })
    }
}
