use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{config::Env, error::AppError, token::TokenService};

/// Name of the HTTP-only cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// AuthUser
///
/// The verified identity of a request. Always derived from a signed session
/// token, never from anything else the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
}

impl AuthUser {
    /// Resolves the identity from the session cookie.
    ///
    /// - no cookie, or an empty one left behind by logout: `Unauthorized`;
    /// - a token that fails verification: `Forbidden`.
    pub fn from_cookies(jar: &CookieJar, tokens: &TokenService) -> Result<Self, AppError> {
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                tracing::warn!("session cookie missing, access denied");
                AppError::Unauthorized
            })?;

        match tokens.verify(token) {
            Ok(claims) => Ok(AuthUser {
                email: claims.email,
            }),
            Err(reason) => {
                tracing::warn!(%reason, "session token rejected");
                Err(AppError::Forbidden)
            }
        }
    }

    /// Ownership check: the resource must belong to this identity.
    /// A valid session asking for someone else's data is still `Unauthorized`.
    pub fn ensure_owns(&self, owner_email: &str) -> Result<(), AppError> {
        if self.email == owner_email {
            Ok(())
        } else {
            tracing::warn!(
                session = %self.email,
                requested = %owner_email,
                "identity mismatch, access denied"
            );
            Err(AppError::Unauthorized)
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Behind `require_session` the identity is already in the request
/// extensions and is reused as is. Anywhere else the cookie is verified here.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let tokens = TokenService::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        Self::from_cookies(&jar, &tokens)
    }
}

/// require_session
///
/// Route layer for the guarded router. Rejects the request before it reaches
/// a handler unless it carries a valid session, then attaches the `AuthUser`.
pub async fn require_session(
    State(tokens): State<TokenService>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = AuthUser::from_cookies(&jar, &tokens)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Builds the HTTP-only session cookie. Production clients live on another
/// site, so the cookie must be `Secure; SameSite=None` there.
pub fn session_cookie(token: String, env: Env) -> Cookie<'static> {
    let builder = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/");

    match env {
        Env::Production => builder.secure(true).same_site(SameSite::None).build(),
        Env::Local => builder.secure(false).same_site(SameSite::Strict).build(),
    }
}

/// An empty, already-expired session cookie that overwrites the client's copy.
pub fn cleared_session_cookie(env: Env) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), env);
    cookie.make_removal();
    cookie
}
