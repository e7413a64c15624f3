use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::AUTHORIZATION,
        request::Parts,
    },
    response::{IntoResponseParts, ResponseParts},
};

use crate::{
    auth::{AuthError, TokenPair},
    error::AppError,
    state::State,
};

pub const REFRESH_HEADER: HeaderName = HeaderName::from_static("x-refresh-token");

/// Token headers attached to a response, empty unless tokens were issued.
pub struct TokenHeaders(pub Option<TokenPair>);

impl From<TokenPair> for TokenHeaders {
    fn from(tokens: TokenPair) -> Self {
        Self(Some(tokens))
    }
}

impl IntoResponseParts for TokenHeaders {
    type Error = AppError;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let Some(tokens) = self.0 else {
            return Ok(res);
        };

        let access = HeaderValue::from_str(&format!("Bearer {}", tokens.access))
            .map_err(|e| AppError::InternalError(Box::new(e)))?;
        let refresh = HeaderValue::from_str(&tokens.refresh)
            .map_err(|e| AppError::InternalError(Box::new(e)))?;

        res.headers_mut().insert(AUTHORIZATION, access);
        res.headers_mut().insert(REFRESH_HEADER, refresh);

        Ok(res)
    }
}

/// Caller of a protected route.
pub struct AuthUser {
    pub user_id: String,
    rotated: Option<TokenPair>,
}

impl AuthUser {
    /// Rotated tokens to hand back, if verification had to refresh them.
    pub fn headers(&self) -> TokenHeaders {
        TokenHeaders(self.rotated.clone())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl FromRequestParts<Arc<State>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<State>) -> Result<Self, Self::Rejection> {
        let access = header_str(&parts.headers, &AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(AuthError::InvalidToken)?;
        let refresh = header_str(&parts.headers, &REFRESH_HEADER);

        let session = state
            .tokens
            .verify(state.store.as_ref(), access, refresh)
            .await?;

        Ok(Self {
            user_id: session.user_id,
            rotated: session.rotated,
        })
    }
}

/// JSON body whose rejections come back as [`AppError::MalformedPayload`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Payload<T>(pub T);

pub fn ensure_owner(owner_id: &str, user: &AuthUser) -> Result<(), AppError> {
    if owner_id == user.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
