use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{entities::token::Claims, errors::AuthError};

/// Principal of a request that passed the auth middleware with an admin token.
///
/// Mutating post and project handlers take this as an argument, so a route
/// that is accidentally left public by the middleware still refuses to run:
/// 401 when no claims were attached, 403 when the principal is not an admin.
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

impl AdminClaims {
    pub fn username(&self) -> &str {
        &self.0.username
    }

    fn from_claims(claims: Option<Claims>) -> Result<Self, AuthError> {
        match claims {
            Some(claims) if claims.admin => Ok(AdminClaims(claims)),
            Some(claims) => {
                tracing::warn!(user = %claims.sub, "Non-admin principal attempted a write");
                Err(AuthError::Forbidden("Admin access required".into()))
            }
            None => Err(AuthError::MissingCredentials),
        }
    }
}

impl FromRequest for AdminClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        ready(AdminClaims::from_claims(claims).map_err(actix_web::Error::from))
    }
}
