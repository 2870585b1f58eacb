use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{errors::AuthError, AppState};

const PUBLIC_POSTS: [&str; 3] = ["/api/auth/login", "/api/auth/register", "/api/auth/refresh"];

/// Verifies the bearer token on every non-public request and attaches the
/// decoded [`Claims`](crate::entities::token::Claims) to the request extensions.
pub struct AuthMiddleware;

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_route(req.path(), req.method()) {
                return service.call(req).await;
            }

            match authenticate(&req) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                }
                Err(e) => {
                    tracing::warn!(path = %req.path(), method = %req.method(), error = %e, "Request rejected by auth middleware");
                    let response = e.error_response();
                    Ok(req.into_response(response))
                }
            }
        })
    }
}

/// Reads are public, as are the auth endpoints themselves.
fn is_public_route(path: &str, method: &Method) -> bool {
    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        return true;
    }

    method == Method::POST && PUBLIC_POSTS.contains(&path.trim_end_matches('/'))
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let mut parts = value.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
                    Some(token.to_string())
                }
                _ => None,
            }
        })
}

fn authenticate(req: &ServiceRequest) -> Result<crate::entities::token::Claims, AuthError> {
    let state = req.app_data::<web::Data<AppState>>()
        .ok_or_else(|| {
            tracing::error!("AppState missing in middleware");
            AuthError::MissingJwtService
        })?;

    let token = extract_token(req).ok_or(AuthError::MissingCredentials)?;
    state.auth_handler.verify(&token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_and_auth_endpoints_are_public() {
        assert!(is_public_route("/api/posts", &Method::GET));
        assert!(is_public_route("/api/projects/123", &Method::GET));
        assert!(is_public_route("/api/posts", &Method::OPTIONS));
        assert!(is_public_route("/api/auth/login", &Method::POST));
        assert!(is_public_route("/api/auth/refresh/", &Method::POST));
    }

    #[test]
    fn writes_are_protected() {
        assert!(!is_public_route("/api/posts", &Method::POST));
        assert!(!is_public_route("/api/projects/123", &Method::PUT));
        assert!(!is_public_route("/api/posts/123", &Method::DELETE));
    }

    #[test]
    fn bearer_token_is_extracted_case_insensitively() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer abc.def.ghi"))
            .to_srv_request();
        assert_eq!(extract_token(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn malformed_authorization_header_yields_no_token() {
        for value in ["Basic abc", "Bearer", "Bearer a b"] {
            let req = TestRequest::default()
                .insert_header((header::AUTHORIZATION, value))
                .to_srv_request();
            assert_eq!(extract_token(&req), None, "{value}");
        }
    }
}
