use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    error::ErrorUnauthorized,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;

use super::CurrentUser;
use super::jwt::{JwtUtils, TokenVerifyResult};
use crate::entity::user::Role;

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth_result = match extract_token(&req) {
            Some(token) => match JwtUtils::verify_token(&token) {
                TokenVerifyResult::Valid(claims) => match current_user_from_claims(&claims) {
                    Some(user) => {
                        req.extensions_mut().insert(user);
                        Ok(())
                    }
                    None => Err(ErrorUnauthorized("Недействительный токен")),
                },
                TokenVerifyResult::Expired => {
                    Err(ErrorUnauthorized("Срок действия токена истёк"))
                }
                TokenVerifyResult::Invalid => Err(ErrorUnauthorized("Недействительный токен")),
            },
            None => Err(ErrorUnauthorized("Требуется вход в систему")),
        };

        let fut = self.service.call(req);
        Box::pin(async move {
            match auth_result {
                Ok(_) => fut.await,
                Err(e) => Err(e),
            }
        })
    }
}

/// Access token from the `accessToken` cookie or a bearer header.
fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie("accessToken") {
        return Some(cookie.value().to_string());
    }

    let header = req.headers().get("Authorization")?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(str::to_string)
}

fn current_user_from_claims(claims: &crate::model::auth::Claims) -> Option<CurrentUser> {
    // Refresh tokens never grant access to the API scope.
    let role = Role::parse(&claims.role)?;
    let id = claims.sub.parse::<i32>().ok()?;
    Some(CurrentUser { id, role })
}
