//! Access control middleware for the marketplace server.
//! This middleware can be placed on any route or service.
//!
//! It checks the incoming request for a valid bearer token and then checks the role carried in the token against
//! the role the route requires. Roles are hierarchical, so an `Admin` token passes a `Seller` check and a `Seller`
//! token passes a `Customer` check. If the check passes, the decoded claims are stored in the request extensions
//! for the handlers to use. Otherwise a 401 or 403 response is returned.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    web,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use market_engine::db_types::Role;

use crate::auth::{bearer_token, TokenVerifier};

pub struct AclMiddlewareFactory {
    required_role: Role,
}

impl AclMiddlewareFactory {
    pub fn new(required_role: Role) -> Self {
        AclMiddlewareFactory { required_role }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_role: self.required_role, service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_role: Role,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_role = self.required_role;
        Box::pin(async move {
            let verifier = req
                .app_data::<web::Data<TokenVerifier>>()
                .ok_or_else(|| {
                    log::warn!("No token verifier is registered with the app");
                    ErrorInternalServerError("No token verifier is registered with the app")
                })?
                .clone();
            let claims = bearer_token(req.request())
                .and_then(|token| verifier.decode_token(token))
                .map_err(|e| ErrorUnauthorized(e.to_string()))?;
            if claims.role.covers(required_role) {
                req.extensions_mut().insert(claims);
                service.call(req).await
            } else {
                Err(ErrorForbidden("Insufficient permissions"))
            }
        })
    }
}
