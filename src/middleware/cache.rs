//! Response Cache Middleware
//!
//! Wraps every request:
//! - non-GET requests and routes opted out of caching pass straight through
//! - a stored response is replayed without running the handler
//! - on a miss the handler runs and a successful response is written back
//!   in a detached task, so the client never waits on the store
//!
//! Store trouble of any kind degrades to "always miss".

use actix_web::body::to_bytes;
use actix_web::{
    Error,
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
};
use futures::future::{LocalBoxFuture, Ready, ok};
use std::{
    rc::Rc,
    task::{Context, Poll},
};

use crate::cache::{CacheDecision, CacheLayer, CachedResponse};

/// Response cache middleware factory
pub struct ResponseCacheMiddleware {
    cache_layer: CacheLayer,
}

impl ResponseCacheMiddleware {
    pub fn new(cache_layer: CacheLayer) -> Self {
        Self { cache_layer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ResponseCacheMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
    <B as MessageBody>::Error: actix_web::ResponseError,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ResponseCacheMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ResponseCacheMiddlewareService {
            service: Rc::new(service),
            cache_layer: self.cache_layer.clone(),
        })
    }
}

pub struct ResponseCacheMiddlewareService<S> {
    service: Rc<S>,
    cache_layer: CacheLayer,
}

impl<S, B> Service<ServiceRequest> for ResponseCacheMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
    <B as MessageBody>::Error: actix_web::ResponseError,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| req.path().to_owned());

        let (key, ttl) = match self.cache_layer.decide(req.method(), &path_and_query) {
            CacheDecision::Cache { key, ttl } => (key, ttl),
            CacheDecision::Bypass => {
                self.cache_layer.stats().record_bypass();
                return Box::pin(async move { Ok(svc.call(req).await?.map_into_boxed_body()) });
            }
        };

        let cache_layer = self.cache_layer.clone();

        Box::pin(async move {
            // Hit?
            if let Some(cached) = cache_layer.lookup(&key).await {
                log::debug!("Cache hit for {}", key);
                cache_layer.stats().record_hit();
                return Ok(req.into_response(cached.to_http_response()));
            }

            log::debug!("Cache miss for {}", key);
            cache_layer.stats().record_miss();
            let generation = cache_layer.generation();

            // Miss -> call downstream
            let res = svc.call(req).await?;
            let status = res.status();

            // Errors and partial results go back untouched and are never stored
            if !status.is_success() {
                return Ok(res.map_into_boxed_body());
            }

            let (req, res) = res.into_parts();
            let headers = res.headers().clone();
            let body = to_bytes(res.into_body()).await?;

            let captured = CachedResponse::new(status, headers, body);
            let out_res = captured.to_http_response();

            let writer = cache_layer.clone();
            actix_web::rt::spawn(async move {
                writer.populate(&key, captured, ttl, generation).await;
            });

            Ok(ServiceResponse::new(req, out_res))
        })
    }
}
