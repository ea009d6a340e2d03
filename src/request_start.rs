use std::time::Instant;

use ntex::service::{Middleware, Service, ServiceCtx};
use ntex::web;

/// When the server first saw a request.
#[derive(Debug, Clone, Copy)]
pub struct RequestStart(pub Instant);

impl RequestStart {
    pub fn of(req: &web::HttpRequest) -> RequestStart {
        req.extensions()
            .get::<RequestStart>()
            .copied()
            .unwrap_or_else(|| RequestStart(Instant::now()))
    }
}

/// Stamps every request with a [`RequestStart`] before routing.
pub struct StampStart;

impl<S> Middleware<S> for StampStart {
    type Service = StampStartMiddleware<S>;

    fn create(&self, service: S) -> Self::Service {
        StampStartMiddleware { service }
    }
}

pub struct StampStartMiddleware<S> {
    service: S,
}

impl<S, Err> Service<web::WebRequest<Err>> for StampStartMiddleware<S>
    where S: Service<web::WebRequest<Err>, Response=web::WebResponse, Error=web::Error>,
          Err: web::ErrorRenderer,
{
    type Response = web::WebResponse;
    type Error = web::Error;

    ntex::forward_ready!(service);

    async fn call(&self, req: web::WebRequest<Err>, ctx: ServiceCtx<'_, Self>) -> Result<Self::Response, Self::Error> {
        req.extensions_mut().insert(RequestStart(Instant::now()));
        ctx.call(&self.service, req).await
    }
}
