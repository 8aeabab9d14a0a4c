use std::io::{self, Read};

use crate::api::external::Context;
use crate::api::ApiError;
use tiny_http::{Header, Response, StatusCode};
use tracing::error;

mod cluster;
mod deployment;
mod webhook;

pub type HttpResult = Result<Response<io::Cursor<Vec<u8>>>, ApiError>;

type Handler = fn(&mut tiny_http::Request, &route_recognizer::Params, &Context) -> HttpResult;

pub struct Router {
    routes: Vec<(tiny_http::Method, route_recognizer::Router<Handler>)>,
}

impl Router {
    pub fn new() -> Router {
        let mut get = route_recognizer::Router::<Handler>::new();
        let mut post = route_recognizer::Router::<Handler>::new();
        let mut delete = route_recognizer::Router::<Handler>::new();

        // GET
        get.add("/deployment", deployment::list);
        get.add("/cluster", cluster::properties);
        // POST
        post.add("/deployment", deployment::create);
        post.add("/deployment/:application/restart", deployment::restart);
        post.add("/webhook", webhook::push);
        // DELETE
        delete.add("/deployment/:application", deployment::delete);

        Router {
            routes: vec![
                (tiny_http::Method::Get, get),
                (tiny_http::Method::Post, post),
                (tiny_http::Method::Delete, delete),
            ],
        }
    }

    /// Dispatch `request`; `None` when no route matches its method and path.
    pub fn handle(
        &self,
        request: &mut tiny_http::Request,
        context: &Context,
    ) -> Option<Response<io::Cursor<Vec<u8>>>> {
        let path = request.url().split('?').next().unwrap_or_default().to_string();
        let (_, routes) = self
            .routes
            .iter()
            .find(|(method, _)| method == request.method())?;
        let matched = routes.recognize(&path).ok()?;

        Some(
            matched.handler()(request, matched.params(), context).unwrap_or_else(|error| {
                error!("{} {} failed: {}", request.method(), path, error);
                Response::from_string(error.to_string())
                    .with_status_code(StatusCode(error.status_code()))
            }),
        )
    }
}

pub(crate) fn json_response(body: String) -> Response<io::Cursor<Vec<u8>>> {
    let response = Response::from_string(body).with_status_code(StatusCode(200));
    match Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

pub(crate) fn empty_response() -> Response<io::Cursor<Vec<u8>>> {
    Response::from_string("").with_status_code(StatusCode(200))
}

pub(crate) fn read_body(request: &mut tiny_http::Request) -> Result<String, ApiError> {
    let mut content = String::new();
    request.as_reader().read_to_string(&mut content)?;
    Ok(content)
}
