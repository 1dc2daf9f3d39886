//! `fetch` transport for the API client.

use async_trait::async_trait;
use glycowatch::{ClientError, ClientResult, HttpClient, HttpRequest, HttpResponse};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

fn js_error(context: &str, url: &str, e: JsValue) -> ClientError {
    ClientError::transport(format!("{}: {:?}", context, e)).in_op_with("fetch", url)
}

/// Sends requests through `window.fetch`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchClient;

#[async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse> {
        let headers = Headers::new().map_err(|e| js_error("building headers", &req.url, e))?;
        for (key, value) in &req.headers {
            headers
                .set(key, value)
                .map_err(|e| js_error("setting header", &req.url, e))?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());
        if let Some(body) = &req.body {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(&req.url, &opts)
            .map_err(|e| js_error("building request", &req.url, e))?;

        let window = web_sys::window()
            .ok_or_else(|| ClientError::transport("no window").in_op_with("fetch", &req.url))?;

        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| js_error("network error", &req.url, e))?;
        let response: Response = value
            .dyn_into()
            .map_err(|e| js_error("unexpected fetch result", &req.url, e))?;

        let status = response.status();
        let promise = response
            .text()
            .map_err(|e| js_error("reading body", &req.url, e))?;
        let body = JsFuture::from(promise)
            .await
            .map_err(|e| js_error("reading body", &req.url, e))?
            .as_string()
            .unwrap_or_default();

        Ok(HttpResponse { status, body })
    }
}
