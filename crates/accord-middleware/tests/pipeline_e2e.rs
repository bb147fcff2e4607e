//! End-to-end middleware pipeline tests.
//!
//! Exercise hooks, global stages and route stages together the way the
//! server drives them.

use std::sync::Arc;

use accord_core::{
    HandlerOutcome, HandlerResponse, RequestContext, RequestHead, RequestInput, ResponseBody,
    Route,
};
use accord_middleware::stages::{RequestIdMiddleware, REQUEST_ID_HEADER};
use accord_middleware::{BoxedMiddleware, FnMiddleware, HookError, Pipeline};
use accord_router::Params;
use http::{HeaderMap, HeaderValue, Method, Uri};
use serde_json::json;

fn context(headers: HeaderMap) -> RequestContext {
    let route = Route::post("/posts").build().unwrap();
    let head = RequestHead::new(Method::POST, Uri::from_static("http://localhost/posts"), headers);
    RequestContext::new(
        Arc::new(route),
        Arc::from(vec!["posts".to_string(), "create".to_string()]),
        head,
        Params::new(),
    )
}

fn input(body: serde_json::Value) -> RequestInput {
    RequestInput {
        body,
        ..RequestInput::default()
    }
}

fn pipeline() -> Pipeline {
    Pipeline::builder()
        .stage(RequestIdMiddleware::new())
        .pre_handler(|ctx, _input| {
            let has_key = ctx.request_headers().contains_key("x-api-key");
            Box::pin(async move {
                if has_key {
                    Ok(())
                } else {
                    Err(HookError::unauthorized("missing api key"))
                }
            })
        })
        .build()
}

fn stamp() -> BoxedMiddleware {
    Arc::new(FnMiddleware::new("stamp", |mut input: RequestInput, ctx, next| async move {
        if let serde_json::Value::Object(map) = &mut input.body {
            map.insert("stamped".to_string(), json!(true));
        }
        next.run(input, ctx).await
    }))
}

fn create_handler() -> Arc<dyn accord_core::Handler> {
    Arc::new(|input: RequestInput, _ctx: RequestContext| async move {
        Ok::<_, anyhow::Error>(HandlerResponse::json(201, input.body))
    })
}

fn api_key() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_static("secret"));
    headers
}

#[tokio::test]
async fn test_full_chain() {
    let pipeline = pipeline();
    let chain = pipeline.chain(vec![stamp()], create_handler());
    assert_eq!(chain.stage_names(), vec!["request_id", "stamp"]);

    let ctx = context(api_key());
    let outcome = pipeline
        .process(&chain, input(json!({"title": "Hello"})), ctx.clone())
        .await
        .unwrap();

    assert!(!outcome.is_short_circuit());
    let response = outcome.into_response();
    assert_eq!(response.status, 201);
    assert!(matches!(
        response.body,
        ResponseBody::Json(ref v) if *v == json!({"title": "Hello", "stamped": true})
    ));
    assert!(ctx.response_headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_hook_rejection_skips_stages() {
    let pipeline = pipeline();
    let chain = pipeline.chain(vec![stamp()], create_handler());

    let ctx = context(HeaderMap::new());
    let outcome = pipeline
        .process(&chain, input(json!({})), ctx.clone())
        .await
        .unwrap();

    assert!(matches!(outcome, HandlerOutcome::ShortCircuit(ref r) if r.status == 401));
    assert!(!ctx.response_headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_route_stage_short_circuit() {
    let pipeline = pipeline();
    let gate: BoxedMiddleware = Arc::new(FnMiddleware::new("gate", |_input, _ctx, _next| async move {
        Ok(HandlerOutcome::ShortCircuit(HandlerResponse::json(
            409,
            json!({"message": "exists"}),
        )))
    }));
    let chain = pipeline.chain(vec![gate], create_handler());

    let outcome = pipeline
        .process(&chain, input(json!({})), context(api_key()))
        .await
        .unwrap();
    assert_eq!(outcome.response().status, 409);
}
