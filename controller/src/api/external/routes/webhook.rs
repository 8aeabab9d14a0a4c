use crate::api::external::routes::{json_response, read_body, HttpResult};
use crate::api::external::Context;
use definition::PushEvent;
use serde_json::json;

/// Registry push notification: restart whatever runs the pushed image.
pub fn push(
    request: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    context: &Context,
) -> HttpResult {
    let content = read_body(request)?;
    let event: PushEvent = serde_json::from_str(&content)?;

    let restarted = context.block_on(context.reactor.on_push(event.repo_name(), event.tag()))?;
    Ok(json_response(json!({ "restarted": restarted }).to_string()))
}
