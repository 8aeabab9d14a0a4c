use crate::api::external::routes::{json_response, HttpResult};
use crate::api::external::Context;

pub fn properties(
    _: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    context: &Context,
) -> HttpResult {
    let properties = context.block_on(context.proxy.cluster_properties())?;
    Ok(json_response(serde_json::to_string(&properties)?))
}
