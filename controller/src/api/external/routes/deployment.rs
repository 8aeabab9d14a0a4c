use crate::api::external::routes::{empty_response, json_response, read_body, HttpResult};
use crate::api::external::Context;
use definition::ServiceDescriptor;
use tracing::{debug, info};

pub fn list(
    _: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    context: &Context,
) -> HttpResult {
    let applications = context.block_on(context.proxy.list())?;
    debug!("{} application(s) found", applications.len());
    Ok(json_response(serde_json::to_string(&applications)?))
}

pub fn create(
    request: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    context: &Context,
) -> HttpResult {
    let content = read_body(request)?;
    let service: ServiceDescriptor = serde_json::from_str(&content)?;
    service.validate()?;

    info!("Deploying {}", service);
    context.block_on(context.proxy.deploy(&service))?;
    Ok(empty_response())
}

pub fn delete(
    _: &mut tiny_http::Request,
    params: &route_recognizer::Params,
    context: &Context,
) -> HttpResult {
    let name = params.find("application").unwrap_or_default();
    context.block_on(context.proxy.delete(name))?;
    Ok(empty_response())
}

pub fn restart(
    _: &mut tiny_http::Request,
    params: &route_recognizer::Params,
    context: &Context,
) -> HttpResult {
    let name = params.find("application").unwrap_or_default();
    context.block_on(context.proxy.restart(name))?;
    Ok(empty_response())
}

#[cfg(test)]
mod tests {
    use crate::api::external::routes::tests::call;
    use crate::kubernetes::tags;
    use crate::tests::fixtures::{server, unmanaged_deployment, TestServer};
    use crate::tests::memory::Fault;
    use rstest::rstest;
    use serde_json::{json, Value};
    use tiny_http::Method;

    const SVC1: &str = r#"{"name":"svc1","image":"nginx:1.0","port":80,"replicas":2,"exposed":false}"#;

    #[rstest]
    fn test_deploy_then_list(server: TestServer) {
        let created = call(&server, Method::Post, "/deployment", SVC1).unwrap();
        assert_eq!(created.status, 200);
        assert!(created.body.is_empty());

        let listed = call(&server, Method::Get, "/deployment", "").unwrap();
        assert_eq!(listed.status, 200);
        let body: Value = serde_json::from_str(&listed.body).unwrap();
        assert_eq!(
            body,
            json!([{
                "name": "svc1",
                "image": "nginx:1.0",
                "port": 80,
                "replicas": 2,
                "exposed": false,
                "ip": ""
            }])
        );
    }

    #[rstest]
    fn test_list_empty(server: TestServer) {
        let listed = call(&server, Method::Get, "/deployment", "").unwrap();
        assert_eq!(listed.status, 200);
        assert_eq!(listed.body, "[]");
    }

    #[rstest]
    fn test_list_failure(server: TestServer) {
        server.fake.deployments.fail_next_list(Fault::Api);
        let listed = call(&server, Method::Get, "/deployment", "").unwrap();
        assert_eq!(listed.status, 400);
    }

    #[rstest]
    fn test_deploy_duplicate(server: TestServer) {
        assert_eq!(call(&server, Method::Post, "/deployment", SVC1).unwrap().status, 200);

        let duplicate = call(&server, Method::Post, "/deployment", SVC1).unwrap();
        assert_eq!(duplicate.status, 409);
        assert_eq!(duplicate.body, "Application svc1 already exist");
        assert_eq!(server.fake.deployments.names(), vec!["svc1"]);
    }

    #[rstest]
    #[case::malformed_json(r#"{"name":"svc1","#)]
    #[case::missing_field(r#"{"name":"svc1","image":"nginx"}"#)]
    #[case::invalid_name(r#"{"name":"Svc_1","image":"nginx","port":80,"replicas":1}"#)]
    #[case::invalid_port(r#"{"name":"svc1","image":"nginx","port":0,"replicas":1}"#)]
    #[case::negative_replicas(r#"{"name":"svc1","image":"nginx","port":80,"replicas":-1}"#)]
    fn test_deploy_rejects_bad_body(server: TestServer, #[case] body: &'static str) {
        let answer = call(&server, Method::Post, "/deployment", body).unwrap();
        assert_eq!(answer.status, 400);
        assert!(server.fake.deployments.names().is_empty());
    }

    #[rstest]
    fn test_deploy_exposed_creates_service(server: TestServer) {
        let body = r#"{"name":"web","image":"nginx","port":8080,"replicas":1,"expose":true}"#;
        assert_eq!(call(&server, Method::Post, "/deployment", body).unwrap().status, 200);
        assert_eq!(server.fake.services.names(), vec!["web"]);
    }

    #[rstest]
    fn test_delete(server: TestServer) {
        call(&server, Method::Post, "/deployment", SVC1).unwrap();

        let deleted = call(&server, Method::Delete, "/deployment/svc1", "").unwrap();
        assert_eq!(deleted.status, 200);
        assert!(server.fake.deployments.names().is_empty());
    }

    #[rstest]
    fn test_delete_missing(server: TestServer) {
        let answer = call(&server, Method::Delete, "/deployment/ghost", "").unwrap();
        assert_eq!(answer.status, 404);
    }

    #[rstest]
    fn test_delete_unmanaged(server: TestServer) {
        server
            .fake
            .deployments
            .insert(unmanaged_deployment("legacy", "nginx:1.0"));

        let answer = call(&server, Method::Delete, "/deployment/legacy", "").unwrap();
        assert_eq!(answer.status, 400);
        assert_eq!(server.fake.deployments.names(), vec!["legacy"]);
    }

    #[rstest]
    fn test_restart(server: TestServer) {
        call(&server, Method::Post, "/deployment", SVC1).unwrap();

        let answer = call(&server, Method::Post, "/deployment/svc1/restart", "").unwrap();
        assert_eq!(answer.status, 200);
        let stored = server.fake.deployments.get_stored("svc1").unwrap();
        assert!(tags::read_tag(&stored, tags::RESTARTED_AT).is_some());
    }

    #[rstest]
    fn test_restart_missing(server: TestServer) {
        let answer = call(&server, Method::Post, "/deployment/ghost/restart", "").unwrap();
        assert_eq!(answer.status, 404);
    }
}
