// Package index client tests against a local mock server

use brewtap::api::PypiApi;
use brewtap::error::FormulaError;
use brewtap::release::{DESCRIPTION, FALLBACK_HOMEPAGE, ReleaseMetadata};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHA256: &str = "abc1230000000000000000000000000000000000000000000000000000000def";
const SDIST_URL: &str = "https://files.pythonhosted.org/packages/39/82/kpf-0.1.10.tar.gz";

fn api(server: &MockServer) -> PypiApi {
    PypiApi::with_base_url(server.uri(), Duration::from_secs(5)).unwrap()
}

fn release_body(info: serde_json::Value, urls: serde_json::Value) -> serde_json::Value {
    json!({ "info": info, "urls": urls })
}

fn sdist() -> serde_json::Value {
    json!({
        "packagetype": "sdist",
        "url": SDIST_URL,
        "digests": { "md5": "ignored", "sha256": SHA256 }
    })
}

fn wheel() -> serde_json::Value {
    json!({
        "packagetype": "bdist_wheel",
        "url": "https://files.pythonhosted.org/packages/kpf-0.1.10-py3-none-any.whl",
        "digests": { "sha256": "f".repeat(64) }
    })
}

async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn resolves_latest_version_from_project_endpoint() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/kpf/json",
        ResponseTemplate::new(200).set_body_json(json!({ "info": { "version": "0.2.0" } })),
    )
    .await;

    let version = api(&server).resolve_latest_version("kpf").await.unwrap();
    assert_eq!(version, "0.2.0");
}

#[tokio::test]
async fn project_without_version_is_malformed() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/kpf/json",
        ResponseTemplate::new(200).set_body_json(json!({ "info": { "name": "kpf" } })),
    )
    .await;

    let err = api(&server).resolve_latest_version("kpf").await.unwrap_err();
    assert!(matches!(err, FormulaError::MalformedResponse(_)), "{err}");
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/kpf/json",
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;

    let err = api(&server).resolve_latest_version("kpf").await.unwrap_err();
    assert!(matches!(err, FormulaError::MalformedResponse(_)), "{err}");
}

#[tokio::test]
async fn fetch_release_uses_project_urls_homepage() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/kpf/0.1.10/json",
        ResponseTemplate::new(200).set_body_json(release_body(
            json!({
                "version": "0.1.10",
                "home_page": null,
                "project_urls": { "Homepage": "https://x.test", "Source": "https://src.test" }
            }),
            json!([wheel(), sdist()]),
        )),
    )
    .await;

    let metadata = api(&server).fetch_release("kpf", "0.1.10").await.unwrap();

    assert_eq!(
        metadata,
        ReleaseMetadata {
            version: "0.1.10".to_string(),
            url: SDIST_URL.to_string(),
            sha256: SHA256.to_string(),
            homepage: "https://x.test".to_string(),
            description: DESCRIPTION.to_string(),
        }
    );
}

#[tokio::test]
async fn fetch_release_prefers_home_page_field() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/kpf/0.1.10/json",
        ResponseTemplate::new(200).set_body_json(release_body(
            json!({
                "version": "0.1.10",
                "home_page": "https://home.test",
                "project_urls": { "Homepage": "https://x.test" }
            }),
            json!([sdist()]),
        )),
    )
    .await;

    let metadata = api(&server).fetch_release("kpf", "0.1.10").await.unwrap();
    assert_eq!(metadata.homepage, "https://home.test");
}

#[tokio::test]
async fn fetch_release_falls_back_to_fixed_homepage() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/kpf/0.1.10/json",
        ResponseTemplate::new(200).set_body_json(release_body(
            json!({ "version": "0.1.10" }),
            json!([sdist()]),
        )),
    )
    .await;

    let metadata = api(&server).fetch_release("kpf", "0.1.10").await.unwrap();
    assert_eq!(metadata.homepage, FALLBACK_HOMEPAGE);
}

#[tokio::test]
async fn release_without_sdist_fails() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/kpf/0.1.10/json",
        ResponseTemplate::new(200).set_body_json(release_body(
            json!({ "version": "0.1.10" }),
            json!([wheel()]),
        )),
    )
    .await;

    let err = api(&server).fetch_release("kpf", "0.1.10").await.unwrap_err();
    assert!(matches!(err, FormulaError::NoSourceDistribution { .. }), "{err}");
}

#[tokio::test]
async fn release_file_without_digest_is_malformed() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/kpf/0.1.10/json",
        ResponseTemplate::new(200).set_body_json(release_body(
            json!({ "version": "0.1.10" }),
            json!([{ "packagetype": "sdist", "url": SDIST_URL, "digests": {} }]),
        )),
    )
    .await;

    let err = api(&server).fetch_release("kpf", "0.1.10").await.unwrap_err();
    assert!(matches!(err, FormulaError::MalformedResponse(_)), "{err}");
}

#[tokio::test]
async fn unknown_release_is_not_found() {
    let server = MockServer::start().await;
    mount(&server, "/kpf/9.9.9/json", ResponseTemplate::new(404)).await;

    let err = api(&server).fetch_release("kpf", "9.9.9").await.unwrap_err();
    assert!(matches!(err, FormulaError::NotFound(ref what) if what == "kpf 9.9.9"));
}

#[tokio::test]
async fn server_error_is_a_network_error() {
    let server = MockServer::start().await;
    mount(&server, "/kpf/json", ResponseTemplate::new(503)).await;

    let err = api(&server).resolve_latest_version("kpf").await.unwrap_err();
    assert!(matches!(err, FormulaError::Network(_)), "{err}");
}

#[tokio::test]
async fn slow_index_times_out_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/kpf/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "info": { "version": "0.2.0" } }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let api = PypiApi::with_base_url(server.uri(), Duration::from_millis(200)).unwrap();
    let err = api.resolve_latest_version("kpf").await.unwrap_err();

    match err {
        FormulaError::Network(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/kpf/json",
        ResponseTemplate::new(200).set_body_json(json!({ "info": { "version": "1.0.0" } })),
    )
    .await;

    let api = PypiApi::with_base_url(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
    assert_eq!(api.base_url(), server.uri());
    assert_eq!(api.resolve_latest_version("kpf").await.unwrap(), "1.0.0");
}
