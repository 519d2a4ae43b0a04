use chrono::{TimeZone, Utc};
use deptree::config::RegistryConfig;
use deptree::registry::{NpmRegistryClient, RegistryClient};
use deptree::{PackageKey, RegistryError};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> NpmRegistryClient {
    NpmRegistryClient::new(&RegistryConfig {
        endpoint: server.uri(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn tap_document() -> serde_json::Value {
    json!({
        "name": "tap",
        "dist-tags": { "latest": "0.4.1" },
        "versions": {
            "0.4.0": {
                "name": "tap",
                "version": "0.4.0",
                "dependencies": {
                    "inherits": "*",
                    "glob": "~3.1.14",
                    "yamlish": "*"
                },
                "devDependencies": { "mocha": "^1.0.0" }
            },
            "0.4.1": { "name": "tap", "version": "0.4.1" }
        },
        "time": {
            "created": "2011-01-01T00:00:00.000Z",
            "0.4.0": "2013-02-20T18:10:42.000Z"
        }
    })
}

#[tokio::test]
async fn fetch_normalizes_package_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tap_document()))
        .mount(&server)
        .await;

    let record = client(&server)
        .fetch(&PackageKey::new("tap", "0.4.0"))
        .await
        .unwrap();

    assert_eq!(record.key, PackageKey::new("tap", "0.4.0"));
    assert_eq!(record.dependency_names(), vec!["inherits", "glob", "yamlish"]);
    assert_eq!(record.dependencies[1].range, "~3.1.14");
    assert_eq!(record.dev_dependencies.len(), 1);
    assert_eq!(
        record.created_at,
        Some(Utc.with_ymd_and_hms(2013, 2, 20, 18, 10, 42).unwrap())
    );
}

#[tokio::test]
async fn v_prefixed_version_fetches_plain_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tap_document()))
        .mount(&server)
        .await;

    let record = client(&server)
        .fetch(&PackageKey::new("tap", "v0.4.0"))
        .await
        .unwrap();
    assert_eq!(record.key, PackageKey::new("tap", "0.4.0"));
    assert_eq!(record.dependencies.len(), 3);
}

#[tokio::test]
async fn version_without_dependencies_is_a_leaf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tap_document()))
        .mount(&server)
        .await;

    let record = client(&server)
        .fetch(&PackageKey::new("tap", "0.4.1"))
        .await
        .unwrap();
    assert!(record.dependencies.is_empty());
    assert_eq!(record.created_at, None);
}

#[tokio::test]
async fn unknown_package_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nonexistent-pkg-xyz"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Not found" })))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch(&PackageKey::new("nonexistent-pkg-xyz", "1.0.0"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { .. }));
}

#[tokio::test]
async fn unknown_version_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tap_document()))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch(&PackageKey::new("tap", "9.9.9"))
        .await
        .unwrap_err();
    match err {
        RegistryError::NotFound { name, version } => {
            assert_eq!(name, "tap");
            assert_eq!(version, "9.9.9");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tap"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch(&PackageKey::new("tap", "0.4.0"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Transport(_)));
}

#[tokio::test]
async fn malformed_document_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tap"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch(&PackageKey::new("tap", "0.4.0"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Decode(_)));
}

#[tokio::test]
async fn invalid_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tap_document()))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(matches!(
        client.fetch(&PackageKey::new("", "1.0.0")).await,
        Err(RegistryError::InvalidKey(_))
    ));
    assert!(matches!(
        client.fetch(&PackageKey::new("tap", "^1.0.0")).await,
        Err(RegistryError::InvalidKey(_))
    ));
}

#[tokio::test]
async fn scoped_names_and_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/@types(%2F|/)node$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dist-tags": { "latest": "20.1.0", "next": "21.0.0-beta.1" },
            "versions": {
                "20.0.0": {},
                "20.1.0": { "dependencies": { "undici-types": "~5.26.4" } },
                "21.0.0-beta.1": {}
            }
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let listing = client.versions("@types/node").await.unwrap();
    assert_eq!(listing.name, "@types/node");
    assert_eq!(listing.versions, vec!["20.0.0", "20.1.0", "21.0.0-beta.1"]);
    assert_eq!(listing.dist_tags.get("next").map(String::as_str), Some("21.0.0-beta.1"));

    let record = client
        .fetch(&PackageKey::new("@types/node", "20.1.0"))
        .await
        .unwrap();
    assert_eq!(record.dependency_names(), vec!["undici-types"]);
}
