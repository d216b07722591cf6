/// HttpAuthority against a mock HTTP server
use serde_json::json;
use std::time::Duration;
use taxalink_core::config::RemoteConfig;
use taxalink_resolve::resilience::RetryPolicyBuilder;
use taxalink_resolve::{
    FailureKind, HttpAuthority, Mapper, MapperOptions, MemoryTaxonStore, ParentRef, RemoteAuthority,
    RetryPolicy, TaxaError, TaxonId,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicyBuilder::from(RetryPolicy::for_network())
        .max_attempts(3)
        .initial_backoff(Duration::from_millis(10))
        .max_backoff(Duration::from_millis(20))
        .with_jitter(false)
        .build()
}

fn authority(server: &MockServer) -> HttpAuthority {
    HttpAuthority::new(&server.uri(), "curator@example.org")
        .unwrap()
        .with_retry_policy(fast_retry())
}

fn human_body() -> serde_json::Value {
    json!({
        "results": {
            "9606": [{
                "id": 9606,
                "parent_id": 9605,
                "rank": "species",
                "name": "Homo sapiens",
                "scientific_name": "Homo sapiens"
            }]
        }
    })
}

#[tokio::test]
async fn test_fetch_taxids_posts_batch_and_parses_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lookup"))
        .and(body_partial_json(json!({
            "kind": "taxid",
            "keys": ["9606", "12345"],
            "email": "curator@example.org",
            "tool": "taxalink"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(human_body()))
        .expect(1)
        .mount(&server)
        .await;

    let found = authority(&server)
        .fetch_taxids(&[TaxonId(9606), TaxonId(12345)])
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    let human = &found[&TaxonId(9606)][0];
    assert_eq!(human.parent, ParentRef::Id(TaxonId(9605)));
    assert_eq!(human.scientific_name, "Homo sapiens");
}

#[tokio::test]
async fn test_accession_requests_carry_db() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lookup"))
        .and(body_partial_json(json!({
            "kind": "accession",
            "keys": ["NM_000546.6"],
            "db": "nucleotide"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {
                "NM_000546.6": [{
                    "id": 9606,
                    "parent_id": 9605,
                    "rank": "species",
                    "name": "Homo sapiens",
                    "scientific_name": "Homo sapiens"
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = authority(&server)
        .fetch_accessions(&["NM_000546.6".to_string()], "nucleotide")
        .await
        .unwrap();
    assert_eq!(found["NM_000546.6"][0].id, TaxonId::HUMAN);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lookup"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(human_body()))
        .expect(1)
        .mount(&server)
        .await;

    let found = authority(&server)
        .fetch_taxids(&[TaxonId(9606)])
        .await
        .unwrap();
    assert!(found.contains_key(&TaxonId(9606)));
}

#[tokio::test]
async fn test_persistent_server_error_surfaces_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = authority(&server)
        .fetch_names(&["Homo sapiens".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, TaxaError::Network(msg) if msg.contains("503")));
}

#[tokio::test]
async fn test_rejected_request_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let err = authority(&server)
        .fetch_taxids(&[TaxonId(9606)])
        .await
        .unwrap_err();
    assert!(matches!(err, TaxaError::Network(msg) if msg.contains("rejected request")));
}

#[tokio::test]
async fn test_mapper_records_remote_failure_per_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let config = RemoteConfig {
        base_url: Some(server.uri()),
        email: Some("curator@example.org".to_string()),
        max_attempts: 2,
        initial_backoff_ms: 5,
        max_backoff_ms: 10,
        ..RemoteConfig::default()
    };
    let mapper = Mapper::new(MemoryTaxonStore::new())
        .with_remote(HttpAuthority::from_config(&config).unwrap())
        .with_options(MapperOptions {
            remote_fallback: true,
            ..MapperOptions::default()
        });

    let query = mapper.map_by_taxid([TaxonId(9606)]).await.unwrap();
    let failure = query.get(&TaxonId(9606)).unwrap().failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Remote);
    assert!(failure.message.contains("rate limited"));
}
