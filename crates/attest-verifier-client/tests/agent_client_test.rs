//! Contract tests for single-verifier agent endpoints.
//!
//! wiremock stands in for a verifier. Response shapes follow the verifier
//! envelope `{"code", "status", "results"}`, plus the bare payloads some
//! deployments send.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/v2.1/agents/{id}` | `fetch_agent_*` |
//! | GET    | `/v2.1/agents` | `fetch_all_*` |
//! | PUT    | `/v2.1/agents/{id}/reactivate` | `reactivate_*` |

use std::time::{Duration, Instant};

use attest_core::{AgentId, HealthTier, OperationalState};
use attest_verifier_client::wire::FETCH_ERROR_FIELD;
use attest_verifier_client::{VerifierClient, VerifierConfig, VerifierError};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> VerifierClient {
    let config = VerifierConfig {
        retry_base_delay_ms: 1,
        ..VerifierConfig::for_url(server.uri())
    };
    VerifierClient::new(config).unwrap()
}

// ── GET /v2.1/agents/{id} ────────────────────────────────────────────

#[tokio::test]
async fn fetch_agent_maps_registered_to_green() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/agent-123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"operational_state": "Registered"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let rec = client
        .fetch_agent(&server.uri(), &AgentId::new("agent-123"))
        .await
        .unwrap();

    assert_eq!(rec.agent_id.as_str(), "agent-123");
    assert_eq!(rec.state, OperationalState::Registered);
    assert_eq!(rec.health(), HealthTier::Green);
    assert_eq!(rec.verifier_url, server.uri());
}

#[tokio::test]
async fn fetch_agent_reads_enveloped_numeric_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/node-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "status": "Success",
            "results": {
                "operational_state": 7,
                "attestation_count": 41,
                "last_received_quote": 1_768_478_400,
                "hash_alg": "sha256"
            }
        })))
        .mount(&server)
        .await;

    let rec = test_client(&server)
        .fetch_agent(&server.uri(), &AgentId::new("node-7"))
        .await
        .unwrap();

    assert_eq!(rec.state, OperationalState::Failed);
    assert_eq!(rec.state_code, Some(7));
    assert_eq!(rec.state_label, "Failed");
    assert_eq!(rec.health(), HealthTier::Red);
    assert_eq!(rec.last_seen.unwrap().timestamp(), 1_768_478_400);
    assert_eq!(rec.raw_field("hash_alg"), Some(&json!("sha256")));
}

#[tokio::test]
async fn fetch_agent_404_is_http_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "status": "agent id not found",
            "results": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch_agent(&server.uri(), &AgentId::new("ghost"))
        .await
        .unwrap_err();

    match err {
        VerifierError::Http {
            status, endpoint, body, ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(endpoint, "GET /v2.1/agents/ghost");
            assert!(body.contains("agent id not found"));
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_agent_500_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/a"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(2000)))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch_agent(&server.uri(), &AgentId::new("a"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    if let VerifierError::Http { body, .. } = err {
        assert!(body.len() <= 515, "body excerpt must be truncated");
    }
}

#[tokio::test]
async fn fetch_agent_non_json_is_deserialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch_agent(&server.uri(), &AgentId::new("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, VerifierError::Deserialization { .. }), "{err:?}");
}

#[tokio::test]
async fn fetch_agent_unreachable_is_transport_error() {
    let config = VerifierConfig {
        timeout_secs: 1,
        max_retries: 1,
        retry_base_delay_ms: 1,
        ..VerifierConfig::for_url("http://127.0.0.1:1")
    };
    let client = VerifierClient::new(config).unwrap();

    let err = client
        .fetch_agent("http://127.0.0.1:1", &AgentId::new("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, VerifierError::Transport { .. }), "{err:?}");
}

#[tokio::test]
async fn fetch_agent_timeout_is_retried_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"operational_state": 3}))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let config = VerifierConfig {
        timeout_secs: 1,
        max_retries: 2,
        retry_base_delay_ms: 1,
        ..VerifierConfig::for_url(server.uri())
    };
    let client = VerifierClient::new(config).unwrap();

    let err = client
        .fetch_agent(&server.uri(), &AgentId::new("slow"))
        .await
        .unwrap_err();
    assert!(matches!(err, VerifierError::Transport { .. }), "{err:?}");
    // MockServer verifies the expected hit count on drop.
}

#[tokio::test]
async fn fetch_agent_uses_configured_api_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3.0/agents/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"operational_state": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let config = VerifierConfig {
        api_version: "v3.0".into(),
        ..VerifierConfig::for_url(server.uri())
    };
    let rec = VerifierClient::new(config)
        .unwrap()
        .fetch_agent(&server.uri(), &AgentId::new("a"))
        .await
        .unwrap();
    assert_eq!(rec.state, OperationalState::Registered);
}

// ── GET /v2.1/agents ─────────────────────────────────────────────────

#[tokio::test]
async fn fetch_all_with_uuid_listing_fetches_each_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "status": "Success",
            "results": {"uuids": [["b-agent", "a-agent"]]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/a-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {"operational_state": 3}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/b-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {"operational_state": 9}
        })))
        .mount(&server)
        .await;

    let records = test_client(&server)
        .fetch_all_agents(&server.uri())
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].agent_id.as_str(), "a-agent");
    assert_eq!(records[0].state, OperationalState::Unknown);
    assert_eq!(records[0].state_label, "Get Quote");
    assert_eq!(records[1].agent_id.as_str(), "b-agent");
    assert_eq!(records[1].state, OperationalState::InvalidQuote);
}

#[tokio::test]
async fn fetch_all_keeps_agents_whose_detail_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"results": {"uuids": ["ok", "bad"]}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"operational_state": 0})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/bad"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let records = test_client(&server)
        .fetch_all_agents(&server.uri())
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    let bad = &records[0];
    assert_eq!(bad.agent_id.as_str(), "bad");
    assert_eq!(bad.state, OperationalState::Unknown);
    assert!(bad.raw_field(FETCH_ERROR_FIELD).is_some());
    assert_eq!(records[1].state, OperationalState::Registered);
}

#[tokio::test]
async fn fetch_all_bounds_concurrent_detail_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {"uuids": ["a1", "a2", "a3", "a4"]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2\.1/agents/a\d$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"operational_state": 3}))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(4)
        .mount(&server)
        .await;

    let config = VerifierConfig {
        retry_base_delay_ms: 1,
        max_concurrent_details: 2,
        ..VerifierConfig::for_url(server.uri())
    };
    let client = VerifierClient::new(config).unwrap();

    let started = Instant::now();
    let records = client.fetch_all_agents(&server.uri()).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(records.len(), 4);
    // Two at a time means two rounds of the 400ms delay.
    assert!(elapsed >= Duration::from_millis(800), "{elapsed:?}");
}

#[tokio::test]
async fn fetch_all_queries_duplicate_ids_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": {"uuids": ["dup", "dup"]}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents/dup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"operational_state": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let records = test_client(&server)
        .fetch_all_agents(&server.uri())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn fetch_all_with_bulk_payloads_needs_no_detail_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "results": {
                "n2": {"operational_state": "Failed"},
                "n1": {"operational_state": "Registered"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = test_client(&server)
        .fetch_all_agents(&server.uri())
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.agent_id.as_str()).collect();
    assert_eq!(ids, vec!["n1", "n2"]);
    assert_eq!(records[1].health(), HealthTier::Red);
}

#[tokio::test]
async fn fetch_all_with_empty_listing_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.1/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": {"uuids": []}})))
        .mount(&server)
        .await;

    let records = test_client(&server)
        .fetch_all_agents(&server.uri())
        .await
        .unwrap();
    assert!(records.is_empty());
}

// ── PUT /v2.1/agents/{id}/reactivate ─────────────────────────────────

#[tokio::test]
async fn reactivate_returns_verifier_answer() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v2.1/agents/agent-1/reactivate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "status": "Success",
            "results": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = test_client(&server)
        .reactivate_agent(&server.uri(), &AgentId::new("agent-1"))
        .await
        .unwrap();
    assert_eq!(answer["status"], "Success");
}

#[tokio::test]
async fn reactivate_with_empty_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v2.1/agents/agent-1/reactivate"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let answer = test_client(&server)
        .reactivate_agent(&server.uri(), &AgentId::new("agent-1"))
        .await
        .unwrap();
    assert!(answer.is_null());
}

#[tokio::test]
async fn reactivate_unknown_agent_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v2.1/agents/ghost/reactivate"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .reactivate_agent(&server.uri(), &AgentId::new("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}
