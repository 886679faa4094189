//! Integration tests for the job API client


use std::collections::BTreeMap;

use job_client::{ClientError, JobApi, JobDescription, JobValue, JobsClient};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use test_utils::{authenticated_session, AUTH_HEADER};

fn client_for(server: &MockServer) -> JobsClient {
    JobsClient::with_client(
        reqwest::Client::new(),
        &format!("{}/jobs", server.uri()),
        authenticated_session(),
    )
}

#[tokio::test]
async fn list_jobs_decodes_array() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(header("Authorization", AUTH_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "j1", "name": "first", "state": "Success"},
            {"id": "j2", "name": "second", "state": "Running"}
        ])))
        .mount(&mock_server)
        .await;

    let jobs = client_for(&mock_server).list_jobs().await.unwrap();
    let ids: Vec<_> = jobs.iter().map(|job| job.id.as_str()).collect();
    assert_eq!(ids, vec!["j1", "j2"]);
    assert_eq!(jobs[1].state.as_deref(), Some("Running"));
}

#[tokio::test]
async fn submit_posts_description_and_returns_job() {
    let mock_server = MockServer::start().await;

    let mut input = BTreeMap::new();
    input.insert("count".to_string(), JobValue::integer(42));
    input.insert("reads".to_string(), JobValue::file("run-1/reads.fastq"));
    let description = JobDescription {
        name: "run-1".to_string(),
        workflow: "cwl/align.cwl".to_string(),
        input,
    };

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("Authorization", AUTH_HEADER))
        .and(body_json(json!({
            "name": "run-1",
            "workflow": "cwl/align.cwl",
            "input": {
                "count": 42,
                "reads": {"class": "File", "path": "run-1/reads.fastq"}
            }
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "j9", "name": "run-1"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let job = client_for(&mock_server)
        .submit_job(&description)
        .await
        .unwrap();
    assert_eq!(job.id, "j9");
}

#[tokio::test]
async fn get_cancel_and_delete_address_the_job() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "j1"})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/jobs/j1/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/jobs/j1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert_eq!(client.get_job("j1").await.unwrap().id, "j1");
    client.cancel_job("j1").await.unwrap();
    client.delete_job("j1").await.unwrap();
}

#[tokio::test]
async fn server_errors_carry_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such job"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).get_job("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("no such job"));
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).list_jobs().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }));
}

#[tokio::test]
async fn job_ids_with_reserved_characters_stay_one_segment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jobs/run%2F1/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server).cancel_job("run/1").await.unwrap();
}
