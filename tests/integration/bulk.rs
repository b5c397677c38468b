//! Bulk API 2.0 round trips against a live org.

use std::time::Duration;

use super::common::{require_credentials, unique_name};
use sf_bulkjobs::{ids_payload, BulkApiClient, BulkOperation, JobKind, JobState};

fn client() -> Option<BulkApiClient> {
    let creds = require_credentials()?;
    Some(
        BulkApiClient::from_credentials(&creds)
            .expect("Failed to create Bulk client")
            .with_poll_interval(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(600)),
    )
}

#[tokio::test]
async fn test_bulk_insert_query_delete_lifecycle() {
    let Some(client) = client() else { return };
    let name = unique_name("Lifecycle");

    let csv_data = format!("Name,Industry\n{name} 1,Technology\n{name} 2,Manufacturing\n");
    let outcome = client
        .execute_ingest_with_results("Account", BulkOperation::Insert, csv_data, None)
        .await
        .expect("Bulk insert should succeed");

    assert_eq!(outcome.summary.state, JobState::JobComplete);
    assert_eq!(outcome.summary.records_processed, 2, "Should process 2 records");
    assert_eq!(outcome.summary.records_failed, 0, "Should have 0 failures");
    let ids: Vec<String> = outcome
        .results
        .successful_ids()
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(ids.len(), 2);

    let rows = client
        .execute_query(
            &format!("SELECT Id, Name FROM Account WHERE Name LIKE '{name}%' ORDER BY Name"),
            false,
        )
        .await
        .expect("Bulk query should succeed");
    assert_eq!(rows.len(), 2);
    assert!(rows[0]["Name"].ends_with(" 1"));

    let payload = ids_payload(&ids).expect("ids payload");
    let summary = client
        .execute_ingest("Account", BulkOperation::Delete, payload, None)
        .await
        .expect("Bulk delete should succeed");
    assert_eq!(summary.records_processed, 2);
}

#[tokio::test]
async fn test_bulk_insert_reports_row_failures() {
    let Some(client) = client() else { return };

    // Contact requires LastName; the second row is rejected per row, not per job.
    let name = unique_name("Contact");
    let csv_data = format!("LastName,FirstName\n{name},Ada\n,Nobody\n");
    let outcome = client
        .execute_ingest_with_results("Contact", BulkOperation::Insert, csv_data, None)
        .await
        .expect("job itself should complete");

    assert_eq!(outcome.summary.records_failed, 1);
    assert_eq!(outcome.results.errors().len(), 1);
    assert!(outcome.results.errors()[0].contains("REQUIRED_FIELD_MISSING"));

    let ids = outcome.results.successful_ids();
    let payload = ids_payload(ids).expect("ids payload");
    let _ = client
        .execute_ingest("Contact", BulkOperation::Delete, payload, None)
        .await;
}

#[tokio::test]
async fn test_bulk_query_invalid_field_fails() {
    let Some(client) = client() else { return };

    let err = client
        .execute_query("SELECT Definitely_Not_A_Field__c FROM Account", false)
        .await
        .expect_err("query with an unknown field must fail");

    assert!(err.is_remote() || err.is_job_failed(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_list_query_jobs() {
    let Some(client) = client() else { return };

    client
        .execute_query("SELECT Id FROM Account LIMIT 1", false)
        .await
        .expect("Bulk query should succeed");

    let jobs = client
        .jobs()
        .list_jobs(JobKind::Query)
        .await
        .expect("list jobs should succeed");
    assert!(!jobs.is_empty());
}
