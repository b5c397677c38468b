use sf_bulkjobs_auth::SalesforceCredentials;

/// Session for integration tests, or `None` when the environment has none.
///
/// A session that is present but malformed is a configuration error and
/// panics instead of silently skipping.
pub fn require_credentials() -> Option<SalesforceCredentials> {
    if std::env::var("SF_ACCESS_TOKEN").is_err() && std::env::var("SALESFORCE_ACCESS_TOKEN").is_err()
    {
        eprintln!("skipping: SF_ACCESS_TOKEN is not set");
        return None;
    }

    match SalesforceCredentials::from_env() {
        Ok(creds) => Some(creds),
        Err(e) => panic!(
            "\n\nINTEGRATION TEST CONFIGURATION ERROR: {e}\n\
             Export SF_INSTANCE_URL and SF_ACCESS_TOKEN (e.g. from `sf org display`).\n\n"
        ),
    }
}

/// Name prefix for records created by these tests.
pub fn unique_name(label: &str) -> String {
    format!("BulkJobsIntTest_{label}_{}", chrono::Utc::now().timestamp_millis())
}
