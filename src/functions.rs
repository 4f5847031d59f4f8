//! Serverless-function calls on the managed backend, and the test-data reset built on them.

use crate::backend::auth_headers;
use crate::config::BackendSettings;
use crate::error::{ConfigError, FunctionError};

/// Run in order by [`FunctionsClient::insert_test_data`]: wipe clients, seed, add contract history.
pub const TEST_DATA_STEPS: [&str; 3] = ["delete-clients", "seed-data", "seed-contract-history"];

#[derive(Clone, Debug)]
pub struct FunctionsClient {
    base: String,
    http: reqwest::Client,
}

impl FunctionsClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .default_headers(auth_headers(&settings.key)?)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(FunctionsClient {
            base: format!("{}/functions/v1", settings.url),
            http,
        })
    }

    /// POST to one function. Any non-2xx answer is an error carrying the response text.
    pub async fn invoke(&self, name: &str) -> Result<serde_json::Value, FunctionError> {
        let fail = |message: String| FunctionError {
            function: name.to_string(),
            message,
        };
        let response = self
            .http
            .post(format!("{}/{}", self.base, name))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| fail(e.to_string()))?;
        if !status.is_success() {
            return Err(fail(if text.is_empty() { status.to_string() } else { text }));
        }
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }

    /// Reset the backend to the reference data set. Stops at the first failing step.
    pub async fn insert_test_data(&self) -> Result<(), FunctionError> {
        for step in TEST_DATA_STEPS {
            tracing::info!(function = step, "invoking");
            self.invoke(step).await?;
        }
        tracing::info!("test data inserted");
        Ok(())
    }
}
