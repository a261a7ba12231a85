//! JavaScript evaluation.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::CdpError;

use super::core::PageSession;

impl PageSession {
    /// Evaluate an expression and return its value by value. Promises are awaited.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Evaluate and deserialize the result.
    pub async fn evaluate_as<T: DeserializeOwned>(&self, expression: &str) -> Result<T, CdpError> {
        let value = self.evaluate(expression).await?;
        Ok(serde_json::from_value(value)?)
    }
}
