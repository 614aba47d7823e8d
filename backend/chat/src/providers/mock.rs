use async_trait::async_trait;
use framescribe_core::{LanguageModel, ScribeError};

/// A mock language provider that returns canned responses.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    echo: bool,
    fail: bool,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            echo: false,
            fail: false,
        }
    }

    /// Always fail, as if the backend were unreachable.
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            echo: false,
            fail: true,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Echo the prompt back, for asserting on what the caller rendered.
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }
}

#[async_trait]
impl LanguageModel for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, ScribeError> {
        if self.fail {
            return Err(ScribeError::unavailable(&self.name, "mock failure"));
        }
        if self.echo {
            return Ok(prompt.to_string());
        }
        Ok(self
            .fixed_response
            .clone()
            .unwrap_or_else(|| "Mock response".to_string()))
    }
}
