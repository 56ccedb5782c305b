use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::models::content::ContentPart;
use crate::providers::base::{Provider, Usage};

/// A mock provider that returns pre-configured replies, for tests
pub struct MockProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<ContentPart>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of replies
    pub fn new<S: Into<String>>(replies: Vec<S>) -> Self {
        Self::scripted(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// Replies and failures in the order they should be returned
    pub fn scripted(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// The content of every request received so far
    pub fn requests(&self) -> Vec<Vec<ContentPart>> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, parts: &[ContentPart]) -> Result<(String, Usage)> {
        self.requests
            .lock()
            .map_err(|_| anyhow!("mock provider lock poisoned"))?
            .push(parts.to_vec());

        let next = self
            .replies
            .lock()
            .map_err(|_| anyhow!("mock provider lock poisoned"))?
            .pop_front();
        match next {
            Some(Ok(text)) => Ok((text, Usage::default())),
            Some(Err(message)) => Err(anyhow!(message)),
            // Return empty reply if no more pre-configured replies
            None => Ok((String::new(), Usage::default())),
        }
    }
}
