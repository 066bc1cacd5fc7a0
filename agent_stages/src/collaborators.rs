//! Trait seams for the collaborators every stage is invoked with (§4.8
//! "collaborators are {LLM provider, Search service, Audit chain}").

use async_trait::async_trait;

use crate::error::{LlmError, StageError};

/// Opaque remote LLM endpoint (§1 Non-goals: designing the LLM itself is
/// out of scope; this crate only programs against its text-in/text-out
/// shape).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

/// Invokes `provider`, parses the response with `parse`, and retries once
/// with a reformatting hint appended to the prompt if parsing fails (§4.8
/// "parse failures trigger one reformatting retry before escalating").
pub async fn complete_and_parse<T>(
    provider: &dyn LlmProvider,
    system_prompt: &str,
    user_prompt: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T, StageError> {
    let first = provider.complete(system_prompt, user_prompt).await?;
    match parse(&first) {
        Ok(value) => return Ok(value),
        Err(reason) => {
            tracing::warn!(reason, "stage output failed schema validation, retrying with reformatting hint");
        }
    }

    let reformat_prompt = format!(
        "{user_prompt}\n\nYour previous response could not be parsed as the required \
         structured format. Respond again, strictly matching the schema, with no \
         additional commentary."
    );
    let second = provider.complete(system_prompt, &reformat_prompt).await?;
    parse(&second).map_err(StageError::SchemaMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyOnce {
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmProvider for FlakyOnce {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(if n == 0 { "not json".to_string() } else { "42".to_string() })
        }
    }

    #[tokio::test]
    async fn retries_once_on_parse_failure() {
        let provider = FlakyOnce { calls: AtomicU32::new(0) };
        let result = complete_and_parse(&provider, "sys", "user", |s| {
            s.parse::<u32>().map_err(|e| e.to_string())
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    struct AlwaysBad;

    #[async_trait]
    impl LlmProvider for AlwaysBad {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            Ok("still not json".to_string())
        }
    }

    #[tokio::test]
    async fn escalates_after_one_retry() {
        let result = complete_and_parse(&AlwaysBad, "sys", "user", |s| {
            s.parse::<u32>().map_err(|e| e.to_string())
        })
        .await;
        assert!(matches!(result, Err(StageError::SchemaMismatch(_))));
    }
}
