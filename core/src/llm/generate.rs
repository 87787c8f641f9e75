use std::future::Future;

use crate::error::{GenerateError, LlmError};

/// Attempt budget used by every generator unless it overrides it.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Strip incidental wrappers the backend tends to add around structured
/// payloads: a UTF-8 BOM, surrounding whitespace, and a markdown code
/// fence with an optional language tag. Idempotent on clean input.
pub fn clean_model_payload(raw: &str) -> String {
    let mut text = raw.trim_start_matches('\u{feff}').trim();

    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = match rest.split_once('\n') {
            // drop a bare language tag left on the fence line
            Some((tag, body))
                if !tag.trim().is_empty()
                    && tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                body
            }
            _ => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim().to_string()
}

/// Run one generative call under a bounded retry loop.
///
/// `call` invokes the backend once; `validate` parses the cleaned text and
/// checks the caller's business rules, returning the typed value or a
/// rejection reason. Transport failures and validation failures consume
/// attempts from the same budget. There is no backoff between attempts;
/// the call itself is bounded by the transport timeout.
pub async fn generate_with_retry<T, C, Fut, V>(
    operation: &str,
    max_attempts: u32,
    mut call: C,
    validate: V,
) -> Result<T, GenerateError>
where
    C: FnMut() -> Fut,
    Fut: Future<Output = Result<String, LlmError>>,
    V: Fn(&str) -> Result<T, String>,
{
    let attempts = max_attempts.max(1);
    let mut last = String::new();

    for attempt in 1..=attempts {
        match call().await {
            Ok(raw) => {
                let cleaned = clean_model_payload(&raw);
                match validate(&cleaned) {
                    Ok(value) => {
                        if attempt > 1 {
                            tracing::debug!(operation, attempt, "generation succeeded after retry");
                        }
                        return Ok(value);
                    }
                    Err(reason) => {
                        tracing::warn!(operation, attempt, %reason, "generated content rejected");
                        last = reason;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(operation, attempt, %err, "model call failed");
                last = err.to_string();
            }
        }
    }

    Err(GenerateError::Exhausted {
        operation: operation.to_string(),
        attempts,
        last,
    })
}
