/*!
 * Timeout and single-retry execution of external calls.
 *
 * Every collaborator call (LLM, TTS, browser, ffmpeg, pdftotext) goes through
 * [`run_with_policy`] with the [`CallPolicy`] configured for that collaborator.
 */

use log::warn;
use std::future::Future;

use crate::app_config::CallPolicy;
use crate::errors::StageError;

/// Run `call` under the policy's timeout, retrying once if the policy allows it.
///
/// `label` names the call in log output. `on_timeout` builds the stage error
/// reported when an attempt exceeds the timeout.
pub async fn run_with_policy<T, F, Fut>(
    policy: &CallPolicy,
    label: &str,
    on_timeout: impl Fn(String) -> StageError,
    mut call: F,
) -> Result<T, StageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StageError>>,
{
    let attempts = if policy.retry_once { 2 } else { 1 };
    let mut last_error = None;

    for attempt in 1..=attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.backoff()).await;
        }

        let result = tokio::select! {
            result = call() => result,
            _ = tokio::time::sleep(policy.timeout()) => {
                Err(on_timeout(format!("{} timed out after {} seconds", label, policy.timeout_secs)))
            }
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < attempts {
                    warn!("{} failed (attempt {}/{}): {}. Retrying.", label, attempt, attempts, e);
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| on_timeout(format!("{} did not run", label))))
}
