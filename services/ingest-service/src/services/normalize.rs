//! Description normalization.
//!
//! Raw alert logs get a deterministic language-model cleanup pass before
//! embedding; when the adapter is unreachable the fallback cleaner strips
//! known log-level prefixes and collapses whitespace. The fallback is pure,
//! so a flaky adapter never changes what gets persisted beyond wording.

use crate::state::AppState;
use routing_common::adapters::language_model::CompletionRequest;
use tracing::warn;

const LOG_LEVEL_PREFIXES: &[&str] = &[
    "[ERROR]",
    "[CRITICAL]",
    "[FATAL]",
    "[WARN]",
    "[WARNING]",
    "[INFO]",
    "[DEBUG]",
    "ERROR:",
    "CRITICAL:",
    "FATAL:",
    "WARN:",
];

const CLEANUP_SYSTEM_PROMPT: &str =
    "You clean and normalize raw error logs into concise incident descriptions. \
     Return ONLY the cleaned description, no other text.";

/// Deterministic cleanup: trim, strip leading log-level prefixes, collapse
/// whitespace runs.
pub fn fallback_clean(text: &str) -> String {
    let mut cleaned = text.trim();
    loop {
        let mut stripped = false;
        for prefix in LOG_LEVEL_PREFIXES {
            if let Some(rest) = cleaned.strip_prefix(prefix) {
                cleaned = rest.trim_start();
                stripped = true;
            }
        }
        if !stripped {
            break;
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cleanup_prompt(raw_log: &str, service: &str) -> String {
    format!(
        "Clean and normalize this error log.\n\n\
         Raw log: {raw_log}\n\
         Service: {service}\n\n\
         Rules:\n\
         - Remove noise (timestamps, log levels, irrelevant file paths)\n\
         - Normalize terminology and fix obvious typos\n\
         - Keep the error type, affected component, and severity indicators\n\
         - Keep it concise but informative\n\n\
         Cleaned description:"
    )
}

/// Clean a description for persistence and embedding. With a raw log and a
/// reachable adapter this is a temperature-0 model pass; everything else is
/// the deterministic fallback.
pub async fn clean_description(
    state: &AppState,
    description: &str,
    raw_log: Option<&str>,
    service: &str,
) -> String {
    let Some(raw) = raw_log.filter(|r| !r.trim().is_empty()) else {
        return fallback_clean(description);
    };

    let request =
        CompletionRequest::deterministic(CLEANUP_SYSTEM_PROMPT, cleanup_prompt(raw, service));
    match state.language_model.complete(request).await {
        Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
        Ok(_) => {
            warn!("language model returned an empty cleanup, using fallback");
            fallback_clean(raw)
        }
        Err(err) => {
            warn!("language model cleanup failed ({}), using fallback", err);
            fallback_clean(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bracketed_log_levels() {
        assert_eq!(
            fallback_clean("[ERROR] connection refused to db-1"),
            "connection refused to db-1"
        );
        assert_eq!(fallback_clean("CRITICAL: disk full"), "disk full");
    }

    #[test]
    fn strips_stacked_prefixes() {
        assert_eq!(fallback_clean("[ERROR] ERROR: timeout"), "timeout");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(
            fallback_clean("  500   on\t/v1/users\n\nafter deploy "),
            "500 on /v1/users after deploy"
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(fallback_clean("pod OOMKilled in checkout"), "pod OOMKilled in checkout");
    }

    #[test]
    fn cleanup_is_deterministic() {
        let input = "[WARN]  latency   spike ";
        assert_eq!(fallback_clean(input), fallback_clean(input));
    }
}
