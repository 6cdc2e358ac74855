use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use {
    anyhow::anyhow,
    futures::FutureExt,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use chatops_metrics::{counter, dispatch as dispatch_metrics, histogram, labels};

use crate::{
    Error, Result,
    action::Invocation,
    parse::{ParsedMessage, parse},
    registry::ActionRegistry,
    reply::Reply,
};

/// Name that always resolves to the built-in help, even if an action with the
/// same name is registered.
pub const HELP_ACTION: &str = "help";

/// How a single dispatch ended. Either way the user has been sent a reply
/// (unless the action produced nothing), so this is informational.
#[derive(Debug)]
pub enum Outcome {
    /// The action (or help) ran. `value` is what it returned; it was delivered
    /// as the final reply when non-empty.
    Completed { value: Option<String> },
    /// Resolution or the handler failed; the error text was the final reply.
    Failed { error: Error },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Completed { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }
}

/// Turns raw message text into an action invocation.
///
/// Holds no per-dispatch state, so one instance can serve any number of
/// concurrent dispatches.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Parse `raw_text`, run the matching action for `user`, and deliver the
    /// result through `reply`.
    ///
    /// Never fails: resolution and handler errors become the final reply, and
    /// a final reply that cannot be delivered is only logged.
    pub async fn dispatch(&self, raw_text: &str, user: &str, reply: Reply) -> Outcome {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        let parsed = parse(raw_text);
        let action_name = parsed.action_name.clone();
        debug!(user, action = %action_name, variant = reply.variant(), "dispatching message");

        let outcome = match self.resolve_and_run(parsed, user, reply.clone()).await {
            Ok(value) => {
                if let Some(text) = value.as_deref().filter(|v| !v.is_empty()) {
                    deliver_final(&reply, text).await;
                }
                Outcome::Completed { value }
            },
            Err(error) => {
                info!(
                    user,
                    action = %action_name,
                    error_type = error.kind(),
                    error = %error,
                    "dispatch failed"
                );
                deliver_final(&reply, &error.to_string()).await;

                #[cfg(feature = "metrics")]
                counter!(dispatch_metrics::ERRORS_TOTAL, labels::ERROR_TYPE => error.kind())
                    .increment(1);

                Outcome::Failed { error }
            },
        };

        #[cfg(feature = "metrics")]
        {
            let label = if outcome.is_completed() {
                "completed"
            } else {
                "failed"
            };
            counter!(dispatch_metrics::TOTAL, labels::OUTCOME => label).increment(1);
            histogram!(dispatch_metrics::DURATION_SECONDS).record(start.elapsed().as_secs_f64());
        }

        outcome
    }

    async fn resolve_and_run(
        &self,
        parsed: ParsedMessage,
        user: &str,
        reply: Reply,
    ) -> Result<Option<String>> {
        if parsed.action_name == HELP_ACTION {
            return self.registry.help_text(parsed.first_argument()).map(Some);
        }

        if parsed.action_name.is_empty() {
            return Err(Error::Usage);
        }

        let action = self
            .registry
            .lookup(&parsed.action_name)
            .ok_or_else(|| Error::unknown_action(&parsed.action_name))?;

        if parsed.supplied_count() < action.min_arity() {
            return Err(Error::Arity {
                name: parsed.action_name,
                min: action.min_arity(),
            });
        }

        info!(user, action = %action.name(), args = parsed.supplied_count(), "running action");
        let invocation = Invocation {
            user: user.to_string(),
            reply,
            args: parsed.arguments,
        };
        match AssertUnwindSafe(action.handler().call(invocation))
            .catch_unwind()
            .await
        {
            Ok(result) => result.map_err(Error::Handler),
            Err(payload) => {
                error!(
                    user,
                    action = %action.name(),
                    panic = panic_message(payload.as_ref()),
                    "action handler panicked"
                );
                Err(Error::Handler(anyhow!(
                    "`{}` failed unexpectedly.",
                    action.name()
                )))
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

async fn deliver_final(reply: &Reply, text: &str) {
    if let Err(e) = reply.send(text).await {
        warn!(error = %e, "final reply could not be delivered");
    }
}
