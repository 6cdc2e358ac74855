//! Built-in demo actions.

use {
    anyhow::anyhow,
    chatops_actions::{ActionDef, ActionResult, Invocation},
};

pub fn demo_actions() -> Vec<ActionDef> {
    vec![
        ActionDef::new("add")
            .description("Adds two numbers")
            .param("x")
            .param("y")
            .handler(add),
        ActionDef::new("sub")
            .description("Subtracts two numbers")
            .param("x")
            .param("y")
            .handler(sub),
        ActionDef::new("echo")
            .description("Repeats the text back")
            .optional_param("text")
            .handler(echo),
    ]
}

fn number(inv: &Invocation, index: usize) -> anyhow::Result<(String, i64)> {
    let raw = inv.arg(index).unwrap_or_default().to_string();
    let value = raw
        .parse()
        .map_err(|_| anyhow!("`{raw}` is not a number"))?;
    Ok((raw, value))
}

async fn add(inv: Invocation) -> ActionResult {
    let (x, a) = number(&inv, 0)?;
    let (y, b) = number(&inv, 1)?;
    inv.reply.send(format!("Adding {x} and {y}")).await?;
    let sum = a.checked_add(b).ok_or_else(|| anyhow!("result is out of range"))?;
    Ok(Some(sum.to_string()))
}

async fn sub(inv: Invocation) -> ActionResult {
    let (x, a) = number(&inv, 0)?;
    let (y, b) = number(&inv, 1)?;
    inv.reply.send(format!("Subtracting {x} and {y}")).await?;
    let difference = a.checked_sub(b).ok_or_else(|| anyhow!("result is out of range"))?;
    Ok(Some(difference.to_string()))
}

async fn echo(inv: Invocation) -> ActionResult {
    Ok(inv.arg(0).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use {
        super::*,
        async_trait::async_trait,
        chatops_actions::{ActionRegistry, Dispatcher, Reply, ReplyChannel},
    };

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReplyChannel for Recorder {
        async fn send(&self, message: &str) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    async fn run(text: &str) -> Vec<String> {
        let registry = Arc::new(ActionRegistry::new());
        registry.register_many(demo_actions()).unwrap();
        let recorder = Arc::new(Recorder::default());
        Dispatcher::new(registry)
            .dispatch(text, "alice", Reply::from_arc(recorder.clone()))
            .await;
        recorder.sent.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn add_announces_then_returns_sum() {
        assert_eq!(run("add 1 2").await, vec!["Adding 1 and 2", "3"]);
    }

    #[tokio::test]
    async fn sub_announces_then_returns_difference() {
        assert_eq!(run("sub 5 7").await, vec!["Subtracting 5 and 7", "-2"]);
    }

    #[tokio::test]
    async fn non_numeric_argument_is_reported() {
        assert_eq!(run("add one 2").await, vec!["`one` is not a number"]);
    }

    #[tokio::test]
    async fn echo_repeats_quoted_text() {
        assert_eq!(run(r#"echo "hello there""#).await, vec!["hello there"]);
    }

    #[tokio::test]
    async fn echo_without_text_sends_nothing() {
        assert!(run("echo").await.is_empty());
    }

    #[tokio::test]
    async fn help_lists_demo_actions() {
        assert_eq!(run("help").await, vec![
            "`add` `x` `y`\nAdds two numbers\n\n\
             `sub` `x` `y`\nSubtracts two numbers\n\n\
             `echo` `[text]`\nRepeats the text back\n\n"
        ]);
    }
}
