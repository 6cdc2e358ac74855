//! Integration tests for the slash-command webhook and service routes.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use tokio::net::TcpListener;

use {
    chatops_actions::{ActionDef, ActionRegistry, ActionResult, Dispatcher, Invocation},
    chatops_gateway::{AppState, build_gateway_app},
};

async fn add(inv: Invocation) -> ActionResult {
    let x: i64 = inv.arg(0).unwrap_or_default().parse()?;
    let y: i64 = inv.arg(1).unwrap_or_default().parse()?;
    inv.reply.send(format!("Adding {x} and {y}")).await?;
    Ok(Some((x + y).to_string()))
}

async fn ping(_: Invocation) -> ActionResult {
    Ok(Some("pong".into()))
}

/// Start a test server on an ephemeral port.
async fn start_server() -> SocketAddr {
    let registry = Arc::new(ActionRegistry::new());
    registry
        .register_many(vec![
            ActionDef::new("add")
                .description("Adds two numbers")
                .param("x")
                .param("y")
                .handler(add),
            ActionDef::new("ping").handler(ping),
        ])
        .unwrap();

    let state = AppState::new(Dispatcher::new(registry), Duration::from_secs(2));
    let app = build_gateway_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn post_command(addr: SocketAddr, form: &[(&str, &str)]) -> (u16, String) {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/slack/commands"))
        .form(form)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let addr = start_server().await;
    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn returned_value_is_the_response_body() {
    let addr = start_server().await;
    let (status, body) = post_command(addr, &[
        ("command", "/bot"),
        ("text", "ping"),
        ("user_name", "alice"),
    ])
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, "pong");
}

#[tokio::test]
async fn first_reply_answers_and_result_goes_to_response_url() {
    let mut hooks = mockito::Server::new_async().await;
    let follow_up = hooks
        .mock("POST", "/commands/T1/123")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "response_type": "ephemeral",
            "text": "3",
        })))
        .create_async()
        .await;

    let addr = start_server().await;
    let response_url = format!("{}/commands/T1/123", hooks.url());
    let (status, body) = post_command(addr, &[
        ("command", "/bot"),
        ("text", "add 1 2"),
        ("user_name", "alice"),
        ("response_url", &response_url),
    ])
    .await;

    assert_eq!(status, 200);
    assert_eq!(body, "Adding 1 and 2");

    for _ in 0..100 {
        if follow_up.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    follow_up.assert_async().await;
}

#[tokio::test]
async fn errors_are_answered_with_200() {
    let addr = start_server().await;

    let (status, body) = post_command(addr, &[("text", ""), ("user_name", "alice")]).await;
    assert_eq!(status, 200);
    assert_eq!(body, "Please provide a command. Type `help` for more info");

    let (status, body) = post_command(addr, &[("text", "mul 2 3"), ("user_name", "alice")]).await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        "`mul` is not a recognized command. Type `help` for more info"
    );

    let (status, body) = post_command(addr, &[("text", "add 1"), ("user_name", "alice")]).await;
    assert_eq!(status, 200);
    assert_eq!(body, "`add` requires at least 2 arguments.");
}

#[tokio::test]
async fn help_lists_registered_actions() {
    let addr = start_server().await;

    let (_, body) = post_command(addr, &[("text", "help"), ("user_name", "alice")]).await;
    assert_eq!(body, "`add` `x` `y`\nAdds two numbers\n\n`ping`\n\n");

    let (_, body) = post_command(addr, &[("text", "help add"), ("user_name", "alice")]).await;
    assert_eq!(body, "`add` `x` `y`\nAdds two numbers");

    let (_, body) = post_command(addr, &[("text", "help mul"), ("user_name", "alice")]).await;
    assert_eq!(body, "The command `mul` does not exist.");
}

#[tokio::test]
async fn unreadable_payload_is_still_200() {
    let addr = start_server().await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/slack/commands"))
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.text().await.unwrap(),
        "Could not read the command payload."
    );
}

#[cfg(feature = "metrics")]
#[tokio::test]
async fn metrics_route_is_served() {
    let addr = start_server().await;
    let resp = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}
