//! Example: Greeter Server
//!
//! A small MCP server with one tool and one prompt.
//!
//! Run with:
//! ```bash
//! cargo run --example greeter_server
//! ```

use twinmcp::prelude::*;

/// Add two numbers.
#[tool(description = "Add two numbers together")]
fn add(a: f64, b: f64) -> String {
    format!("{}", a + b)
}

/// Produce a greeting prompt, with an optional style.
#[prompt(description = "Greet someone", default(style = "friendly"))]
fn greet(name: String, style: String) -> Vec<PromptMessage> {
    vec![PromptMessage::user(format!(
        "Please write a {style} greeting for {name}."
    ))]
}

#[tokio::main]
async fn main() {
    let peer = PeerBuilder::server("greeter-server", "1.0.0")
        .tool(Add)
        .prompt(Greet)
        .instructions("Use 'add' for arithmetic and 'greet' to draft greetings.")
        .connect(StdioTransport::stdio())
        .await
        .expect("failed to start peer");

    peer.closed().await;
}
