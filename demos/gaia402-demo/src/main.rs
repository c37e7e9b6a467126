//! Example: calling an x402 payment-gated Gaia node.
//!
//! Issues a chat completion request and an embeddings request against a
//! protected server. A `402 Payment Required` challenge is handled
//! transparently by the payment middleware.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CLIENT_PRIVATE_KEY` - the signing credential (required)
//! - `SERVER_URL` - the Gaia node base URL (default `http://localhost:3000`)

mod scheme;

use std::env;
use std::process;

use dotenvy::dotenv;
use gaia402_client::{
    ChatCompletionRequest, ChatMessage, EmbeddingsRequest, GaiaClient,
};
use gaia402_reqwest::{PaymentsClient, WithPayments, WithPaymentsBuild};
use gaia402_types::credential::PrivateKey;
use reqwest::Client;

use crate::scheme::PlaceholderScheme;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        println!("Error: {e}");
        process::exit(1)
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let private_key: PrivateKey = env::var("CLIENT_PRIVATE_KEY")
        .map_err(|_| "CLIENT_PRIVATE_KEY is not set")?
        .parse()?;
    let server_url =
        env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let payments = PaymentsClient::new().register(PlaceholderScheme::new(private_key));
    let http = Client::new().with_payments(payments).build();
    let gaia = GaiaClient::from_base_url(&server_url, http)?;

    println!("=== x402 Protected Gaia Node Example ===\n");

    println!("1. Making a chat completion request...");
    chat_with_gaia_node(&gaia).await?;
    println!();

    println!("2. Generating embeddings...");
    generate_embeddings(&gaia).await?;
    println!();

    println!("Done! All requests completed successfully.");

    Ok(())
}

/// Example: chat completions with payment.
async fn chat_with_gaia_node(gaia: &GaiaClient) -> Result<(), Box<dyn std::error::Error>> {
    let request = ChatCompletionRequest {
        model: "llama".to_string(),
        messages: vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("What is the meaning of life?"),
        ],
        temperature: Some(0.7),
    };
    let response = gaia.chat_completions(&request).await?;
    println!("AI Response: {}", response.first_content().unwrap_or_default());
    Ok(())
}

/// Example: embeddings with payment.
async fn generate_embeddings(gaia: &GaiaClient) -> Result<(), Box<dyn std::error::Error>> {
    let request = EmbeddingsRequest {
        model: "text-embedding-ada-002".to_string(),
        input: "The food was delicious and the waiter was very friendly.".into(),
    };
    let response = gaia.embeddings(&request).await?;
    let embedding = response.first_embedding().unwrap_or_default();
    println!("Embedding dimensions: {}", embedding.len());
    println!(
        "First few values: {:?}",
        &embedding[..embedding.len().min(5)]
    );
    Ok(())
}
