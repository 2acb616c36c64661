use chain_lens::errors::ErrorEnvelope;

#[tokio::main]
async fn main() {
    if let Err(e) = chain_lens::cli::run().await {
        let envelope = ErrorEnvelope::from(&e);
        eprintln!(
            "{}",
            serde_json::to_string(&envelope).unwrap_or_else(|_| format!("Error: {e}"))
        );
        std::process::exit(1);
    }
}
