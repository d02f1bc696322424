#[tokio::main]
async fn main() -> anyhow::Result<()> {
    webminer_cli::cli::run().await
}
