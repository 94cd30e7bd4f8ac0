use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cmc_cli::main_entry().await
}
