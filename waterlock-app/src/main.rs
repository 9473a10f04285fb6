use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    waterlock_app::run().await?;
    Ok(())
}
