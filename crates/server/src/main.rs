#[tokio::main]
async fn main() -> anyhow::Result<()> {
    meetsense_server::init_tracing();
    meetsense_server::run().await
}
