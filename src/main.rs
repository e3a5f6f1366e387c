#[tokio::main]
async fn main() -> std::io::Result<()> {
    prompter_server::run_with_config().await
}
