use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Bind address from the first argument, or SALESBOARD_ADDR, or default.
    let addr = env::args()
        .nth(1)
        .or_else(|| env::var("SALESBOARD_ADDR").ok())
        .unwrap_or_else(|| "127.0.0.1:3000".to_string());

    salesboard::app::run(&addr).await?;

    Ok(())
}
