//! `crewdesk server` - Start the crewdesk HTTP server.

use crewdesk_server::ServerConfig;

pub async fn run(config: ServerConfig) -> Result<(), String> {
    println!(
        "Starting crewdesk server on {}:{} (data: {})...",
        config.host,
        config.port,
        config.data_dir.display()
    );

    let addr = crewdesk_server::start_server(config).await?;
    println!("crewdesk server listening on http://{}", addr);

    // Keep the process running until interrupted
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    println!("\nShutting down...");
    Ok(())
}
