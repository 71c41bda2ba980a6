//! RHOAM chat binary.

use rhoam_cli::{chat, config};
use rhoam_observer::Agent;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let (config_path, config_source) = config::select_config_path(
        std::env::args().nth(1),
        std::env::var("RHOAM_CONFIG_PATH").ok(),
    );

    let config = config::load_config(Some(&config_path))
        .expect("rhoam config is unusable; fix or remove the file");

    // Logs go to stderr so stdout carries only the chat transcript.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!(
        source = config_source,
        path = config_path.as_str(),
        "using config file"
    );

    let observer = chat::build_observer(&config.observer);
    observer.start();

    let agent = Agent::new(config.agent.id.clone(), config.agent.name.clone());
    if !agent.connect(&observer) {
        tracing::error!(agent_id = agent.id.as_str(), "could not connect user agent");
        observer.stop();
        return;
    }

    let listener_agent = agent.clone();
    observer.subscribe(move |event| {
        if event.sender_id != listener_agent.id {
            listener_agent.listen(event);
        }
        println!("{}", chat::format_approved(event));
    });

    println!(
        "{} connected to observer '{}'. Type 'exit' or 'quit' to leave.",
        agent.name,
        observer.id()
    );

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();
    if let Err(e) = chat::run_chat(&observer, &agent, input, output, shutdown_signal()).await {
        tracing::error!(error = %e, "chat session aborted");
    }

    tracing::info!("rhoam shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, leaving chat"); }
        () = terminate => { tracing::info!("received SIGTERM, leaving chat"); }
    }
}
