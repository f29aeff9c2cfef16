#[tokio::main]
async fn main() {
    let recording = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    if let Err(e) = discovery_sync::run(recording).await {
        eprintln!("discovery-sync: {}", e);
        std::process::exit(1);
    }
}
