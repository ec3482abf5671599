//! Basic speech synthesis example
//!
//! Needs GOOGLE_CLOUD_API_KEY unless the text is already cached.

use voicebox_spk::{SpeechConfig, SpeechService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut config = SpeechConfig::default();
    config.cache_dir = std::env::temp_dir().join("voicebox-example");

    let service = SpeechService::from_config(config)?;

    let text = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "สวัสดีครับ".to_string());

    println!("Synthesizing speech...");
    match service.speak(&text).await {
        Ok(artifact) => {
            let origin = if artifact.cached { "cache" } else { "provider" };
            println!("{} (from {})", artifact.path.display(), origin);
            println!("served at {}", artifact.url);
        }
        Err(e) => {
            eprintln!("Failed to synthesize speech: {}", e);
        }
    }

    Ok(())
}
