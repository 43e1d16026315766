//! Classify every bubble in the open conversations of the running messenger.
//!
//! ```text
//! RUST_LOG=bubblescope=debug cargo run --example scan_chat
//! ```

#[cfg(target_os = "windows")]
fn main() -> anyhow::Result<()> {
    use bubblescope::platforms::{ScreenRegionCapture, UiaControlSource, WindowsInput};
    use bubblescope::{
        ChatView, ClassifierConfig, EdgeScanDetector, NewMessageTracker, Services, WindowRegistry,
    };
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClassifierConfig::from_env()?;
    let source = UiaControlSource::new()?;
    let screenshots = ScreenRegionCapture;
    let detector = EdgeScanDetector::default();
    let input = WindowsInput::new();
    let services = Services {
        screenshots: &screenshots,
        detector: &detector,
        input: &input,
    };

    let mut registry = WindowRegistry::new();
    let windows = registry.discover(&source, &config.class_names)?;
    if windows.is_empty() {
        anyhow::bail!("no messenger window found");
    }

    let mut chats = Vec::new();
    for window in windows {
        match registry.open_chat(window, &config.class_names, None) {
            Ok(chat) => chats.push(chat),
            Err(e) => tracing::warn!("Skipping {}: {}", window, e),
        }
    }

    for chat in chats {
        let view = ChatView::new(&registry, chat, services, &config)?;
        let mut tracker = NewMessageTracker::new();
        for record in tracker.observe(view.messages()?) {
            println!("{:<28} {}", record.type_name(), record);
            let snapshot = record.describe(&registry, &config.markers);
            println!("{}", serde_json::to_string(&snapshot)?);
        }
    }

    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("scan_chat needs the Windows UI Automation backend");
}
