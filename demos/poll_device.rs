use std::env;
use std::error::Error;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use zidoo_rc::{PollCoordinator, PollSettings, ZidooClient, ZidooConfig, ZidooEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    let mut host = env::var("ZIDOO_HOST").ok();
    let mut psk = env::var("ZIDOO_PSK").ok();
    let mut debug_mode = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--debug" | "-d" => debug_mode = true,
            "--psk" if i + 1 < args.len() => {
                psk = Some(args[i + 1].clone());
                i += 1;
            }
            other => host = Some(other.to_string()),
        }
        i += 1;
    }

    let Some(host) = host else {
        println!("Usage: poll_device <host> [--psk <key>] [--debug/-d]");
        println!("  - host: IP address of the player (or set ZIDOO_HOST)");
        println!("  - --psk: pre-shared key, if the player requires one");
        println!("  - --debug or -d: Enable verbose debug logging");
        return Ok(());
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if debug_mode { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = ZidooConfig::new(&host);
    if let Some(psk) = psk.as_deref() {
        config = config.with_psk(psk);
    }

    let client = ZidooClient::new(config)?;
    let handle = PollCoordinator::new(client, PollSettings::default()).spawn();
    let mut events = handle.event_receiver();

    println!("Polling {} (Ctrl+C to stop)", host);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                let Ok(event) = event else { continue };
                let now = chrono::Local::now().format("%H:%M:%S");
                match event {
                    ZidooEvent::StateChanged(state) => println!("[{}] State: {:?}", now, state),
                    ZidooEvent::MediaChanged(record) => println!(
                        "[{}] {:?}: {} ({:?} / {:?} ms)",
                        now,
                        record.source,
                        record.media_title().unwrap_or("-"),
                        record.position_ms,
                        record.duration_ms
                    ),
                    other => println!("[{}] {}", now, other.event_type()),
                }
            }
        }
    }

    let snapshot = handle.snapshot();
    println!("Last state: {:?}, sources: {:?}", snapshot.state, snapshot.source_list);
    handle.shutdown().await?;
    Ok(())
}
