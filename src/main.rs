use benchlink::{
    channels, init_logging, BenchConfig, Command, ConnectionManager, ConnectionParams, LinkEvent,
    PollerConfig, Sample, SampleSink, SerialTransport, TelemetryPoller,
};
use std::sync::Arc;

/// Prints each accepted sample as append-only log rows:
/// `timestamp - reading type: value`, one row per reading.
struct StdoutSink;

impl SampleSink for StdoutSink {
    fn on_sample(&self, sample: &Sample) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        for (label, value) in sample.readings() {
            println!("{} - {}: {}", stamp, label, value);
        }
    }
}

fn usage() -> ! {
    eprintln!("Usage: benchlink <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list                     List available serial ports");
    eprintln!("  monitor <port> [baud]    Connect and stream decoded telemetry");
    std::process::exit(2);
}

fn list() -> anyhow::Result<()> {
    let ports = benchlink::list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }
    for port in ports {
        println!("{}\t{}", port.port_name, port.description);
    }
    Ok(())
}

async fn monitor(port: String, baud: Option<u32>) -> anyhow::Result<()> {
    let config = BenchConfig::load_or_default()?;

    let params = ConnectionParams {
        port,
        baud_rate: baud.unwrap_or(config.connection.baud_rate),
        settle_delay_ms: config.connection.settle_delay_ms,
        ..Default::default()
    };

    let manager = Arc::new(ConnectionManager::new(Box::new(SerialTransport::new())));
    let mut events = manager.subscribe();
    manager.connect(&params)?;

    let mut poller = TelemetryPoller::start(
        manager.clone(),
        PollerConfig {
            interval_ms: config.connection.poll_interval_ms,
            window_s: config.display.window_s,
        },
    );
    poller.register_sink(Arc::new(StdoutSink));

    println!("Monitoring {} (Ctrl-C to stop)...", params.port);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                match event {
                    Ok(LinkEvent::Status(status)) => println!("[status] {}", status.raw),
                    Ok(LinkEvent::Error(msg)) => {
                        eprintln!("link error: {}", msg);
                        break;
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // Make sure the motor is not left spinning when the console goes away.
    if let Err(e) = manager.send_command(&Command::Stop) {
        tracing::warn!("Could not send stop on shutdown: {}", e);
    }
    println!(
        "Session motor time: {} ({} thrust points)",
        poller.session_formatted(),
        poller.series(channels::THRUST).len()
    );

    poller.stop();
    manager.disconnect();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("list") => list(),
        Some("monitor") => {
            let Some(port) = args.get(1).cloned() else {
                usage();
            };
            let baud = match args.get(2) {
                Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
                    anyhow::anyhow!("invalid baud rate: {}", raw)
                })?),
                None => None,
            };
            monitor(port, baud).await
        }
        _ => usage(),
    }
}
