//! CLI tool for Recovery Monitor (remon)

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use colored::Colorize;
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "remon")]
#[command(about = "Recovery Monitor: detect phones in PreLoader, fastboot and EDL modes over USB", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enumeration backend: pnp, adb, fastboot, sysfs, command (repeatable)
    #[arg(short, long, global = true)]
    backend: Vec<String>,

    /// Poll interval in seconds
    #[arg(short, long, global = true)]
    interval: Option<f64>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "text", global = true)]
    format: String,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Take one snapshot and classify the attached devices
    Scan,
    /// Watch for devices appearing and disappearing until Ctrl+C
    Monitor {
        /// Do not ring the terminal bell on new devices
        #[arg(long)]
        no_bell: bool,
    },
    /// Wait for a recovery-mode device; exits non-zero if none shows up in time
    Wait {
        /// Seconds to wait before giving up
        #[arg(short, long, default_value_t = 30)]
        timeout: u64,

        /// Mode to wait for: preloader, bootloader, edl, adb (repeatable; default: any recovery mode)
        #[arg(short, long)]
        mode: Vec<String>,
    },
    /// Print a sample configuration file
    Config,
}

#[cfg(feature = "cli")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::init();

    if cli.format != "text" && cli.format != "json" {
        eprintln!("Unknown format '{}'. Supported: text, json", cli.format);
        return Err("Invalid format".into());
    }

    match &cli.command {
        Commands::Config => {
            print!("{}", remonlib::MonitorConfig::sample_toml());
        }
        Commands::Scan => {
            let config = load_config(&cli)?;
            handle_scan(&config, &cli.format)?;
        }
        Commands::Monitor { no_bell } => {
            let mut config = load_config(&cli)?;
            if *no_bell {
                config.bell = false;
            }
            handle_monitor(&config, &cli.format)?;
        }
        Commands::Wait { timeout, mode } => {
            let config = load_config(&cli)?;
            if !handle_wait(&config, &cli.format, *timeout, mode)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Merge the config file (if any) with command-line overrides
#[cfg(feature = "cli")]
fn load_config(cli: &Cli) -> Result<remonlib::MonitorConfig, Box<dyn std::error::Error>> {
    use remonlib::{BackendKind, MonitorConfig};

    let mut config = match &cli.config {
        Some(path) => MonitorConfig::from_toml_file(&path.to_string_lossy())?,
        None => MonitorConfig::default(),
    };

    if !cli.backend.is_empty() {
        config.backends = cli
            .backend
            .iter()
            .map(|b| BackendKind::parse(b))
            .collect::<Result<Vec<_>, _>>()?;
    }

    if let Some(secs) = cli.interval {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(format!("Invalid interval: {}", secs).into());
        }
        config.poll_interval_ms = ((secs * 1000.0).round() as u64).max(1);
    }

    config.validate()?;
    log::debug!("effective configuration: {:?}", config);
    Ok(config)
}

#[cfg(feature = "cli")]
fn handle_scan(
    config: &remonlib::MonitorConfig,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let enumerator = remonlib::enumerator::from_config(config)?;
    let report = remonlib::quick_scan(&enumerator);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "═══ Recovery Devices ═══".cyan().bold());
    println!("  {} {}", "Backend:".white().bold(), report.backend.green());
    if let Some(err) = &report.error {
        println!("  {} {}", "Enumeration failed:".red(), err);
    }

    if report.is_empty() {
        println!("  {}", "No recovery-mode devices detected".yellow());
        return Ok(());
    }

    for device in &report.devices {
        println!("  {} {}", "•".white(), device.description);
    }

    println!();
    for mode in report.modes() {
        if let Some(tool) = mode.tool_hint() {
            println!(
                "  {} {} {}",
                "✓".green().bold(),
                format!("{} detected", mode).green().bold(),
                format!("(use {})", tool).dimmed()
            );
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn handle_monitor(
    config: &remonlib::MonitorConfig,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    use remonlib::{DetectionKind, DeviceEnumerator, DevicePoller, PollEvent, PollerConfig};
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let enumerator = remonlib::enumerator::from_config(config)?;

    if format == "text" {
        println!("{}", "═══ Recovery Monitor ═══".cyan().bold());
        println!(
            "  {} {}",
            "Backend:".white().bold(),
            enumerator.name().green()
        );
        println!(
            "  {} {}ms",
            "Interval:".white().bold(),
            config.poll_interval_ms.to_string().cyan()
        );
        println!();
        println!("{}", "Press Ctrl+C to stop monitoring...".yellow().italic());
        println!();
    }

    // Install Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let bell = config.bell;
    let mut poller = DevicePoller::new(enumerator, PollerConfig::from(config));
    let mut write_error: Option<serde_json::Error> = None;

    let total = poller.run(&running, |event| {
        if format == "json" {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    write_error.get_or_insert(e);
                }
            }
            return;
        }

        match event {
            PollEvent::Detection(d) => {
                let stamp = d.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
                match d.kind {
                    DetectionKind::Appeared => {
                        println!(
                            "[{}] {} {}",
                            stamp.dimmed(),
                            "[+] DETECTED:".green().bold(),
                            d.device
                        );
                        if let Some(tool) = d.mode.tool_hint() {
                            println!(
                                "    {} {}",
                                format!("{} mode", d.mode).yellow().bold(),
                                format!("(use {})", tool).dimmed()
                            );
                        }
                        if bell {
                            print!("\x07");
                            let _ = std::io::stdout().flush();
                        }
                    }
                    DetectionKind::Disappeared => {
                        println!(
                            "[{}] {} {}",
                            stamp.dimmed(),
                            "[-] DISCONNECTED:".red().bold(),
                            d.device
                        );
                    }
                }
            }
            PollEvent::Status {
                timestamp,
                detections,
                devices,
            } => {
                println!(
                    "[{}] {} (devices: {}, detections: {})",
                    timestamp.format("%H:%M:%S").to_string().dimmed(),
                    "Monitoring...".cyan(),
                    devices,
                    detections
                );
            }
        }
    });

    if let Some(e) = write_error {
        return Err(e.into());
    }

    if format == "text" {
        println!();
        println!(
            "{} {}",
            "Monitoring stopped. Total detections:".yellow(),
            total.to_string().bold()
        );
    }
    Ok(())
}

/// Returns false when the timeout passed without a matching device.
#[cfg(feature = "cli")]
fn handle_wait(
    config: &remonlib::MonitorConfig,
    format: &str,
    timeout_secs: u64,
    modes: &[String],
) -> Result<bool, Box<dyn std::error::Error>> {
    use remonlib::{DeviceEnumerator, DeviceMode, DevicePoller, PollerConfig};
    use std::time::Duration;

    let wanted = modes
        .iter()
        .map(|m| DeviceMode::parse(m))
        .collect::<Result<Vec<_>, _>>()?;

    let enumerator = remonlib::enumerator::from_config(config)?;
    if format == "text" {
        println!("{}", "═══ Waiting for Device ═══".cyan().bold());
        println!(
            "  {} {}",
            "Backend:".white().bold(),
            enumerator.name().green()
        );
        println!("  {} {}s", "Timeout:".white().bold(), timeout_secs.to_string().cyan());
        println!();
    }

    let mut poller = DevicePoller::new(enumerator, PollerConfig::from(config));
    let found = poller.wait_for(
        |mode| {
            if wanted.is_empty() {
                mode.is_recovery()
            } else {
                wanted.contains(&mode)
            }
        },
        Duration::from_secs(timeout_secs),
    );

    match (&found, format) {
        (Some(event), "json") => println!("{}", serde_json::to_string(event)?),
        (None, "json") => println!("null"),
        (Some(event), _) => {
            println!("  {} {}", "[+] DETECTED:".green().bold(), event.device);
            if let Some(tool) = event.mode.tool_hint() {
                println!(
                    "    {} {}",
                    format!("{} mode", event.mode).yellow().bold(),
                    format!("(use {})", tool).dimmed()
                );
            }
        }
        (None, _) => println!(
            "  {}",
            format!("No matching device within {}s", timeout_secs).red()
        ),
    }
    Ok(found.is_some())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("remon was built without the \"cli\" feature");
}
