use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use netpulse::{
    arguments::Arguments,
    config::load_config_from_path,
    connectivity::{ConnectivityMonitor, ConnectivityState, SignalHost, StatusColor},
    logger::{self, LogTag},
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Main entry point for netpulse
///
/// Modes:
/// - `--once`: one user-visible check, print, exit 0 if the endpoint
///   answered, 1 otherwise
/// - default: run the monitor, print every state change, accept host
///   signals on stdin until `quit` or Ctrl-C
#[tokio::main]
async fn main() {
    let args = Arguments::parse();

    match run(args).await {
        Ok(code) => {
            logger::flush();
            std::process::exit(code);
        }
        Err(e) => {
            logger::error(LogTag::System, &format!("{:#}", e));
            logger::flush();
            std::process::exit(2);
        }
    }
}

async fn run(args: Arguments) -> Result<i32> {
    let mut config = load_config_from_path(&args.config)?;

    let (logger_config, warnings) = args.logger_config(&config.logging);
    logger::init(logger_config);
    for warning in warnings {
        logger::warning(LogTag::Config, &warning);
    }

    args.apply_overrides(&mut config);

    // No OS-level signal source; the host starts online and is driven from stdin
    let host = Arc::new(SignalHost::new(true));
    let mut monitor = ConnectivityMonitor::start(&config.monitor, host.clone())
        .context("Failed to start connectivity monitor")?;

    if args.once {
        let state = monitor.recheck().await;
        print_state(&state, args.json);
        monitor.shutdown();
        return Ok(once_exit_code(&state));
    }

    let json = args.json;
    let _subscription = monitor.subscribe(move |state| print_state(state, json));

    logger::info(
        LogTag::System,
        "Type 'help' for commands, 'quit' or Ctrl-C to exit",
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                logger::info(LogTag::System, "Ctrl-C received, shutting down");
                break;
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => {
                        if !handle_command(line.trim(), &host, &monitor, json) {
                            break;
                        }
                    }
                    None => {
                        logger::debug(LogTag::System, "stdin closed, waiting for Ctrl-C");
                        stdin_open = false;
                    }
                }
            }
        }
    }

    monitor.shutdown();
    Ok(0)
}

/// Exit status for `--once`
///
/// A failed probe falls back to the host flag, which this binary cannot
/// observe, so only a confirmed answer (a measured latency) counts as online.
fn once_exit_code(state: &ConnectivityState) -> i32 {
    if state.is_online && state.latency_ms.is_some() {
        0
    } else {
        1
    }
}

/// Apply one stdin command; returns false to quit
fn handle_command(
    command: &str,
    host: &SignalHost,
    monitor: &ConnectivityMonitor,
    json: bool,
) -> bool {
    match command.to_lowercase().as_str() {
        "" => {}
        "online" => host.set_online(true),
        "offline" => host.set_online(false),
        "visible" => host.set_visible(true),
        "hidden" => host.set_visible(false),
        "recheck" => {
            tokio::spawn(monitor.recheck());
        }
        "status" => print_state(&monitor.status(), json),
        "help" => println!("commands: online, offline, visible, hidden, recheck, status, quit"),
        "quit" | "exit" => return false,
        other => logger::warning(
            LogTag::System,
            &format!("Unknown command '{}', type 'help'", other),
        ),
    }
    true
}

fn print_state(state: &ConnectivityState, json: bool) {
    if json {
        match serde_json::to_string(state) {
            Ok(line) => println!("{}", line),
            Err(e) => logger::error(
                LogTag::System,
                &format!("Failed to serialize state: {}", e),
            ),
        }
        return;
    }

    let badge = format!("{:<9}", state.quality_text().to_uppercase());
    let badge = match state.status_color() {
        StatusColor::Success => badge.bright_green().bold(),
        StatusColor::Warning => badge.bright_yellow().bold(),
        StatusColor::Danger => badge.bright_red().bold(),
        StatusColor::Secondary => badge.dimmed(),
    };
    let checked = state
        .last_checked_at
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("{} {} (checked {})", badge, state.status_text(), checked);
}

#[cfg(test)]
mod tests {
    use super::*;
    use netpulse::config::MonitorConfig;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_once_exits_one_when_port_refuses() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = MonitorConfig {
            ping_url: format!("http://{}/api/health", addr),
            timeout_ms: 1000,
            enable_periodic_check: false,
            check_on_start: false,
            ..Default::default()
        };
        let mut monitor =
            ConnectivityMonitor::start(&config, Arc::new(SignalHost::new(true))).unwrap();

        let state = monitor.recheck().await;
        monitor.shutdown();

        assert!(state.is_online, "host flag fallback keeps the state online");
        assert_eq!(state.latency_ms, None);
        assert_eq!(once_exit_code(&state), 1);
    }

    #[test]
    fn test_once_exits_zero_on_confirmed_answer() {
        let mut state = ConnectivityState::initial(true);
        state.latency_ms = Some(80);
        assert_eq!(once_exit_code(&state), 0);

        assert_eq!(once_exit_code(&ConnectivityState::initial(false)), 1);
    }
}
