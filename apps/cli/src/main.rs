mod args;
mod config;
mod dirs;
mod positions;

use std::io;
use std::time::Duration;

use args::Command;
use positions::FilePositionSource;
use presence_app::{
    AppPaths, AppState, LedgerOutcome, TickReport, ensure_app_data_dir, resolve_range,
};
use presence_core::{GeoPoint, TrackingPing};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let command = args::parse_args(std::env::args().skip(1)).map_err(|err| {
        eprintln!("{err}");
        args::print_help();
        io::Error::new(io::ErrorKind::InvalidInput, "invalid arguments")
    })?;
    if command == Command::Help {
        args::print_help();
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "presence_cli=info,presence_app=info,presence_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let data_dir = dirs::resolve_data_dir().map_err(io::Error::other)?;
    let paths = AppPaths::new(data_dir);
    ensure_app_data_dir(&paths)?;
    let config = config::load_or_create(&paths.config_path).map_err(io::Error::other)?;
    if config.created {
        println!(
            "Created config at {} (set the office location there).",
            config.file.display()
        );
    }
    tracing::debug!(data_dir = %paths.app_data_dir.display(), "using data dir");

    let app_state = AppState::new(paths.db_path.clone(), config.config.office());
    app_state.initialize()?;

    match command {
        Command::Login { code } => {
            let code = app_state.services.current_employee.login(&code)?;
            println!("Logged in as {code}.");
        }
        Command::Logout => match app_state.services.current_employee.logout()? {
            Some(code) => println!("Logged out {code}."),
            None => println!("Nobody was logged in."),
        },
        Command::WhoAmI => match app_state.services.current_employee.current()? {
            Some(code) => println!("{code}"),
            None => println!("Nobody is logged in."),
        },
        Command::CheckIn => {
            let code = app_state.services.current_employee.require()?;
            let already = app_state
                .services
                .ledger
                .get_employee(&code)?
                .is_some_and(|employee| employee.checked_in);
            if already {
                println!("You already have an active session.");
                return Ok(());
            }
            report_outcome(app_state.services.ledger.check_in(&code)?, "Checked in.");
        }
        Command::CheckOut => {
            let code = app_state.services.current_employee.require()?;
            let active = app_state
                .services
                .ledger
                .get_employee(&code)?
                .is_some_and(|employee| employee.checked_in);
            if !active {
                println!("No active session found. Please check in first.");
                return Ok(());
            }
            report_outcome(app_state.services.ledger.check_out(&code)?, "Checked out.");
        }
        Command::Ping { lat, lng, accuracy } => {
            let code = app_state.services.current_employee.require()?;
            let ping = TrackingPing::evaluated(
                chrono::Utc::now(),
                GeoPoint::new(lat, lng),
                accuracy,
                &app_state.config.office,
            );
            let label = if ping.inside_office {
                "Ping recorded (inside office)."
            } else {
                "Ping recorded (outside office)."
            };
            report_outcome(app_state.services.ledger.record_gps_ping(&code, ping)?, label);
        }
        Command::SignalLost => {
            let code = app_state.services.current_employee.require()?;
            report_outcome(
                app_state.services.ledger.record_signal_lost(&code)?,
                "Signal loss recorded.",
            );
        }
        Command::Status => print_status(&app_state)?,
        Command::Report(params) => {
            let range = resolve_range(&params, chrono::Utc::now())?;
            let sessions = app_state.services.reports.sessions(&range)?;
            if sessions.is_empty() {
                println!("No sessions between {} and {}.", range.start, range.end);
            }
            for summary in sessions {
                println!(
                    "{}\t{}\t{}\t{}m\t{} pings\t{}m outside\tleft {}\tback {}\tsignal lost {}",
                    summary.employee_code,
                    summary.start.to_rfc3339(),
                    summary
                        .end
                        .map(|end| end.to_rfc3339())
                        .unwrap_or_else(|| "open".to_string()),
                    summary.duration_seconds / 60,
                    summary.ping_count,
                    summary.seconds_outside / 60,
                    summary.left_office_count,
                    summary.back_in_office_count,
                    summary.signal_lost_count,
                );
            }
        }
        Command::Watch { positions } => {
            let interval = Duration::from_secs(config.config.poll_interval_secs);
            let source = FilePositionSource::open(&positions)?;
            watch(app_state, source, interval).await?;
        }
        Command::Help => unreachable!("help is handled before startup"),
    }

    Ok(())
}

fn report_outcome(outcome: LedgerOutcome, applied: &str) {
    match outcome {
        LedgerOutcome::Applied => println!("{applied}"),
        LedgerOutcome::UnknownEmployee => println!("Employee is not known on this device."),
        LedgerOutcome::NotCheckedIn => println!("Not checked in, nothing recorded."),
    }
}

fn print_status(app_state: &AppState) -> CliResult {
    let code = app_state.services.current_employee.require()?;
    let Some(employee) = app_state.services.ledger.get_employee(&code)? else {
        println!("{code}: no attendance record.");
        return Ok(());
    };
    let stamp = |value: Option<chrono::DateTime<chrono::Utc>>| {
        value
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    };
    println!(
        "{}: {}",
        employee.code,
        if employee.checked_in {
            "checked in"
        } else {
            "checked out"
        }
    );
    println!("  last check-in:  {}", stamp(employee.last_check_in));
    println!("  last check-out: {}", stamp(employee.last_check_out));
    println!("  last ping:      {}", stamp(employee.last_ping));
    println!("  sessions:       {}", employee.sessions.len());
    if let Some(session) = employee.active_session() {
        println!("  open session:   {} since {}", session.id, session.start.to_rfc3339());
        println!("  pings:          {}", session.pings.len());
        if let Some(ping) = session.last_ping() {
            println!(
                "  position:       {}",
                if ping.inside_office {
                    "inside office"
                } else {
                    "outside office"
                }
            );
        }
        if let Some(event) = session.events.last() {
            println!(
                "  last event:     {} at {}",
                event.kind.as_str(),
                event.timestamp.to_rfc3339()
            );
        }
    }
    let recovery = app_state.services.ledger.recovery();
    tracing::debug!(?recovery, "recovery counters");
    Ok(())
}

async fn watch(app_state: AppState, mut source: FilePositionSource, every: Duration) -> CliResult {
    let monitor = app_state.services.monitor.clone();
    let mut ticker = tokio::time::interval(every);
    println!("Watching every {}s. Press Ctrl+C to stop.", every.as_secs());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = tokio::task::block_in_place(|| monitor.tick(&mut source));
                match report {
                    Ok(TickReport::Pinged { code, ping, degraded }) => {
                        tracing::info!(
                            code = %code,
                            inside_office = ping.inside_office,
                            accuracy = ping.accuracy,
                            degraded,
                            "ping recorded"
                        );
                    }
                    Ok(TickReport::SignalLost { code, error }) => {
                        tracing::warn!(code = %code, error = %error, "signal lost recorded");
                    }
                    Ok(TickReport::Idle(reason)) => {
                        tracing::debug!(?reason, "monitor idle");
                    }
                    // the poller is unattended; storage errors are logged and the next tick retries
                    Err(err) => tracing::error!(error = %err, "monitor tick failed"),
                }
            }
            _ = &mut shutdown => {
                println!("Stopping.");
                break;
            }
        }
    }

    let recovery = app_state.services.ledger.recovery();
    tracing::info!(
        sessions_recovered = recovery.sessions_recovered,
        dangling_pointers_cleared = recovery.dangling_pointers_cleared,
        corrupt_state_resets = recovery.corrupt_state_resets,
        "watch stopped"
    );
    Ok(())
}
