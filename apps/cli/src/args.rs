use std::path::PathBuf;

use presence_app::RangeParams;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { code: String },
    Logout,
    WhoAmI,
    CheckIn,
    CheckOut,
    Ping { lat: f64, lng: f64, accuracy: f64 },
    SignalLost,
    Status,
    Report(RangeParams),
    Watch { positions: PathBuf },
    Help,
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "login" => {
            let code = args
                .next()
                .ok_or_else(|| "missing employee code for login".to_string())?;
            no_more(args)?;
            Ok(Command::Login { code })
        }
        "logout" => no_more(args).map(|_| Command::Logout),
        "whoami" => no_more(args).map(|_| Command::WhoAmI),
        "check-in" => no_more(args).map(|_| Command::CheckIn),
        "check-out" => no_more(args).map(|_| Command::CheckOut),
        "signal-lost" => no_more(args).map(|_| Command::SignalLost),
        "status" => no_more(args).map(|_| Command::Status),
        "ping" => {
            let mut lat = None;
            let mut lng = None;
            let mut accuracy = 0.0;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--lat" => lat = Some(parse_f64(&arg, args.next())?),
                    "--lng" => lng = Some(parse_f64(&arg, args.next())?),
                    "--accuracy" => accuracy = parse_f64(&arg, args.next())?,
                    _ => return Err(format!("unknown argument: {arg}")),
                }
            }
            let lat = lat.ok_or_else(|| "missing --lat".to_string())?;
            let lng = lng.ok_or_else(|| "missing --lng".to_string())?;
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(format!("coordinates out of range: {lat}, {lng}"));
            }
            Ok(Command::Ping { lat, lng, accuracy })
        }
        "report" => {
            let mut params = RangeParams::default();
            while let Some(arg) = args.next() {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for {arg}"))?;
                match arg.as_str() {
                    "--range" => params.range = Some(value),
                    "--start" => params.start = Some(value),
                    "--end" => params.end = Some(value),
                    _ => return Err(format!("unknown argument: {arg}")),
                }
            }
            Ok(Command::Report(params))
        }
        "watch" => {
            let mut positions = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--positions" => {
                        let value = args
                            .next()
                            .ok_or_else(|| "missing value for --positions".to_string())?;
                        positions = Some(PathBuf::from(value));
                    }
                    _ => return Err(format!("unknown argument: {arg}")),
                }
            }
            let positions = positions.ok_or_else(|| "missing --positions".to_string())?;
            Ok(Command::Watch { positions })
        }
        "--help" | "-h" | "help" => Ok(Command::Help),
        _ => Err(format!("unknown command: {command}")),
    }
}

fn no_more(mut args: impl Iterator<Item = String>) -> Result<(), String> {
    match args.next() {
        Some(arg) => Err(format!("unknown argument: {arg}")),
        None => Ok(()),
    }
}

fn parse_f64(flag: &str, value: Option<String>) -> Result<f64, String> {
    let value = value.ok_or_else(|| format!("missing value for {flag}"))?;
    let parsed = value
        .parse::<f64>()
        .map_err(|_| format!("invalid value for {flag}: {value}"))?;
    if !parsed.is_finite() {
        return Err(format!("invalid value for {flag}: {value}"));
    }
    Ok(parsed)
}

pub fn print_help() {
    println!(
        "Presence Tracker CLI\n\n\
Usage:\n  presence-tracker <command> [options]\n\n\
Commands:\n  login <code>                 Remember the employee using this device\n  logout                       Forget the employee using this device\n  whoami                       Show the employee using this device\n  check-in                     Start (or keep) the attendance session\n  check-out                    Close the attendance session\n  ping --lat <deg> --lng <deg> [--accuracy <m>]\n                               Record one location sample\n  signal-lost                  Record that no location sample was available\n  status                       Show check-in state and the open session\n  report [--range <name>] [--start <rfc3339>] [--end <rfc3339>]\n                               Summarize sessions (today, last7days, last14days, thismonth, alltime)\n  watch --positions <file>     Poll a JSON-lines fix file on the configured interval\n"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn parses_ping_with_defaults() {
        assert_eq!(
            parse(&["ping", "--lat", "30.04", "--lng", "31.23"]),
            Ok(Command::Ping {
                lat: 30.04,
                lng: 31.23,
                accuracy: 0.0
            })
        );
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(parse(&["ping", "--lat", "91", "--lng", "0"]).is_err());
        assert!(parse(&["ping", "--lat", "NaN", "--lng", "0"]).is_err());
    }

    #[test]
    fn parses_report_range() {
        let Ok(Command::Report(params)) = parse(&["report", "--range", "last7days"]) else {
            panic!("expected report");
        };
        assert_eq!(params.range.as_deref(), Some("last7days"));
        assert!(parse(&["report", "--range"]).is_err());
    }

    #[test]
    fn rejects_unknown_commands_and_extra_args() {
        assert!(parse(&["teleport"]).is_err());
        assert!(parse(&["status", "--verbose"]).is_err());
        assert_eq!(parse(&[]), Ok(Command::Help));
    }
}
