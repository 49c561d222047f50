use log::LevelFilter;
use std::time::Duration;

/// The league and tournament every view is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolTarget {
    pub league_id: i64,
    pub tournament_id: i64,
}

#[derive(Debug, Default, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// `None` until both ids were given as positive integers.
    pub target: Option<PoolTarget>,
    /// Periodic re-fetch of the active view; off unless `POOL_REFRESH_SECS` is set.
    pub refresh_every: Option<Duration>,
}

impl AppSettings {
    pub fn load(target: Option<PoolTarget>) -> Self {
        let log_level = std::env::var("POOL_LOG").ok();
        let refresh = std::env::var("POOL_REFRESH_SECS").ok();
        Self::from_vars(target, log_level.as_deref(), refresh.as_deref())
    }

    fn from_vars(target: Option<PoolTarget>, log_level: Option<&str>, refresh: Option<&str>) -> Self {
        Self {
            full_screen: false,
            log_level: log_level.and_then(|l| l.trim().parse().ok()),
            target,
            refresh_every: refresh
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliCommand {
    Help,
    Version,
    Run { target: Option<PoolTarget> },
}

/// Parse the arguments after the program name. Unknown flags are an error;
/// missing or non-positive ids only leave the target unset.
pub fn parse_args<I>(args: I) -> Result<CliCommand, String>
where
    I: IntoIterator<Item = String>,
{
    let mut league = None;
    let mut tournament = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-V" | "--version" => return Ok(CliCommand::Version),
            "-l" | "--league" => league = args.next().as_deref().and_then(positive_id),
            "-t" | "--tournament" => tournament = args.next().as_deref().and_then(positive_id),
            other => return Err(format!("Unknown argument: {other}")),
        }
    }

    let target = league
        .zip(tournament)
        .map(|(league_id, tournament_id)| PoolTarget { league_id, tournament_id });
    Ok(CliCommand::Run { target })
}

fn positive_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parses_league_and_tournament() {
        let cmd = parse_args(args(&["--league", "3", "--tournament", "12"])).unwrap();
        assert_eq!(
            cmd,
            CliCommand::Run { target: Some(PoolTarget { league_id: 3, tournament_id: 12 }) }
        );
    }

    #[test]
    fn test_invalid_ids_leave_target_unset() {
        for raw in [
            &["--league", "0", "--tournament", "12"][..],
            &["--league", "abc", "--tournament", "12"],
            &["--league", "3"],
            &["--tournament", "-4", "--league", "3"],
            &[],
        ] {
            assert_eq!(parse_args(args(raw)).unwrap(), CliCommand::Run { target: None });
        }
    }

    #[test]
    fn test_help_and_version_short_circuit() {
        assert_eq!(parse_args(args(&["--league", "1", "-h"])).unwrap(), CliCommand::Help);
        assert_eq!(parse_args(args(&["--version"])).unwrap(), CliCommand::Version);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(parse_args(args(&["--season", "2025"])).is_err());
    }

    #[test]
    fn test_refresh_interval_needs_positive_seconds() {
        let on = AppSettings::from_vars(None, None, Some("45"));
        assert_eq!(on.refresh_every, Some(Duration::from_secs(45)));
        assert_eq!(AppSettings::from_vars(None, None, Some("0")).refresh_every, None);
        assert_eq!(AppSettings::from_vars(None, None, Some("soon")).refresh_every, None);
        assert_eq!(AppSettings::from_vars(None, None, None).refresh_every, None);
    }

    #[test]
    fn test_log_level_parses_names() {
        let settings = AppSettings::from_vars(None, Some("debug"), None);
        assert_eq!(settings.log_level, Some(LevelFilter::Debug));
        assert_eq!(AppSettings::from_vars(None, Some("loud"), None).log_level, None);
    }
}
