// =============================================================================
// Command-line parsing — `market-snapshot <SYMBOL> [info]`
// =============================================================================

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Lightweight price / book view.
    Info { symbol: String },
    /// Full snapshot, persisted to disk.
    Snapshot { symbol: String },
}

pub const USAGE: &str = "
Market Snapshot - Binance Public Market Data Analytics

Usage:
  market-snapshot <symbol>        Create comprehensive snapshot
  market-snapshot <symbol> info   Show basic info only

Examples:
  market-snapshot ETHUSDT
  market-snapshot BTCUSDT info
  market-snapshot BNBUSDT

Supported: Any Binance trading pair (e.g., ETHUSDT, BTCUSDT, SOLUSDT)
";

/// Parse arguments, excluding the program name.
///
/// The symbol is upper-cased; any mode other than `info` means a full
/// snapshot.
pub fn parse_args<I>(args: I) -> Command
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();

    let Some(first) = args.next() else {
        return Command::Help;
    };

    let symbol = first.trim().to_uppercase();
    if symbol.is_empty() || matches!(symbol.as_str(), "HELP" | "-H" | "--HELP") {
        return Command::Help;
    }

    match args.next().map(|m| m.to_lowercase()).as_deref() {
        Some("info") => Command::Info { symbol },
        _ => Command::Snapshot { symbol },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_prints_help() {
        assert_eq!(parse(&[]), Command::Help);
    }

    #[test]
    fn help_tokens_any_case() {
        for token in ["help", "HELP", "-h", "-H", "--help", "--Help"] {
            assert_eq!(parse(&[token]), Command::Help, "{token}");
        }
    }

    #[test]
    fn symbol_is_uppercased_and_defaults_to_snapshot() {
        assert_eq!(
            parse(&["ethusdt"]),
            Command::Snapshot {
                symbol: "ETHUSDT".into()
            }
        );
    }

    #[test]
    fn info_mode() {
        assert_eq!(
            parse(&["btcusdt", "INFO"]),
            Command::Info {
                symbol: "BTCUSDT".into()
            }
        );
    }

    #[test]
    fn unknown_mode_runs_snapshot() {
        assert_eq!(
            parse(&["SOLUSDT", "full"]),
            Command::Snapshot {
                symbol: "SOLUSDT".into()
            }
        );
    }
}
