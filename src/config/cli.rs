use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "dm-price-etl")]
#[command(about = "Fetch dm shaving products per category and chart their prices")]
pub struct CliArgs {
    /// Path to TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the output directory from the config
    #[arg(long)]
    pub output_path: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log CPU and memory usage per phase
    #[arg(long)]
    pub monitor: bool,

    /// Dry run - show requests and output files without executing
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_arguments() {
        let args = CliArgs::parse_from(["dm-price-etl"]);
        assert!(args.config.is_none());
        assert!(args.output_path.is_none());
        assert!(!args.verbose);
        assert!(!args.monitor);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_flags_are_parsed() {
        let args = CliArgs::parse_from([
            "dm-price-etl",
            "--config",
            "etl-config.toml",
            "--output-path",
            "./reports",
            "-v",
            "--monitor",
            "--dry-run",
        ]);
        assert_eq!(args.config.as_deref(), Some("etl-config.toml"));
        assert_eq!(args.output_path.as_deref(), Some("./reports"));
        assert!(args.verbose);
        assert!(args.monitor);
        assert!(args.dry_run);
    }
}
