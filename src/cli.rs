//! Command-line front end
//!
//! Unrecognized flags are rejected rather than tolerated: `clap`'s derive
//! parser does this by default, so strict flag checking falls out of the
//! crate choice rather than needing extra code.

use std::path::PathBuf;

use clap::Parser;

/// Generate a self-contained C JSON parser from a registered schema.
#[derive(Debug, Parser)]
#[command(name = "jipg", about, version)]
pub struct Cli {
    /// Path to write the generated header to.
    #[arg(long, default_value = "jsonparser.h")]
    pub header: PathBuf,

    /// Path to write the generated source to. Ignored with --single-file.
    #[arg(long, default_value = "jsonparser.c")]
    pub source: PathBuf,

    /// Fold the source body into the header behind an
    /// `#ifdef <BASENAME>_IMPLEMENTATION` guard instead of writing it
    /// separately.
    #[arg(long)]
    pub single_file: bool,

    /// Load generator configuration (type mappings, capacity limits) from
    /// this file instead of the default search locations.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_split_output() {
        let cli = Cli::parse_from(["jipg"]);
        assert_eq!(cli.header, PathBuf::from("jsonparser.h"));
        assert_eq!(cli.source, PathBuf::from("jsonparser.c"));
        assert!(!cli.single_file);
        assert!(cli.config.is_none());
    }

    #[test]
    fn rejects_unknown_flags() {
        let result = Cli::try_parse_from(["jipg", "--bogus-flag"]);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_single_file_and_config_overrides() {
        let cli = Cli::parse_from(["jipg", "--single-file", "--config", "my.toml"]);
        assert!(cli.single_file);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
    }
}
