//! Extracts a [`DriverParams`] from parsed `clap::ArgMatches`.
//!
//! One flat command, so there is no per-subcommand `*Args` bridge to
//! build — just the single `*Params`/`from_matches` extraction step.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;

#[derive(Debug, Clone)]
pub struct DriverParams {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub compile_only: bool,
    pub keep: bool,
    pub verbose: u8,
    pub color: ColorChoice,
}

impl DriverParams {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let inputs = matches
            .get_many::<PathBuf>("input")
            .map(|vs| vs.cloned().collect())
            .unwrap_or_default();
        let output = matches.get_one::<PathBuf>("output").cloned();
        let compile_only = matches.get_flag("compile");
        let keep = matches.get_flag("keep");
        let verbose = matches.get_count("verbose");
        let color = match matches.get_one::<String>("color").map(String::as_str) {
            Some("always") => ColorChoice::Always,
            Some("never") => ColorChoice::Never,
            _ => ColorChoice::Auto,
        };
        Self {
            inputs,
            output,
            compile_only,
            keep,
            verbose,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build_command;

    #[test]
    fn defaults_are_empty_inputs_and_auto_color() {
        let matches = build_command("tinker").get_matches_from(["tinker"]);
        let params = DriverParams::from_matches(&matches);
        assert!(params.inputs.is_empty());
        assert!(!params.compile_only);
        assert!(!params.keep);
        assert_eq!(params.verbose, 0);
    }

    #[test]
    fn flags_and_repeated_inputs_are_parsed() {
        let matches = build_command("tinker").get_matches_from([
            "tinker",
            "-c",
            "-o",
            "out.o",
            "-vv",
            "-i",
            "a.bkr",
            "-i",
            "b.bkr",
        ]);
        let params = DriverParams::from_matches(&matches);
        assert_eq!(params.inputs, vec![PathBuf::from("a.bkr"), PathBuf::from("b.bkr")]);
        assert_eq!(params.output, Some(PathBuf::from("out.o")));
        assert!(params.compile_only);
        assert_eq!(params.verbose, 2);
    }
}
