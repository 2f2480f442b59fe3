//! Parsing Options.
//! `--net {file}` is required; weights come from `--weights {file}` or are estimated from
//! `--log {file}`.

use clap::{Arg, ArgAction, Command, value_parser};
use std::error::Error;

use crate::config::PlayoutConfig;

fn make_options_parser() -> clap::Command {
    let parser = Command::new("pn-playout")
        .no_binary_name(true)
        .args_override_self(true)
        .version("v0.1.0")
        .about("Generate an event log by stochastic playout of a Petri net")
        .arg(
            Arg::new("net")
                .long("net")
                .value_name("FILE")
                .help("Accepting Petri net, JSON or RON (by extension)")
                .required(true),
        )
        .arg(
            Arg::new("weights")
                .short('w')
                .long("weights")
                .value_name("FILE")
                .help("Transition weights keyed by transition name, JSON"),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .value_name("FILE")
                .help("Reference event log (JSON) used to estimate weights"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML playout configuration")
                .default_value("pn-playout.toml"),
        )
        .arg(
            Arg::new("traces")
                .short('n')
                .long("traces")
                .help("Number of traces to generate")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("max-length")
                .short('l')
                .long("max-length")
                .help("Maximum number of events per trace")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("parallel")
                .short('p')
                .long("parallel")
                .help("Simulate traces on all cores")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path to file where the generated log will be stored")
                .default_value("playout.json"),
        )
        .arg(
            Arg::new("save-weights")
                .long("save-weights")
                .value_name("FILE")
                .help("Write the weight model used, given or estimated, to this file"),
        );
    parser
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub net: String,
    pub weights: Option<String>,
    pub log: Option<String>,
    pub config: String,
    pub traces: Option<usize>,
    pub max_length: Option<usize>,
    pub seed: Option<u64>,
    pub parallel: bool,
    pub output: String,
    pub save_weights: Option<String>,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    /// Later occurrences of a flag override earlier ones.
    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let net = matches
            .get_one::<String>("net")
            .cloned()
            .ok_or("missing --net")?;
        let config = matches
            .get_one::<String>("config")
            .cloned()
            .unwrap_or_default();
        let output = matches
            .get_one::<String>("output")
            .cloned()
            .unwrap_or_default();

        Ok(Options {
            net,
            weights: matches.get_one::<String>("weights").cloned(),
            log: matches.get_one::<String>("log").cloned(),
            config,
            traces: matches.get_one::<usize>("traces").copied(),
            max_length: matches.get_one::<usize>("max-length").copied(),
            seed: matches.get_one::<u64>("seed").copied(),
            parallel: matches.get_flag("parallel"),
            output,
            save_weights: matches.get_one::<String>("save-weights").cloned(),
        })
    }

    /// Command-line values take precedence over the configuration file.
    pub fn apply_to(&self, config: &mut PlayoutConfig) {
        if let Some(traces) = self.traces {
            config.no_traces = traces;
        }
        if let Some(max_length) = self.max_length {
            config.max_trace_length = max_length;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.parallel {
            config.parallel = true;
        }
    }
}
