#![warn(non_snake_case)]

use anyhow::{Context, Result};

use pn_playout::PlayoutConfig;
use pn_playout::event_log::EventLog;
use pn_playout::net::AcceptingNet;
use pn_playout::net::io::{read_by_extension, read_json, write_json};
use pn_playout::options::Options;
use pn_playout::playout::Playout;
use pn_playout::stochastic::WeightFile;

fn main() -> Result<()> {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let mut flags = shellwords::split(&std::env::var("PN_PLAYOUT_FLAGS").unwrap_or_default())
        .context("Failed to split PN_PLAYOUT_FLAGS")?;
    log::debug!("options from environment: {:?}", flags);

    for (i, arg) in std::env::args_os().enumerate().skip(1) {
        let arg = arg
            .into_string()
            .map_err(|arg| anyhow::anyhow!("Argument {i} is not valid Unicode: {arg:?}"))?;
        flags.push(arg);
    }
    let options = match Options::parse_from_args(&flags) {
        Ok(options) => options,
        Err(e) => match e.downcast_ref::<clap::Error>() {
            Some(e) => e.exit(),
            None => anyhow::bail!("{e}"),
        },
    };
    log::debug!("{:?}", options);

    let mut config = PlayoutConfig::load_from_file(&options.config)?;
    options.apply_to(&mut config);

    let accepting: AcceptingNet = read_by_extension(&options.net)
        .with_context(|| format!("Failed to read net: {}", options.net))?;
    let net = &accepting.net;
    let initial_marking = accepting.initial_marking();

    let weights = match &options.weights {
        Some(path) => {
            let file: WeightFile =
                read_json(path).with_context(|| format!("Failed to read weights: {path}"))?;
            Some(file.resolve(net)?)
        }
        None => None,
    };
    let reference_log: Option<EventLog> = match &options.log {
        Some(path) => {
            Some(read_json(path).with_context(|| format!("Failed to read log: {path}"))?)
        }
        None => None,
    };

    let mut playout = Playout::new(net, &initial_marking);
    if let Some(final_marking) = &accepting.final_marking {
        playout = playout.final_marking(final_marking);
    }
    if let Some(weights) = &weights {
        playout = playout.weights(weights);
    }
    if let Some(reference_log) = &reference_log {
        playout = playout.reference_log(reference_log);
    }
    let result = playout.run(&config)?;

    write_json(&options.output, &result.log)
        .with_context(|| format!("Failed to write log: {}", options.output))?;
    log::info!("log written to {}", options.output);
    if let Some(path) = &options.save_weights {
        write_json(path, &WeightFile::from_map(&result.weights, net))
            .with_context(|| format!("Failed to write weights: {path}"))?;
        log::info!("weights written to {path}");
    }
    println!(
        "{} traces, {} events (seed {}): {} stopped by choice, {} by deadlock, {} by length limit",
        result.summary.traces,
        result.summary.events,
        result.seed,
        result.summary.stopped_by_choice,
        result.summary.stopped_by_deadlock,
        result.summary.stopped_by_length_limit
    );
    Ok(())
}
