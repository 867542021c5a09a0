//! Command line front-end for the primal heuristic engine.

mod mps;
mod sol;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use primal_heur::{Config, ParamValue, Search};

#[derive(Parser)]
#[command(name = "primal")]
#[command(about = "Primal heuristic engine for mixed-integer programs")]
struct Cli {
    /// MPS instance (.mps, optionally .gz or .bz2 compressed)
    instance: PathBuf,

    /// Wall-clock budget in seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// Write the best solution in SOL format to this path
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Heuristic parameter, as heuristic.param=value (repeatable)
    #[arg(long = "param", value_name = "HEUR.PARAM=VALUE")]
    params: Vec<String>,
}

/// Turn `heur.param=value` strings into configuration triples, guessing the
/// value type from its shape.
fn parse_params(raw: &[String]) -> Result<Config> {
    let mut config = Config::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("parameter {entry:?} is not of the form heur.param=value"))?;
        let (heur, param) = key
            .split_once('.')
            .with_context(|| format!("parameter key {key:?} is not of the form heur.param"))?;

        let value = if let Ok(b) = value.parse::<bool>() {
            ParamValue::Bool(b)
        } else if let Ok(i) = value.parse::<i64>() {
            ParamValue::Int(i)
        } else if let Ok(f) = value.parse::<f64>() {
            ParamValue::Float(f)
        } else {
            ParamValue::Str(value.to_string())
        };

        config.push((heur.to_string(), param.to_string(), value));
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mip = mps::parse(&cli.instance)
        .with_context(|| format!("failed to parse {}", cli.instance.display()))?;
    let mip = Arc::new(mip);

    let config = parse_params(&cli.params)?;
    let mut search = Search::with_default_portfolio(&config)?;

    match search.run(&mip, cli.time_limit)? {
        Some(solution) => {
            let cost = mip.objective_value(&solution);
            log::info!("best solution has objective {cost}");

            match &cli.output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("cannot create {}", path.display()))?;
                    sol::write_sol(&mut BufWriter::new(file), &mip, &solution)?;
                    log::info!("solution written to {}", path.display());
                }
                None => {
                    let stdout = std::io::stdout();
                    sol::write_sol(&mut stdout.lock(), &mip, &solution)?;
                }
            }
        }
        None => log::info!("no solution found"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_types() {
        let config = parse_params(&[
            "lockrounding.max_orderings=2".to_string(),
            "coefdiving.verbose=true".to_string(),
            "fracdiving.bias=0.5".to_string(),
            "boundsol.mode=greedy".to_string(),
        ])
        .unwrap();

        assert_eq!(config[0].2, ParamValue::Int(2));
        assert_eq!(config[1].2, ParamValue::Bool(true));
        assert_eq!(config[2].2, ParamValue::Float(0.5));
        assert_eq!(config[3].2, ParamValue::Str("greedy".into()));
    }

    #[test]
    fn test_parse_params_rejects_malformed() {
        assert!(parse_params(&["no-equals".to_string()]).is_err());
        assert!(parse_params(&["nodot=1".to_string()]).is_err());
    }
}
