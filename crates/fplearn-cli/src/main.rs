use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use fplearn_cli::predict::input::load_predict_config;
use fplearn_cli::predict::predict::run_prediction;
use fplearn_cli::train::input::load_train_config;
use fplearn_cli::train::trainer::run_training;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("FPLEARN_LOG", "error,fplearn=info"))
        .init();

    let matches = Command::new("fplearn")
        .version(clap::crate_version!())
        .about("Fingerprint activity learning - compression and cross-validated classifiers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train the compressor and per-label activity classifiers")
                .arg(
                    Arg::new("config")
                        .help("Path to training configuration file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("input_file")
                        .short('i')
                        .long("input_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the compound CSV. Overrides the input file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output_dir")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Directory that trained artifacts and reports are written to. \
                             Overrides the directory specified in the configuration file.",
                        )
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("compressor_file")
                        .short('c')
                        .long("compressor_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Reuse previously trained compressor weights (*.safetensors) \
                             instead of retraining.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("no_compress")
                        .long("no-compress")
                        .help("Train on raw fingerprints only, without the compressor.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .help("Replace existing artifacts instead of failing on collision.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Score new structures with previously trained models")
                .arg(
                    Arg::new("config")
                        .help("Path to prediction configuration file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("input_file")
                        .short('i')
                        .long("input_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to the compound CSV to score.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to the predictions CSV to write.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("classifier_file")
                        .short('m')
                        .long("model")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to the trained classifier weights (*.safetensors).")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("compressor_file")
                        .short('c')
                        .long("compressor")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the trained compressor weights; required when the \
                             classifier was trained on compressed features.",
                        )
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: &PathBuf = matches.get_one("config").unwrap();
    log::info!("[fplearn] Training from config: {:?}", config_path);

    let config = load_train_config(config_path, matches)?;

    match run_training(&config) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let config_path: &PathBuf = matches.get_one("config").unwrap();
    log::info!("[fplearn] Prediction using config: {:?}", config_path);

    let config = load_predict_config(config_path, matches)?;

    match run_prediction(&config) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
