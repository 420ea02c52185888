mod cli_main;

use std::fs::File;
use std::io::{self, BufWriter};
use std::process;

use clap::Parser;
use cli_main::{Cli, Commands, ReportFormat};
use dnapack::io::manifest::read_source_list;
use dnapack::pipeline::batch::run_batch;
use dnapack::pipeline::decode::decode_file;
use dnapack::pipeline::encode::{process_fastq, remove_artifact, EncodeConfig, EncodeOutcome};
use dnapack::stats::{calculate_stats, format_tsv};
use dnapack::PackError;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Setting tracing default failed");

    match cli.command {
        Commands::Encode {
            fastq,
            output,
            kmer_length,
            num_reads,
            filter,
            max_line_length,
            force,
            json,
        } => {
            let config = EncodeConfig {
                window: kmer_length,
                max_records: num_reads,
                filter,
                max_line_length,
            };

            if force {
                if let Err(e) = remove_artifact(&output) {
                    eprintln!("Error removing {}: {}", output.display(), e);
                    process::exit(1);
                }
            }

            match process_fastq(&fastq, &output, &config) {
                Ok(EncodeOutcome::Skipped) => {
                    if json {
                        let report = serde_json::json!({ "total_bases": 0, "skipped": true });
                        println!("{}", report);
                    } else {
                        println!("Output file `{}` exists, skip it.", output.display());
                    }
                }
                Ok(EncodeOutcome::Written(stats)) => {
                    if json {
                        match serde_json::to_string_pretty(&stats) {
                            Ok(text) => println!("{}", text),
                            Err(e) => eprintln!("Error serializing statistics: {}", e),
                        }
                    } else {
                        println!("{}\t{}", output.display(), stats.total_bases);
                    }
                }
                Err(e) => {
                    eprintln!("Error encoding {}: {}", fastq.display(), e);
                    process::exit(1);
                }
            }
        }

        Commands::Batch {
            input,
            log,
            out_dir,
            kmer_length,
            num_reads,
            filter,
            max_line_length,
            threads,
        } => {
            let config = EncodeConfig {
                window: kmer_length,
                max_records: num_reads,
                filter,
                max_line_length,
            };

            let sources = match read_source_list(&input) {
                Ok(sources) => sources,
                Err(e) => {
                    eprintln!("Error reading source list: {}", e);
                    process::exit(1);
                }
            };

            match run_batch(&sources, &out_dir, &log, &config, threads) {
                Ok(None) => println!("Log file `{}` exists, exit.", log.display()),
                Ok(Some(summary)) => {
                    if summary.failed > 0 {
                        eprintln!("{} of {} files failed, see log", summary.failed, summary.sources);
                        process::exit(2);
                    }
                }
                Err(e) => {
                    eprintln!("Error during batch encoding: {}", e);
                    process::exit(1);
                }
            }
        }

        Commands::Decode {
            input,
            count,
            output,
            width,
        } => {
            let result = match &output {
                Some(path) => File::create(path)
                    .map_err(PackError::from)
                    .and_then(|f| decode_file(&input, count, width, BufWriter::new(f))),
                None => decode_file(&input, count, width, io::stdout().lock()),
            };
            if let Err(e) = result {
                eprintln!("Error decoding {}: {}", input.display(), e);
                if let Some(path) = output {
                    let _ = std::fs::remove_file(path);
                }
                process::exit(1);
            }
        }

        Commands::Inspect {
            input,
            count,
            format,
        } => {
            info!("Inspecting packed file: {}", input.display());
            let stats = match calculate_stats(&input, count) {
                Ok(stats) => stats,
                Err(e) => {
                    eprintln!("Error reading {}: {}", input.display(), e);
                    process::exit(1);
                }
            };

            match format {
                ReportFormat::Json => match serde_json::to_string_pretty(&stats) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error serializing statistics: {}", e);
                        process::exit(1);
                    }
                },
                ReportFormat::Tsv => println!("{}", format_tsv(&stats)),
            }
        }
    }
}
