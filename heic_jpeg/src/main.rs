use anyhow::Context;
use clap::{Parser, Subcommand};
use heic_jpeg::rename::RenameSkip;
use heic_jpeg::{
    rename_by_capture_date, run_batch_with, BatchConfiguration, BatchStatus, CancellationToken,
    ProgressUpdate, ResizeDimensions, SourceFormat,
};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::BatchProgressBar;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "heic-jpeg")]
#[command(version, about = "Batch HEIC/HEIF to JPEG converter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every matching image in a directory to JPEG
    Convert {
        #[arg(value_name = "SOURCE_DIR")]
        source: PathBuf,

        /// Output directory (default: SOURCE_DIR/ConvertedFiles)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JPEG quality
        #[arg(short, long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,

        /// Parallel workers
        #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..=32))]
        workers: u16,

        /// Search subdirectories and mirror them under the output directory
        #[arg(short, long)]
        recursive: bool,

        /// Stretch every image to exactly WIDTHxHEIGHT
        #[arg(long, value_name = "WIDTHxHEIGHT")]
        resize: Option<ResizeDimensions>,

        /// Delete each source file after it converted successfully
        #[arg(long)]
        delete_originals: bool,

        /// Source format to look for (heif, png, tiff, webp, bmp)
        #[arg(long, default_value = "heif")]
        format: SourceFormat,

        /// Print the result as JSON instead of the summary box
        #[arg(long)]
        json: bool,
    },

    /// Rename JPEGs in a directory after their EXIF capture time
    RenameByDate {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    if let Err(e) = init_logging("heic_jpeg", log_config) {
        eprintln!("⚠️  Could not initialize logging: {}", e);
    }

    match cli.command {
        Commands::Convert {
            source,
            output,
            quality,
            workers,
            recursive,
            resize,
            delete_originals,
            format,
            json,
        } => {
            let mut config = BatchConfiguration::new(source)
                .with_quality(quality)
                .with_workers(workers as usize)
                .with_recursive(recursive)
                .with_resize(resize)
                .with_delete_originals(delete_originals)
                .with_source_format(format);
            if let Some(output) = output {
                config = config.with_output_directory(output);
            }

            let cancel = CancellationToken::new();
            let handler_token = cancel.clone();
            ctrlc::set_handler(move || {
                eprintln!("\n⛔ Cancelling: finishing files in progress...");
                handler_token.cancel();
            })
            .context("Failed to install Ctrl-C handler")?;

            let bar = BatchProgressBar::new(0, "Converting", !json);
            let observer = |u: &ProgressUpdate| {
                bar.set_length(u.total as u64);
                bar.set_position(u.done as u64);
                bar.set_message(u.current_file.clone());
                if !u.succeeded {
                    bar.println(&format!("❌ [{}%] Failed: {}", u.percent, u.current_file));
                }
            };

            let result = run_batch_with(&config, &observer, &cancel);
            bar.finish_with_message(result.status.as_str());

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                if let Some(message) = &result.message {
                    println!("{}", message);
                }
                shared_utils::print_summary_report(&result.summary_report());
            }

            if result.status == BatchStatus::Error {
                std::process::exit(1);
            }
            if result.status == BatchStatus::Cancelled {
                std::process::exit(130);
            }
        }

        Commands::RenameByDate { dir } => {
            let report = rename_by_capture_date(&dir)
                .with_context(|| format!("Renaming files in {}", dir.display()))?;
            for (from, to) in &report.renamed {
                println!(
                    "✅ Renamed '{}' to '{}'",
                    shared_utils::common_utils::file_base_name(from),
                    shared_utils::common_utils::file_base_name(to)
                );
            }
            for (path, reason) in &report.skipped {
                let name = shared_utils::common_utils::file_base_name(path);
                match reason {
                    RenameSkip::NoDate => println!("⏭️  No EXIF date found in '{}', skipped.", name),
                    RenameSkip::InvalidDate(d) => {
                        println!("⏭️  Invalid date format '{}' in '{}', skipped.", d, name)
                    }
                    RenameSkip::TargetExists(t) => println!(
                        "⏭️  '{}' already exists, '{}' skipped.",
                        shared_utils::common_utils::file_base_name(t),
                        name
                    ),
                    RenameSkip::RenameFailed(e) => println!("❌ Could not rename '{}': {}", name, e),
                }
            }
        }
    }

    Ok(())
}
