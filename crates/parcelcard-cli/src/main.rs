mod commands;
mod logger;
mod progress;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "parcelcard",
    version,
    about = "Find detailed parcel data based on parcel listings"
)]
struct Cli {
    /// Log level for output
    #[arg(long, global = true, default_value = "info",
          value_parser = ["error", "warn", "info", "debug", "trace"])]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape property cards for every parcel in the listing, then post-process
    All {
        /// Path to the parcel listing (.xlsx, .xls, or .csv with a PARCEL_C column)
        input_file: PathBuf,

        /// The output .csv file
        #[arg(short, long, default_value = "output.csv")]
        output_file: PathBuf,

        /// Number of documents to request and process at the same time
        /// (be careful not to set this too high)
        #[arg(short, long, default_value_t = 20,
              value_parser = clap::value_parser!(u16).range(1..=200))]
        concurrency: u16,

        /// Include geocoding in post-processed results. Very slow...
        #[arg(long)]
        geocode: bool,

        /// Geoapify API key for geocoding
        #[arg(long)]
        geoapify_key: Option<String>,
    },
    /// Clean and enrich an existing output dataset
    PostProcess {
        /// The output .csv file to post-process
        output_file: PathBuf,

        /// Where to write the post-processed dataset
        /// (default: <output>_post_processed.csv)
        #[arg(short = 'O', long)]
        post_processed_output_file: Option<PathBuf>,

        /// Number of rows to process at the same time
        #[arg(short, long, default_value_t = 20,
              value_parser = clap::value_parser!(u16).range(1..=200))]
        concurrency: u16,

        /// Include geocoding in post-processed results. Very slow...
        #[arg(long)]
        geocode: bool,

        /// Geoapify API key for geocoding
        #[arg(long)]
        geoapify_key: Option<String>,
    },
    /// Export owner locations from a post-processed dataset as GeoJSON
    GenerateShapefile {
        /// The post-processed .csv file
        post_processed_output_file: PathBuf,

        /// Where to write the point-geometry file
        #[arg(short, long, default_value = "owners.geojson")]
        shapefile: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init(&cli.log);

    let result = match cli.command {
        Commands::All {
            input_file,
            output_file,
            concurrency,
            geocode,
            geoapify_key,
        } => {
            commands::all::run(
                input_file,
                output_file,
                concurrency as usize,
                geocode,
                geoapify_key,
            )
            .await
        }
        Commands::PostProcess {
            output_file,
            post_processed_output_file,
            concurrency,
            geocode,
            geoapify_key,
        } => {
            commands::post_process::run(
                output_file,
                post_processed_output_file,
                concurrency as usize,
                geocode,
                geoapify_key,
            )
            .await
        }
        Commands::GenerateShapefile {
            post_processed_output_file,
            shapefile,
        } => commands::shapefile::run(post_processed_output_file, shapefile),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
