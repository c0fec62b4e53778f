use clap::Parser;
use lib::{
    AGE_GROUP_LABELS, ColumnKind, DatabaseConfig, FREQUENCY_MAPPING, PipelineError, Redundancy,
    RequiredColumn, SimpleLogger, Statistic, db, drop_if_redundant, impute_by_group, map_codes,
    normalize_names, profile, quantile_bucket, read_csv, write_csv,
};
use log::debug;
use std::path::PathBuf;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

/// Input columns the pipeline depends on, by canonical name. Any other
/// columns in the file flow through untouched.
const REQUIRED_COLUMNS: &[RequiredColumn] = &[
    RequiredColumn {
        name: "age",
        kinds: &[ColumnKind::Int],
    },
    RequiredColumn {
        name: "category",
        kinds: &[ColumnKind::Text],
    },
    RequiredColumn {
        name: "review_rating",
        kinds: &[ColumnKind::Float, ColumnKind::Int],
    },
    RequiredColumn {
        name: "frequency_of_purchases",
        kinds: &[ColumnKind::Text],
    },
    RequiredColumn {
        name: "discount_applied",
        kinds: &[ColumnKind::Bool],
    },
    RequiredColumn {
        name: "promo_code_used",
        kinds: &[ColumnKind::Bool],
    },
    RequiredColumn {
        name: "purchase_amount_(usd)",
        kinds: &[ColumnKind::Float, ColumnKind::Int],
    },
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file with the raw shopping dataset
    #[arg(short, long)]
    input_file: PathBuf,

    /// Path for the cleaned CSV output
    #[arg(short, long, default_value = "customer_cleaned.csv")]
    output: PathBuf,

    /// Log level for output
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    // Initialize timer and logger
    let total_start = Instant::now();
    log::set_logger(&LOGGER).unwrap();

    // Acquire CLI args
    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    println!("Scrubber! Customer shopping data pipeline");
    debug!(
        "Input file: {} | Output file: {}",
        args.input_file.display(),
        args.output.display()
    );

    // Load
    let load_start = Instant::now();
    let mut table = read_csv(&args.input_file)?;
    table.require_columns(REQUIRED_COLUMNS)?;
    println!(
        "Loaded {} rows x {} columns in {:.2?}",
        table.num_rows(),
        table.num_columns(),
        load_start.elapsed()
    );

    // Profile
    println!("\n--- HEAD ---");
    println!("{}", profile::head(&table, 5));
    println!("\n--- INFO ---");
    println!("{}", profile::info(&table));
    println!("\n--- DESCRIBE ---");
    println!("{}", profile::describe(&table));
    println!("\n--- MISSING VALUES (BEFORE) ---");
    println!("{}", profile::render_missing(&profile::missing_counts(&table)));

    // Impute missing Review Rating with median by Category
    let summary = impute_by_group(&mut table, "Review Rating", "Category", Statistic::Median)?;
    println!(
        "\nFilled {} missing review ratings ({} groups had no known rating)",
        summary.filled,
        summary.unfilled_groups.len()
    );
    println!("\n--- MISSING VALUES (AFTER) ---");
    println!("{}", profile::render_missing(&profile::missing_counts(&table)));

    // Rename columns to snake_case
    normalize_names(&mut table);
    println!("\n--- COLUMNS AFTER RENAME ---");
    println!("{}", table.column_names().join(", "));

    // Create age_group column
    quantile_bucket(&mut table, "age", "age_group", &AGE_GROUP_LABELS)?;
    println!("\n--- AGE GROUP SAMPLE ---");
    println!("{}", profile::sample(&table, &["age", "age_group"], 10)?);

    // Purchase frequency mapping
    map_codes(
        &mut table,
        "frequency_of_purchases",
        "purchase_frequency_days",
        &FREQUENCY_MAPPING,
    )?;
    println!("\n--- PURCHASE FREQUENCY SAMPLE ---");
    println!(
        "{}",
        profile::sample(
            &table,
            &["purchase_frequency_days", "frequency_of_purchases"],
            10
        )?
    );

    // Check discount vs promo code, drop the copy only when truly redundant
    println!("\n--- DISCOUNT vs PROMO ---");
    println!(
        "{}",
        profile::sample(&table, &["discount_applied", "promo_code_used"], 10)?
    );
    match drop_if_redundant(&mut table, "discount_applied", "promo_code_used")? {
        Redundancy::Dropped => {
            println!("Are both columns identical? true (dropped promo_code_used)");
        }
        Redundancy::Kept { mismatches } => {
            println!(
                "Are both columns identical? false ({} rows differ, keeping both)",
                mismatches
            );
        }
    }
    println!("\n--- FINAL COLUMNS ---");
    println!("{}", table.column_names().join(", "));

    // Save cleaned data
    let io_start = Instant::now();
    write_csv(&table, &args.output)?;
    println!(
        "\nCleaned dataset saved as {} in {:.2?}",
        args.output.display(),
        io_start.elapsed()
    );

    // Write to MySQL and read back a sample
    let db_config = DatabaseConfig::load()?;
    debug!(
        "Database target: {}:{} database={} table={}",
        db_config.host, db_config.port, db_config.database, db_config.table
    );
    let db_start = Instant::now();
    let sample = db::publish(&table, &db_config).await?;
    println!(
        "Data written to MySQL successfully in {:.2?}",
        db_start.elapsed()
    );
    println!("\n--- READ-BACK SAMPLE ---");
    for line in &sample {
        println!("{}", line);
    }

    println!(
        "\nPipeline completed successfully in {:.2?}",
        total_start.elapsed()
    );
    Ok(())
}
