mod output;
mod protocol;

use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dbgrid_db::EditorConfig;
use dbgrid_sqlite::{DatabaseHandle, ExecuteResult, SqlOutcome, Value};
use tracing_subscriber::EnvFilter;

use output::{
    OutputFormat, format_columns, format_execute, format_outcome, format_query, format_tables,
};
use protocol::Session;

#[derive(Debug, Parser)]
#[command(name = "dbgrid")]
#[command(about = "Browse and edit SQLite database files")]
#[command(version)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List user tables.
    Tables(TablesArgs),
    /// Show the columns of a table.
    Schema(SchemaArgs),
    /// Show one page of a table's rows.
    Data(DataArgs),
    /// Run an SQL statement; writes are saved to the file.
    Sql(SqlArgs),
    /// Set one cell.
    Update(UpdateArgs),
    /// Delete one row.
    Delete(DeleteArgs),
    /// Insert one row.
    Insert(InsertArgs),
    /// Serve editor commands as JSON lines on stdin/stdout.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct TablesArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
}

#[derive(Debug, Args)]
struct DataArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
    /// Zero-based page number.
    #[arg(long, default_value_t = 0)]
    page: usize,
    /// Rows per page (default: from config).
    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(Debug, Args)]
struct SqlArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Statement to run.
    statement: String,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
    /// Row identifier.
    #[arg(long, allow_hyphen_values = true)]
    rowid: i64,
    /// Column name.
    #[arg(long)]
    column: String,
    /// New value; parsed as JSON when valid (`null`, `42`, `"text"`), text otherwise.
    #[arg(long, allow_hyphen_values = true)]
    value: String,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
    /// Row identifier.
    #[arg(long, allow_hyphen_values = true)]
    rowid: i64,
}

#[derive(Debug, Args)]
struct InsertArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
    /// Row as a JSON object of column → value.
    #[arg(long)]
    data: String,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let config = match EditorConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: Failed to load config: {err}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let format = cli.format;
    let result = match cli.command {
        Command::Tables(args) => run_tables(args, &config, format),
        Command::Schema(args) => run_schema(args, &config, format),
        Command::Data(args) => run_data(args, &config, format),
        Command::Sql(args) => run_sql(args, &config, format),
        Command::Update(args) => run_update(args, &config, format),
        Command::Delete(args) => run_delete(args, &config, format),
        Command::Insert(args) => run_insert(args, &config, format),
        Command::Serve(args) => run_serve(args, &config),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(config: &EditorConfig) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .try_init()
        .ok();
}

fn open_database(path: &Path, config: &EditorConfig) -> Result<DatabaseHandle, String> {
    let mut db = DatabaseHandle::with_config(config);
    db.open(path).map_err(|err| err.to_string())?;
    Ok(db)
}

fn run_tables(args: TablesArgs, config: &EditorConfig, format: OutputFormat) -> Result<(), String> {
    let db = open_database(&args.db, config)?;
    let tables = db.get_tables().map_err(|e| e.to_string())?;
    print!("{}", format_tables(&tables, format)?);
    Ok(())
}

fn run_schema(args: SchemaArgs, config: &EditorConfig, format: OutputFormat) -> Result<(), String> {
    let db = open_database(&args.db, config)?;
    let columns = db.get_table_info(&args.table).map_err(|e| e.to_string())?;
    print!("{}", format_columns(&columns, format)?);
    Ok(())
}

fn run_data(args: DataArgs, config: &EditorConfig, format: OutputFormat) -> Result<(), String> {
    let db = open_database(&args.db, config)?;
    let page_size = args.page_size.unwrap_or(config.default_page_size);
    let result = db
        .get_table_data(&args.table, args.page, page_size)
        .map_err(|e| e.to_string())?;
    print!("{}", format_query(&result, format)?);
    Ok(())
}

fn run_sql(args: SqlArgs, config: &EditorConfig, format: OutputFormat) -> Result<(), String> {
    let db = open_database(&args.db, config)?;
    let outcome = db.execute_sql(&args.statement).map_err(|e| e.to_string())?;
    print!("{}", format_outcome(&outcome, format)?);
    match outcome {
        SqlOutcome::Execute(ExecuteResult::Failed { error }) => Err(error),
        _ => Ok(()),
    }
}

fn run_update(args: UpdateArgs, config: &EditorConfig, format: OutputFormat) -> Result<(), String> {
    let db = open_database(&args.db, config)?;
    let value = parse_cli_value(&args.value);
    let result = db
        .update_cell(&args.table, args.rowid, &args.column, value)
        .map_err(|e| e.to_string())?;
    report_write(result, format)
}

fn run_delete(args: DeleteArgs, config: &EditorConfig, format: OutputFormat) -> Result<(), String> {
    let db = open_database(&args.db, config)?;
    let result = db
        .delete_row(&args.table, args.rowid)
        .map_err(|e| e.to_string())?;
    report_write(result, format)
}

fn run_insert(args: InsertArgs, config: &EditorConfig, format: OutputFormat) -> Result<(), String> {
    let data = parse_row_data(&args.data)?;
    let db = open_database(&args.db, config)?;
    let result = db.insert_row(&args.table, &data).map_err(|e| e.to_string())?;
    report_write(result, format)
}

fn run_serve(args: ServeArgs, config: &EditorConfig) -> Result<(), String> {
    let db = open_database(&args.db, config)?;
    let session = Session::new(db);
    session
        .serve(io::stdin().lock(), io::stdout().lock())
        .map_err(|err| format!("Editor session failed: {err}"))
}

/// Prints a successful write; a failed one becomes the command's error.
fn report_write(result: ExecuteResult, format: OutputFormat) -> Result<(), String> {
    match result {
        ExecuteResult::Failed { error } => Err(error),
        applied => {
            print!("{}", format_execute(&applied, format)?);
            Ok(())
        }
    }
}

/// Interprets a command-line value: JSON scalars and byte arrays keep their
/// type, anything else is text.
fn parse_cli_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|json| Value::from_json(&json))
        .unwrap_or_else(|| Value::Text(raw.to_string()))
}

fn parse_row_data(raw: &str) -> Result<Vec<(String, Value)>, String> {
    let json: serde_json::Value =
        serde_json::from_str(raw).map_err(|err| format!("Invalid --data JSON: {err}"))?;
    let serde_json::Value::Object(object) = json else {
        return Err("--data must be a JSON object of column names to values".to_string());
    };

    object
        .into_iter()
        .map(|(column, value)| {
            Value::from_json(&value)
                .map(|value| (column.clone(), value))
                .ok_or_else(|| format!("Unsupported value for column '{column}'"))
        })
        .collect()
}
