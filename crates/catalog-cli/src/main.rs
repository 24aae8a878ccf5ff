mod config;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use catalog_core::validation::{
    is_conventional_id, normalize_tags, split_tags, validate_field, validate_id,
};
use catalog_core::{
    csv, ImportOptions, ImportPolicy, Record, RecordStore, RecordType, SnapshotRepository,
};
use catalog_store::FileRepository;

use config::Config;

#[derive(Parser)]
#[command(
    name = "catalog",
    version,
    about = "Catalogue photos, articles, documents and objects"
)]
struct Cli {
    /// Path to the state file
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new record
    Add {
        /// Record ID (default: next free NNNN_YYYY for the current year)
        #[arg(long)]
        id: Option<String>,

        /// Record type
        #[arg(short = 't', long = "type")]
        kind: CliType,

        #[arg(short, long)]
        category: String,

        #[arg(short, long)]
        subcategory: String,

        /// Tags (separated by ';' or ',')
        #[arg(short = 'g', long)]
        tags: Option<String>,
    },

    /// Edit an existing record
    Edit {
        /// Record ID
        id: String,

        #[arg(short = 't', long = "type")]
        kind: Option<CliType>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        subcategory: Option<String>,

        /// Replace all tags (separated by ';' or ','; empty clears them)
        #[arg(short = 'g', long)]
        tags: Option<String>,
    },

    /// Delete a record by ID
    Remove {
        /// Record ID
        id: String,
    },

    /// Show a single record
    Show {
        /// Record ID
        id: String,
    },

    /// List all records
    List,

    /// Search records by category, subcategory or tag
    #[command(group(ArgGroup::new("filter").required(true).multiple(true).args(["category", "tag"])))]
    Find {
        #[arg(short, long)]
        category: Option<String>,

        /// Requires --category
        #[arg(short, long, requires = "category")]
        subcategory: Option<String>,

        #[arg(short = 'g', long)]
        tag: Option<String>,
    },

    /// Delete every record with a given category, subcategory or tag
    #[command(group(ArgGroup::new("field").required(true).args(["category", "subcategory", "tag"])))]
    Purge {
        #[arg(short, long)]
        category: Option<String>,

        /// Matches in any category
        #[arg(short, long)]
        subcategory: Option<String>,

        #[arg(short = 'g', long)]
        tag: Option<String>,
    },

    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Manage subcategories
    Subcategory {
        #[command(subcommand)]
        command: SubcategoryCommands,
    },

    /// Import records from a CSV file (id,type,category,subcategory,tags)
    Import {
        path: PathBuf,

        /// Skip malformed lines instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Export all records to a CSV file
    Export { path: PathBuf },

    /// Print the next free ID for a year
    NextId {
        /// Year (default: current year)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// Register a category
    Add { name: String },

    /// Rename a category, keeping its subcategories
    Rename { name: String, new_name: String },

    /// Delete a category and its subcategories
    Remove {
        name: String,

        /// Also delete every record in this category
        #[arg(long)]
        with_records: bool,
    },

    /// List categories and their subcategories
    List,
}

#[derive(Subcommand)]
enum SubcategoryCommands {
    /// Register a subcategory (creates the category if needed)
    Add { category: String, name: String },

    /// Rename a subcategory within its category
    Rename {
        category: String,
        name: String,
        new_name: String,
    },

    /// Delete a subcategory from its category
    Remove { category: String, name: String },
}

#[derive(Clone, ValueEnum)]
enum CliType {
    Photo,
    Article,
    Document,
    Object,
}

impl From<CliType> for RecordType {
    fn from(val: CliType) -> Self {
        match val {
            CliType::Photo => RecordType::Photo,
            CliType::Article => RecordType::Article,
            CliType::Document => RecordType::Document,
            CliType::Object => RecordType::Object,
        }
    }
}

fn default_state_path() -> PathBuf {
    directories::ProjectDirs::from("dev", "catalog", "catalog")
        .map(|dirs| dirs.data_dir().join("model.json"))
        .unwrap_or_else(|| PathBuf::from("model.json"))
}

fn open_repo(file: Option<PathBuf>, config: &Config) -> FileRepository {
    let path = file
        .or_else(|| config.store.path.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_state_path);
    FileRepository::new(path)
}

/// Load the state file. An unreadable one is moved aside first, and the
/// command fails if that is not possible, so nothing can overwrite it.
fn load_store(repo: &FileRepository) -> Result<RecordStore> {
    match repo.try_load() {
        Ok(store) => Ok(store.unwrap_or_default()),
        Err(e) => {
            let backup = repo.back_up().with_context(|| {
                format!("cannot load {} ({e}) and cannot back it up", repo.path().display())
            })?;
            warn!(
                path = %repo.path().display(),
                backup = %backup.display(),
                "cannot load state file, starting empty: {e}"
            );
            eprintln!(
                "Warning: {} is unreadable ({e}); moved it to {}",
                repo.path().display(),
                backup.display()
            );
            Ok(RecordStore::new())
        }
    }
}

fn save(repo: &FileRepository, store: &RecordStore) -> Result<()> {
    repo.save(store)
        .with_context(|| format!("failed to save {}", repo.path().display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?;
    let repo = open_repo(cli.file, &config);
    let mut store = load_store(&repo)?;

    match cli.command {
        Commands::Add {
            id,
            kind,
            category,
            subcategory,
            tags,
        } => cmd_add(
            &repo,
            &mut store,
            &config,
            id,
            kind.into(),
            category,
            subcategory,
            tags,
        ),
        Commands::Edit {
            id,
            kind,
            category,
            subcategory,
            tags,
        } => cmd_edit(
            &repo,
            &mut store,
            &config,
            &id,
            kind.map(Into::into),
            category,
            subcategory,
            tags,
        ),
        Commands::Remove { id } => cmd_remove(&repo, &mut store, &id),
        Commands::Show { id } => cmd_show(&store, &id),
        Commands::List => cmd_list(&store),
        Commands::Find {
            category,
            subcategory,
            tag,
        } => cmd_find(
            &store,
            category.as_deref(),
            subcategory.as_deref(),
            tag.as_deref(),
        ),
        Commands::Purge {
            category,
            subcategory,
            tag,
        } => cmd_purge(&repo, &mut store, category, subcategory, tag),
        Commands::Category { command } => match command {
            CategoryCommands::Add { name } => cmd_category_add(&repo, &mut store, &name),
            CategoryCommands::Rename { name, new_name } => {
                cmd_category_rename(&repo, &mut store, &name, &new_name)
            }
            CategoryCommands::Remove { name, with_records } => {
                cmd_category_remove(&repo, &mut store, &name, with_records)
            }
            CategoryCommands::List => cmd_category_list(&store),
        },
        Commands::Subcategory { command } => match command {
            SubcategoryCommands::Add { category, name } => {
                cmd_subcategory_add(&repo, &mut store, &category, &name)
            }
            SubcategoryCommands::Rename {
                category,
                name,
                new_name,
            } => cmd_subcategory_rename(&repo, &mut store, &category, &name, &new_name),
            SubcategoryCommands::Remove { category, name } => {
                cmd_subcategory_remove(&repo, &mut store, &category, &name)
            }
        },
        Commands::Import { path, skip_invalid } => {
            let policy = if skip_invalid {
                ImportPolicy::Skip
            } else {
                config.import.policy()?
            };
            let options = ImportOptions {
                policy,
                uppercase_tags: config.tags.uppercase,
            };
            cmd_import(&repo, &mut store, &path, options)
        }
        Commands::Export { path } => cmd_export(&store, &path),
        Commands::NextId { year } => {
            let year = year.unwrap_or_else(current_year);
            println!("{}", store.next_id_for_year(year));
            Ok(())
        }
        Commands::Config => cmd_config(&repo, &config),
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn parse_tags(raw: &str, uppercase: bool) -> Vec<String> {
    if uppercase {
        normalize_tags(raw)
    } else {
        split_tags(raw)
    }
}

// ---------------------------------------------------------------------------
// Record commands
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn cmd_add(
    repo: &FileRepository,
    store: &mut RecordStore,
    config: &Config,
    id: Option<String>,
    kind: RecordType,
    category: String,
    subcategory: String,
    tags: Option<String>,
) -> Result<()> {
    let id = match id {
        Some(id) => id.trim().to_string(),
        None => store.next_id_for_year(current_year()),
    };
    validate_id(&id)?;
    validate_field("category", &category)?;
    validate_field("subcategory", &subcategory)?;
    if !is_conventional_id(&id) {
        warn!("id {id} does not follow the NNNN_YYYY convention");
    }

    let tags = tags
        .map(|t| parse_tags(&t, config.tags.uppercase))
        .unwrap_or_default();
    let record = Record::builder()
        .id(id)
        .kind(kind)
        .category(category.trim())
        .subcategory(subcategory.trim())
        .tags(tags)
        .build()?;

    if !store.add_record(record.clone()) {
        bail!("a record with id {} already exists", record.id());
    }
    store.add_category(record.category());
    store.add_subcategory(record.category(), record.subcategory());
    save(repo, store)?;
    println!("Added: {record}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_edit(
    repo: &FileRepository,
    store: &mut RecordStore,
    config: &Config,
    id: &str,
    kind: Option<RecordType>,
    category: Option<String>,
    subcategory: Option<String>,
    tags: Option<String>,
) -> Result<()> {
    let Some(existing) = store.find_record_with_id(id) else {
        bail!("no record with id {id}");
    };

    let mut builder = existing.to_builder();
    if let Some(kind) = kind {
        builder = builder.kind(kind);
    }
    if let Some(category) = category {
        validate_field("category", &category)?;
        builder = builder.category(category.trim());
    }
    if let Some(subcategory) = subcategory {
        validate_field("subcategory", &subcategory)?;
        builder = builder.subcategory(subcategory.trim());
    }
    if let Some(tags) = tags {
        builder = builder.tags(parse_tags(&tags, config.tags.uppercase));
    }
    let record = builder.build()?;

    if !store.edit_record(id, record.clone()) {
        bail!("record {id} could not be updated");
    }
    store.add_category(record.category());
    store.add_subcategory(record.category(), record.subcategory());
    save(repo, store)?;
    println!("Updated: {record}");
    Ok(())
}

fn cmd_remove(repo: &FileRepository, store: &mut RecordStore, id: &str) -> Result<()> {
    if !store.remove_record(id) {
        bail!("no record with id {id}");
    }
    save(repo, store)?;
    println!("Removed: {id}");
    Ok(())
}

fn cmd_show(store: &RecordStore, id: &str) -> Result<()> {
    match store.find_record_with_id(id) {
        Some(record) => {
            println!("ID:          {}", record.id());
            println!("Type:        {}", record.kind());
            println!("Category:    {}", record.category());
            println!("Subcategory: {}", record.subcategory());
            let tags: Vec<&str> = record.tags().iter().map(String::as_str).collect();
            println!("Tags:        {}", tags.join(", "));
            Ok(())
        }
        None => bail!("no record with id {id}"),
    }
}

fn cmd_list(store: &RecordStore) -> Result<()> {
    if store.is_empty() {
        println!("No records.");
        return Ok(());
    }
    for record in store.records() {
        println!("{record}");
    }
    println!("{} record(s)", store.len());
    Ok(())
}

fn cmd_find(
    store: &RecordStore,
    category: Option<&str>,
    subcategory: Option<&str>,
    tag: Option<&str>,
) -> Result<()> {
    let mut results = match (category, subcategory, tag) {
        (Some(c), Some(s), _) => store.find_records_with_subcategory(c, s),
        (Some(c), None, _) => store.find_records_with_category(c),
        (None, _, Some(t)) => store.find_records_with_tag(t),
        (None, _, None) => bail!("give --category or --tag"),
    };
    if let (Some(_), Some(t)) = (category, tag) {
        results.retain(|r| r.has_tag(t));
    }

    if results.is_empty() {
        println!("No records found.");
        return Ok(());
    }
    for record in &results {
        println!("{record}");
    }
    Ok(())
}

fn cmd_purge(
    repo: &FileRepository,
    store: &mut RecordStore,
    category: Option<String>,
    subcategory: Option<String>,
    tag: Option<String>,
) -> Result<()> {
    let before = store.len();
    let (field, value, removed) = match (category, subcategory, tag) {
        (Some(c), _, _) => {
            let removed = store.remove_all_records_with_category(&c);
            ("category", c, removed)
        }
        (None, Some(s), _) => {
            let removed = store.remove_all_records_with_subcategory(&s);
            ("subcategory", s, removed)
        }
        (None, None, Some(t)) => {
            let removed = store.remove_all_records_with_tag(&t);
            ("tag", t, removed)
        }
        (None, None, None) => bail!("give --category, --subcategory or --tag"),
    };

    if !removed {
        println!("No records with {field} {value}.");
        return Ok(());
    }
    save(repo, store)?;
    info!(field = %field, value = %value, count = before - store.len(), "purged records");
    println!("Removed {} record(s) with {field} {value}", before - store.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Taxonomy commands
// ---------------------------------------------------------------------------

fn cmd_category_add(repo: &FileRepository, store: &mut RecordStore, name: &str) -> Result<()> {
    validate_field("category", name)?;
    let name = name.trim();
    if !store.add_category(name) {
        bail!("category {name} already exists");
    }
    save(repo, store)?;
    println!("Added category: {name}");
    Ok(())
}

fn cmd_category_rename(
    repo: &FileRepository,
    store: &mut RecordStore,
    name: &str,
    new_name: &str,
) -> Result<()> {
    validate_field("category", new_name)?;
    let new_name = new_name.trim();
    if store.contains_category(new_name) && name != new_name {
        warn!("category {new_name} already exists and will be replaced");
    }
    if !store.edit_category(name, new_name) {
        bail!("no category {name}");
    }
    save(repo, store)?;
    println!("Renamed category: {name} -> {new_name}");
    Ok(())
}

fn cmd_category_remove(
    repo: &FileRepository,
    store: &mut RecordStore,
    name: &str,
    with_records: bool,
) -> Result<()> {
    if !store.remove_category(name) {
        bail!("no category {name}");
    }
    let before = store.len();
    if with_records {
        store.remove_all_records_with_category(name);
    }
    save(repo, store)?;
    println!("Removed category: {name}");
    if with_records {
        println!("Removed {} record(s)", before - store.len());
    } else {
        let remaining = store.find_records_with_category(name).len();
        if remaining > 0 {
            println!("{remaining} record(s) still use this category");
        }
    }
    Ok(())
}

fn cmd_category_list(store: &RecordStore) -> Result<()> {
    let taxonomy = store.taxonomy();
    if taxonomy.is_empty() {
        println!("No categories.");
        return Ok(());
    }
    for (category, subcategories) in taxonomy {
        let count = store.find_records_with_category(category).len();
        println!("{category} ({count})");
        for subcategory in subcategories {
            let count = store
                .find_records_with_subcategory(category, subcategory)
                .len();
            println!("  {subcategory} ({count})");
        }
    }
    Ok(())
}

fn cmd_subcategory_add(
    repo: &FileRepository,
    store: &mut RecordStore,
    category: &str,
    name: &str,
) -> Result<()> {
    validate_field("category", category)?;
    validate_field("subcategory", name)?;
    let (category, name) = (category.trim(), name.trim());
    if !store.add_subcategory(category, name) {
        bail!("subcategory {name} already exists in {category}");
    }
    save(repo, store)?;
    println!("Added subcategory: {category}/{name}");
    Ok(())
}

fn cmd_subcategory_rename(
    repo: &FileRepository,
    store: &mut RecordStore,
    category: &str,
    name: &str,
    new_name: &str,
) -> Result<()> {
    validate_field("subcategory", new_name)?;
    let new_name = new_name.trim();
    if !store.edit_subcategory(category, name, new_name) {
        bail!("no subcategory {name} in {category}");
    }
    save(repo, store)?;
    println!("Renamed subcategory: {category}/{name} -> {category}/{new_name}");
    Ok(())
}

fn cmd_subcategory_remove(
    repo: &FileRepository,
    store: &mut RecordStore,
    category: &str,
    name: &str,
) -> Result<()> {
    if !store.remove_subcategory(category, name) {
        bail!("no subcategory {name} in {category}");
    }
    save(repo, store)?;
    println!("Removed subcategory: {category}/{name}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

fn cmd_import(
    repo: &FileRepository,
    store: &mut RecordStore,
    path: &Path,
    options: ImportOptions,
) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let report = csv::import(store, BufReader::new(file), options)
        .with_context(|| format!("importing {}", path.display()))?;

    for failure in &report.failures {
        warn!("skipped: {failure}");
    }
    for id in &report.duplicates {
        warn!("skipped duplicate id {id}");
    }

    if report.imported > 0 {
        save(repo, store)?;
    }
    info!(
        imported = report.imported,
        duplicates = report.duplicates.len(),
        failures = report.failures.len(),
        "import finished"
    );
    println!(
        "Imported {} record(s), {} duplicate(s), {} invalid line(s)",
        report.imported,
        report.duplicates.len(),
        report.failures.len()
    );
    Ok(())
}

fn cmd_export(store: &RecordStore, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let count = csv::export(store, BufWriter::new(file))
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Exported {count} record(s) to {}", path.display());
    Ok(())
}

fn cmd_config(repo: &FileRepository, config: &Config) -> Result<()> {
    println!("Config:      {}", config::describe_config_source());
    println!("State file:  {}", repo.path().display());
    println!("Import:      on_error = {}", config.import.on_error);
    println!("Tags:        uppercase = {}", config.tags.uppercase);
    Ok(())
}
