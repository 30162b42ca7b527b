use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use study_search::{
    config, EngineConfig, ItemKind, SearchEngine, SearchQuery, SortBy, SortOrder, SqliteProvider,
    SqliteStore,
};

#[derive(Parser)]
#[command(name = "study-search", about = "Search study folders, sets, and cards", version)]
struct Cli {
    /// Study database (folders/sets/cards tables)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Where the index and history are kept (defaults to search.sqlite in the data dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// JSON file with engine settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the study database
    Index,

    /// Run a query and record it in history
    Search {
        /// Free text; may be empty when filters are given
        text: Vec<String>,

        /// Only these kinds (repeatable)
        #[arg(long = "kind", value_enum)]
        kinds: Vec<KindArg>,

        #[arg(long, value_enum, default_value_t = SortArg::Relevance)]
        sort: SortArg,

        #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
        order: OrderArg,

        #[arg(long)]
        limit: Option<usize>,

        /// Earliest update time (Unix ms), inclusive
        #[arg(long, requires = "to")]
        from: Option<i64>,

        /// Latest update time (Unix ms), inclusive
        #[arg(long, requires = "from")]
        to: Option<i64>,
    },

    /// Autocomplete a partial word
    Suggest {
        partial: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show or clear query history
    History {
        #[arg(long)]
        clear: bool,

        /// Most frequent queries
        #[arg(long, conflicts_with = "clear")]
        popular: bool,

        /// Words from recent queries
        #[arg(long, conflicts_with_all = ["clear", "popular"])]
        trending: bool,
    },

    /// Index entry counts
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Folder,
    Set,
    Card,
}

impl From<KindArg> for ItemKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Folder => ItemKind::Folder,
            KindArg::Set => ItemKind::Set,
            KindArg::Card => ItemKind::Card,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Relevance,
    Date,
    Name,
    Type,
}

impl From<SortArg> for SortBy {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Relevance => SortBy::Relevance,
            SortArg::Date => SortBy::Date,
            SortArg::Name => SortBy::Name,
            SortArg::Type => SortBy::Type,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The study database is opened query_only, so the store defaults to its own
/// file in the data dir. Sharing one file is opt-in via `--store`.
fn resolve_paths(db: Option<PathBuf>, store: Option<PathBuf>, data_dir: &Path) -> (PathBuf, PathBuf) {
    let db_path = db.unwrap_or_else(|| data_dir.join("study.sqlite"));
    let store_path = store.unwrap_or_else(|| data_dir.join("search.sqlite"));
    (db_path, store_path)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    study_search::init_tracing(cli.verbose);

    let (db_path, store_path) = resolve_paths(cli.db, cli.store, &config::default_data_dir());
    let engine_config = match &cli.config {
        Some(path) => EngineConfig::from_json(path)?,
        None => EngineConfig::default(),
    };

    if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(&store_path)?;
    let mut engine =
        SearchEngine::with_config(SqliteProvider::new(&db_path), store, engine_config);

    match cli.command {
        Commands::Index => {
            engine.build_index();
            print_json(&engine.stats())?;
        }
        Commands::Search {
            text,
            kinds,
            sort,
            order,
            limit,
            from,
            to,
        } => {
            let text = text.join(" ");
            let mut query = SearchQuery::new(text.clone()).with_sort(sort.into(), order.into());
            if !kinds.is_empty() {
                query = query.with_kinds(kinds.into_iter().map(ItemKind::from));
            }
            if let (Some(from), Some(to)) = (from, to) {
                query = query.with_date_range(from, to);
            }
            if let Some(limit) = limit {
                query = query.with_limit(limit);
            }
            let results = engine.search(&query);
            engine.save_search_query(&text);
            print_json(&results)?;
        }
        Commands::Suggest { partial, limit } => {
            let suggestions = match limit {
                Some(limit) => engine.get_suggestions_with_limit(&partial, limit),
                None => engine.get_suggestions(&partial),
            };
            print_json(&suggestions)?;
        }
        Commands::History {
            clear,
            popular,
            trending,
        } => {
            if clear {
                engine.clear_search_history();
                print_json(&engine.get_search_history())?;
            } else if popular {
                print_json(&engine.get_popular_searches())?;
            } else if trending {
                print_json(&engine.get_trending_terms())?;
            } else {
                print_json(&engine.get_search_history())?;
            }
        }
        Commands::Stats => print_json(&engine.stats())?,
    }

    Ok(())
}
