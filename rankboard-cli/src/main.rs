mod config;
mod output;
mod persist;

use clap::Parser;
use rankboard_core::{
    Aggregate, CombineOptions, Leaderboard, MemoryStore, RankOrder, DEFAULT_PAGE_SIZE,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::output::format_score;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "rankboard", version, about = "Leaderboards: ranks, pages, windows and merges")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON snapshot holding every leaderboard (default: rankboard.json)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Path to config file (default: ~/.config/rankboard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Members per page for leaders and around listings
    #[arg(long, global = true)]
    page_size: Option<usize>,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Log store operations to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add a member, or overwrite its score
    Add {
        board: String,
        member: String,
        #[arg(allow_negative_numbers = true)]
        score: f64,
    },
    /// Remove a member
    Remove { board: String, member: String },
    /// Add a (possibly negative) delta to a member's score
    Change {
        board: String,
        member: String,
        #[arg(allow_negative_numbers = true)]
        delta: f64,
    },
    /// Print a member's score
    Score { board: String, member: String },
    /// Print a member's rank (highest score is 1 unless --ascending)
    Rank {
        board: String,
        member: String,
        #[arg(long)]
        ascending: bool,
    },
    /// Print a member's score and rank
    Show { board: String, member: String },
    /// Exit 0 if the member exists, 1 otherwise
    Check { board: String, member: String },
    /// Print the number of members
    Total { board: String },
    /// Print the number of pages at the current page size
    Pages { board: String },
    /// Count members with scores in [min, max]
    Count {
        board: String,
        #[arg(allow_negative_numbers = true)]
        min: f64,
        #[arg(allow_negative_numbers = true)]
        max: f64,
    },
    /// List one page of members
    Leaders {
        board: String,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,
        #[arg(long)]
        ascending: bool,
    },
    /// List the page-sized window centred on a member
    Around { board: String, member: String },
    /// Rank the given members, in the order given
    List {
        board: String,
        #[arg(required = true)]
        members: Vec<String>,
        /// Skip the score lookups
        #[arg(long)]
        no_scores: bool,
    },
    /// List members with scores in [min, max]
    Range {
        board: String,
        #[arg(allow_negative_numbers = true)]
        min: f64,
        #[arg(allow_negative_numbers = true)]
        max: f64,
    },
    /// Remove members with scores in [min, max]
    RemoveRange {
        board: String,
        #[arg(allow_negative_numbers = true)]
        min: f64,
        #[arg(allow_negative_numbers = true)]
        max: f64,
    },
    /// Union of a leaderboard and sources, written to a destination
    Merge(CombineArgs),
    /// Intersection of a leaderboard and sources, written to a destination
    Intersect(CombineArgs),
    /// Delete a whole leaderboard
    Clear { board: String },
    /// List every leaderboard in the snapshot
    Boards,
    /// Create a default config file at ~/.config/rankboard/config.toml
    Init,
}

#[derive(clap::Args)]
struct CombineArgs {
    board: String,
    destination: String,
    #[arg(required = true)]
    sources: Vec<String>,

    /// Weight per source, in source order (repeatable). Defaults to 1.0 each.
    #[arg(long = "weight", allow_negative_numbers = true)]
    weights: Vec<f64>,

    /// How to combine a member's scores: "sum", "min" or "max"
    #[arg(long, default_value = "sum")]
    aggregate: String,
}

impl CombineArgs {
    fn options(&self) -> CombineOptions {
        let aggregate: Aggregate = self.aggregate.parse().unwrap_or_else(|e| bail(e));
        CombineOptions {
            weights: if self.weights.is_empty() { None } else { Some(self.weights.clone()) },
            aggregate,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn order(ascending: bool) -> RankOrder {
    if ascending {
        RankOrder::Ascending
    } else {
        RankOrder::Descending
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Init = cli.command {
        let path = config::create_default_config();
        println!("Created config at {}", path.display());
        println!("Edit it to set your default data file and page size.");
        return;
    }

    // Load config file, merge with CLI args (CLI wins)
    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let data_path = cli
        .data
        .clone()
        .or(cfg.data_file.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(persist::DEFAULT_DATA_FILE));
    let page_size = cli.page_size.or(cfg.page_size).unwrap_or(DEFAULT_PAGE_SIZE);

    let store = Arc::new(persist::load_store(&data_path));

    let mutated = run_command(&cli, &store, page_size).unwrap_or_else(|e| bail(e));

    if mutated {
        persist::save_store(&data_path, &store);
    }
}

/// Run one command against the store. Returns whether the store changed.
fn run_command(
    cli: &Cli,
    store: &Arc<MemoryStore>,
    page_size: usize,
) -> rankboard_core::Result<bool> {
    let open = |name: &str| Leaderboard::with_page_size(name, Arc::clone(store), page_size);
    let json = cli.json;

    match &cli.command {
        Commands::Add { board, member, score } => {
            open(board).add_member(member, *score)?;
            Ok(true)
        }
        Commands::Remove { board, member } => {
            let removed = open(board).remove_member(member)?;
            if !removed {
                eprintln!("{member} was not on {board}");
            }
            Ok(removed)
        }
        Commands::Change { board, member, delta } => {
            let score = open(board).change_score_for(member, *delta)?;
            if json {
                output::print_value(&serde_json::json!({ "member": member, "score": score }));
            } else {
                println!("{}", format_score(score));
            }
            Ok(true)
        }
        Commands::Score { board, member } => {
            let score = open(board)
                .score_for(member)?
                .unwrap_or_else(|| bail(format!("{member} is not on {board}")));
            if json {
                output::print_value(&serde_json::json!({ "member": member, "score": score }));
            } else {
                println!("{}", format_score(score));
            }
            Ok(false)
        }
        Commands::Rank { board, member, ascending } => {
            let rank = open(board)
                .rank_for(member, order(*ascending))?
                .unwrap_or_else(|| bail(format!("{member} is not on {board}")));
            if json {
                output::print_value(&serde_json::json!({ "member": member, "rank": rank }));
            } else {
                println!("{rank}");
            }
            Ok(false)
        }
        Commands::Show { board, member } => {
            let leaderboard = open(board);
            let ranked = leaderboard
                .score_and_rank_for(member)?
                .unwrap_or_else(|| bail(format!("{member} is not on {board}")));
            print_listing(&leaderboard, &[ranked], json)?;
            Ok(false)
        }
        Commands::Check { board, member } => {
            let present = open(board).check_member(member)?;
            if json {
                output::print_value(&serde_json::json!({ "member": member, "present": present }));
            } else {
                println!("{present}");
            }
            if !present {
                std::process::exit(1);
            }
            Ok(false)
        }
        Commands::Total { board } => {
            println!("{}", open(board).total_members()?);
            Ok(false)
        }
        Commands::Pages { board } => {
            println!("{}", open(board).total_pages()?);
            Ok(false)
        }
        Commands::Count { board, min, max } => {
            println!("{}", open(board).total_members_in_score_range(*min, *max)?);
            Ok(false)
        }
        Commands::Leaders { board, page, ascending } => {
            let leaderboard = open(board);
            let members = leaderboard.leaders_in_order(*page, order(*ascending))?;
            print_listing(&leaderboard, &members, json)?;
            Ok(false)
        }
        Commands::Around { board, member } => {
            let leaderboard = open(board);
            let members = leaderboard.around_me(member)?;
            if members.is_empty() {
                bail(format!("{member} is not on {board}"));
            }
            print_listing(&leaderboard, &members, json)?;
            Ok(false)
        }
        Commands::List { board, members, no_scores } => {
            let leaderboard = open(board);
            let ranked = leaderboard.ranked_in_list(members.as_slice(), !*no_scores)?;
            print_listing(&leaderboard, &ranked, json)?;
            Ok(false)
        }
        Commands::Range { board, min, max } => {
            let leaderboard = open(board);
            let members = leaderboard.members_in_score_range(*min, *max)?;
            print_listing(&leaderboard, &members, json)?;
            Ok(false)
        }
        Commands::RemoveRange { board, min, max } => {
            let removed = open(board).remove_members_in_score_range(*min, *max)?;
            println!("Removed {removed} members from {board}");
            Ok(removed > 0)
        }
        Commands::Merge(args) => {
            let count = open(&args.board).merge_leaderboards(
                &args.destination,
                args.sources.as_slice(),
                &args.options(),
            )?;
            println!("{} now has {count} members", args.destination);
            Ok(true)
        }
        Commands::Intersect(args) => {
            let count = open(&args.board).intersect_leaderboards(
                &args.destination,
                args.sources.as_slice(),
                &args.options(),
            )?;
            println!("{} now has {count} members", args.destination);
            Ok(true)
        }
        Commands::Clear { board } => Ok(open(board).clear()?),
        Commands::Boards => {
            let names = store.names();
            if json {
                output::print_value(&names);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
            Ok(false)
        }
        Commands::Init => unreachable!("handled before the store is loaded"),
    }
}

fn print_listing(
    leaderboard: &Leaderboard<MemoryStore>,
    members: &[rankboard_core::RankedMember],
    json: bool,
) -> rankboard_core::Result<()> {
    let total = leaderboard.total_members()?;
    if json {
        output::print_json(leaderboard.name(), members, total);
    } else {
        output::print_table(leaderboard.name(), members, total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_numbers_parse() {
        let cli = Cli::try_parse_from(["rankboard", "change", "weekly", "ada", "-5"]).unwrap();
        assert!(matches!(cli.command, Commands::Change { delta, .. } if delta == -5.0));

        let cli = Cli::try_parse_from(["rankboard", "leaders", "weekly", "--page", "-3"]).unwrap();
        assert!(matches!(cli.command, Commands::Leaders { page: -3, ascending: false, .. }));
    }

    #[test]
    fn test_combine_args() {
        let cli = Cli::try_parse_from([
            "rankboard", "intersect", "foo", "foobar", "bar", "baz",
            "--weight", "2", "--weight", "0.5", "--aggregate", "max",
        ])
        .unwrap();
        let Commands::Intersect(args) = cli.command else {
            panic!("expected intersect");
        };
        assert_eq!(args.sources, vec!["bar", "baz"]);
        let options = args.options();
        assert_eq!(options.weights, Some(vec![2.0, 0.5]));
        assert_eq!(options.aggregate, Aggregate::Max);
    }

    #[test]
    fn test_run_command_against_memory_store() {
        let store = Arc::new(MemoryStore::new());
        let cli = Cli::try_parse_from(["rankboard", "add", "weekly", "ada", "12.5"]).unwrap();
        assert!(run_command(&cli, &store, DEFAULT_PAGE_SIZE).unwrap());

        let cli = Cli::try_parse_from(["rankboard", "total", "weekly"]).unwrap();
        assert!(!run_command(&cli, &store, DEFAULT_PAGE_SIZE).unwrap());
        assert_eq!(store.names(), vec!["weekly".to_string()]);
    }

    #[test]
    fn test_removing_absent_member_is_not_a_change() {
        let store = Arc::new(MemoryStore::new());
        let cli = Cli::try_parse_from(["rankboard", "add", "weekly", "ada", "1"]).unwrap();
        run_command(&cli, &store, DEFAULT_PAGE_SIZE).unwrap();

        let cli = Cli::try_parse_from(["rankboard", "remove", "weekly", "ghost"]).unwrap();
        assert!(!run_command(&cli, &store, DEFAULT_PAGE_SIZE).unwrap());

        let cli = Cli::try_parse_from(["rankboard", "remove", "weekly", "ada"]).unwrap();
        assert!(run_command(&cli, &store, DEFAULT_PAGE_SIZE).unwrap());
    }

    #[test]
    fn test_infinite_score_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let cli = Cli::try_parse_from(["rankboard", "add", "weekly", "ada", "inf"]).unwrap();
        assert!(run_command(&cli, &store, DEFAULT_PAGE_SIZE).is_err());
        assert!(store.names().is_empty());
    }
}
