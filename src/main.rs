use std::{
    error::Error,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Parser, Subcommand};
use log::{debug, warn};
use swingview::{
    Club, ClubStore, Dataset, FetcherConfig, StatsStore, SwingError, SwingFetcher,
    SwingStatsSnapshot,
    preferences::FileBasedStorage,
    view::{self, EMPTY_STATE},
    writer,
};

const DEFAULT_WATCH_INTERVAL_S: u64 = 5;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the swing analyzer
    #[arg(long, global = true)]
    analyzer_url: Option<String>,

    /// URL of a simulated swing list
    #[arg(long, global = true)]
    simulated_url: Option<String>,

    /// Try the simulated swing list before the analyzer
    #[arg(long, global = true)]
    use_simulated: bool,

    /// Directory holding the stored preferences
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the swing list once and print it
    Swings {
        #[arg(short, long)]
        tempo: bool,
    },
    /// Keep fetching the swing list until Ctrl-C
    Watch {
        #[arg(short, long)]
        tempo: bool,

        #[arg(short, long, default_value_t = DEFAULT_WATCH_INTERVAL_S)]
        interval: u64,
    },
    /// Fetch the latest swing from the analyzer and store it
    Latest,
    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },
    Club {
        #[command(subcommand)]
        action: ClubAction,
    },
    /// Fetch the swing list and write it as JSON Lines
    Export {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long)]
        tempo: bool,
    },
}

#[derive(Subcommand, Debug)]
enum StatsAction {
    Show,
    /// Store a made-up measurement for the selected club
    Mock,
    Clear,
}

#[derive(Subcommand, Debug)]
enum ClubAction {
    Show,
    Set { club: Club },
    Clear,
    List,
}

fn dataset(tempo: bool) -> Dataset {
    if tempo { Dataset::Tempo } else { Dataset::Metrics }
}

fn fetcher_config(cli: &Args) -> FetcherConfig {
    let mut config = FetcherConfig::load();
    if let Some(url) = &cli.analyzer_url {
        config.analyzer_url = url.clone();
    }
    if let Some(url) = &cli.simulated_url {
        config.simulated_url = Some(url.clone());
    }
    if cli.use_simulated {
        config.use_simulated = true;
    }
    config
}

struct Stores {
    club: ClubStore,
    stats: StatsStore,
}

impl Stores {
    fn open(data_dir: Option<&PathBuf>) -> Result<Self, SwingError> {
        let storage = match data_dir {
            Some(dir) => FileBasedStorage::new(dir.clone())?,
            None => FileBasedStorage::new_default()?,
        };
        let stores = Self {
            club: ClubStore::new(storage.clone()),
            stats: StatsStore::new(storage),
        };
        stores.flush();
        Ok(stores)
    }

    fn flush(&self) {
        self.club.flush();
        self.stats.flush();
    }
}

async fn swings(fetcher: &SwingFetcher, dataset: Dataset) {
    let outcome = fetcher.fetch_cycle(dataset).await;
    println!("{}", view::render_swing_table(&outcome.records, dataset));
    if !outcome.records.is_empty() {
        println!(
            "\n{}",
            view::render_source_line(outcome.source, outcome.records.len())
        );
    }
}

async fn watch(fetcher: &SwingFetcher, dataset: Dataset, interval: u64) {
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    let interval = Duration::from_secs(interval.max(1));
    loop {
        println!("--- {} ---", chrono::Local::now().format("%H:%M:%S"));
        swings(fetcher, dataset).await;
        tokio::time::sleep(interval).await;
    }
}

async fn latest(fetcher: &SwingFetcher, stores: &Stores) -> Result<(), SwingError> {
    let snapshot = fetcher.fetch_latest().await?;
    stores.stats.write(snapshot.clone());
    println!(
        "{}",
        view::render_stats_card(Some(&snapshot), stores.club.read())
    );
    Ok(())
}

fn stats(action: &StatsAction, stores: &Stores) {
    let club = stores.club.read();
    match action {
        StatsAction::Show => {
            println!(
                "{}",
                view::render_stats_card(stores.stats.read().as_ref(), club)
            );
        }
        StatsAction::Mock => {
            let snapshot = SwingStatsSnapshot::mock(club);
            stores.stats.write(snapshot.clone());
            println!("{}", view::render_stats_card(Some(&snapshot), club));
        }
        StatsAction::Clear => {
            stores.stats.clear();
            println!("Swing stats cleared");
        }
    }
}

fn club(action: &ClubAction, stores: &Stores) {
    match action {
        ClubAction::Show => match stores.club.read() {
            Some(club) => println!("{club}"),
            None => println!("No club selected"),
        },
        ClubAction::Set { club } => {
            stores.club.write(*club);
            println!("Selected {club}");
        }
        ClubAction::Clear => {
            stores.club.clear();
            println!("Club selection cleared");
        }
        ClubAction::List => println!("{}", view::render_club_list(stores.club.read())),
    }
}

async fn export(fetcher: &SwingFetcher, dataset: Dataset, output: &Path) -> Result<(), SwingError> {
    let outcome = fetcher.fetch_cycle(dataset).await;
    if outcome.records.is_empty() {
        println!("{EMPTY_STATE}");
    }
    writer::export_records(output, &outcome.records)?;
    println!("Wrote {} swings to {}", outcome.records.len(), output.display());
    Ok(())
}

async fn run(cli: Args) -> Result<(), SwingError> {
    match &cli.command {
        Commands::Swings { tempo } => {
            let fetcher = SwingFetcher::new(fetcher_config(&cli))?;
            swings(&fetcher, dataset(*tempo)).await;
        }
        Commands::Watch { tempo, interval } => {
            let fetcher = SwingFetcher::new(fetcher_config(&cli))?;
            watch(&fetcher, dataset(*tempo), *interval).await;
        }
        Commands::Export { output, tempo } => {
            let fetcher = SwingFetcher::new(fetcher_config(&cli))?;
            export(&fetcher, dataset(*tempo), output).await?;
        }
        Commands::Latest => {
            let fetcher = SwingFetcher::new(fetcher_config(&cli))?;
            let stores = Stores::open(cli.data_dir.as_ref())?;
            let result = latest(&fetcher, &stores).await;
            stores.flush();
            result?;
        }
        Commands::Stats { action } => {
            let stores = Stores::open(cli.data_dir.as_ref())?;
            stats(action, &stores);
            stores.flush();
        }
        Commands::Club { action } => {
            let stores = Stores::open(cli.data_dir.as_ref())?;
            club(action, &stores);
            stores.flush();
        }
    }
    Ok(())
}

fn report(e: &SwingError) {
    eprintln!("Error: {e}");
    let mut source = e.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    debug!("Running {:?}", cli.command);
    if let Err(e) = run(cli).await {
        report(&e);
        std::process::exit(1);
    }
}
