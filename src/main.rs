use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use home_scout::auth::AuthContext;
use home_scout::config::{AppConfig, QueryServiceConfig};
use home_scout::listings::{
    HousingPriority, HttpListingStore, InMemorySavedStore, ListingFilter, ListingRecord,
    ListingStore, SavedStore,
};
use home_scout::models::{format_count, format_price};
use home_scout::query_service::HttpQueryService;
use home_scout::search::{GuidedSearch, SearchSession, Stage};
use home_scout::telemetry;
use home_scout::SearchError;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "home-scout",
    about = "Search property listings in plain language",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Guided search: describe a home, answer a few questions, browse results (default)
    Guided(GuidedArgs),
    /// Work with the listing store directly
    Listings {
        #[command(subcommand)]
        command: ListingsCommand,
        /// Override the configured listing API URL
        #[arg(long, global = true)]
        api_url: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
struct GuidedArgs {
    /// Start with this query instead of prompting for one
    #[arg(long)]
    query: Option<String>,
    /// Override the configured query service URL
    #[arg(long)]
    api_url: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Print results as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum ListingsCommand {
    /// List every listing
    List,
    /// Show one listing
    Get { id: String },
    /// Filtered search
    Search(SearchArgs),
    /// Delete a listing (requires HOME_SCOUT_ACCESS_TOKEN)
    Delete { id: String },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Location, keyword, or property ID
    #[arg(long)]
    query: Option<String>,
    /// house, apartment, condo, townhouse or all
    #[arg(long = "type")]
    property_type: Option<String>,
    #[arg(long)]
    min_price: Option<u64>,
    #[arg(long)]
    max_price: Option<u64>,
    /// Minimum bedrooms
    #[arg(long)]
    bedrooms: Option<u32>,
    /// Comma-separated, e.g. schools,transport
    #[arg(long, value_delimiter = ',')]
    priorities: Vec<HousingPriority>,
}

impl From<SearchArgs> for ListingFilter {
    fn from(args: SearchArgs) -> Self {
        Self {
            query: args.query,
            property_type: args.property_type,
            min_price: args.min_price,
            max_price: args.max_price,
            min_bedrooms: args.bedrooms,
            priorities: args.priorities,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init(&config.telemetry)?;

    info!("🏠 Home Scout ({:?})", config.environment);

    match cli.command {
        None => run_guided(config, GuidedArgs::default()).await,
        Some(Command::Guided(args)) => run_guided(config, args).await,
        Some(Command::Listings { command, api_url }) => {
            if let Some(url) = api_url {
                config.listings.base_url = url
                    .parse()
                    .with_context(|| format!("Invalid listing API URL: {}", url))?;
            }
            run_listings(config, command).await
        }
    }
}

async fn run_guided(config: AppConfig, args: GuidedArgs) -> Result<()> {
    let timeout = args
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(config.query_service.timeout);
    let service_config = match &args.api_url {
        Some(url) => QueryServiceConfig::new(url, timeout)?,
        None => QueryServiceConfig::new(config.query_service.base_url.as_str(), timeout)?,
    };
    info!("Using query service at {}", service_config.base_url);

    let service = HttpQueryService::new(&service_config)?;
    let mut search = GuidedSearch::with_timeout(service, timeout);
    let saved = InMemorySavedStore::new(Arc::new(AuthContext::with_token(config.access_token)));
    let mut prompt = Prompt::new();
    let mut pending_query = args.query;

    loop {
        match search.session().stage() {
            Stage::Initial => {
                let line = match pending_query.take() {
                    Some(query) => query,
                    None => match prompt.ask("What kind of property are you looking for?").await? {
                        Some(line) => line,
                        None => break,
                    },
                };
                match parse_command(&line) {
                    Input::Quit => break,
                    Input::Restart => search.start_over(),
                    _ => {
                        println!("Processing...");
                        if let Err(err) = search.submit_query(&line).await {
                            print_error(search.session(), &err);
                        }
                    }
                }
            }
            Stage::AwaitingClarification => {
                println!("\nLet's clarify your search");
                println!("{}\n", search.session().expanded_query());

                let questions = search.session().clarifying_questions().to_vec();
                let mut restarted = false;
                for (index, question) in questions.iter().enumerate() {
                    if !search.session().responses()[index].trim().is_empty() {
                        continue;
                    }
                    let Some(answer) = prompt.ask(question).await? else {
                        return Ok(());
                    };
                    match parse_command(&answer) {
                        Input::Quit => return Ok(()),
                        Input::Restart => {
                            search.start_over();
                            restarted = true;
                            break;
                        }
                        _ => search.set_response(index, answer)?,
                    }
                }
                if restarted {
                    continue;
                }

                println!("Searching...");
                if let Err(err) = search.submit_responses().await {
                    print_error(search.session(), &err);
                    let Some(line) = prompt.ask("Press enter to retry, or :restart / :quit:").await? else {
                        break;
                    };
                    match parse_command(&line) {
                        Input::Quit => break,
                        Input::Restart => search.start_over(),
                        _ => {}
                    }
                }
            }
            Stage::Complete => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(search.session().results())?);
                } else {
                    print_results(search.session());
                }

                let Some(line) = prompt
                    .ask("n <#>/p <#> photos, s <#> save, :restart, :quit, or a new search:")
                    .await?
                else {
                    break;
                };
                match parse_command(&line) {
                    Input::Quit => break,
                    Input::Restart => search.new_search(),
                    Input::NextImage(listing) => {
                        if let Err(err) = search.next_image(listing) {
                            println!("{}", err);
                        }
                    }
                    Input::PreviousImage(listing) => {
                        if let Err(err) = search.previous_image(listing) {
                            println!("{}", err);
                        }
                    }
                    Input::Save(listing) => toggle_saved(&saved, search.session(), listing).await,
                    Input::Text(query) => {
                        println!("Processing...");
                        if let Err(err) = search.submit_query(&query).await {
                            print_error(search.session(), &err);
                        }
                    }
                }
            }
        }
    }

    info!("Goodbye");
    Ok(())
}

async fn run_listings(config: AppConfig, command: ListingsCommand) -> Result<()> {
    let auth = Arc::new(AuthContext::with_token(config.access_token));
    let store = HttpListingStore::new(&config.listings, auth)?;

    match command {
        ListingsCommand::List => print_records(&store.list().await?),
        ListingsCommand::Get { id } => print_records(&[store.get(&id).await?]),
        ListingsCommand::Search(args) => {
            let filter = ListingFilter::from(args);
            let records = store.search(&filter).await?;
            info!("Found {} listing(s)", records.len());
            print_records(&records);
        }
        ListingsCommand::Delete { id } => {
            store.delete(&id).await?;
            println!("Deleted listing {}", id);
        }
    }

    Ok(())
}

async fn toggle_saved(saved: &InMemorySavedStore, session: &SearchSession, listing: usize) {
    let Some(id) = session
        .results()
        .get(listing)
        .and_then(|listing| listing.id.clone().or_else(|| listing.url.clone()))
    else {
        println!("Listing {} can't be saved: it has no id", listing + 1);
        return;
    };

    match saved.toggle(&id).await {
        Ok(true) => println!("Saved listing {}", listing + 1),
        Ok(false) => println!("Removed listing {} from saved", listing + 1),
        Err(err) => println!("{}", err),
    }
}

#[derive(Debug, PartialEq)]
enum Input {
    Quit,
    Restart,
    NextImage(usize),
    PreviousImage(usize),
    Save(usize),
    Text(String),
}

/// Listing numbers on screen start at 1.
fn parse_command(line: &str) -> Input {
    let line = line.trim();
    match line {
        ":quit" | ":q" => return Input::Quit,
        ":restart" | ":new" => return Input::Restart,
        _ => {}
    }

    let mut parts = line.split_whitespace();
    let (Some(verb), Some(number), None) = (parts.next(), parts.next(), parts.next()) else {
        return Input::Text(line.to_string());
    };
    let Some(index) = number.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
        return Input::Text(line.to_string());
    };

    match verb {
        "n" => Input::NextImage(index),
        "p" => Input::PreviousImage(index),
        "s" => Input::Save(index),
        _ => Input::Text(line.to_string()),
    }
}

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` at end of input.
    async fn ask(&mut self, label: &str) -> Result<Option<String>> {
        print!("{} ", label);
        std::io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await
            .context("Failed to read from stdin")?
            .map(|line| line.trim().to_string()))
    }
}

fn print_error(session: &SearchSession, err: &SearchError) {
    match session.last_error() {
        Some(message) => println!("Error: {}", message),
        None => println!("Error: {}", err),
    }
    if err.is_remote() {
        println!("The search service did not give a usable answer. Your input is kept.");
    }
}

fn print_results(session: &SearchSession) {
    let results = session.results();
    println!("\n✅ Search Results ({})\n", results.len());

    if results.is_empty() {
        println!("No properties found matching your criteria.");
        return;
    }

    for (i, listing) in results.iter().enumerate() {
        println!("{}. {} ({})", i + 1, listing.location.headline(), listing.price_label());
        println!(
            "   {} beds, {} baths, {} sqft, built {}",
            opt(listing.beds),
            opt(listing.full_baths),
            format_count(listing.sqft),
            opt(listing.year_built)
        );
        println!(
            "   Type: {}  Status: {}",
            listing.property_type.as_deref().unwrap_or("N/A"),
            listing.status
        );
        if let (Some(image), Some(carousel)) = (session.active_image(i), session.carousel(i)) {
            println!(
                "   Photo {}/{}: {}",
                carousel.active_index() + 1,
                carousel.len(),
                image
            );
        }
        if let Some(url) = &listing.url {
            println!("   URL: {}", url);
        }
        println!("   {}", listing.summary());
        println!();
    }
}

fn print_records(records: &[ListingRecord]) {
    for (i, record) in records.iter().enumerate() {
        println!("{}. {} ({})", i + 1, record.title, format_price(Some(record.price)));
        println!("   {}", record.address);
        println!(
            "   {} beds, {} baths, {} sqft{}",
            record.bedrooms,
            record.bathrooms,
            format_count(Some(u64::from(record.area))),
            record
                .property_type
                .as_deref()
                .map(|kind| format!(", {}", kind))
                .unwrap_or_default()
        );
        println!("   ID: {}", record.id);
        println!();
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
