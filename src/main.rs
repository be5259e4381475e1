use std::{path::PathBuf, sync::Arc, sync::mpsc, thread};

use chrono::NaiveDate;
use clap::{Parser, Subcommand, arg};
use log::{debug, error, info, warn};

use checkon::api::{AuthToken, Backend, City, HttpBackend, PackingBag};
use checkon::catalog::{Catalog, normalize_label};
use checkon::recommender::{RecommendationSource, RecommendedItem, Recommender, group_by_category};
use checkon::session::{SessionEvent, SessionHandle, SessionOptions, TripUpdate};
use checkon::trip::{
    Labelled, PlanningStyle, Purpose, TransportMode, TripAttributes, WizardStep, parse_labels,
};
use checkon::{AppConfig, CheckOnError, ChecklistDraft, SelectedItem, submit_checklist, writer};

const TOKEN_ENV_VAR: &str = "CHECKON_TOKEN";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Bearer token for the backend. The CHECKON_TOKEN variable takes precedence
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct TripArgs {
    /// healing, activity, business, culture or camping
    #[arg(short, long)]
    purpose: Option<String>,

    /// rental-car or public-transit
    #[arg(short, long)]
    transport: Option<String>,

    /// hiking, sea-swim, food-tour or historic-sites (repeatable)
    #[arg(long = "activity")]
    activities: Vec<String>,

    /// infant, minor, elderly or pet (repeatable)
    #[arg(long = "companion")]
    companions: Vec<String>,

    #[arg(long)]
    minimal: Option<bool>,

    #[arg(long)]
    exchange: Option<bool>,
}

impl TripArgs {
    fn to_attributes(&self) -> TripAttributes {
        TripAttributes {
            purpose: self.purpose.as_deref().and_then(Purpose::from_label),
            transport_mode: self.transport.as_deref().and_then(TransportMode::from_label),
            activities: parse_labels(&self.activities),
            minimal_packing: self.minimal,
            needs_currency_exchange: self.exchange,
            companions: parse_labels(&self.companions),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
struct PlanArgs {
    #[command(flatten)]
    trip: TripArgs,

    #[arg(long)]
    city_id: u32,

    /// First day of the trip (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last day of the trip (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    #[arg(long)]
    title: Option<String>,

    /// Write every item by hand instead of asking for recommendations
    #[arg(long)]
    custom: bool,

    /// Item to add to the checklist (repeatable)
    #[arg(long = "add")]
    add: Vec<String>,

    /// Recommended item to leave out (repeatable)
    #[arg(long = "remove")]
    remove: Vec<String>,

    /// Item that goes in checked baggage (repeatable)
    #[arg(long = "hold")]
    hold: Vec<String>,

    /// Journal file for session events
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Create the checklist on the backend
    #[arg(long)]
    submit: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recommend items from the local rules, without the backend
    Recommend {
        #[command(flatten)]
        trip: TripArgs,
    },
    /// Plan a trip checklist with backend recommendations
    Plan(PlanArgs),
    /// List the cities known to the backend
    Cities,
    /// List the backend's item catalog
    Catalog,
    /// Show or change the saved configuration
    Config {
        #[arg(long)]
        show: bool,

        #[arg(long)]
        set_api_url: Option<String>,

        #[arg(long)]
        set_token: Option<String>,

        #[arg(long)]
        set_user_id: Option<u64>,
    },
}

fn resolve_token(cli_token: Option<&str>, config: &AppConfig) -> Option<AuthToken> {
    std::env::var(TOKEN_ENV_VAR)
        .ok()
        .and_then(AuthToken::new)
        .or_else(|| cli_token.and_then(AuthToken::new))
        .or_else(|| config.auth_token.as_deref().and_then(AuthToken::new))
}

fn print_items(items: &[RecommendedItem]) {
    for group in group_by_category(items) {
        println!("{}:", group.category_label);
        for item in group.items {
            println!("  - {}", item);
        }
    }
}

fn recommend(trip: &TripArgs) {
    let recommender = Recommender::default();
    let items = recommender.local_items(&trip.to_attributes());
    print_items(&items);
}

async fn load_catalog(backend: &dyn Backend) -> Catalog {
    match backend.list_catalog().await {
        Ok(entries) if !entries.is_empty() => Catalog::from_entries(&entries),
        Ok(_) => {
            warn!("Backend catalog is empty, using the built-in catalog");
            Catalog::builtin()
        }
        Err(e) => {
            warn!("Could not load the item catalog ({}), using the built-in catalog", e);
            Catalog::builtin()
        }
    }
}

async fn resolve_city(backend: &dyn Backend, city_id: u32) -> Result<City, CheckOnError> {
    match backend.list_cities().await {
        Ok(cities) => cities
            .into_iter()
            .find(|city| city.city_id == city_id)
            .ok_or(CheckOnError::InvalidUserInput {
                field: "city".to_string(),
                reason: format!("unknown city id {}", city_id),
            }),
        Err(e) => {
            warn!("Could not load cities ({}), continuing with city {}", e, city_id);
            Ok(City {
                city_id,
                city_name: format!("City {}", city_id),
            })
        }
    }
}

async fn answer_wizard(
    session: &SessionHandle,
    args: &PlanArgs,
    city: City,
    catalog: &Catalog,
) -> Result<(), CheckOnError> {
    let trip = args.trip.to_attributes();
    session.update(TripUpdate::City(Some(city))).await?;
    session.update(TripUpdate::Step(WizardStep::Date)).await?;
    session
        .update(TripUpdate::Dates {
            start: Some(args.start),
            end: Some(args.end),
        })
        .await?;
    session.update(TripUpdate::Step(WizardStep::Companion)).await?;
    for companion in trip.companions {
        session.update(TripUpdate::ToggleCompanion(companion)).await?;
    }
    session.update(TripUpdate::Step(WizardStep::Purpose)).await?;
    session.update(TripUpdate::Purpose(trip.purpose)).await?;
    session.update(TripUpdate::Step(WizardStep::PlanningStyle)).await?;

    if args.custom {
        session
            .update(TripUpdate::PlanningStyle(Some(PlanningStyle::Custom)))
            .await?;
        session.update(TripUpdate::Step(WizardStep::CustomItems)).await?;
        for label in &args.add {
            session.update(TripUpdate::AddCustomItem(label.clone())).await?;
        }
        return Ok(());
    }

    session
        .update(TripUpdate::PlanningStyle(Some(PlanningStyle::Recommended)))
        .await?;
    session.update(TripUpdate::Step(WizardStep::Transport)).await?;
    session.update(TripUpdate::Transport(trip.transport_mode)).await?;
    session.update(TripUpdate::Step(WizardStep::Activities)).await?;
    for activity in trip.activities {
        session.update(TripUpdate::ToggleActivity(activity)).await?;
    }
    session.update(TripUpdate::Step(WizardStep::Minimal)).await?;
    session
        .update(TripUpdate::MinimalPacking(trip.minimal_packing))
        .await?;
    session.update(TripUpdate::Step(WizardStep::Exchange)).await?;
    session
        .update(TripUpdate::CurrencyExchange(trip.needs_currency_exchange))
        .await?;
    session.update(TripUpdate::Step(WizardStep::Items)).await?;

    let snapshot = session.settled().await?;
    if let Some(message) = &snapshot.last_error {
        warn!("Using local recommendations: {}", message);
    }
    if let Some(recommendations) = &snapshot.recommendations {
        println!("Recommended items:");
        print_items(&recommendations.items);
    }

    for label in &args.remove {
        let wanted = normalize_label(label);
        match snapshot
            .selected
            .iter()
            .find(|item| normalize_label(&item.item_label) == wanted)
        {
            Some(item) => {
                session.set_selected(item.clone(), false).await?;
            }
            None => warn!("'{}' is not selected, nothing to remove", label),
        }
    }
    for label in &args.add {
        let item: SelectedItem =
            RecommendedItem::from_label(label, catalog, RecommendationSource::User).into();
        session.set_selected(item, true).await?;
    }
    session.update(TripUpdate::Step(WizardStep::Done)).await?;
    Ok(())
}

async fn run_wizard(
    session: &SessionHandle,
    args: &PlanArgs,
    city: City,
    catalog: &Catalog,
    user_id: u64,
) -> Result<ChecklistDraft, CheckOnError> {
    answer_wizard(session, args, city, catalog).await?;
    let selection = session.finalize().await?;
    if selection.defaulted {
        warn!("No items selected, using the minimal item set");
    }
    let snapshot = session.snapshot().await?;

    let mut editor = snapshot.checklist_editor(user_id, &selection);
    if let Some(title) = &args.title {
        editor.set_title(title.as_str());
    }
    for label in &args.hold {
        if editor.set_packing_bag_for_label(label, PackingBag::Hold) == 0 {
            warn!("'{}' is not on the checklist", label);
        }
    }
    Ok(editor.to_draft())
}

async fn plan(
    args: PlanArgs,
    config: &AppConfig,
    token: Option<AuthToken>,
) -> Result<(), CheckOnError> {
    if args.submit && token.is_none() {
        return Err(CheckOnError::MissingAuthToken);
    }
    let backend = Arc::new(HttpBackend::from_config(config)?);
    let catalog = load_catalog(backend.as_ref()).await;
    let city = resolve_city(backend.as_ref(), args.city_id).await?;
    let recommender = Arc::new(Recommender::new(catalog));

    // if we need to write a journal the session also sends its events to a writer thread
    let (events, journal_writer) = match &args.output {
        Some(output_file) => {
            let (event_tx, event_rx) = mpsc::channel::<SessionEvent>();
            let output_file = output_file.clone();
            let writer_thread =
                thread::spawn(move || writer::write_session_events(&output_file, event_rx));
            (Some(event_tx), Some(writer_thread))
        }
        None => (None, None),
    };

    let session = SessionHandle::spawn(
        backend.clone(),
        recommender.clone(),
        SessionOptions {
            token: token.clone(),
            retry_policy: config.retry_policy(),
            events,
        },
    );

    let outcome = run_wizard(&session, &args, city, recommender.catalog(), config.user_id).await;

    // the journal is complete once the session task has dropped its sender
    if let Err(e) = session.shutdown().await {
        debug!("Session already stopped: {}", e);
    }
    drop(session);
    if let Some(writer_thread) = journal_writer {
        match tokio::task::spawn_blocking(move || writer_thread.join()).await {
            Ok(Ok(Ok(written))) => info!("Wrote {} session events", written),
            Ok(Ok(Err(e))) => warn!("Session journal incomplete: {}", e),
            _ => warn!("Session journal writer stopped unexpectedly"),
        }
    }

    let draft = outcome?;
    let payload = draft.build_payload(recommender.catalog())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).unwrap_or_else(|_| format!("{:?}", payload))
    );

    if args.submit {
        let created =
            submit_checklist(backend.as_ref(), &draft, recommender.catalog(), token.as_ref())
                .await?;
        println!("Created checklist {}", created.checklist_id);
    }
    Ok(())
}

async fn list_cities(config: &AppConfig) -> Result<(), CheckOnError> {
    let backend = HttpBackend::from_config(config)?;
    for city in backend.list_cities().await? {
        println!("{}\t{}", city.city_id, city.city_name);
    }
    Ok(())
}

async fn list_catalog(config: &AppConfig) -> Result<(), CheckOnError> {
    let backend = HttpBackend::from_config(config)?;
    let catalog = Catalog::from_entries(&backend.list_catalog().await?);
    for category in catalog.categories() {
        println!("{}:", category.label);
        for item in &category.items {
            match item.item_id {
                Some(item_id) => println!("  {:>4} {}", item_id, item.label),
                None => println!("       {}", item.label),
            }
        }
    }
    Ok(())
}

fn update_config(
    mut config: AppConfig,
    show: bool,
    api_url: Option<String>,
    token: Option<String>,
    user_id: Option<u64>,
) -> Result<(), CheckOnError> {
    let changed = api_url.is_some() || token.is_some() || user_id.is_some();
    if let Some(api_url) = api_url {
        config.api_base_url = api_url;
    }
    if let Some(token) = token {
        config.auth_token = AuthToken::new(token).map(|token| token.bearer().to_string());
    }
    if let Some(user_id) = user_id {
        config.user_id = user_id;
    }
    if changed {
        config.save()?;
        info!("Saved config to {:?}", AppConfig::config_path()?);
    }
    if show || !changed {
        let shown = AppConfig {
            auth_token: config.auth_token.as_ref().map(|_| "***".to_string()),
            ..config
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&shown)
                .map_err(|e| CheckOnError::ConfigSerializeError { source: e })?
        );
    }
    Ok(())
}

async fn run(cli: Args) -> Result<(), CheckOnError> {
    let config = match AppConfig::from_local_file() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            warn!("Could not read config ({}), using defaults", e);
            AppConfig::default()
        }
    };
    let token = resolve_token(cli.token.as_deref(), &config);

    match cli.command {
        Commands::Recommend { trip } => {
            recommend(&trip);
            Ok(())
        }
        Commands::Plan(args) => plan(args, &config, token).await,
        Commands::Cities => list_cities(&config).await,
        Commands::Catalog => list_catalog(&config).await,
        Commands::Config {
            show,
            set_api_url,
            set_token,
            set_user_id,
        } => update_config(config, show, set_api_url, set_token, set_user_id),
    }
}

#[tokio::main]
async fn main() {
    colog::init();

    let cli = Args::parse();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
