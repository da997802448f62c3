use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;
use tracing_subscriber::EnvFilter;

use netwatch::client::{Dispatcher, HttpTransport, LocalTransport, ToolTransport};
use netwatch::config::Settings;
use netwatch::resource::UiResource;
use netwatch::server::{self, McpServer};
use netwatch::state::{DashboardState, Msg};
use netwatch::tools::{CallerClass, ToolRequest, ToolResponse, ToolSurface};
use netwatch::ui::{self, Theme};
use netwatch::{events, App};
use netwatch_store::{ClickHouseStore, TelemetryAggregator};
use netwatch_types::FilterInput;

#[derive(Parser, Debug)]
#[command(name = "netwatch", version)]
#[command(about = "Network health dashboard over ClickHouse flow telemetry")]
struct Cli {
    /// TOML settings file (environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the tools as JSON-RPC over HTTP (POST /mcp)
    Serve {
        /// Address to bind (overrides LISTEN_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Serve the tools as JSON-RPC over stdin/stdout
    Stdio,

    /// Interactive terminal dashboard
    Tui(TuiArgs),

    /// Print the dashboard digest once and exit
    Snapshot(SnapshotArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Time window in hours (1-168)
    #[arg(long)]
    hours: Option<i64>,

    /// Only include traffic seen by this sensor address
    #[arg(long)]
    sensor_ip: Option<String>,

    /// Only include traffic seen by this sensor
    #[arg(long)]
    sensor_name: Option<String>,
}

impl FilterArgs {
    fn into_input(self) -> FilterInput {
        FilterInput {
            time_window_hours: self.hours,
            sensor_ip: self.sensor_ip,
            sensor_name: self.sensor_name,
            result_limit: None,
        }
    }
}

#[derive(Args, Debug)]
struct TuiArgs {
    /// JSON-RPC endpoint of a running server (e.g. http://localhost:8002/mcp).
    /// Queries ClickHouse in-process when omitted.
    #[arg(long)]
    connect: Option<String>,

    #[command(flatten)]
    filter: FilterArgs,

    /// Start with auto-refresh enabled
    #[arg(short, long)]
    auto_refresh: bool,

    /// Write logs to this file (the terminal is otherwise silent)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Also write the snapshot as JSON to this file
    #[arg(short, long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // the terminal owns stdout/stderr, so it only logs to a file
    match &cli.command {
        Command::Tui(args) => {
            if let Some(path) = &args.log_file {
                init_file_logging(path)?;
            }
        }
        _ => init_logging(),
    }

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.listen_host.clone());
            let port = port.unwrap_or(settings.port);
            run_http(&settings, &host, port).await
        }
        Command::Stdio => run_stdio(&settings).await,
        Command::Tui(args) => run_tui(&settings, args).await,
        Command::Snapshot(args) => run_snapshot(&settings, args).await,
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}

fn init_file_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn build_store(settings: &Settings) -> Arc<ClickHouseStore> {
    Arc::new(ClickHouseStore::new(settings.clickhouse()))
}

fn build_tools(settings: &Settings, store: Arc<ClickHouseStore>) -> ToolSurface {
    ToolSurface::new(TelemetryAggregator::new(store))
        .with_defaults(settings.default_hours, settings.default_limit)
}

fn build_server(settings: &Settings, store: Arc<ClickHouseStore>) -> Arc<McpServer> {
    Arc::new(McpServer::new(
        build_tools(settings, store),
        UiResource::new(&settings.ui_html_path),
    ))
}

/// Serve JSON-RPC over HTTP until interrupted
async fn run_http(settings: &Settings, host: &str, port: u16) -> Result<()> {
    let store = build_store(settings);
    info!(store = %store.config().url, database = %store.config().database, "Starting HTTP server");
    let server = build_server(settings, store.clone());

    let listener = server::http::bind(host, port)
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))?;

    tokio::select! {
        result = server::http::serve(listener, server) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    store.close();
    Ok(())
}

/// Serve JSON-RPC over stdio until stdin closes
async fn run_stdio(settings: &Settings) -> Result<()> {
    let store = build_store(settings);
    let server = build_server(settings, store.clone());

    tokio::select! {
        result = server::stdio::serve_stdio(server) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    store.close();
    Ok(())
}

/// One full load, printed as the digest
async fn run_snapshot(settings: &Settings, args: SnapshotArgs) -> Result<()> {
    let store = build_store(settings);
    let tools = build_tools(settings, store.clone());
    let filter = settings.filter(args.filter.into_input());

    let response = tools
        .execute(CallerClass::Agent, ToolRequest::ShowDashboard(filter))
        .await;
    store.close();

    let ToolResponse::Dashboard { digest, snapshot } = response? else {
        bail!("unexpected response to the dashboard tool");
    };
    println!("{}", digest);

    if let Some(path) = args.export {
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Exported snapshot to: {}", path.display());
    }
    Ok(())
}

/// Run the terminal dashboard
async fn run_tui(settings: &Settings, args: TuiArgs) -> Result<()> {
    let (transport, store): (Arc<dyn ToolTransport>, Option<Arc<ClickHouseStore>>) =
        match &args.connect {
            Some(endpoint) => {
                let transport = HttpTransport::builder()
                    .endpoint(endpoint.clone())
                    .timeout(settings.query_timeout() * 2)
                    .build();
                (Arc::new(transport), None)
            }
            None => {
                let store = build_store(settings);
                let transport = LocalTransport::new(build_tools(settings, store.clone()));
                (Arc::new(transport), Some(store))
            }
        };

    let filter = settings.filter(args.filter.into_input());
    let state = DashboardState::new(filter).with_refresh_period(settings.refresh_interval());

    // Detect the theme before the terminal switches to raw mode
    let theme = Theme::auto_detect();
    let mut app = App::new(state, theme, transport.description());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(transport, tx);
    dispatcher.run(app.state.start());
    if args.auto_refresh {
        dispatcher.run(app.toggle_auto_refresh());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // the loop blocks on terminal input; keep it off the async workers
    let result = tokio::task::block_in_place(|| {
        run_app(&mut terminal, &mut app, &mut dispatcher, &mut rx)
    });

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    drop(dispatcher);
    if let Some(store) = store {
        store.close();
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    dispatcher: &mut Dispatcher,
    rx: &mut UnboundedReceiver<Msg>,
) -> Result<()> {
    while app.running {
        // Reconcile tool responses and timer ticks
        while let Ok(msg) = rx.try_recv() {
            let commands = app.apply(msg);
            dispatcher.run(commands);
        }

        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            let commands = match event {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    events::handle_key_event(app, key)
                }
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => Vec::new(),
            };
            dispatcher.run(commands);
        }
    }

    Ok(())
}
