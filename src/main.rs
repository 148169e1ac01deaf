use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use park_atlas::{
    aggregate::{aggregate, stack_keys},
    config::Config,
    observations::ObservationSet,
    scale::{category_ordering, stacked_max},
    state::AppState,
    ui,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    fs::File,
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

#[derive(Parser, Debug)]
#[command(name = "park-atlas", about = "National park species explorer")]
struct Cli {
    /// TOML config file (default: ./park_atlas.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `data.dir` from the config
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive map (default)
    View,
    /// Print species counts for one park
    Summary { park: String },
}

fn init_logging(log_file: Option<&PathBuf>) -> io::Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

fn summary(config: &Config, park: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = &config.data;
    let observations = ObservationSet::load(data.resolve(&data.observations))?;
    let agg = aggregate(observations.records(), park)?;
    if agg.is_empty() {
        println!("{}: no observations", park);
        return Ok(());
    }

    println!("{} ({} species)", park, agg.total());
    println!("\nSpecies by category");
    for category in category_ordering(&agg.category_counts) {
        println!("  {:<24} {}", category, agg.category_counts[&category]);
    }

    let keys = stack_keys(&agg.statuses, &config.chart.baseline_statuses);
    println!("\nSpecies by conservation status (max stacked {})", stacked_max(&agg.category_status_counts, &keys));
    for (category, statuses) in &agg.category_status_counts {
        let parts: Vec<String> = statuses.iter().map(|(s, n)| format!("{}: {}", s, n)).collect();
        println!("  {:<24} {}", category, parts.join(", "));
    }
    Ok(())
}

fn run_tui(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = AppState::load(config)?;
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // the terminal is restored even when the loop fails
    let result = event_loop(&mut terminal, &mut state);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::rng();
    loop {
        let now = Instant::now();
        state.tick(now, &mut rng);
        terminal.draw(|f| ui::draw(f, state, now))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = event::read()? {
                if state.handle_input(code) {
                    return Ok(());
                }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }

    match cli.command.unwrap_or(Command::View) {
        Command::View => run_tui(&config),
        Command::Summary { park } => summary(&config, &park),
    }
}
