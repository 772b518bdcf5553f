use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tileweave::cli::commands;
use tileweave::config::GameConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tileweave")]
#[command(about = "A tile placement game core with a headless player and layout tools")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "tileweave.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a headless game, dragging deck tiles onto random option tiles
    Play {
        /// Layout file to import after the origin tile is laid
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Number of turns to play
        #[arg(short, long, default_value_t = 10)]
        turns: u32,

        /// Directory to save the final layout into
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Inspect a saved layout or one of its tiles
    Inspect {
        /// Path to the layout file
        #[arg(short, long)]
        layout: PathBuf,

        /// Tile coordinates as X,Y
        #[arg(short, long, allow_hyphen_values = true)]
        tile: Option<String>,
    },

    /// Manage saved layouts
    Layouts {
        #[command(subcommand)]
        action: LayoutAction,
    },
}

#[derive(Subcommand)]
enum LayoutAction {
    /// List available layouts
    List {
        /// Layout directory
        #[arg(short, long, default_value = "layouts")]
        dir: PathBuf,
    },
}

fn init_logging(level: &str, json: bool) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match GameConfig::from_file_or_default(Path::new(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.log_level, cli.log_json);

    let result = match cli.command {
        Commands::Play {
            layout,
            turns,
            save,
        } => commands::play(&config, layout.as_deref(), turns, save.as_deref()),
        Commands::Inspect { layout, tile } => commands::inspect(&config, &layout, tile.as_deref()),
        Commands::Layouts { action } => match action {
            LayoutAction::List { dir } => commands::list_layouts(&dir),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
