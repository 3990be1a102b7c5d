use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jkn_sentiment::{AppConfig, Dashboard, FsArtifactLoader, View, VisualizationTab};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jkn_sentiment")]
#[command(about = "📱 Mobile JKN sentiment analysis dashboard")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sentiment distribution overview
    Dashboard,
    /// Dataset summary and preview, optionally exported to CSV
    Dataset {
        /// Number of rows to preview
        #[arg(short, long)]
        rows: Option<usize>,
        /// Write the full dataset to this file (default: configured export file name)
        #[arg(long, num_args = 0..=1)]
        export: Option<Option<PathBuf>>,
    },
    /// Classify one review; reads stdin when TEXT is omitted
    Predict { text: Option<String> },
    /// Charts, word clouds and per-label statistics
    Visualize {
        #[arg(long, value_enum)]
        tab: Option<Tab>,
    },
    /// Interactive menu over all views
    Menu,
}

#[derive(Clone, Copy, ValueEnum)]
enum Tab {
    Distribution,
    WordCloud,
    Detail,
}

impl From<Tab> for VisualizationTab {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::Distribution => VisualizationTab::Distribution,
            Tab::WordCloud => VisualizationTab::WordCloud,
            Tab::Detail => VisualizationTab::Detail,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config: AppConfig = AppConfig::load(args.config.as_deref()).context("failed loading configuration")?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    let level = config.level().context("invalid --log-level")?;
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    info!(dataset = %config.dataset_path.display(), model_dir = %config.artifacts.model_dir.display(), "starting dashboard");
    let dashboard: Dashboard<FsArtifactLoader> = Dashboard::open(config);

    match args.command.unwrap_or(Command::Menu) {
        Command::Dashboard => println!("{}", dashboard.render(View::Dashboard)),
        Command::Dataset { rows, export } => {
            let rows: usize = rows.unwrap_or(dashboard.config().preview_rows);
            println!("{}", dashboard.render_dataset(rows));
            if let Some(target) = export {
                let (written, count) = dashboard.export_dataset(target.as_deref()).context("failed exporting dataset")?;
                println!("📥 {} baris disimpan ke {}", count, written.display());
            }
        }
        Command::Predict { text } => {
            let text: String = match text {
                Some(text) => text,
                None => std::io::read_to_string(std::io::stdin()).context("failed reading review from stdin")?,
            };
            print!("{}", dashboard.render_prediction(&text));
        }
        Command::Visualize { tab } => match tab {
            Some(tab) => println!("{}", dashboard.render_visualization(tab.into())),
            None => println!("{}", dashboard.render(View::Visualization)),
        },
        Command::Menu => run_menu(&dashboard)?,
    }

    Ok(())
}

fn print_menu() {
    println!("🚀 Navigation");
    for (i, view) in View::ALL.iter().enumerate() {
        println!("  {}. {}", i + 1, view.title());
    }
    println!("  q. Keluar");
}

fn run_menu(dashboard: &Dashboard<FsArtifactLoader>) -> Result<()> {
    let mut editor: DefaultEditor = DefaultEditor::new().context("failed starting line editor")?;
    println!("📱 Mobile JKN Sentiment Analysis");

    loop {
        print_menu();
        let line: String = match editor.readline("📋 Menu Utama > ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed reading menu choice"),
        };
        let choice: &str = line.trim();
        if choice.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(choice);
        if choice.eq_ignore_ascii_case("q") {
            break;
        }

        match View::from_choice(choice) {
            Some(View::ManualPrediction) => prediction_prompt(dashboard, &mut editor)?,
            Some(view) => println!("{}", dashboard.render(view)),
            None => println!("⚠️ Pilihan tidak dikenal: {}", choice),
        }
    }

    println!("🚀 Mobile JKN Sentiment Analysis Dashboard");
    Ok(())
}

/// One review per line until `q`, Ctrl-C or Ctrl-D
fn prediction_prompt(dashboard: &Dashboard<FsArtifactLoader>, editor: &mut DefaultEditor) -> Result<()> {
    print!("{}", dashboard.render_prediction_form());
    if !dashboard.inference().is_ready() {
        return Ok(());
    }

    println!("(ketik q untuk kembali ke menu)");
    loop {
        let line: String = match editor.readline("🔮 > ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e).context("failed reading review"),
        };
        if line.trim().eq_ignore_ascii_case("q") {
            return Ok(());
        }
        let _ = editor.add_history_entry(line.as_str());
        print!("{}", dashboard.render_prediction(&line));
    }
}
