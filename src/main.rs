//! Pipeviz CLI - NLP pipeline viewer

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use pipeviz::answer::Answer;
use pipeviz::backend::{Backend, HttpBackend, MockBackend, QueryResult};
use pipeviz::catalog::builtin_groups;
use pipeviz::config::{ConfigOverrides, ViewerConfig};
use pipeviz::error::{FixSuggestion, PipevizError};
use pipeviz::pipeline::{RawStep, Stage};
use pipeviz::tui::widgets::{StageRenderer, ViewMode};
use pipeviz::tui::PipelineTheme;

#[derive(Parser)]
#[command(name = "pipeviz")]
#[command(about = "Pipeviz - step-by-step viewer for an NLP question-answering pipeline")]
#[command(version)]
struct Cli {
    /// Config file (default: ./pipeviz.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Question-answering service URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Auto-advance interval in milliseconds (1000-10000)
    #[arg(long, global = true, value_name = "MS")]
    interval: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Tui {
        /// Use built-in demo data instead of the service
        #[arg(long)]
        demo: bool,
    },

    /// List available questions
    Questions {
        #[arg(long)]
        demo: bool,
    },

    /// Run a question and print every stage
    Run {
        question: String,

        /// Rendering for stage payloads (default: best available per stage)
        #[arg(long, value_enum)]
        view: Option<ViewMode>,

        #[arg(long)]
        demo: bool,
    },

    /// Render a saved /run response (or bare step list) offline
    Inspect {
        /// Path to a JSON file
        file: PathBuf,

        #[arg(long, value_enum)]
        view: Option<ViewMode>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui { demo: false });

    let overrides = ConfigOverrides {
        config_path: cli.config,
        api_url: cli.api_url,
        interval_ms: cli.interval,
    };

    let result = match ViewerConfig::resolve(&overrides) {
        Ok(config) => {
            init_tracing(&config, matches!(command, Commands::Tui { .. }));
            dispatch(command, config).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e
            .downcast_ref::<PipevizError>()
            .and_then(|e| e.fix_suggestion())
        {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr, except in the dashboard where they go to the
/// configured file or nowhere.
fn init_tracing(config: &ViewerConfig, tui: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if !tui {
        builder.with_writer(std::io::stderr).init();
        return;
    }

    let file = config.log_file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        None => builder.with_writer(std::io::sink).init(),
    }
}

async fn dispatch(command: Commands, config: ViewerConfig) -> anyhow::Result<()> {
    match command {
        Commands::Tui { demo } => {
            let backend = make_backend(&config, demo)?;
            pipeviz::tui::run(&config, backend).await
        }
        Commands::Questions { demo } => {
            let backend = make_backend(&config, demo)?;
            list_questions(backend.as_ref()).await;
            Ok(())
        }
        Commands::Run {
            question,
            view,
            demo,
        } => {
            let backend = make_backend(&config, demo)?;
            run_question(backend.as_ref(), &question, view, &config).await?;
            Ok(())
        }
        Commands::Inspect { file, view } => {
            inspect_file(&file, view, &config).await?;
            Ok(())
        }
    }
}

fn make_backend(config: &ViewerConfig, demo: bool) -> Result<Arc<dyn Backend>, PipevizError> {
    if demo {
        return Ok(Arc::new(MockBackend::new()));
    }
    Ok(Arc::new(HttpBackend::new(config)?))
}

async fn list_questions(backend: &dyn Backend) {
    let questions = backend.questions().await;

    if questions.is_empty() {
        println!(
            "{} Service catalog unavailable, built-in questions:",
            "→".cyan()
        );
        for group in builtin_groups() {
            println!("{}", group.name.cyan().bold());
            for question in &group.questions {
                println!("  {}", question);
            }
        }
        return;
    }

    println!("{} {} questions", "→".cyan(), questions.len());
    for question in &questions {
        println!("  {}. {}", question.id.to_string().dimmed(), question.text);
    }
}

async fn run_question(
    backend: &dyn Backend,
    question: &str,
    view: Option<ViewMode>,
    config: &ViewerConfig,
) -> Result<(), PipevizError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(PipevizError::Config("question must not be empty".to_string()));
    }

    println!("{} {}", "Question:".cyan().bold(), question);
    let result = backend.run(question).await?;
    print_result(&result, view, config);
    Ok(())
}

async fn inspect_file(
    file: &Path,
    view: Option<ViewMode>,
    config: &ViewerConfig,
) -> Result<(), PipevizError> {
    let body = tokio::fs::read_to_string(file).await?;
    let result = match serde_json::from_str::<Vec<RawStep>>(&body) {
        Ok(steps) => QueryResult::new("", steps),
        Err(_) => QueryResult::from_json_str(&body)?,
    };
    print_result(&result, view, config);
    Ok(())
}

fn print_result(result: &QueryResult, view: Option<ViewMode>, config: &ViewerConfig) {
    let theme = PipelineTheme::new();
    let renderer = StageRenderer::new(&theme)
        .search_depth(config.functor_search_depth)
        .max_depth(config.max_render_depth);
    let pipeline = result.pipeline();

    for stage in Stage::ALL {
        let data = pipeline.slot(stage).map(|d| d.as_ref());
        let mode = data.map(|d| renderer.resolve(d, view));

        println!();
        println!(
            "{} {} {}",
            "──".dimmed(),
            stage.title().magenta().bold(),
            format!("({})", stage.description()).dimmed()
        );
        if let Some(mode) = mode {
            println!("{}", format!("[{}]", mode.label()).dimmed());
        }
        println!("{}", renderer.text(data, mode.unwrap_or(ViewMode::Raw)));
    }

    println!();
    match Answer::classify(&result.answer) {
        Some(answer) => println!(
            "{} {}",
            format!("{}:", answer.title()).green().bold(),
            answer
        ),
        None => println!("{} {}", "Answer:".green().bold(), "(none)".dimmed()),
    }
    if let Some(raw) = &pipeline.result_raw {
        println!("{} {}", "Result:".dimmed(), raw.to_compact_json());
    }

    let names: Vec<String> = result
        .steps
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s.name))
        .collect();
    println!("{} {}", "Steps:".dimmed(), names.join(", "));
}
