//! A terminal front end for `react-loop`: runs demo tasks or chats with the
//! agent interactively.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use react_loop::Config;
use react_loop::core::{
    Agent, AgentBuilder, AgentEvent, CancellationToken, RunError, RunResult,
    Strategy, truncate_chars,
};
use react_loop::research::{
    RESEARCH_MAX_ITERATIONS, RESEARCH_MAX_TOKENS, ResearchAgent,
    ResearchReport,
};
use react_loop::tools::default_registry;
use tokio::io::{self, AsyncBufReadExt};
use tokio::{select, signal};

const BAR_CHAR: &str = "▎";
const OBSERVATION_PREVIEW: usize = 200;
const COMPARE_COMMAND: &str = "/compare ";

const DEMO_TASKS: &[&str] = &[
    "What is 23 * 17 + 156?",
    "Who was Alexander Pushkin and in which year was he born?",
    "What year is it now?",
];

const DEMO_TOPICS: &[&str] = &["Who founded OpenAI and in which year?"];

#[derive(Parser)]
#[command(version, about = "A reasoning-and-acting agent in the terminal")]
struct Args {
    /// Chat with the agent instead of running the demo tasks.
    #[arg(short, long)]
    interactive: bool,

    /// How the agent exchanges tool calls with the model.
    #[arg(long, value_enum, default_value_t = Mode::React)]
    strategy: Mode,

    /// Upper bound of model turns per task.
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Model name understood by the API.
    #[arg(long, env = "OPENROUTER_MODEL")]
    model: Option<String>,

    /// API key of the OpenAI-compatible endpoint.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint.
    #[arg(long, env = "OPENROUTER_BASE_URL")]
    base_url: Option<String>,

    /// Print results as JSON instead of the colored trace.
    #[arg(long)]
    json: bool,

    /// Tasks to run instead of the built-in demo.
    tasks: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// THOUGHT / ACTION / ANSWER text protocol.
    React,
    /// Native structured tool calls.
    FunctionCalling,
    /// Text protocol with research instructions and a research log.
    Research,
}

enum Runner {
    Agent(Agent),
    Research(ResearchAgent),
}

enum Outcome {
    Run(RunResult),
    Research(ResearchReport),
}

impl Outcome {
    fn result(&self) -> &RunResult {
        match self {
            Outcome::Run(result) => result,
            Outcome::Research(report) => &report.result,
        }
    }
}

impl Runner {
    async fn run(
        &self,
        input: &str,
        cancel: CancellationToken,
    ) -> Result<Outcome, RunError> {
        match self {
            Runner::Agent(agent) => agent
                .run_with_cancellation(input, cancel)
                .await
                .map(Outcome::Run),
            Runner::Research(agent) => {
                let report = match input.strip_prefix(COMPARE_COMMAND) {
                    Some(items) => {
                        let items = items
                            .split(',')
                            .map(str::trim)
                            .filter(|item| !item.is_empty())
                            .collect::<Vec<_>>();
                        agent.compare_with_cancellation(&items, None, cancel).await?
                    }
                    None => agent.research_with_cancellation(input, cancel).await?,
                };
                Ok(Outcome::Research(report))
            }
        }
    }
}

/// Renders agent events as a colored trace.
struct Trace {
    style: ProgressStyle,
    spinner: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Trace {
    fn new(quiet: bool) -> anyhow::Result<Self> {
        let style = ProgressStyle::with_template("{spinner} {wide_msg}")
            .context("invalid spinner template")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        Ok(Self {
            style,
            spinner: Mutex::new(None),
            quiet,
        })
    }

    fn on_event(&self, event: &AgentEvent<'_>) {
        if let AgentEvent::IterationStarted { index } = event {
            self.start_spinner(*index);
            return;
        }
        // Finish the spinner before printing anything else.
        self.stop_spinner();
        if self.quiet {
            return;
        }

        let bar = BAR_CHAR;
        match *event {
            AgentEvent::TaskStarted { task } => {
                println!("\n{}🎯 {}", bar.bright_white(), task.bold());
            }
            AgentEvent::IterationStarted { .. } => {}
            AgentEvent::ModelResponse { index, content } => {
                println!("{}--- iteration {index} ---", bar.dimmed());
                for line in content.trim().lines() {
                    println!("{}🤖 {}", bar.bright_cyan(), line.bright_white());
                }
            }
            AgentEvent::Action {
                tool, argument, ..
            } => {
                println!(
                    "{}🔧 {}(\"{}\")",
                    bar.bright_yellow(),
                    tool.bold(),
                    argument
                );
            }
            AgentEvent::Observation { output, .. } => {
                let preview = truncate_chars(output, OBSERVATION_PREVIEW);
                let ellipsis = if preview.len() < output.len() { "..." } else { "" };
                println!("{}👁  {preview}{ellipsis}", bar.bright_green());
            }
            AgentEvent::MissingAction { .. } => {
                println!(
                    "{}⚠️  no ACTION or ANSWER, asking the model to continue",
                    bar.yellow()
                );
            }
            AgentEvent::Answer { answer, .. } => {
                println!("{}✅ {}", bar.bright_green(), answer.bright_white());
            }
            AgentEvent::Exhausted { iterations } => {
                println!(
                    "{}❌ no answer after {iterations} iterations",
                    bar.bright_red()
                );
            }
        }
    }

    fn start_spinner(&self, index: usize) {
        let mut spinner =
            self.spinner.lock().unwrap_or_else(PoisonError::into_inner);
        let progress_bar = spinner.get_or_insert_with(|| {
            let progress_bar = ProgressBar::new_spinner();
            progress_bar.set_style(self.style.clone());
            progress_bar.enable_steady_tick(Duration::from_millis(100));
            progress_bar
        });
        progress_bar.set_message(format!("🤔 Thinking... (iteration {index})"));
    }

    fn stop_spinner(&self) {
        let mut spinner =
            self.spinner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(progress_bar) = spinner.take() {
            progress_bar.finish_and_clear();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let trace = Arc::new(Trace::new(args.json)?);
    let runner = build_runner(&args, trace.clone())?;

    if args.interactive {
        interactive(&runner, &args, &trace).await
    } else {
        batch(&runner, &args, &trace).await;
        Ok(())
    }
}

fn build_runner(args: &Args, trace: Arc<Trace>) -> anyhow::Result<Runner> {
    let mut config = Config::from_parts(
        args.api_key.clone(),
        args.model.clone(),
        args.base_url.clone(),
    )?;
    if args.strategy == Mode::Research {
        config = config.with_max_tokens(RESEARCH_MAX_TOKENS);
    }
    debug!("using {config:?}");

    let mut builder = AgentBuilder::with_model_provider(config.provider())
        .with_tools(default_registry())
        .on_event(move |event| trace.on_event(event));
    let max_iterations = match (args.max_iterations, args.strategy) {
        (Some(max_iterations), _) => Some(max_iterations),
        (None, Mode::Research) => Some(RESEARCH_MAX_ITERATIONS),
        (None, _) => None,
    };
    if let Some(max_iterations) = max_iterations {
        builder = builder.with_max_iterations(max_iterations);
    }

    Ok(match args.strategy {
        Mode::React => Runner::Agent(builder.build()),
        Mode::FunctionCalling => Runner::Agent(
            builder.with_strategy(Strategy::FunctionCalling).build(),
        ),
        Mode::Research => Runner::Research(ResearchAgent::new(builder)),
    })
}

async fn batch(runner: &Runner, args: &Args, trace: &Trace) {
    let defaults = match args.strategy {
        Mode::Research => DEMO_TOPICS,
        _ => DEMO_TASKS,
    };
    let tasks = if args.tasks.is_empty() {
        defaults.iter().map(|task| (*task).to_owned()).collect()
    } else {
        args.tasks.clone()
    };

    for task in &tasks {
        run_one(runner, task, args.json, trace).await;
        if !args.json {
            println!("\n{}", "-".repeat(70).dimmed());
        }
    }
}

async fn interactive(
    runner: &Runner,
    args: &Args,
    trace: &Trace,
) -> anyhow::Result<()> {
    println!("Type a task and press enter, `exit` to quit.");
    if args.strategy == Mode::Research {
        println!("Use `{}item1, item2` to compare items.", COMPARE_COMMAND);
    }

    loop {
        print!("> ");
        std::io::stdout().flush().context("cannot write to stdout")?;

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        run_one(runner, line, args.json, trace).await;
    }

    println!("👋 Bye!");
    Ok(())
}

/// Runs one task, cancelling it on Ctrl-C, and prints the outcome.
async fn run_one(runner: &Runner, task: &str, json: bool, trace: &Trace) {
    let cancel = CancellationToken::new();
    let run = runner.run(task, cancel.clone());
    tokio::pin!(run);

    let outcome = select! {
        outcome = &mut run => outcome,
        _ = signal::ctrl_c() => {
            cancel.cancel();
            run.await
        }
    };
    trace.stop_spinner();

    match outcome {
        Ok(outcome) if json => print_json(&outcome),
        Ok(outcome) => print_stats(&outcome),
        Err(RunError::Cancelled) => println!("{}", "⏹  Cancelled".yellow()),
        Err(err) => {
            error!("run failed: {err}");
            eprintln!("{} {err}", "❌ Error:".bright_red());
        }
    }
}

fn print_stats(outcome: &Outcome) {
    let result = outcome.result();
    println!("\n📊 Stats:");
    println!("   Iterations: {}", result.iterations);
    println!("   Actions: {}", result.actions.len());
    if let Outcome::Research(report) = outcome {
        println!("   Queries: {}", report.research_log.queries.len());
    }
    println!("   Success: {}", if result.success { "✅" } else { "❌" });
}

fn print_json(outcome: &Outcome) {
    let json = match outcome {
        Outcome::Run(result) => serde_json::to_string_pretty(result),
        Outcome::Research(report) => serde_json::to_string_pretty(report),
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(err) => error!("cannot serialize the result: {err}"),
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
