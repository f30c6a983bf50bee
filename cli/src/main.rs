//! `aria`: terminal front-end for the ARIA dashboard.
//!
//! One-shot subcommands mount only the panel they drive, run a single action
//! and print the outcome. `watch` mounts the whole dashboard and prints a line
//! whenever a panel's state changes, until Ctrl-C.


use std::sync::Arc;

use aria_client::config::DEFAULT_BASE_URL;
use aria_client::fetcher::PanelState;
use aria_client::net::types::{AutoLearningStatus, DictionaryStats, FeedbackKind, LearningStats, SessionKind, WordEntry};
use aria_client::panels::auto_learning::AutoLearningPanel;
use aria_client::panels::chat::ChatPanel;
use aria_client::panels::cloud::Mood;
use aria_client::panels::dictionary::DictionaryPanel;
use aria_client::panels::learning::LearningPanel;
use aria_client::panels::search::SearchPanel;
use aria_client::panels::training::TrainingPanel;
use aria_client::poller::StatusPoller;
use aria_client::scope::ViewScope;
use aria_client::state::chat::{ChatMode, Message, Role};
use aria_client::state::training::DEFAULT_EPOCHS;
use aria_client::{ActionError, ApiError, ClientConfig, Connectivity, Dashboard, HttpTransport, Notice, Transport};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("ARIA backend unreachable at {0}")]
    Unreachable(String),
    #[error("nothing to send: {0}")]
    NothingToSend(&'static str),
    #[error("backend returned no reply: {0}")]
    NoReply(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "aria", about = "ARIA dashboard terminal client")]
struct Cli {
    #[arg(long, env = "ARIA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

struct CliContext {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the backend once.
    Status,
    /// Send one chat turn and print the reply.
    Chat {
        message: String,
        #[arg(long, value_enum)]
        feedback: Option<Rating>,
        /// Use the emotion-aware endpoint and print the resulting mood.
        #[arg(long)]
        futuristic: bool,
    },
    /// Run a web search.
    Search { query: String },
    Learning(LearningCommand),
    /// Teach a concept and its definition.
    Teach { concept: String, definition: String },
    /// Print the exported knowledge base as JSON.
    Export,
    /// Run one neural training request.
    Train {
        #[arg(long, default_value_t = DEFAULT_EPOCHS)]
        epochs: u64,
    },
    Dictionary(DictionaryCommand),
    /// Mount every panel and print state changes until Ctrl-C.
    Watch,
}

#[derive(Args, Debug)]
struct LearningCommand {
    #[command(subcommand)]
    command: LearningSubcommand,
}

#[derive(Subcommand, Debug)]
enum LearningSubcommand {
    Status,
    Start,
    Stop,
    Session {
        #[arg(value_enum, default_value_t = Session::Quick)]
        kind: Session,
    },
}

#[derive(Args, Debug)]
struct DictionaryCommand {
    #[command(subcommand)]
    command: DictionarySubcommand,
}

#[derive(Subcommand, Debug)]
enum DictionarySubcommand {
    Stats,
    Search { query: String },
    Word { word: String },
    Learn { word: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Rating {
    Positive,
    Negative,
}

impl From<Rating> for FeedbackKind {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Positive => Self::Positive,
            Rating::Negative => Self::Negative,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Session {
    Quick,
    Deep,
}

impl From<Session> for SessionKind {
    fn from(session: Session) -> Self {
        match session {
            Session::Quick => Self::Quick,
            Session::Deep => Self::Deep,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    cli.base_url.trim_end_matches('/').clone_into(&mut config.base_url);
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
    let ctx = CliContext { config, transport };

    match cli.command {
        Command::Status => run_status(&ctx).await,
        Command::Chat { message, feedback, futuristic } => {
            let mode = if futuristic { ChatMode::Futuristic } else { ctx.config.chat_mode };
            run_chat(&ctx, &message, feedback, mode).await
        }
        Command::Search { query } => run_search(&ctx, &query).await,
        Command::Learning(learning) => run_learning(&ctx, learning).await,
        Command::Teach { concept, definition } => run_teach(&ctx, &concept, &definition).await,
        Command::Export => run_export(&ctx).await,
        Command::Train { epochs } => run_train(&ctx, epochs).await,
        Command::Dictionary(dictionary) => run_dictionary(&ctx, dictionary).await,
        Command::Watch => run_watch(&ctx).await,
    }
}

// =============================================================================
// ONE-SHOT COMMANDS
// =============================================================================

async fn probe(ctx: &CliContext, scope: &ViewScope) -> Result<StatusPoller, CliError> {
    let poller = StatusPoller::new(Arc::clone(&ctx.transport), scope);
    if poller.probe().await == Connectivity::Connected {
        Ok(poller)
    } else {
        Err(CliError::Unreachable(ctx.config.base_url.clone()))
    }
}

async fn run_status(ctx: &CliContext) -> Result<(), CliError> {
    let scope = ViewScope::new();
    probe(ctx, &scope).await?;
    println!("{}", Connectivity::Connected);
    Ok(())
}

async fn run_chat(ctx: &CliContext, message: &str, feedback: Option<Rating>, mode: ChatMode) -> Result<(), CliError> {
    let scope = ViewScope::new();
    let poller = probe(ctx, &scope).await?;
    let panel = ChatPanel::mount(Arc::clone(&ctx.transport), poller.subscribe());
    panel.set_mode(mode);

    panel.set_input(message);
    if !panel.send().await? {
        return Err(CliError::NothingToSend("message is blank"));
    }

    let transcript = panel.transcript();
    let Some(reply) = transcript.messages.last() else {
        return Err(CliError::NoReply("empty transcript".to_owned()));
    };
    if reply.role != Role::Assistant {
        return Err(CliError::NoReply(reply.text.clone()));
    }
    println!("{}", format_reply(reply));
    if mode == ChatMode::Futuristic {
        println!("{}", describe_mood(&panel.mood()));
    }

    if let Some(rating) = feedback {
        panel.submit_feedback(reply.id, rating.into()).await?;
        println!("feedback recorded");
    }
    panel.close();
    Ok(())
}

async fn run_search(ctx: &CliContext, query: &str) -> Result<(), CliError> {
    let panel = SearchPanel::mount(Arc::clone(&ctx.transport));
    panel.set_query(query);
    if !panel.search().await? {
        return Err(CliError::NothingToSend("query is blank"));
    }

    let results = panel.state().results;
    if results.is_empty() {
        println!("no results");
    }
    for result in &results {
        println!("{}\n  {}\n  {} ({})", result.title, result.description, result.url, result.source);
    }
    panel.close();
    Ok(())
}

async fn run_learning(ctx: &CliContext, learning: LearningCommand) -> Result<(), CliError> {
    let panel = AutoLearningPanel::mount(Arc::clone(&ctx.transport), ctx.config.intervals.auto_learning);
    match learning.command {
        LearningSubcommand::Status => panel.refresh().await?,
        LearningSubcommand::Start => panel.start().await?,
        LearningSubcommand::Stop => panel.stop().await?,
        LearningSubcommand::Session { kind } => panel.trigger_session(kind.into()).await?,
    }
    print_notice(panel.notice().as_ref());
    println!("{}", describe_auto_learning(&panel.status()));
    panel.close();
    Ok(())
}

async fn run_teach(ctx: &CliContext, concept: &str, definition: &str) -> Result<(), CliError> {
    let panel = LearningPanel::mount(Arc::clone(&ctx.transport), ctx.config.intervals.learning);
    panel.teach(concept, definition).await?;
    print_notice(panel.notice().as_ref());
    panel.close();
    Ok(())
}

async fn run_export(ctx: &CliContext) -> Result<(), CliError> {
    let panel = LearningPanel::mount(Arc::clone(&ctx.transport), ctx.config.intervals.learning);
    let knowledge = panel.export().await?;
    panel.close();
    print_json(&json!({
        "concepts": knowledge.concepts,
        "successful_patterns": knowledge.successful_patterns,
    }))
}

async fn run_train(ctx: &CliContext, epochs: u64) -> Result<(), CliError> {
    let panel = TrainingPanel::mount(Arc::clone(&ctx.transport));
    panel.set_epochs(epochs);
    let metrics = panel.train().await?;
    println!("precision {:.1}%  loss {:.2}  epochs {}", metrics.precision, metrics.loss, metrics.epochs);

    let info = panel.network_info();
    if info.loaded {
        println!("parameters {}", info.data.parameters);
    }
    panel.close();
    Ok(())
}

async fn run_dictionary(ctx: &CliContext, dictionary: DictionaryCommand) -> Result<(), CliError> {
    let panel = DictionaryPanel::mount(Arc::clone(&ctx.transport), ctx.config.intervals.dictionary);
    match dictionary.command {
        DictionarySubcommand::Stats => {
            panel.refresh().await?;
            println!("{}", describe_dictionary(&panel.stats()));
        }
        DictionarySubcommand::Search { query } => {
            if panel.search(&query).await? == 0 {
                println!("no matches");
            }
            for word in panel.lookup().results {
                println!("{} ({}): {}", word.word, word.part_of_speech, word.definition);
            }
        }
        DictionarySubcommand::Word { word } => {
            let entry = panel.open_word(&word).await?;
            println!("{}", describe_word(&entry));
        }
        DictionarySubcommand::Learn { word } => {
            if !panel.learn_word(&word).await? {
                return Err(CliError::NothingToSend("word is blank"));
            }
            print_notice(panel.notice().as_ref());
        }
    }
    panel.close();
    Ok(())
}

// =============================================================================
// WATCH
// =============================================================================

async fn run_watch(ctx: &CliContext) -> Result<(), CliError> {
    let dashboard = Dashboard::mount(Arc::clone(&ctx.transport), &ctx.config.intervals);
    let mut status = dashboard.poller.subscribe();
    let mut auto_learning = dashboard.auto_learning.subscribe();
    let mut learning = dashboard.learning.subscribe();
    let mut dictionary = dashboard.dictionary.subscribe();
    let mut mood = dashboard.cloud.subscribe_mood();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    println!("watching {} (Ctrl-C to stop)", ctx.config.base_url);
    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal?;
                break;
            }
            Ok(()) = status.changed() => println!("status: {}", *status.borrow_and_update()),
            Ok(()) = auto_learning.changed() => println!("{}", describe_auto_learning(&auto_learning.borrow_and_update())),
            Ok(()) = learning.changed() => println!("{}", describe_learning(&learning.borrow_and_update())),
            Ok(()) = dictionary.changed() => println!("{}", describe_dictionary(&dictionary.borrow_and_update())),
            Ok(()) = mood.changed() => println!("{}", describe_mood(&mood.borrow_and_update())),
            else => break,
        }
    }

    dashboard.unmount();
    Ok(())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn format_reply(message: &Message) -> String {
    let mut tags = Vec::new();
    if let Some(percent) = message.confidence_percent() {
        tags.push(format!("confidence {percent}%"));
    }
    if let Some(emotion) = &message.emotion {
        tags.push(emotion.clone());
    }
    if message.learned_something {
        tags.push("learned something new".to_owned());
    }
    if tags.is_empty() { message.text.clone() } else { format!("{}\n[{}]", message.text, tags.join(", ")) }
}

fn freshness<T>(state: &PanelState<T>) -> String {
    match (&state.last_error, state.stale) {
        (Some(error), true) => format!(" [stale: {error}]"),
        _ => String::new(),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn describe_auto_learning(state: &PanelState<AutoLearningStatus>) -> String {
    if !state.loaded {
        return format!("auto-learning: unavailable{}", freshness(state));
    }
    let status = &state.data;
    let system = if status.is_advanced() { "advanced" } else { "basic" };
    format!(
        "auto-learning: {} ({system}) | {} knowledge | {} active topics | last session {}{}",
        if status.is_running { "running" } else { "stopped" },
        status.total_knowledge,
        status.active_topics,
        status.last_session.last_session.as_deref().unwrap_or("never"),
        freshness(state),
    )
}

fn describe_learning(state: &PanelState<LearningStats>) -> String {
    if !state.loaded {
        return format!("learning: unavailable{}", freshness(state));
    }
    let stats = &state.data;
    format!(
        "learning: {} entries | {} patterns | vocabulary {} | feedback {:.1}{}",
        stats.knowledge_entries,
        stats.learned_patterns,
        stats.vocabulary_size,
        stats.average_feedback,
        freshness(state),
    )
}

fn describe_dictionary(state: &PanelState<DictionaryStats>) -> String {
    if !state.loaded {
        return format!("dictionary: unavailable{}", freshness(state));
    }
    let stats = &state.data;
    format!(
        "dictionary: {} words | {} today | learning {}{}",
        stats.total_words,
        stats.words_learned_today,
        on_off(stats.learning_enabled),
        freshness(state),
    )
}

fn describe_mood(mood: &Mood) -> String {
    match mood.color {
        Some(color) => format!("mood: {} {color}", mood.emotion),
        None => format!("mood: {}", mood.emotion),
    }
}

fn describe_word(entry: &WordEntry) -> String {
    let mut out = format!("{} ({})", entry.word, entry.part_of_speech);
    if !entry.pronunciation.is_empty() {
        out.push_str(&format!(" /{}/", entry.pronunciation));
    }
    out.push_str(&format!("\n  {}", entry.definition));
    if !entry.example.is_empty() {
        out.push_str(&format!("\n  e.g. {}", entry.example));
    }
    if !entry.synonyms.is_empty() {
        out.push_str(&format!("\n  synonyms: {}", entry.synonyms.join(", ")));
    }
    if !entry.antonyms.is_empty() {
        out.push_str(&format!("\n  antonyms: {}", entry.antonyms.join(", ")));
    }
    out
}

fn print_notice(notice: Option<&Notice>) {
    if let Some(notice) = notice {
        println!("{}", notice.message);
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
