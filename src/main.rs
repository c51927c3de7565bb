use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use code_exec_api::{build_executor, passed_count, TestCase, TestCaseResult};
use interview_api::InterviewApiClient;
use interview_client::commands::{parse_page_command, PageCommand, HELP_TEXT};
use interview_client::{
    create_session, logging, EnvConfig, PhaseOrchestrator, RecordingNavigator, Route,
    SendOutcome, Services,
};
use session_model::{Level, NewSession, Phase, Role, RunOutcome};
use session_store::{FileSnapshotStore, SnapshotStore};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

#[derive(Parser)]
#[command(name = "interview")]
#[command(about = "Take a phased AI interview from the terminal", long_about = None)]
struct Cli {
    /// Log filter; overrides INTERVIEW_LOG and RUST_LOG.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a session and open its interview page
    New {
        #[arg(long)]
        vacancy: String,
        #[arg(long)]
        stack: String,
        #[arg(long, value_parser = parse_level, default_value = "middle")]
        level: Level,
        #[arg(long, default_value = NewSession::DEFAULT_LANGUAGE)]
        language: String,
    },
    /// Open a page of an existing session
    Open {
        session_id: String,
        #[arg(long, value_enum, default_value_t = PageArg::Interview)]
        page: PageArg,
    },
    /// Print the locally stored snapshot of a session
    Show { session_id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PageArg {
    Interview,
    Coding,
    Final,
}

impl From<PageArg> for Phase {
    fn from(page: PageArg) -> Self {
        match page {
            PageArg::Interview => Phase::Interview,
            PageArg::Coding => Phase::LiveCoding,
            PageArg::Final => Phase::Final,
        }
    }
}

fn parse_level(value: &str) -> Result<Level, String> {
    Level::parse(value).ok_or_else(|| {
        let known: Vec<&str> = Level::ALL.iter().map(|level| level.as_str()).collect();
        format!("unknown level {value:?}, expected one of {}", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = EnvConfig::from_env().map_err(io::Error::other)?;
    logging::init(cli.log.as_deref().or(config.log_filter.as_deref()));

    let store = Arc::new(FileSnapshotStore::new(config.store_root()));
    if let Command::Show { session_id } = &cli.command {
        println!("{:#}", store.load(session_id).to_value());
        return Ok(());
    }

    let gateway =
        Arc::new(InterviewApiClient::new(config.interview_api_config()).map_err(io::Error::other)?);
    let executor = build_executor(config.code_exec_config()).map_err(io::Error::other)?;
    let navigator = Arc::new(RecordingNavigator::new());
    let services = Services::new(gateway, executor, store, navigator.clone());

    let first = match cli.command {
        Command::New {
            vacancy,
            stack,
            level,
            language,
        } => {
            let form = NewSession::new(vacancy, stack)
                .with_level(level)
                .with_language(language);
            let session_id = create_session(&services, &form)
                .await
                .map_err(io::Error::other)?;
            println!("session {session_id}");
            navigator
                .take()
                .pop()
                .unwrap_or(Route::Interview(session_id))
        }
        Command::Open { session_id, page } => Route::for_phase(page.into(), session_id),
        Command::Show { .. } => return Ok(()),
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut route = first;
    loop {
        let (Some(session_id), Some(page)) = (route.session_id(), route.phase()) else {
            println!("Back at the start page. Run `interview new` to begin another session.");
            return Ok(());
        };

        println!("== {route} ==");
        let orchestrator = PhaseOrchestrator::new(services.clone(), session_id, page);
        if !orchestrator.page_available() {
            println!(
                "(last known phase is {}; checking with the server)",
                orchestrator.snapshot().phase
            );
        }
        if orchestrator.enter().await.is_err() {
            if let Some(error) = orchestrator.page_state().error {
                eprintln!("{error}");
            }
            orchestrator.recover();
        }

        let next = drive_page(&orchestrator, &navigator, &mut input).await;
        orchestrator.unmount();
        match next? {
            Some(next) => route = next,
            None => return Ok(()),
        }
    }
}

/// Reads page input until the orchestrator asks for another route or input
/// ends.
async fn drive_page<R>(
    orchestrator: &PhaseOrchestrator,
    navigator: &RecordingNavigator,
    input: &mut Lines<R>,
) -> io::Result<Option<Route>>
where
    R: AsyncBufRead + Unpin,
{
    let mut printed = 0;
    loop {
        printed = print_transcript(orchestrator, printed);
        if let Some(route) = navigator.take().pop() {
            return Ok(Some(route));
        }

        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        match parse_page_command(&line) {
            None => report_send(orchestrator, orchestrator.send_message(&line).await),
            Some(PageCommand::Help) => println!("{HELP_TEXT}"),
            Some(PageCommand::Code(path)) => match std::fs::read_to_string(&path) {
                Ok(code) => orchestrator.update_code(code),
                Err(error) => eprintln!("cannot read {path}: {error}"),
            },
            Some(PageCommand::Run) => match orchestrator.run_code().await {
                Some(outcome) => print_outcome(&outcome),
                None => eprintln!("no result: another run is active or the code changed"),
            },
            Some(PageCommand::Test(path)) => match load_cases(&path) {
                Ok(cases) => print_results(&orchestrator.run_tests(&cases).await),
                Err(error) => eprintln!("cannot load test cases from {path}: {error}"),
            },
            Some(PageCommand::Retry) => {
                report_send(orchestrator, orchestrator.retry_undelivered().await)
            }
            Some(PageCommand::Refresh) => {
                if let Err(error) = orchestrator.refresh().await {
                    eprintln!("refresh failed: {error}");
                }
            }
            Some(PageCommand::Show) => println!("{:#}", orchestrator.snapshot().to_value()),
            Some(PageCommand::Quit) => return Ok(None),
            Some(PageCommand::Unknown(command)) => {
                eprintln!("unknown command {command}, try /help");
            }
        }
    }
}

/// Prints the page bucket from `printed` on and returns the new length. A
/// bucket replaced by a shorter remote copy is printed again in full.
fn print_transcript(orchestrator: &PhaseOrchestrator, printed: usize) -> usize {
    let snapshot = orchestrator.snapshot();
    let messages = snapshot.messages(orchestrator.page());
    let start = if messages.len() < printed { 0 } else { printed };
    for message in &messages[start..] {
        let speaker = match message.role {
            Role::User => "you",
            Role::Assistant => "interviewer",
        };
        println!("{speaker}> {}", message.content);
    }
    messages.len()
}

fn report_send(orchestrator: &PhaseOrchestrator, outcome: SendOutcome) {
    match outcome {
        SendOutcome::ReadOnly => eprintln!("this phase is over; the page is read-only"),
        SendOutcome::Failed(_) => {
            if let Some(error) = orchestrator.page_state().inline_error {
                eprintln!("{error} (use /retry to resend)");
            }
        }
        SendOutcome::Ignored | SendOutcome::Delivered(_) | SendOutcome::Dropped => {}
    }
}

fn print_outcome(outcome: &RunOutcome) {
    if !outcome.stdout.is_empty() {
        println!("{}", outcome.stdout.trim_end());
    }
    if !outcome.stderr.is_empty() {
        eprintln!("{}", outcome.stderr.trim_end());
    }
    let status = outcome.status.as_deref().unwrap_or("unknown");
    match outcome.execution_time {
        Some(seconds) => println!("[{status} in {seconds:.3}s]"),
        None => println!("[{status}]"),
    }
}

fn print_results(results: &[TestCaseResult]) {
    for (index, result) in results.iter().enumerate() {
        let mark = if result.passed { "pass" } else { "FAIL" };
        println!("#{} {mark} [{}] {:?} -> {:?}", index + 1, result.status, result.input, result.actual);
        if let Some(error) = &result.error {
            eprintln!("   {error}");
        }
    }
    println!("{}/{} passed", passed_count(results), results.len());
}

fn load_cases(path: &str) -> io::Result<Vec<TestCase>> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(io::Error::other)
}
