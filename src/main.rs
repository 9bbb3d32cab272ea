use clap::{Arg, ArgAction, Command, value_parser};
use shell_commander::{
    completion::{CompletionBackend, OllamaBackend},
    config::Config,
    console::ConsoleUI,
    executor::Executor,
    generator::{CommandGenerator, LlmGenerator, MockGenerator},
    http_client::ReqwestHttpClient,
    logging,
    observer::{PanelObserver, TracingObserver},
    reviewer::{CommandReviewer, LlmReviewer, MockReviewer},
    workflow::{RetryPolicy, WorkflowEngine},
};
use std::sync::Arc;
use tracing::info;

fn cli() -> Command {
    Command::new("shellcmd")
        .about("Turn natural-language requests into reviewed, human-approved shell commands")
        .arg(Arg::new("model")
            .long("model")
            .help("Model name served by the completion server")
            .value_name("MODEL"))
        .arg(Arg::new("base-url")
            .long("base-url")
            .help("Base URL of the Ollama-compatible completion server")
            .value_name("URL"))
        .arg(Arg::new("max-review-rounds")
            .long("max-review-rounds")
            .help("Give up on a request after this many reviewer rejections")
            .value_name("N")
            .value_parser(value_parser!(u32)))
        .arg(Arg::new("show-transitions")
            .long("show-transitions")
            .help("Print a panel for every workflow transition")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("mock")
            .long("mock")
            .help("Use the built-in mock generator and reviewer")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Enable debug logging on stderr")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("config")
            .long("config")
            .help("Show configuration information")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("init-config")
            .long("init-config")
            .help("Write the current configuration to the config file")
            .action(ArgAction::SetTrue))
}

fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) {
    if let Some(model) = matches.get_one::<String>("model") {
        config.model = model.clone();
    }
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.base_url = base_url.clone();
    }
    if let Some(limit) = matches.get_one::<u32>("max-review-rounds") {
        config.max_review_rounds = Some(*limit);
    }
    if matches.get_flag("show-transitions") {
        config.show_transitions = true;
    }
    if matches.get_flag("mock") {
        config.use_mock = true;
    }
}

fn build_collaborators(
    config: &Config,
) -> anyhow::Result<(Box<dyn CommandGenerator>, Box<dyn CommandReviewer>)> {
    if config.is_mock_mode() {
        info!("Using mock generator and reviewer");
        let generator: Box<dyn CommandGenerator> = Box::new(MockGenerator::new());
        let reviewer: Box<dyn CommandReviewer> = Box::new(MockReviewer::new());
        return Ok((generator, reviewer));
    }

    info!("Using model '{}' at {}", config.model, config.base_url);
    let http = Arc::new(ReqwestHttpClient::new(config.request_timeout())?);
    let backend: Arc<dyn CompletionBackend> = Arc::new(OllamaBackend::new(
        http,
        config.base_url.clone(),
        config.model.clone(),
        config.temperature,
    ));

    let generator: Box<dyn CommandGenerator> = Box::new(LlmGenerator::new(backend.clone()));
    let reviewer: Box<dyn CommandReviewer> = Box::new(LlmReviewer::new(backend));
    Ok((generator, reviewer))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("verbose"));

    let mut config = Config::load()?;
    apply_cli_overrides(&mut config, &matches);

    if matches.get_flag("config") {
        config.show_config_info()?;
        return Ok(());
    }

    if matches.get_flag("init-config") {
        config.save()?;
        println!("✅ Configuration written to {}", Config::get_config_path()?.display());
        return Ok(());
    }

    let (generator, reviewer) = build_collaborators(&config)?;
    let policy = match config.max_review_rounds {
        Some(limit) => RetryPolicy::bounded(limit),
        None => RetryPolicy::unbounded(),
    };

    let mut engine = WorkflowEngine::new(
        generator,
        reviewer,
        Box::new(Executor::new(config.shell.clone())),
        ConsoleUI::stdio(),
    )
    .with_policy(policy)
    .with_observer(Box::new(TracingObserver));

    if config.show_transitions {
        engine = engine.with_observer(Box::new(PanelObserver::stdout()));
    }

    engine.run().await?;
    Ok(())
}
