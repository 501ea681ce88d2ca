use colloquy::api::{self, app_state::AppState};
use colloquy::config::config::EngineConfig;
use colloquy::config::loader::{ConfigLoader, config_exists};
use colloquy::models::bot::Bots;
use colloquy::observability::{EngineMetrics, ObservabilityState, create_observability_router};
use colloquy::services::chat::{ChatService, create_chat_service};
use colloquy::services::graph::Graphmaster;
use colloquy::services::graph::loader::AimlLoader;
use colloquy::services::predicates::create_predicate_cache;
use colloquy::storage::create_predicate_store;
use parking_lot::RwLock;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    colloquy::observability::init_tracing("colloquy");

    let config = if config_exists() {
        ConfigLoader::load()?
    } else {
        info!("No colloquy.toml found; using the development configuration");
        EngineConfig::development()
    };
    // Startup configuration violations abort loudly.
    ConfigLoader::validate(&config)?;
    info!("Configuration loaded successfully");

    let store = create_predicate_store(&config.storage)?;
    info!(backend = %config.storage.backend, "Predicate store initialized");

    let bots = Arc::new(Bots::from_configs(&config.bots));
    info!(bots = bots.len(), "Bot registry initialized");

    let mut graph = Graphmaster::new(&config.matching);
    for bot in &config.bots {
        for path in &bot.rule_files {
            match AimlLoader::load_file(path) {
                Ok(categories) => {
                    let count = graph.add_categories(&bot.id, &categories);
                    info!(botid = %bot.id, path = %path.display(), categories = count, "Rule file loaded");
                }
                Err(e) => {
                    error!(botid = %bot.id, path = %path.display(), error = %e, "Failed to load rule file");
                }
            }
        }
    }
    let category_count = graph.category_count();
    let graph = Arc::new(RwLock::new(graph));

    let metrics = Arc::new(EngineMetrics::default());
    metrics.set_categories_loaded(category_count);

    let predicates = create_predicate_cache(&config.predicates, store.clone(), bots.clone());
    let chat = create_chat_service(&config, graph, predicates, bots.clone(), metrics.clone());
    info!(
        "{} bots thinking with {} categories",
        bots.len(),
        category_count
    );

    // Console mode: read lines from stdin, print replies.
    let console = std::env::args().any(|a| a == "--console")
        || std::env::var("COLLOQUY_CONSOLE").is_ok();
    if console {
        let botid = config.bots[0].id.clone();
        run_console(chat.clone(), &botid)?;
        chat.save_all();
        return Ok(());
    }

    let app_state = AppState::new(chat.clone(), store, metrics.clone());
    let observability_state = Arc::new(ObservabilityState::new(
        metrics,
        env!("CARGO_PKG_VERSION").to_string(),
    ));
    let router = create_observability_router(observability_state).merge(api::create_router(app_state));
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    // Flush all cached predicates before the process ends.
    chat.save_all();
    Ok(())
}

/// Interactive console: one exchange per line, `/exit` quits.
fn run_console(chat: Arc<ChatService>, botid: &str) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let userid = "console-user";

    println!("Colloquy console. Talking to \"{}\". /exit to quit.", botid);
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/exit" {
            break;
        }
        match chat.get_response(input, userid, botid) {
            Ok(reply) if reply.is_empty() => println!("[no reply]"),
            Ok(reply) => println!("{}", reply),
            Err(e) => error!(error = %e, "response failed"),
        }
    }
    Ok(())
}
