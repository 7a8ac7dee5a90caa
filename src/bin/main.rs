use multi_agent_assistant::{AgentKind, MultiAgentSystem, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_SYMBOL: &str = "NVDA";
const DEMO_QUERIES: &[&str] = &[
    "Get the latest analyst recommendation for NVDA",
    "Get the most recent news about NVDA",
];

/// Usage: assistant [--agent multi_agent|web_search|finance] [--symbol TICKER] [QUERY...]
///
/// Without a query, runs the two NVDA demo queries.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let settings = Settings::from_env()?;
    let system = MultiAgentSystem::from_settings(&settings)?;

    let mut agent = AgentKind::MultiAgent;
    let mut symbol: Option<String> = None;
    let mut words = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--agent" => {
                let value = args.next().ok_or("--agent needs a value")?;
                agent = serde_json::from_value(serde_json::Value::String(value.clone()))
                    .map_err(|_| format!("unknown agent: {}", value))?;
            }
            "--symbol" => symbol = Some(args.next().ok_or("--symbol needs a value")?),
            _ => words.push(arg),
        }
    }

    let queries: Vec<String> = if words.is_empty() {
        symbol.get_or_insert_with(|| DEMO_SYMBOL.to_string());
        DEMO_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        vec![words.join(" ")]
    };

    for query in queries {
        info!(agent = %agent, query = %query, "Running query");
        let response = system.dispatch(agent, &query, symbol.as_deref()).await;

        println!("\n=== {} ===", agent.display_name());
        println!("> {}\n", query);
        println!("{}", response);
    }

    Ok(())
}
