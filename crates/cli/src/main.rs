use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use wayfarer_agents::TripAgent;
use wayfarer_core::models::{BudgetTier, ChatInput, TripContext};
use wayfarer_core::{city_list, resolve_city};
use wayfarer_datasets::TravelDatasets;
use wayfarer_observability::{init_tracing, AppMetrics};
use wayfarer_storage::MemoryStore;
use wayfarer_weather::WeatherService;

#[derive(Debug, Parser)]
#[command(name = "wayfarer")]
#[command(about = "Conversational domestic trip planner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive planning conversation.
    Chat,
    /// Plan in one shot from explicit flags.
    Plan {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=14))]
        days: u8,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=10))]
        travelers: u8,
        #[arg(long)]
        tier: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        stars: Option<u8>,
        #[arg(long)]
        budget: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfarer_cli=info");
    let cli = Cli::parse();

    let agent = build_agent()?;

    match cli.command {
        Command::Chat => run_chat(agent).await?,
        Command::Plan {
            from,
            to,
            days,
            start,
            travelers,
            tier,
            stars,
            budget,
        } => {
            let Some(source) = resolve_city(&from) else {
                bail!("unknown city '{from}'; supported: {}", city_list());
            };
            let Some(destination) = resolve_city(&to) else {
                bail!("unknown city '{to}'; supported: {}", city_list());
            };
            let budget_tier = match tier.as_deref() {
                Some(value) => match BudgetTier::parse(value) {
                    Some(tier) => Some(tier),
                    None => bail!("invalid --tier '{value}' (budget, balanced, or premium)"),
                },
                None => None,
            };

            let context = TripContext {
                source: Some(source.to_string()),
                destination: Some(destination.to_string()),
                num_days: Some(days),
                start_date: start,
                num_travelers: Some(travelers),
                budget_tier,
                min_hotel_stars: stars,
                max_budget: budget,
            };

            let plan = agent.plan_trip(&context).await?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }

    Ok(())
}

async fn run_chat(agent: TripAgent<MemoryStore>) -> Result<()> {
    let mut session_id: Option<String> = None;

    println!("Wayfarer trip planner. Type 'new' to start over, 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }
        if message.is_empty() {
            continue;
        }

        if message.eq_ignore_ascii_case("new") || message.eq_ignore_ascii_case("reset") {
            session_id = None;
            println!("\nStarting a fresh trip. Where would you like to go?\n");
            continue;
        }

        let reply = agent
            .handle_turn(ChatInput {
                session_id: session_id.clone(),
                text: message.to_string(),
                reset: false,
            })
            .await?;
        session_id = Some(reply.session_id.clone());

        println!("\n{}\n", reply.reply_text);
    }

    Ok(())
}

fn build_agent() -> Result<TripAgent<MemoryStore>> {
    let catalog = Arc::new(TravelDatasets::load()?);
    let weather = Arc::new(WeatherService::new()?);

    Ok(TripAgent::new(
        catalog,
        weather,
        Arc::new(MemoryStore::new()),
        Arc::new(AppMetrics::new()),
    ))
}
