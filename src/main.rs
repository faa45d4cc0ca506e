use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use expense_ledger::{
    category_style, format_amount, summary_cards, AmountTier, Config, ExpenseCategory,
    ExpenseDraft, ExpenseItem, ExpenseStore,
};

#[derive(Parser, Debug)]
#[command(name = "expense-ledger", version, about = "Track personal and business expenses")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "expense-ledger.toml")]
    config: PathBuf,

    /// Storage file (overrides config file)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new expense
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        amount: f64,

        #[arg(short, long, default_value = "personal")]
        category: ExpenseCategory,

        /// Day of the expense (YYYY-MM-DD), today if omitted
        #[arg(short, long, value_parser = parse_day)]
        date: Option<DateTime<Utc>>,
    },
    /// List expenses, optionally for one category
    List {
        #[arg(short, long)]
        category: Option<ExpenseCategory>,
    },
    /// Show total, personal and business sums
    Summary {
        /// Print the summary cards as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove expenses by id
    Remove {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Remove every expense
    Clear,
}

fn parse_day(value: &str) -> Result<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Expected YYYY-MM-DD, got {:?}", value))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .context("Invalid start of day")?;
    Ok(midnight.and_utc())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config);
    if let Some(path) = cli.db.clone() {
        config.storage.path = path;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("expense_ledger={}", config.logging.level))),
        )
        .with_writer(std::io::stderr)
        .init();

    let backend = config.storage.open_backend()?;
    let mut store = ExpenseStore::open(backend, config.store_options());
    let currency = config.display.currency.clone();

    match cli.command {
        Command::Add {
            name,
            amount,
            category,
            date,
        } => {
            let mut draft = ExpenseDraft::new(name, amount, category);
            if let Some(date) = date {
                draft = draft.on(date);
            }

            let item = match draft.build() {
                Some(item) => item,
                None => anyhow::bail!("Expense needs a non-empty name and an amount above zero"),
            };

            let id = item.id();
            store.add(item);
            if let Some(item) = store.get(id) {
                println!("✓ Added {}", render_row(item, store.is_highlighted(id), &currency));
            }
        }
        Command::List { category } => {
            let categories = match category {
                Some(category) => vec![category],
                None => ExpenseCategory::ALL.to_vec(),
            };

            for category in categories {
                let rows = store.by_category(category);
                if rows.is_empty() {
                    continue;
                }

                println!(
                    "\n{} ({})",
                    category_style(category).list_title.to_uppercase(),
                    format_amount(store.total_for(category), &currency)
                );
                for item in rows {
                    println!("  {}", render_row(item, store.is_highlighted(item.id()), &currency));
                }
            }

            if store.is_empty() {
                println!("No expenses yet");
            }
        }
        Command::Summary { json } => {
            let cards = summary_cards(&store);
            if json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
                return Ok(());
            }

            for card in cards {
                println!("{:<10} {:>14}", card.title, format_amount(card.amount, &currency));
            }
        }
        Command::Remove { ids } => {
            let before = store.len();
            store.remove(ids);
            println!("✓ Removed {} expense(s)", before - store.len());
        }
        Command::Clear => {
            let before = store.len();
            store.remove_all();
            println!("✓ Cleared {} expense(s)", before);
        }
    }

    Ok(())
}

fn render_row(item: &ExpenseItem, highlighted: bool, currency: &str) -> String {
    let tier = AmountTier::of(item.amount());
    format!(
        "{}{} [{}] {} {} ({}) {}",
        if highlighted { "* " } else { "" },
        item.date().format("%Y-%m-%d"),
        category_style(item.category()).icon,
        item.name(),
        format_amount(item.amount(), currency),
        tier.color().as_str(),
        item.id()
    )
}
