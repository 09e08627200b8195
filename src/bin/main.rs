use clap::Parser;
use lumina_currency::{
    config::Settings,
    gemini::GeminiClient,
    models::CurrencyCode,
    session::ConverterSession,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// AI-powered real-time exchange & analytics
#[derive(Debug, Parser)]
#[command(name = "lumina", version)]
struct Cli {
    /// Amount to convert (digits and '.' only)
    amount: String,

    /// Source currency
    from: CurrencyCode,

    /// Target currency
    to: CurrencyCode,

    /// Overlay a second pair on the trend chart
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
    compare: Option<Vec<CurrencyCode>>,

    /// Swap source and target before converting
    #[arg(long)]
    swap: bool,

    /// Gemini API key (defaults to GEMINI_API_KEY / API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Print the raw results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(key) = cli.api_key.clone() {
        settings = settings.with_api_key(key);
    }
    if let Some(model) = cli.model.clone() {
        settings = settings.with_model(model);
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let generator = Arc::new(GeminiClient::new(&settings)?);
    info!(model = %generator.model(), "Gemini client ready");

    let mut session = ConverterSession::new(generator);
    session.set_amount_input(&cli.amount)?;
    session.set_from(cli.from);
    session.set_to(cli.to);

    if let Some([from, to]) = cli.compare.as_deref() {
        session.set_compare_from(*from);
        session.set_compare_to(*to);
        session.set_comparing(true);
    }

    if cli.swap {
        session.swap();
    }

    if !session.submit().await {
        eprintln!("Nothing to convert: amount must be greater than zero.");
        return Ok(());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&session.view())?);
        return Ok(());
    }

    print_session(&session);
    Ok(())
}

fn print_session(session: &ConverterSession) {
    let pair = session.pair();

    if let Some(error) = session.error() {
        eprintln!("⚠️  {}", error);
    }

    if let Some(conversion) = session.conversion() {
        println!("\n=== LIVE RATE ({}) ===", pair);
        if let Some(caption) = session.rate_caption() {
            println!("{}", caption);
        }
        if let Some(total) = session.formatted_total() {
            println!("{}", total);
        }

        println!("\n--- Gemini Analysis ---");
        println!("{}", conversion.rate_text);

        let sources = session.visible_sources();
        if !sources.is_empty() {
            println!("\nVerified Sources:");
            for source in sources {
                println!("  - {} <{}>", source.title, source.uri);
            }
        }
    }

    if let Some(chart) = session.chart() {
        println!("\n=== MARKET TRENDS ===");
        print!("{}", chart.render_text());
    }
}
