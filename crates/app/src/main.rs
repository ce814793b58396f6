use std::{path::PathBuf, time::Duration};

use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use engine::{OrderSnapshot, SplitMode, SplitSession};
use split_client::SplitClient;

use crate::{
    edits::{Edit, in_command_line_order},
    error::{AppError, Result},
    settings::Settings,
};

mod edits;
mod error;
mod render;
mod settings;

#[derive(Debug, Parser)]
#[command(name = "conto", about = "Split a restaurant check", disable_version_flag = true)]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the resulting checks without committing.
    Preview(SplitArgs),
    /// Compute the split and send it to the order service.
    Commit(SplitArgs),
}

#[derive(Debug, Args)]
struct SplitArgs {
    /// Order snapshot (JSON).
    #[arg(long)]
    order: PathBuf,
    /// Split mode: by_seat, custom, even, by_price.
    #[arg(long)]
    mode: Option<String>,
    /// Number of payers in even mode.
    #[arg(long)]
    ways: Option<u32>,
    /// Move an item: ITEM=CHECK or ITEM=new. Repeatable, applied in
    /// command-line order together with --split.
    #[arg(long = "assign", value_name = "ITEM=CHECK")]
    assign: Vec<String>,
    /// Fragment an item: ITEM=WAYS, ITEM=1 merges it back. Repeatable.
    #[arg(long = "split", value_name = "ITEM=WAYS")]
    split: Vec<String>,
    /// Override the order service base URL.
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    let split_matches = matches.subcommand().map(|(_, sub)| sub);
    let settings = Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "conto={level},engine={level},split_client={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Preview(args) => {
            let edits = edits(&args, split_matches)?;
            let session = open_session(&settings, &args, &edits)?;
            print!("{}", render::session(&session));
        }
        Command::Commit(args) => {
            let edits = edits(&args, split_matches)?;
            let session = open_session(&settings, &args, &edits)?;
            print!("{}", render::session(&session));
            let client = build_client(&settings, args.base_url.as_deref())?;
            let response = client.commit(&session).await.map_err(AppError::from)?;
            for order in &response.split_orders {
                println!(
                    "created split order {} #{} ({})",
                    order.split_index, order.display_number, order.status
                );
            }
        }
    }

    Ok(())
}

/// Pair each repeatable edit with its argv position.
fn indexed<'a>(
    matches: Option<&ArgMatches>,
    id: &str,
    values: &'a [String],
) -> impl Iterator<Item = (usize, &'a str)> {
    let indices: Vec<usize> = matches
        .and_then(|matches| matches.indices_of(id))
        .map(Iterator::collect)
        .unwrap_or_default();
    indices.into_iter().zip(values.iter().map(String::as_str))
}

fn edits(args: &SplitArgs, matches: Option<&ArgMatches>) -> Result<Vec<Edit>> {
    in_command_line_order(
        indexed(matches, "assign", &args.assign),
        indexed(matches, "split", &args.split),
    )
}

fn open_session(settings: &Settings, args: &SplitArgs, edits: &[Edit]) -> Result<SplitSession> {
    let raw = std::fs::read_to_string(&args.order)?;
    let order: OrderSnapshot = serde_json::from_str(&raw)?;

    let mode = match args.mode.as_deref().or(settings.split.mode.as_deref()) {
        Some(mode) => SplitMode::try_from(mode)?,
        None => SplitMode::default(),
    };

    let mut builder = SplitSession::builder()
        .order(order)
        .tax(settings.tax.policy())
        .mode(mode);
    if let Some(ways) = args.ways.or(settings.split.ways) {
        builder = builder.num_ways(ways);
    }
    let mut session = builder.build()?;
    for edit in edits {
        edit.apply(&mut session)?;
    }
    Ok(session)
}

fn build_client(settings: &Settings, base_url: Option<&str>) -> Result<SplitClient> {
    let server = settings.server.clone();
    let base_url = base_url
        .map(str::to_string)
        .or_else(|| server.as_ref().map(|server| server.base_url.clone()))
        .ok_or_else(|| AppError::Usage("no order service configured".to_string()))?;
    let (username, password, timeout_secs) = match &server {
        Some(server) => (
            server.username.as_str(),
            server.password.as_str(),
            server.timeout_secs,
        ),
        None => ("", "", 10),
    };

    tracing::info!("Committing to {base_url}...");
    let client = SplitClient::builder()
        .server(&base_url, username, password)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Vec<Edit> {
        let matches = Cli::command().try_get_matches_from(argv).unwrap();
        let Command::Preview(args) = Cli::from_arg_matches(&matches).unwrap().command else {
            panic!("expected preview");
        };
        edits(&args, matches.subcommand().map(|(_, sub)| sub)).unwrap()
    }

    #[test]
    fn repeated_edits_follow_argv() {
        let edits = parse(&[
            "conto", "preview", "--order", "table.json", "--split", "pizza=2", "--assign",
            "beer=new", "--split", "pizza=1",
        ]);
        assert_eq!(
            edits,
            vec![
                Edit::split("pizza=2").unwrap(),
                Edit::assign("beer=new").unwrap(),
                Edit::split("pizza=1").unwrap(),
            ]
        );
    }
}
