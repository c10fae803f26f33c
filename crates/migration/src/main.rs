use sea_orm::Database;
use sea_orm_migration::prelude::*;

use migration::Migrator;

const USAGE: &str = "usage: migration [up [N] | down [N] | fresh | refresh | status]";
const DEFAULT_DATABASE_URL: &str = "sqlite:./partage.db?mode=rwc";

enum Command {
    Up(Option<u32>),
    Down(Option<u32>),
    Fresh,
    Refresh,
    Status,
}

fn parse_command(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let name = args.next().unwrap_or_else(|| "up".to_string());
    let steps = args
        .next()
        .map(|raw| raw.parse::<u32>().map_err(|_| format!("invalid step count {raw:?}")))
        .transpose()?;

    match (name.as_str(), steps) {
        ("up", steps) => Ok(Command::Up(steps)),
        // `down` without a count only reverts the last migration.
        ("down", steps) => Ok(Command::Down(Some(steps.unwrap_or(1)))),
        ("fresh", None) => Ok(Command::Fresh),
        ("refresh", None) => Ok(Command::Refresh),
        ("status", None) => Ok(Command::Status),
        _ => Err(USAGE.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let command = match parse_command(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db = Database::connect(&db_url).await?;

    match command {
        Command::Up(steps) => Migrator::up(&db, steps).await?,
        Command::Down(steps) => Migrator::down(&db, steps).await?,
        Command::Fresh => Migrator::fresh(&db).await?,
        Command::Refresh => Migrator::refresh(&db).await?,
        Command::Status => Migrator::status(&db).await?,
    }

    Ok(())
}
