use std::error::Error;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use engine::{Currency, Engine, ExpenseCmd, Locale, LoginForm, Money, SplitMode};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "partage_admin")]
#[command(about = "Admin utilities for Partage (bootstrap users, groups and expenses)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./partage.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Group(Group),
    Expense(Expense),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Group {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    Create(GroupCreateArgs),
    AddMember(GroupAddMemberArgs),
    Balances(GroupBalancesArgs),
}

#[derive(Args, Debug)]
struct GroupCreateArgs {
    /// Email of the owner.
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "EUR", value_parser = parse_currency)]
    currency: Currency,
}

#[derive(Args, Debug)]
struct GroupAddMemberArgs {
    /// Group id.
    #[arg(long)]
    group: String,
    /// Email of the group owner.
    #[arg(long)]
    owner: String,
    /// Email of the new member.
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct GroupBalancesArgs {
    #[arg(long)]
    group: String,
    /// Email of a member of the group.
    #[arg(long)]
    user: String,
    #[arg(long, default_value = "fr-FR", value_parser = parse_locale)]
    locale: Locale,
}

#[derive(Args, Debug)]
struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    /// Log an expense split equally among all members.
    Add(ExpenseAddArgs),
}

#[derive(Args, Debug)]
struct ExpenseAddArgs {
    #[arg(long)]
    group: String,
    /// Email of the member who paid.
    #[arg(long)]
    payer: String,
    /// Amount in major units, e.g. `12,50` or `12.50`.
    #[arg(long, value_parser = parse_amount)]
    amount: Money,
    #[arg(long)]
    description: String,
}

fn parse_currency(raw: &str) -> Result<Currency, String> {
    Currency::try_from(raw).map_err(|err| err.to_string())
}

fn parse_locale(raw: &str) -> Result<Locale, String> {
    Locale::try_from(raw).map_err(|err| err.to_string())
}

fn parse_amount(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let (user, created) = engine.register_user(&LoginForm::new(args.email)).await?;
            if !created {
                eprintln!("user already exists: {}", user.email);
                std::process::exit(1);
            }
            println!("created user: {} ({})", user.email, user.id);
        }
        Command::Group(Group {
            command: GroupCommand::Create(args),
        }) => {
            let owner = engine.user_by_email(&args.owner).await?;
            let group_id = engine
                .new_group(&args.name, Some(args.currency), &owner.id)
                .await?;
            println!("created group: {} ({group_id})", args.name);
        }
        Command::Group(Group {
            command: GroupCommand::AddMember(args),
        }) => {
            let owner = engine.user_by_email(&args.owner).await?;
            let member = engine
                .add_member(&args.group, &args.email, &owner.id)
                .await?;
            println!("added {} to group {}", member.email, args.group);
        }
        Command::Group(Group {
            command: GroupCommand::Balances(args),
        }) => {
            let user = engine.user_by_email(&args.user).await?;
            let group = engine.group(&args.group, &user.id).await?;
            let balances = engine.group_balances(&args.group, &user.id).await?;
            let label = |user_id: &str| {
                group
                    .member(user_id)
                    .map_or_else(|| user_id.to_string(), |m| m.user.label().to_string())
            };

            println!("{} ({})", group.name, group.currency.code());
            for balance in &balances {
                println!(
                    "  {:<32} {:>14}",
                    label(&balance.user_id),
                    Money::new(balance.net_minor).format(group.currency, args.locale)
                );
            }
            let transfers = engine.settle_up(&args.group, &user.id).await?;
            if !transfers.is_empty() {
                println!("to settle up:");
            }
            for transfer in transfers {
                println!(
                    "  {} -> {}: {}",
                    label(&transfer.from_user_id),
                    label(&transfer.to_user_id),
                    Money::new(transfer.amount_minor).format(group.currency, args.locale)
                );
            }
        }
        Command::Expense(Expense {
            command: ExpenseCommand::Add(args),
        }) => {
            let payer = engine.user_by_email(&args.payer).await?;
            let group = engine.group(&args.group, &payer.id).await?;
            let members: Vec<String> = group.members.iter().map(|m| m.user.id.clone()).collect();

            let expense_id = engine
                .add_expense(ExpenseCmd::new(
                    &args.group,
                    &payer.id,
                    args.description,
                    args.amount.minor(),
                    SplitMode::equal(members),
                    Utc::now(),
                ))
                .await?;
            println!(
                "logged expense {expense_id}: {}",
                args.amount.format(group.currency, Locale::FrFr)
            );
        }
    }

    Ok(())
}
