//! Task Donegeon
//!
//! Command-line front end: every subcommand opens the configured database,
//! runs one operation and prints the result as markdown or JSON.

use anyhow::{Result, anyhow};
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use task_donegeon::cli::game::{AchievementCommand, CategoryCommand, InventoryCommand};
use task_donegeon::cli::task::{TagCommand, TaskCommand};
use task_donegeon::cli::{Cli, Command, UserCommand};
use task_donegeon::config::{Config, RewardsConfig};
use task_donegeon::db::{Database, now_ms};
use task_donegeon::error::{ErrorReport, GameError};
use task_donegeon::format::{self, OutputFormat};
use task_donegeon::logging::{self, LogTarget};
use task_donegeon::types::{NewCategory, NewUser, User};
use tracing::{debug, info};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = cli.format;

    if let Err(e) = logging::init(&LogTarget::parse(&cli.log), cli.verbose) {
        eprintln!("Error: failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match output {
                OutputFormat::Json => {
                    let report = ErrorReport::from(&e);
                    match format::to_json(&report) {
                        Ok(json) => println!("{json}"),
                        Err(_) => eprintln!("Error: {e:#}"),
                    }
                }
                OutputFormat::Markdown => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::resolve(cli.config.as_deref())?;

    // Override paths from CLI arguments
    if let Some(db_path) = cli.database {
        config.database.path = db_path;
    }

    config.ensure_db_dir()?;
    debug!(path = %config.database.path.display(), "opening database");
    let db = Database::open(&config.database.path)?;

    let out = Printer { format: cli.format };
    let rewards = &config.rewards;

    match cli.command {
        Command::Init => {
            let added = db.seed_default_categories()?;
            info!(path = %config.database.path.display(), "database ready");
            out.print(&db.list_categories()?, |c| {
                format!(
                    "Database ready at {} ({} categories added)\n\n{}",
                    config.database.path.display(),
                    added,
                    format::format_categories_markdown(c)
                )
            })
        }
        Command::User(cmd) => run_user(&db, &out, cmd),
        Command::Task(cmd) => run_task(&db, &out, rewards, cmd),
        Command::Category(cmd) => run_category(&db, &out, cmd),
        Command::Achievement(cmd) => run_achievement(&db, &out, rewards, cmd),
        Command::Inventory(cmd) => run_inventory(&db, &out, cmd),
    }
}

/// Prints command results in the selected format.
struct Printer {
    format: OutputFormat,
}

impl Printer {
    fn print<T, F>(&self, value: &T, markdown: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        match self.format {
            OutputFormat::Json => println!("{}", format::to_json(value)?),
            OutputFormat::Markdown => print!("{}", markdown(value)),
        }
        Ok(())
    }
}

/// Look a user up by numeric id or by username.
fn find_user(db: &Database, key: &str) -> Result<User> {
    match key.parse::<i64>() {
        Ok(id) => Ok(db.get_user(id)?.ok_or(GameError::UserNotFound(id))?),
        Err(_) => db
            .get_user_by_username(key)?
            .ok_or_else(|| anyhow!("no user named '{}'", key)),
    }
}

fn run_user(db: &Database, out: &Printer, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::Create(args) => {
            let user = db.create_user(NewUser {
                username: args.username,
                email: args.email,
                first_name: args.first_name,
                last_name: args.last_name,
            })?;
            out.print(&user, format::format_user_markdown)
        }
        UserCommand::Show { user } => {
            let user = find_user(db, &user)?;
            out.print(&user, format::format_user_markdown)
        }
        UserCommand::List(page) => {
            let users = db.list_users(page.offset, page.limit)?;
            out.print(&users, |users| {
                let mut md = format!("# Players ({})\n\n", users.len());
                for u in users {
                    md.push_str(&format!(
                        "- `{}` {} level {}, {} gold\n",
                        u.id, u.username, u.progression.level, u.progression.gold
                    ));
                }
                md
            })
        }
        UserCommand::Delete { user_id } => {
            let user = db
                .delete_user(user_id)?
                .ok_or(GameError::UserNotFound(user_id))?;
            out.print(&user, |u| format!("Deleted user `{}` ({})\n", u.id, u.username))
        }
        UserCommand::Award { user_id, xp, gold } => {
            let (user, change) = db.award(user_id, xp, gold)?;
            out.print(&user, |u| {
                let mut md = String::new();
                if change.leveled_up() {
                    md.push_str(&format!("Level up! {} -> {}\n\n", change.from, change.to));
                }
                md.push_str(&format::format_user_markdown(u));
                md
            })
        }
    }
}

fn run_task(db: &Database, out: &Printer, rewards: &RewardsConfig, cmd: TaskCommand) -> Result<()> {
    match cmd {
        TaskCommand::Create(args) => {
            let owner = args.owner;
            let task = db.create_task(owner, args.into(), rewards)?;
            out.print(&task, format::format_task_markdown)
        }
        TaskCommand::Show { task_id } => {
            let task = db.get_task(task_id)?.ok_or(GameError::TaskNotFound(task_id))?;
            out.print(&task, format::format_task_markdown)
        }
        TaskCommand::List { owner, all, page } => {
            let tasks = db.list_tasks(owner, page.offset, page.limit, all)?;
            out.print(&tasks, |t| format::format_tasks_markdown("Tasks", t))
        }
        TaskCommand::Overdue { owner } => {
            let tasks = db.overdue_tasks(owner, now_ms())?;
            out.print(&tasks, |t| format::format_tasks_markdown("Overdue", t))
        }
        TaskCommand::Today { owner } => {
            let tasks = db.tasks_due_today(owner, now_ms())?;
            out.print(&tasks, |t| format::format_tasks_markdown("Due today", t))
        }
        TaskCommand::Subtasks { task_id } => {
            let tasks = db.subtasks(task_id)?;
            out.print(&tasks, |t| format::format_tasks_markdown("Subtasks", t))
        }
        TaskCommand::ByCategory {
            owner,
            category,
            page,
        } => {
            let tasks = db.tasks_by_category(owner, category, page.offset, page.limit)?;
            out.print(&tasks, |t| format::format_tasks_markdown("Tasks in category", t))
        }
        TaskCommand::Update(args) => {
            let (task, completion) = db.update_task(args.task_id, args.user, args.to_update())?;

            #[derive(Serialize)]
            struct Updated<'a> {
                task: &'a task_donegeon::types::Task,
                completion: Option<&'a task_donegeon::completion::CompletionReport>,
            }

            let updated = Updated {
                task: &task,
                completion: completion.as_ref().map(|c| &c.report),
            };
            out.print(&updated, |u| match completion {
                Some(ref done) => format::format_completion_markdown(done),
                None => format::format_task_markdown(u.task),
            })
        }
        TaskCommand::Complete { task_id, user } => {
            let done = db.complete_task(task_id, user)?;
            out.print(&done, format::format_completion_markdown)
        }
        TaskCommand::Delete { task_id, user } => {
            let task = db.delete_task(task_id, user)?;
            out.print(&task, |t| format!("Deleted task `{}` ({})\n", t.id, t.title))
        }
        TaskCommand::Tag(cmd) => run_tag(db, out, cmd),
    }
}

fn run_tag(db: &Database, out: &Printer, cmd: TagCommand) -> Result<()> {
    match cmd {
        TagCommand::Add {
            task_id,
            name,
            user,
        } => {
            let tag = db.add_tag(task_id, user, &name)?;
            out.print(&tag, |t| format!("Tagged task `{}` with #{}\n", t.task_id, t.name))
        }
        TagCommand::List { task_id } => {
            let tags = db.task_tags(task_id)?;
            out.print(&tags, |tags| {
                let names: Vec<String> = tags.iter().map(|t| format!("`{}` #{}", t.id, t.name)).collect();
                format!("# Tags on task {}\n\n{}\n", task_id, names.join(", "))
            })
        }
        TagCommand::Delete { tag_id, user } => {
            let tag = db.delete_tag(tag_id, user)?;
            out.print(&tag, |t| format!("Removed #{} from task `{}`\n", t.name, t.task_id))
        }
    }
}

fn run_category(db: &Database, out: &Printer, cmd: CategoryCommand) -> Result<()> {
    match cmd {
        CategoryCommand::Create {
            name,
            description,
            color,
            icon,
        } => {
            let category = db.create_category(NewCategory {
                name,
                description,
                color,
                icon_name: icon,
            })?;
            out.print(&category, |c| format::format_categories_markdown(std::slice::from_ref(c)))
        }
        CategoryCommand::List => {
            let categories = db.list_categories()?;
            out.print(&categories, |c| format::format_categories_markdown(c))
        }
        CategoryCommand::Seed => {
            let added = db.seed_default_categories()?;
            out.print(&added, |n| format!("Added {} default categories\n", n))
        }
    }
}

fn run_achievement(
    db: &Database,
    out: &Printer,
    rewards: &RewardsConfig,
    cmd: AchievementCommand,
) -> Result<()> {
    match cmd {
        AchievementCommand::Grant(args) => {
            let user_id = args.user;
            let (achievement, user, change) = db.grant_achievement(user_id, args.into(), rewards)?;
            out.print(&achievement, |a| {
                let mut md = format!(
                    "# Achievement unlocked: {}\n\n- **experience**: +{}\n- **gold**: +{}\n",
                    a.name, a.experience_reward, a.gold_reward
                );
                if change.leveled_up() {
                    md.push_str(&format!("- **level up**: {} -> {}\n", change.from, change.to));
                }
                md.push('\n');
                md.push_str(&format::format_user_markdown(&user));
                md
            })
        }
        AchievementCommand::List { user } => {
            let achievements = db.list_achievements(user)?;
            out.print(&achievements, |a| format::format_achievements_markdown(a))
        }
    }
}

fn run_inventory(db: &Database, out: &Printer, cmd: InventoryCommand) -> Result<()> {
    match cmd {
        InventoryCommand::Add(args) => {
            let user_id = args.user;
            let item = db.add_inventory_item(user_id, args.into())?;
            out.print(&item, |i| format::format_inventory_markdown(std::slice::from_ref(i)))
        }
        InventoryCommand::Update {
            item_id,
            user,
            quantity,
            equipped,
        } => {
            let item = db.update_inventory_item(item_id, user, quantity, equipped)?;
            out.print(&item, |i| format::format_inventory_markdown(std::slice::from_ref(i)))
        }
        InventoryCommand::List { user } => {
            let items = db.list_inventory(user)?;
            out.print(&items, |i| format::format_inventory_markdown(i))
        }
    }
}
