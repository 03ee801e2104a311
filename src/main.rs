use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use std::fs;
use std::path::PathBuf;
use taskdb::{Config, Task, TaskStore, now_secs, open_pool, schema};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskdb")]
#[command(about = "taskdb CLI - Tasks, authors and labels in a SQLite database")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the tables if they do not exist
    Init,

    /// Manage users
    #[command(subcommand)]
    User(UserCommands),

    /// Manage labels
    #[command(subcommand)]
    Label(LabelCommands),

    /// Create a task
    Create {
        #[arg(long)]
        author: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Label name, repeatable
        #[arg(long = "label")]
        labels: Vec<String>,
        #[arg(long)]
        assigned: Option<i64>,
    },

    /// List tasks, optionally filtered by author or label
    List {
        #[arg(long, conflicts_with = "label")]
        author: Option<i64>,
        #[arg(long)]
        label: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Change fields of a task; unspecified fields keep their value
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        assigned: Option<i64>,
    },

    /// Mark a task closed now
    Close { id: i64 },

    /// Clear the closed timestamp of a task
    Reopen { id: i64 },

    /// Delete a task
    Delete { id: i64 },

    /// Run a create/update/list/delete walkthrough against the database
    Demo,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Add a user and print its id
    Add { name: String },
}

#[derive(Subcommand)]
enum LabelCommands {
    /// Add a label and print its id
    Add { name: String },
    /// List label names
    List,
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    let store = open_store(&config)?;

    match cli.command {
        Commands::Init => {
            schema::provision(store.pool())?;
            println!("Initialized {}", config.database.display());
        }
        Commands::User(UserCommands::Add { name }) => {
            let id = schema::insert_user(store.pool(), &name)?;
            println!("{}", id);
        }
        Commands::Label(LabelCommands::Add { name }) => {
            let id = schema::insert_label(store.pool(), &name)?;
            println!("{}", id);
        }
        Commands::Label(LabelCommands::List) => {
            for name in schema::label_names(store.pool())? {
                println!("{}", name);
            }
        }
        Commands::Create {
            author,
            title,
            content,
            labels,
            assigned,
        } => {
            let mut task = Task::new(author, title, content).with_labels(labels);
            task.assigned_id = assigned;
            let id = store.create(&mut task).wrap_err("Failed to create task")?;
            println!("{}", id);
        }
        Commands::List { author, label, json } => {
            let tasks = match (author, label) {
                (Some(author), _) => store.get_by_author(author)?,
                (None, Some(label)) => store.get_by_label(&label)?,
                (None, None) => store.get_all()?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("{}", "No tasks".dimmed());
            } else {
                for task in &tasks {
                    print_task(task);
                }
            }
        }
        Commands::Update {
            id,
            title,
            content,
            assigned,
        } => {
            let mut task = find_task(&store, id)?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(content) = content {
                task.content = content;
            }
            if assigned.is_some() {
                task.assigned_id = assigned;
            }
            store.update(&task)?;
            print_task(&task);
        }
        Commands::Close { id } => {
            let mut task = find_task(&store, id)?;
            task.closed = Some(now_secs());
            store.update(&task)?;
            print_task(&task);
        }
        Commands::Reopen { id } => {
            let mut task = find_task(&store, id)?;
            task.closed = None;
            store.update(&task)?;
            print_task(&task);
        }
        Commands::Delete { id } => {
            store.delete(id)?;
            println!("Deleted task {}", id);
        }
        Commands::Demo => run_demo(&store)?,
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<TaskStore> {
    if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let pool = open_pool(&config.database, &config.pool)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;

    Ok(TaskStore::new(pool))
}

/// Look a task up by id through the full listing
fn find_task(store: &TaskStore, id: i64) -> Result<Task> {
    store
        .get_all()?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| eyre!("Task {} not found", id))
}

fn print_task(task: &Task) {
    let state = match task.closed {
        Some(_) => "closed".red(),
        None => "open".green(),
    };

    println!("{} {} [{}]", format!("#{}", task.id).bold(), task.title, state);
    println!("    author: {}", task.author_id);
    if let Some(assigned) = task.assigned_id {
        println!("    assigned: {}", assigned);
    }
    println!("    opened: {}", format_ts(task.opened));
    if let Some(closed) = task.closed {
        println!("    closed: {}", format_ts(closed));
    }
    if !task.labels.is_empty() {
        println!("    labels: {}", task.labels.join(", ").cyan());
    }
    if !task.content.is_empty() {
        println!("    {}", task.content.dimmed());
    }
}

fn format_ts(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Create a labelled task, close it, list it three ways, then delete it twice.
fn run_demo(store: &TaskStore) -> Result<()> {
    let pool = store.pool();
    schema::provision(pool)?;

    let author = schema::insert_user(pool, "demo")?;
    let existing = schema::label_names(pool)?;
    for name in ["one", "two"] {
        if !existing.iter().any(|l| l == name) {
            schema::insert_label(pool, name)?;
        }
    }

    println!("{}", "INSERT".bold());
    let mut task = Task::new(author, "First task", "some text description").with_labels(["one", "two"]);
    store.create(&mut task)?;
    print_task(&task);

    println!("{}", "UPDATE".bold());
    task.closed = Some(now_secs());
    store.update(&task)?;
    print_task(&task);

    println!("{}", "SELECT ALL TASKS".bold());
    for t in store.get_all()? {
        print_task(&t);
    }

    println!("{}", "GET TASKS BY AUTHOR".bold());
    let by_author = store.get_by_author(author)?;
    if by_author.is_empty() {
        println!("{}", "No tasks for this author".dimmed());
    }
    for t in &by_author {
        print_task(t);
    }

    println!("{}", "GET TASKS BY LABEL".bold());
    for t in store.get_by_label("one")? {
        print_task(&t);
    }

    println!("{}", "DELETE".bold());
    match store.delete(task.id) {
        Ok(()) => println!("Deleted task {}", task.id),
        Err(e) => println!("{} {}", "Delete failed:".red(), e),
    }
    match store.delete(task.id) {
        Ok(()) => println!("Deleted task {}", task.id),
        Err(e) => println!("{} {}", "Delete failed:".red(), e),
    }

    Ok(())
}
