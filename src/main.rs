use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use startpage::domain::{NoteColor, Priority, SearchEngine};
use startpage::notes::format_created_at;
use startpage::notifications::SystemOpener;
use startpage::persistence::{
    atomic_write, backup_file_name, ensure_data_dir, init_local_data_dir, read_file,
    storage_file, FileStore,
};
use startpage::pomodoro::TickOutcome;
use startpage::ticker::{LoopScheduler, SystemClock};
use startpage::StartPage;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "startpage")]
#[command(about = "A personal start page: todos, pomodoro focus tracking, bookmarks, search and notes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .startpage directory in the current directory
    Init,
    /// Manage the todo list
    Todo {
        #[command(subcommand)]
        action: TodoCommand,
    },
    /// Manage bookmarked websites
    Site {
        #[command(subcommand)]
        action: SiteCommand,
    },
    /// Search the web and record the query in history
    Search {
        query: Vec<String>,
        /// Engine to use instead of the current one (baidu, google, bing)
        #[arg(short, long)]
        engine: Option<String>,
    },
    /// Show recent searches
    History {
        /// Forget every recorded search
        #[arg(long)]
        clear: bool,
    },
    /// Show or set the default search engine
    Engine {
        #[arg(value_parser = parse_engine)]
        engine: Option<SearchEngine>,
    },
    /// Manage sticky notes
    Note {
        #[command(subcommand)]
        action: NoteCommand,
    },
    /// Pomodoro timer
    Pomodoro {
        #[command(subcommand)]
        action: PomodoroCommand,
    },
    /// Show focus time per day
    Focus,
    /// Light/dark theme
    Theme {
        #[command(subcommand)]
        action: ThemeCommand,
    },
    /// Write every collection to a backup file
    Export {
        /// Output file path. Defaults to ./startpage-backup_YYYYMMDD.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace stored data with a backup file
    Import {
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Delete all start page data
    Reset {
        /// Skip the confirmation prompts
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TodoCommand {
    List,
    Add {
        text: Vec<String>,
        #[arg(short, long, default_value = "medium", value_parser = parse_priority)]
        priority: Priority,
    },
    /// Toggle an item's completed flag
    Done { number: usize },
    Rm { number: usize },
    Edit { number: usize, text: Vec<String> },
    /// Drag item FROM onto position TO
    Mv { from: usize, to: usize },
    Priority {
        number: usize,
        #[arg(value_parser = parse_priority)]
        priority: Priority,
    },
}

#[derive(Subcommand)]
enum SiteCommand {
    List,
    Add {
        name: String,
        url: String,
        #[arg(long, default_value = "")]
        icon: String,
    },
    Rm { number: usize },
    /// Drag site FROM onto position TO
    Mv { from: usize, to: usize },
    Open { number: usize },
}

#[derive(Subcommand)]
enum NoteCommand {
    List,
    Add {
        #[arg(short, long, default_value = "yellow", value_parser = parse_color)]
        color: NoteColor,
        text: Vec<String>,
    },
    Edit { number: usize, text: Vec<String> },
    Color {
        number: usize,
        #[arg(value_parser = parse_color)]
        color: NoteColor,
    },
    Rm { number: usize },
}

#[derive(Subcommand)]
enum PomodoroCommand {
    Status,
    /// Change durations in minutes (work 1-60, break 1-30)
    Set {
        #[arg(long)]
        work: Option<u32>,
        #[arg(long = "break")]
        break_minutes: Option<u32>,
    },
    /// Switch between work and break
    Switch,
    Reset,
    /// Run the countdown in the foreground until it expires
    Run,
}

#[derive(Subcommand)]
enum ThemeCommand {
    Status,
    /// Flip the theme and keep it regardless of time of day
    Toggle,
    /// Follow the time of day again
    Auto,
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_id(s)
        .ok_or_else(|| format!("unknown priority '{}' (low, medium, high, urgent)", s))
}

fn parse_engine(s: &str) -> Result<SearchEngine, String> {
    SearchEngine::from_id(s)
        .ok_or_else(|| format!("unknown search engine '{}' (baidu, google, bing)", s))
}

fn parse_color(s: &str) -> Result<NoteColor, String> {
    NoteColor::from_id(s)
        .ok_or_else(|| format!("unknown color '{}' (yellow, blue, green, pink, purple)", s))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "startpage=warn".into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Some(Commands::Init) = cli.command {
        let data_dir = init_local_data_dir()?;
        println!("Initialized start page directory: {}", data_dir.display());
        println!();
        println!("Start page will now use this local directory for its data.");
        return Ok(());
    }

    ensure_data_dir()?;
    let path = storage_file()?;
    let store = FileStore::open(&path)
        .with_context(|| format!("Failed to open storage file: {}", path.display()))?;

    let mut page = StartPage::new(
        Rc::new(store),
        Rc::new(SystemClock),
        Rc::new(LoopScheduler),
        Rc::new(SystemOpener),
        false,
    );

    let result = run(&mut page, cli.command);
    if let Some(notice) = page.take_notice() {
        eprintln!("{}", notice);
    }
    result
}

fn run(page: &mut StartPage, command: Option<Commands>) -> Result<()> {
    match command {
        None => print_overview(page),
        Some(Commands::Init) => {}
        Some(Commands::Todo { action }) => run_todo(page, action)?,
        Some(Commands::Site { action }) => run_site(page, action)?,
        Some(Commands::Search { query, engine }) => {
            let query = query.join(" ");
            let url = match engine {
                Some(id) => page.search.search_with(&query, &id),
                None => page.search.search(&query),
            };
            match url {
                Some(url) => println!("Opened {}", url),
                None => println!("Nothing to search"),
            }
        }
        Some(Commands::History { clear }) => {
            if clear {
                page.search.clear_history();
                println!("Search history cleared");
            } else {
                for entry in page.search.history() {
                    println!("{:<8} {}", entry.engine.id(), entry.query);
                }
            }
        }
        Some(Commands::Engine { engine }) => {
            if let Some(engine) = engine {
                page.search.set_engine(engine);
            }
            let current = page.search.current_engine();
            println!("Search engine: {} ({})", current.name(), current.id());
        }
        Some(Commands::Note { action }) => run_note(page, action)?,
        Some(Commands::Pomodoro { action }) => run_pomodoro(page, action)?,
        Some(Commands::Focus) => {
            println!("Today: {}", format_focus(page.pomodoro.today_focus_seconds()));
            for (day, secs) in page.pomodoro.focus_log().iter().rev().take(7) {
                println!("{}  {}", day, format_focus(*secs));
            }
        }
        Some(Commands::Theme { action }) => {
            match action {
                ThemeCommand::Status => {}
                ThemeCommand::Toggle => {
                    page.theme.toggle();
                }
                ThemeCommand::Auto => page.theme.clear_override(),
            }
            let preference = page.theme.preference();
            let source = if preference.user_overridden {
                "chosen"
            } else {
                "by time of day"
            };
            println!("Theme: {} ({})", preference.mode.id(), source);
        }
        Some(Commands::Export { output }) => {
            let snapshot = page.export_backup()?;
            let output = output.unwrap_or_else(|| {
                PathBuf::from(backup_file_name(chrono::Local::now().date_naive()))
            });
            atomic_write(&output, &snapshot.to_json_pretty()?)?;
            println!("Backup written: {}", output.display());
        }
        Some(Commands::Import { file, yes }) => {
            let raw = read_file(&file)?;
            if !yes && !confirm("Importing replaces the current data. Continue? [y/N] ")? {
                println!("Import cancelled");
                return Ok(());
            }
            let written = page.import_backup(&raw)?;
            println!("Imported {} collections from {}", written.len(), file.display());
        }
        Some(Commands::Reset { yes }) => {
            if !yes {
                let question = "This deletes all start page data and cannot be undone. Continue? [y/N] ";
                if !confirm(question)? {
                    println!("Reset cancelled");
                    return Ok(());
                }
                if prompt("Type DELETE to confirm: ")? != "DELETE" {
                    println!("Reset cancelled");
                    return Ok(());
                }
            }
            page.reset_all()?;
            println!("All start page data deleted");
        }
    }
    Ok(())
}

fn print_overview(page: &StartPage) {
    println!("Todos: {} open of {}", page.todos.remaining(), page.todos.len());
    println!(
        "Pomodoro: {} {} | focus today {}",
        page.pomodoro.mode().id(),
        page.pomodoro.formatted_time(),
        format_focus(page.pomodoro.today_focus_seconds())
    );
    println!("Search engine: {}", page.search.current_engine().name());
    println!("Theme: {}", page.theme.mode().id());
}

fn run_todo(page: &mut StartPage, action: TodoCommand) -> Result<()> {
    let todos = &mut page.todos;
    match action {
        TodoCommand::List => {
            for (i, item) in todos.items().iter().enumerate() {
                let mark = if item.completed { "x" } else { " " };
                println!("{:>3}. [{}] {}  ({})", i + 1, mark, item.text, item.priority.label());
            }
            println!("{} remaining", todos.remaining());
        }
        TodoCommand::Add { text, priority } => {
            if !todos.add(&text.join(" "), priority) {
                println!("Nothing to add");
            }
        }
        TodoCommand::Done { number } => check(todos.toggle(index(number)?), number)?,
        TodoCommand::Rm { number } => check(todos.remove(index(number)?), number)?,
        TodoCommand::Edit { number, text } => {
            check(todos.begin_edit(index(number)?), number)?;
            todos.update_draft(&text.join(" "));
            if !todos.commit_edit() {
                println!("Edit discarded");
            }
        }
        TodoCommand::Mv { from, to } => {
            let (from, to) = move_indices(todos.len(), from, to)?;
            todos.reorder(from, to);
        }
        TodoCommand::Priority { number, priority } => {
            check(todos.set_priority(index(number)?, priority), number)?
        }
    }
    Ok(())
}

fn run_site(page: &mut StartPage, action: SiteCommand) -> Result<()> {
    let sites = &mut page.websites;
    match action {
        SiteCommand::List => {
            for (i, site) in sites.items().iter().enumerate() {
                println!("{:>3}. {} {}  {}", i + 1, site.icon, site.name, site.url);
            }
        }
        SiteCommand::Add { name, url, icon } => sites.add(&name, &url, &icon)?,
        SiteCommand::Rm { number } => check(sites.remove(index(number)?), number)?,
        SiteCommand::Mv { from, to } => {
            let (from, to) = move_indices(sites.items().len(), from, to)?;
            sites.reorder(from, to);
        }
        SiteCommand::Open { number } => check(sites.open(index(number)?), number)?,
    }
    Ok(())
}

fn run_note(page: &mut StartPage, action: NoteCommand) -> Result<()> {
    let notes = &mut page.notes;
    match action {
        NoteCommand::List => {
            for (i, note) in notes.notes().iter().enumerate() {
                println!(
                    "{:>3}. [{}] {}  {}",
                    i + 1,
                    note.color.id(),
                    format_created_at(note),
                    note.content
                );
            }
        }
        NoteCommand::Add { color, text } => {
            notes.add(color);
            let text = text.join(" ");
            if !text.is_empty() {
                notes.update(0, &text);
            }
        }
        NoteCommand::Edit { number, text } => {
            check(notes.update(index(number)?, &text.join(" ")), number)?
        }
        NoteCommand::Color { number, color } => {
            check(notes.set_color(index(number)?, color), number)?
        }
        NoteCommand::Rm { number } => check(notes.remove(index(number)?), number)?,
    }
    Ok(())
}

fn run_pomodoro(page: &mut StartPage, action: PomodoroCommand) -> Result<()> {
    match action {
        PomodoroCommand::Status => {}
        PomodoroCommand::Set {
            work,
            break_minutes,
        } => {
            if let Some(minutes) = work {
                page.pomodoro.set_work_minutes(minutes);
            }
            if let Some(minutes) = break_minutes {
                page.pomodoro.set_break_minutes(minutes);
            }
        }
        PomodoroCommand::Switch => page.pomodoro.switch_mode(),
        PomodoroCommand::Reset => page.pomodoro.reset(),
        PomodoroCommand::Run => return run_countdown(page),
    }

    let settings = page.pomodoro.settings();
    println!(
        "{} {} (work {}m, break {}m)",
        page.pomodoro.mode().id(),
        page.pomodoro.formatted_time(),
        settings.work_minutes,
        settings.break_minutes
    );
    Ok(())
}

/// Foreground countdown; focus time is saved on every tick
fn run_countdown(page: &mut StartPage) -> Result<()> {
    page.pomodoro.start();
    let mut stdout = io::stdout();

    loop {
        let Some(interval) = page.pomodoro.ticker().filter(|t| t.is_active()).map(|t| t.interval())
        else {
            break;
        };
        std::thread::sleep(interval);
        match page.tick() {
            TickOutcome::Running { .. } => {
                write!(
                    stdout,
                    "\r{} {}  {:>3.0}%",
                    page.pomodoro.mode().id(),
                    page.pomodoro.formatted_time(),
                    page.pomodoro.progress_percentage()
                )?;
                stdout.flush()?;
            }
            TickOutcome::Expired { finished } => {
                println!("\r{} finished, next up: {}", finished.id(), page.pomodoro.mode().id());
                break;
            }
            TickOutcome::Stopped => break,
        }
    }
    Ok(())
}

/// Convert a 1-based number from the command line
fn index(number: usize) -> Result<usize> {
    number.checked_sub(1).context("Numbers start at 1")
}

/// Both positions of a move as indices; moving an entry onto itself is allowed
fn move_indices(len: usize, from: usize, to: usize) -> Result<(usize, usize)> {
    for number in [from, to] {
        if number == 0 || number > len {
            anyhow::bail!("No entry number {}", number);
        }
    }
    Ok((from - 1, to - 1))
}

fn check(found: bool, number: usize) -> Result<()> {
    if !found {
        anyhow::bail!("No entry number {}", number);
    }
    Ok(())
}

fn format_focus(secs: u64) -> String {
    format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(message: &str) -> Result<bool> {
    let answer = prompt(message)?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}
