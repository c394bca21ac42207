use anyhow::Context;
use chrono::Utc;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use roadmap_catalog::{Status, TaskId};
use roadmap_core::{
    Deadline, NotesDebouncer, RemoteWrite, RoadmapView, Tracker, TrackerConfig, UpdateOutcome,
};
use roadmap_store::Session;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn task_arg() -> Arg {
    Arg::new("task")
        .required(true)
        .help("Task identifier")
}

fn cli() -> Command {
    Command::new("roadmap")
        .version(roadmap_core::VERSION)
        .about("Track progress through a phased relocation roadmap")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .default_value("roadmap.toml")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file, used when it exists"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Override the data directory"),
        )
        .subcommand(Command::new("phases").about("List phases with their progress"))
        .subcommand(
            Command::new("status")
                .about("Show every task with its effective status")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("complete")
                .about("Mark a task completed")
                .arg(task_arg()),
        )
        .subcommand(
            Command::new("activate")
                .about("Mark a task active")
                .arg(task_arg()),
        )
        .subcommand(
            Command::new("note")
                .about("Replace the notes of a task")
                .arg(task_arg())
                .arg(Arg::new("text").required(true).help("Notes text")),
        )
        .subcommand(
            Command::new("attach")
                .about("Upload a document for a task")
                .arg(task_arg())
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File to upload"),
                ),
        )
        .subcommand(
            Command::new("link")
                .about("Print a signed download link for a task's document")
                .arg(task_arg()),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and sync local progress")
                .arg(Arg::new("user").required(true).help("User identifier"))
                .arg(Arg::new("email").long("email").help("Contact address")),
        )
        .subcommand(Command::new("logout").about("Sign out"))
        .subcommand(
            Command::new("deadline")
                .about("Show or change the target move date")
                .subcommand(
                    Command::new("set")
                        .about("Set the target date")
                        .arg(Arg::new("date").required(true).help("Date as YYYY-MM-DD")),
                )
                .subcommand(Command::new("clear").about("Forget the target date")),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    let config_path = matches.get_one::<PathBuf>("config");
    let mut config = TrackerConfig::load(config_path.map(PathBuf::as_path))?;
    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config = config.with_data_dir(dir);
    }

    let tracker = Arc::new(Tracker::from_config(&config)?);
    tracker.restore_session().await?;
    tracker.load().await?;

    match matches.subcommand() {
        Some(("phases", _)) => print_phases(&tracker.roadmap().await),
        Some(("status", args)) => {
            let view = tracker.roadmap().await;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_status(&view);
            }
        }
        Some(("complete", args)) => {
            let outcome = tracker.complete_task(&task(args)).await?;
            report(&outcome.completed);
            if let Some(unlocked) = &outcome.unlocked {
                println!("Unlocked {}", unlocked.task_id);
            }
        }
        Some(("activate", args)) => report(&tracker.activate_task(&task(args)).await?),
        Some(("note", args)) => {
            let text = args.get_one::<String>("text").cloned().unwrap_or_default();
            let debouncer = NotesDebouncer::spawn(Arc::clone(&tracker), config.notes_debounce());
            debouncer.edit(&task(args), text)?;
            if debouncer.flush().await > 0 {
                println!("Notes saved");
            }
        }
        Some(("attach", args)) => {
            let path = args
                .get_one::<PathBuf>("path")
                .context("missing file path")?;
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_name()
                .map_or_else(|| "document".to_string(), |n| n.to_string_lossy().into_owned());
            report(&tracker.attach_file(&task(args), &name, &bytes).await?);
        }
        Some(("link", args)) => {
            let link = tracker.download_link(&task(args)).await?;
            println!("{}", link.url);
            println!("Expires {}", link.expires_at.format("%Y-%m-%d %H:%M UTC"));
        }
        Some(("login", args)) => {
            let user = args.get_one::<String>("user").context("missing user")?;
            let mut session = Session::new(user.clone());
            session.email = args.get_one::<String>("email").cloned();
            let sync = tracker.on_session_change(Some(session)).await?;
            println!("Signed in as {user}: {} records pushed", sync.pushed);
            for failed in &sync.failed {
                println!("  not synced: {failed}");
            }
        }
        Some(("logout", _)) => {
            tracker.on_session_change(None).await?;
            println!("Signed out");
        }
        Some(("deadline", args)) => match args.subcommand() {
            Some(("set", set)) => {
                let date = set.get_one::<String>("date").context("missing date")?;
                let deadline = Deadline::parse(date)?;
                deadline.save(tracker.cache()).await?;
                print_deadline(&deadline);
            }
            Some(("clear", _)) => {
                Deadline::clear(tracker.cache()).await?;
                println!("Deadline cleared");
            }
            _ => match Deadline::load(tracker.cache()).await? {
                Some(deadline) => print_deadline(&deadline),
                None => println!("No deadline set"),
            },
        },
        _ => unreachable!("subcommand_required"),
    }

    Ok(())
}

fn task(args: &ArgMatches) -> TaskId {
    TaskId::new(args.get_one::<String>("task").cloned().unwrap_or_default())
}

fn report(outcome: &UpdateOutcome) {
    println!("{}: {}", outcome.task_id, outcome.record.status);
    if let RemoteWrite::Failed { reason, .. } = &outcome.remote {
        println!("  saved locally, remote copy pending ({reason})");
    }
}

fn marker(status: Status) -> &'static str {
    match status {
        Status::Completed => "[x]",
        Status::Active => "[ ]",
        Status::Blocked => "[-]",
    }
}

fn print_phases(view: &RoadmapView) {
    for (index, phase) in view.phases.iter().enumerate() {
        let current = view.current_phase.as_ref() == Some(&phase.id);
        println!(
            "{}{}. {} {}/{} ({}%){}",
            if current { "> " } else { "  " },
            index + 1,
            phase.title,
            phase.mandatory.completed,
            phase.mandatory.total,
            phase.mandatory.rounded_percent(),
            if phase.unlocked { "" } else { " locked" },
        );
    }
    println!(
        "Overall {}/{} ({}%), optional {}/{}",
        view.overall.completed,
        view.overall.total,
        view.overall.rounded_percent(),
        view.optional.completed,
        view.optional.total,
    );
}

fn print_status(view: &RoadmapView) {
    for phase in &view.phases {
        println!(
            "{} ({}/{})",
            phase.title, phase.mandatory.completed, phase.mandatory.total
        );
        for task in &phase.tasks {
            println!(
                "  {} {}{} [{}]",
                marker(task.status),
                task.title,
                if task.optional { " (optional)" } else { "" },
                task.id,
            );
        }
    }
    if view.all_complete {
        println!("All mandatory tasks completed");
    }
}

fn print_deadline(deadline: &Deadline) {
    let now = Utc::now();
    let days = deadline.days_left(now);
    if deadline.is_past(now) {
        println!("{deadline}: date reached");
    } else {
        println!("{deadline}: {days} days left ({})", deadline.urgency(now));
    }
}
