mod input;

use clap::{Parser, Subcommand};
use input::{is_yes, parse_input, Input, HELP};
use repset_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "repset")]
#[command(about = "Guided workout session runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override plans directory
    #[arg(long, global = true)]
    plans_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workout session (default)
    Run {
        /// Plan to run
        #[arg(long, default_value = "sample")]
        plan: String,

        /// Auto-complete (for testing) - complete every set and finish
        #[arg(long)]
        auto_complete: bool,
    },

    /// List available plans
    Plans,

    /// Show the exercises of a plan
    Show {
        #[arg(long, default_value = "sample")]
        plan: String,
    },

    /// List completed sessions
    History,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    repset_core::logging::init_with_level(&config.logging.level);

    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    if let Some(dir) = cli.plans_dir {
        config.plans.plans_dir = dir;
    }

    match cli.command {
        Some(Commands::Run {
            plan,
            auto_complete,
        }) => cmd_run(&config, &plan, auto_complete),
        Some(Commands::Plans) => cmd_plans(&config),
        Some(Commands::Show { plan }) => cmd_show(&config, &plan),
        Some(Commands::History) => cmd_history(&config),
        None => cmd_run(&config, "sample", false),
    }
}

/// How an input left the session
enum Flow {
    Continue,
    Finished,
}

fn cmd_run(config: &Config, plan_id: &str, auto_complete: bool) -> Result<()> {
    let source = DirectoryPlanSource::new(&config.plans.plans_dir);
    let plan = source.fetch_plan(plan_id)?;

    let dispatcher =
        ReportDispatcher::spawn(JsonlCompletionLog::new(config.completion_log_path()))?;

    let controller = SessionController::new(
        plan,
        config.session_settings(),
        Box::new(SystemClock),
        dispatcher.handle(),
    )?;

    if auto_complete {
        run_auto(controller)?;
    } else {
        run_interactive(controller, config.poll_interval())?;
    }

    // Let any queued completion report land before exiting
    dispatcher.shutdown()
}

fn run_auto(mut controller: SessionController<DispatchHandle>) -> Result<()> {
    loop {
        render(&controller.snapshot());

        let index = controller.current_exercise_index();
        let total = controller.compute_total_sets(controller.current_exercise());
        for set in 0..total {
            controller.toggle_set(index, set);
            controller.skip_rest();
        }

        match controller.go_to_next() {
            NextOutcome::Advanced(_) => continue,
            NextOutcome::SessionComplete => {
                print_complete(&controller);
                return Ok(());
            }
            NextOutcome::Blocked => {
                return Err(Error::Other(format!(
                    "exercise {} could not be completed",
                    index + 1
                )));
            }
        }
    }
}

fn run_interactive(
    mut controller: SessionController<DispatchHandle>,
    poll_interval: Duration,
) -> Result<()> {
    let lines = spawn_stdin_reader()?;
    let mut confirming_exit = false;

    render(&controller.snapshot());
    println!("Type ? for commands.");
    prompt()?;

    loop {
        match lines.recv_timeout(poll_interval) {
            Ok(line) => {
                if confirming_exit {
                    confirming_exit = false;
                    if is_yes(&line) {
                        let abandoned = controller.confirm_exit();
                        println!(
                            "\nSession discarded ({} completed sets lost).",
                            abandoned.sets_discarded
                        );
                        return Ok(());
                    }
                    controller.cancel_exit();
                    println!("Continuing.");
                } else {
                    match parse_input(&line) {
                        Ok(input) => {
                            if let Flow::Finished =
                                handle_input(&mut controller, input, &mut confirming_exit)
                            {
                                return Ok(());
                            }
                        }
                        Err(message) => println!("{}", message),
                    }
                }
                prompt()?;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                let abandoned = controller.confirm_exit();
                println!(
                    "\nInput closed; session discarded ({} completed sets lost).",
                    abandoned.sets_discarded
                );
                return Ok(());
            }
        }

        if let Some(event) = controller.poll() {
            print_timer_event(event);
            prompt()?;
        }
    }
}

/// Forward stdin lines to the session loop so it can keep ticking between them
fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

fn handle_input(
    controller: &mut SessionController<DispatchHandle>,
    input: Input,
    confirming_exit: &mut bool,
) -> Flow {
    match input {
        Input::Toggle(set) => {
            let index = controller.current_exercise_index();
            match controller.toggle_set(index, set - 1) {
                ToggleOutcome::Completed { rest_event } => {
                    println!("✓ Set {} done.", set);
                    match rest_event {
                        Some(event) => print_timer_event(event),
                        None => {
                            if let Some(rest) = controller.snapshot().rest {
                                println!("  Rest {}s.", rest.total);
                            }
                        }
                    }
                }
                ToggleOutcome::Uncompleted => println!("Set {} un-marked.", set),
                ToggleOutcome::Ignored => println!("There is no set {} here.", set),
            }
            render(&controller.snapshot());
        }
        Input::Next => match controller.go_to_next() {
            NextOutcome::Advanced(_) => render(&controller.snapshot()),
            NextOutcome::SessionComplete => {
                print_complete(controller);
                return Flow::Finished;
            }
            NextOutcome::Blocked => println!("Finish every set before moving on."),
        },
        Input::Previous => {
            if controller.go_to_previous() {
                render(&controller.snapshot());
            } else {
                println!("Already at the first exercise.");
            }
        }
        Input::Extend(secs) => {
            let extended = match secs {
                Some(secs) => controller.extend_rest(secs),
                None => controller.extend_rest_default(),
            };
            match controller.snapshot().rest {
                Some(rest) if extended => {
                    println!("Rest extended: {}s left.", rest.remaining)
                }
                _ => println!("No rest running."),
            }
        }
        Input::Skip => match controller.skip_rest() {
            Some(event) => print_timer_event(event),
            None => println!("No rest running."),
        },
        Input::Exit => {
            let request = controller.request_exit();
            println!(
                "Discard this session? {} completed sets will be lost. [y/N]",
                request.sets_completed
            );
            *confirming_exit = true;
        }
        Input::Status => render(&controller.snapshot()),
        Input::Help => println!("{}", HELP),
        Input::Empty => {}
    }

    Flow::Continue
}

fn cmd_plans(config: &Config) -> Result<()> {
    let source = DirectoryPlanSource::new(&config.plans.plans_dir);
    for id in source.list_plans()? {
        match source.fetch_plan(&id) {
            Ok(plan) => println!("  {:<16} {}", id, plan.name),
            Err(e) => println!("  {:<16} (unusable: {})", id, e),
        }
    }
    Ok(())
}

fn cmd_show(config: &Config, plan_id: &str) -> Result<()> {
    let source = DirectoryPlanSource::new(&config.plans.plans_dir);
    let plan = source.fetch_plan(plan_id)?;

    println!("\n{} ({})", plan.name, plan.id);
    println!();
    for (i, exercise) in plan.exercises.iter().enumerate() {
        println!(
            "  {}. {}: {}, rest {}s",
            i + 1,
            exercise.name,
            exercise.prescription.summary(),
            exercise.prescription.rest_seconds()
        );
        if let Some(notes) = exercise.prescription.notes() {
            println!("     Note: {}", notes);
        }
    }
    println!();
    Ok(())
}

fn cmd_history(config: &Config) -> Result<()> {
    let reports = read_reports(&config.completion_log_path())?;
    if reports.is_empty() {
        println!("No completed sessions yet.");
        return Ok(());
    }

    for report in reports {
        println!(
            "  {}  {} ({})  {} sets",
            report.completed_at.format("%Y-%m-%d %H:%M"),
            report.plan_name,
            report.plan_id,
            report.sets_completed
        );
    }
    Ok(())
}

fn render(snapshot: &SessionSnapshot) {
    println!("\n╭─────────────────────────────────────────╮");
    println!(
        "│  {}  ·  exercise {}/{}",
        snapshot.plan_name,
        snapshot.exercise_index + 1,
        snapshot.exercise_count
    );
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  {}  ({})",
        snapshot.exercise.name,
        snapshot.exercise.prescription.summary()
    );
    if !snapshot.exercise.instructions.is_empty() {
        println!("  {}", snapshot.exercise.instructions);
    }
    if let Some(notes) = snapshot.exercise.prescription.notes() {
        println!("  ℹ {}", notes);
    }
    println!();

    let sets: Vec<String> = snapshot
        .sets
        .iter()
        .enumerate()
        .map(|(i, done)| format!("[{}] {}", if *done { "x" } else { " " }, i + 1))
        .collect();
    println!("  Sets: {}", sets.join("  "));

    if let Some(rest) = snapshot.rest {
        println!(
            "  Rest: {}s / {}s ({:.0}% left)",
            rest.remaining,
            rest.total,
            rest.progress() * 100.0
        );
    }

    if snapshot.exercise_complete {
        if snapshot.is_last {
            println!("  → 'n' to finish the session");
        } else {
            println!("  → 'n' for the next exercise");
        }
    }
    println!();
}

fn print_timer_event(event: TimerEvent) {
    match event {
        TimerEvent::Expired => println!("⏰ Rest over."),
        TimerEvent::Skipped { remaining } => println!("Rest skipped ({}s left).", remaining),
    }
}

fn print_complete<S: CompletionSink>(controller: &SessionController<S>) {
    println!("\n✓ Session complete!");
    println!(
        "  {}: {} sets",
        controller.plan().name,
        controller.state().total_completed()
    );
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}
