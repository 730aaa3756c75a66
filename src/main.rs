use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use course_navigator::api::{KeyringTokenStore, PlatformClient};
use course_navigator::app::{ParseResult, QUIZ_HELP, QuizCommand, parse_quiz_line};
use course_navigator::config::session::ReadingState;
use course_navigator::progress::SyncStatus;
use course_navigator::quiz::{Advance, AttemptState};
use course_navigator::remote::Registration;
use course_navigator::tutor::GradeRequest;
use course_navigator::{App, AppError, Config, QuizAttempt, Services};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "course-navigator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the access token
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        email: String,
        #[arg(long)]
        full_name: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// List enrolled courses with progress
    Courses,
    /// Show progress and the resume point for a course
    Dashboard {
        /// Course slug (defaults to the current course)
        course: Option<String>,
        /// Ask the platform instead of computing locally
        #[arg(long)]
        remote: bool,
    },
    /// Read a lesson
    Lesson { slug: String },
    /// Show the chapter after the given (or last opened) one
    Next { slug: Option<String> },
    /// Mark a chapter complete
    Complete { slug: String },
    /// Take a chapter's quiz
    Quiz { slug: String },
    /// Ask the AI tutor about a lesson
    Ask {
        slug: String,
        /// Starts an interactive conversation when omitted
        question: Vec<String>,
    },
    /// Have the AI grade a free-form answer
    Grade { slug: String, question_id: String, answer: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "course_navigator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let reading = ReadingState::load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable session state: {:#}", e);
        ReadingState::default()
    });
    let client = PlatformClient::new(config.api_base_url.clone(), config.request_timeout())
        .context("Failed to build HTTP client")?;
    let mut app = App::new(config, Services::platform(client), Box::new(KeyringTokenStore), reading);

    let result = run(&mut app, cli.command).await;

    if let Err(e) = app.reading_state().save() {
        tracing::warn!("Failed to save session state: {:#}", e);
    }
    result
}

async fn run(app: &mut App, command: Commands) -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    match command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => match prompt(&mut stdin, "Password: ").await? {
                    Some(p) => p,
                    None => bail!("No password given"),
                },
            };
            app.login(&username, &password).await?;
            println!("Logged in as {}", username);
        }
        Commands::Register { email, full_name, password } => {
            let password = match password {
                Some(p) => p,
                None => match prompt(&mut stdin, "Password: ").await? {
                    Some(p) => p,
                    None => bail!("No password given"),
                },
            };
            app.register(&Registration { email: email.clone(), password, full_name }).await?;
            println!("Account created for {}. Run `course-navigator login` next.", email);
        }
        Commands::Logout => {
            app.logout()?;
            println!("Logged out");
        }
        Commands::Courses => {
            open(app).await?;
            print_courses(app)?;
        }
        Commands::Dashboard { course, remote } => {
            open(app).await?;
            let slug = match course {
                Some(slug) => slug,
                None => app.current_course()?.slug.clone(),
            };
            // without platform history the local view would understate progress
            let remote = remote || !app.progress_loaded()?;
            if remote {
                let dash = app.remote_dashboard(&slug).await?;
                println!(
                    "{}: {}/{} chapters ({:.0}%)",
                    dash.course_slug, dash.completed_chapters, dash.total_chapters, dash.percentage
                );
                if let Some(next) = dash.next_chapter_slug {
                    println!("Continue with: {}", next);
                }
            } else {
                let view = app.dashboard(&slug)?;
                println!(
                    "{}: {}/{} chapters ({}%)",
                    view.title, view.stats.completed, view.stats.total, view.stats.percentage
                );
                if let Some(next) = view.resume_slug {
                    println!("Continue with: {}", next);
                }
            }
        }
        Commands::Lesson { slug } => {
            open(app).await?;
            print_lesson(app, &slug).await?;
        }
        Commands::Next { slug } => {
            open(app).await?;
            let current = match slug.as_deref().or(app.current_chapter()) {
                Some(s) => s.to_string(),
                None => bail!("No lesson opened yet. Pass a chapter slug."),
            };
            match app.navigation()?.next_chapter(&current) {
                Some(next) => println!("Next: {} ({})", next.title, next.slug),
                None => println!("\"{}\" is the last chapter", current),
            }
        }
        Commands::Complete { slug } => {
            open(app).await?;
            let outcome = app.complete(&slug).await?;
            report_sync(&slug, outcome.newly_completed, &outcome.sync);
        }
        Commands::Quiz { slug } => {
            open(app).await?;
            app.lesson(&slug).await?;
            run_quiz(app, &slug, &mut stdin).await?;
        }
        Commands::Ask { slug, question } => {
            open(app).await?;
            let mut conversation = app.tutor(&slug).await?;
            let width = app.config().wrap_width;
            if !question.is_empty() {
                let reply = app.ask(&mut conversation, &question.join(" ")).await?;
                println!("{}", textwrap::fill(&reply, width));
                return Ok(());
            }

            println!("Ask about \"{}\". Empty line to stop.", conversation.chapter_slug());
            while let Some(line) = prompt(&mut stdin, "> ").await? {
                if line.is_empty() {
                    break;
                }
                match app.ask(&mut conversation, &line).await {
                    Ok(reply) => println!("{}\n", textwrap::fill(&reply, width)),
                    // tutor errors never end the session
                    Err(e) => println!("{}", e),
                }
            }
        }
        Commands::Grade { slug, question_id, answer } => {
            open(app).await?;
            if answer.is_empty() {
                bail!("Provide an answer to grade");
            }
            let chapter_id = app.catalog()?.find_chapter_by_slug(&slug)?.id.clone();
            let grade = app
                .grade(&GradeRequest { chapter_id, question_id, answer: answer.join(" ") })
                .await?;
            println!("Score: {}/5", grade.score);
            for s in &grade.strengths {
                println!("  + {}", s);
            }
            for w in &grade.weaknesses {
                println!("  - {}", w);
            }
            if !grade.reasoning.is_empty() {
                println!("\n{}", textwrap::fill(&grade.reasoning, app.config().wrap_width));
            }
        }
    }

    Ok(())
}

/// Restore the stored session or explain how to get one
async fn open(app: &mut App) -> Result<()> {
    match app.open().await {
        Ok(()) => Ok(()),
        Err(e) if e.requires_reauth() => {
            bail!("{}\nRun `course-navigator login <username>` to continue.", e)
        }
        Err(AppError::Catalog(e)) if e.is_blocking() => {
            bail!("{}\nCourse content cannot be shown right now. Try again later.", e)
        }
        Err(e) => Err(e.into()),
    }
}

/// Read one trimmed line; `None` once stdin is closed
async fn prompt(stdin: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    use std::io::Write;

    print!("{}", label);
    std::io::stdout().flush()?;
    let line = stdin.next_line().await.context("Failed to read from stdin")?;
    Ok(line.map(|l| l.trim().to_string()))
}

fn print_courses(app: &App) -> Result<()> {
    let catalog = app.catalog()?;
    if catalog.is_empty() {
        println!("You are not enrolled in any courses yet.");
        return Ok(());
    }
    if !app.progress_loaded()? {
        println!("Progress could not be loaded from the platform; showing this device only.\n");
    }
    for course in catalog.courses() {
        let stats = app.ledger()?.completion_stats(course);
        println!("{:<24} {:>3}%  {}", course.slug, stats.percentage, course.title);
        for module in &course.modules {
            println!("  {}", module.title);
            for chapter in &module.chapters {
                let done = if app.ledger()?.is_complete(&chapter.slug) { "x" } else { " " };
                let lock = if chapter.is_premium { " [premium]" } else { "" };
                println!("    [{}] {}{}", done, chapter.title, lock);
            }
        }
    }
    Ok(())
}

async fn print_lesson(app: &mut App, slug: &str) -> Result<()> {
    let width = app.config().wrap_width;
    let chapter = app.lesson(slug).await?;
    let title = chapter.title.clone();
    let has_quiz = chapter.quiz.is_some();
    let summary = chapter.summary().unwrap_or_default();

    println!("{}\n{}\n", title, "=".repeat(title.chars().count()));
    println!("{} min read\n", summary.reading_time_minutes);
    for block in summary.plain_text.split("\n\n") {
        println!("{}\n", textwrap::fill(block, width));
    }
    if has_quiz {
        println!("This lesson has a quiz: course-navigator quiz {}", slug);
    }
    if let Some(next) = app.navigation()?.next_chapter(slug) {
        println!("Next: {} ({})", next.title, next.slug);
    }
    Ok(())
}

fn report_sync(slug: &str, newly_completed: bool, sync: &SyncStatus) {
    match sync {
        SyncStatus::Synced if newly_completed => println!("Marked \"{}\" complete", slug),
        SyncStatus::Synced => println!("\"{}\" synced", slug),
        SyncStatus::AlreadyComplete => println!("\"{}\" was already complete", slug),
        SyncStatus::Failed(e) => println!("{}\nIt will be retried next time.", e),
    }
}

async fn run_quiz(app: &mut App, slug: &str, stdin: &mut Lines<BufReader<Stdin>>) -> Result<()> {
    let quiz = app.quiz(slug)?.clone();
    let mut attempt = QuizAttempt::start(&quiz)?;
    println!("{} questions. Type `help` for commands.", attempt.total_questions());

    loop {
        if let Some(question) = attempt.current_question() {
            if let AttemptState::AwaitingSelection { index, selection: None } = attempt.state() {
                println!("\nQ{}. {}", index + 1, question.prompt());
                for (i, option) in question.options().iter().enumerate() {
                    println!("  {}) {}", i + 1, option);
                }
            }
        }

        let line = prompt(stdin, "quiz> ").await?;
        if line.is_none() {
            println!();
        }
        let command = match parse_quiz_line(line.as_deref()) {
            ParseResult::Ok(command) => command,
            ParseResult::UnknownCommand(cmd) => {
                println!("Unknown command: {}", cmd);
                continue;
            }
            ParseResult::MissingArgument(cmd) => {
                println!("{} needs an option number", cmd);
                continue;
            }
            ParseResult::InvalidOption(arg) => {
                println!("Not an option: {}", arg);
                continue;
            }
        };

        match command {
            QuizCommand::Select(option) => {
                if let Err(e) = attempt.select_option(option) {
                    println!("{}", e);
                }
            }
            QuizCommand::Submit => match attempt.submit() {
                Ok(true) => println!("Correct!"),
                Ok(false) => {
                    let correct = attempt
                        .current_question()
                        .map(|q| q.options()[q.correct_option()].clone())
                        .unwrap_or_default();
                    println!("Not quite. The answer was: {}", correct);
                }
                Err(e) => println!("{}", e),
            },
            QuizCommand::Next => match attempt.advance() {
                Ok(Advance::Next(_)) => {}
                Ok(Advance::Finished(_)) => break,
                Err(e) => println!("{}", e),
            },
            QuizCommand::Quit => {
                println!("Quiz abandoned");
                return Ok(());
            }
            QuizCommand::Help => println!("{}", QUIZ_HELP),
            QuizCommand::Nop => {}
        }
    }

    let (score, outcome) = app.finish_quiz(slug, attempt).await?;
    println!("\nScore: {}/{} ({}%)", score.correct, score.total, score.percentage());
    report_sync(slug, outcome.newly_completed, &outcome.sync);
    Ok(())
}
