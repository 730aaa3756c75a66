//! Command parsing for the interactive quiz prompt

/// Parsed command from the quiz prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizCommand {
    /// Choose an option (zero-based): `2` or `select 2`
    Select(usize),
    /// Lock in the chosen option: `submit`
    Submit,
    /// Go to the next question: `next`
    Next,
    /// Abandon the attempt: `q` or `quit`
    Quit,
    /// Show help: `help` or `h`
    Help,
    /// Empty line
    Nop,
}

/// Result of parsing a prompt line
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// Successfully parsed command
    Ok(QuizCommand),
    /// Unknown command
    UnknownCommand(String),
    /// Command needs an argument
    MissingArgument(String),
    /// Argument is not an option number
    InvalidOption(String),
}

/// Help text shown by the `help` command
pub const QUIZ_HELP: &str = "\
  <n> | select <n>   choose option n
  submit | s         submit your answer
  next | n           go to the next question
  quit | q           leave the quiz
  help | h           show this help";

/// Parse a prompt line
///
/// Options are numbered from 1 on screen and returned zero-based.
pub fn parse_quiz_command(input: &str) -> ParseResult {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(QuizCommand::Nop);
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        return parse_option(input);
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");

    match cmd.to_lowercase().as_str() {
        "select" | "sel" | "pick" => {
            if args.is_empty() {
                ParseResult::MissingArgument("select".to_string())
            } else {
                parse_option(args)
            }
        }
        "submit" | "s" => ParseResult::Ok(QuizCommand::Submit),
        "next" | "n" => ParseResult::Ok(QuizCommand::Next),
        "quit" | "q" | "exit" => ParseResult::Ok(QuizCommand::Quit),
        "help" | "h" | "?" => ParseResult::Ok(QuizCommand::Help),
        _ => ParseResult::UnknownCommand(cmd.to_string()),
    }
}

/// Parse what the prompt read; closed input (`None`) quits
pub fn parse_quiz_line(line: Option<&str>) -> ParseResult {
    match line {
        Some(input) => parse_quiz_command(input),
        None => ParseResult::Ok(QuizCommand::Quit),
    }
}

fn parse_option(arg: &str) -> ParseResult {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => ParseResult::Ok(QuizCommand::Select(n - 1)),
        _ => ParseResult::InvalidOption(arg.to_string()),
    }
}
