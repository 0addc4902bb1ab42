//! Parsing of the single-line commands typed during a session.

/// A command typed at the session prompt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// Toggle a set, 1-based as displayed
    Toggle(usize),
    Next,
    Previous,
    /// Extend rest by the given seconds, or the configured step
    Extend(Option<u32>),
    Skip,
    Exit,
    Status,
    Help,
    Empty,
}

pub const HELP: &str = "\
  t <n>      toggle set n
  n          next exercise (finishes the session on the last one)
  p          previous exercise
  + [secs]   extend the current rest
  s          skip the current rest
  ?          show this help
  .          show the current exercise again
  q          quit (asks for confirmation)";

pub fn parse_input(line: &str) -> Result<Input, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(Input::Empty);
    };
    let arg = parts.next();

    if parts.next().is_some() {
        return Err(format!("Too many arguments in '{}'", line.trim()));
    }

    // Allow "+15" as well as "+ 15"
    if let Some(secs) = head.strip_prefix('+') {
        let secs = if secs.is_empty() { arg } else { Some(secs) };
        return match secs {
            None => Ok(Input::Extend(None)),
            Some(s) => s
                .parse::<u32>()
                .map(|n| Input::Extend(Some(n)))
                .map_err(|_| format!("Not a number of seconds: '{}'", s)),
        };
    }

    let input = match (head.to_lowercase().as_str(), arg) {
        ("t" | "toggle", Some(n)) => {
            let set = n
                .parse::<usize>()
                .map_err(|_| format!("Not a set number: '{}'", n))?;
            if set == 0 {
                return Err("Set numbers start at 1".into());
            }
            Input::Toggle(set)
        }
        ("t" | "toggle", None) => return Err("Which set? Try 't 1'".into()),
        ("n" | "next", None) => Input::Next,
        ("p" | "prev" | "previous", None) => Input::Previous,
        ("s" | "skip", None) => Input::Skip,
        ("q" | "quit" | "exit", None) => Input::Exit,
        (".", None) => Input::Status,
        ("?" | "h" | "help", None) => Input::Help,
        _ => return Err(format!("Unknown command '{}' (? for help)", line.trim())),
    };

    Ok(input)
}

/// Whether an answer to the exit prompt means yes
pub fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
