#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCommand {
    Help,
    /// Replace the editor buffer with the contents of a file.
    Code(String),
    Run,
    /// Run the buffer against a JSON file of `{input, expected}` cases.
    Test(String),
    Retry,
    Refresh,
    Show,
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
/code <file>   load the editor buffer from a file
/run           run the editor buffer
/test <file>   run the buffer against a JSON list of {input, expected} cases
/retry         resend the last undelivered message
/refresh       fetch the session again
/show          print the stored snapshot
/quit          leave the page
anything else is sent as a message";

/// Parses a `/command`. Plain text returns `None` and is sent as a message.
pub fn parse_page_command(input: &str) -> Option<PageCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match (command, argument) {
        ("/help", _) => PageCommand::Help,
        ("/code", path) if !path.is_empty() => PageCommand::Code(path.to_string()),
        ("/run", _) => PageCommand::Run,
        ("/test", path) if !path.is_empty() => PageCommand::Test(path.to_string()),
        ("/retry", _) => PageCommand::Retry,
        ("/refresh", _) => PageCommand::Refresh,
        ("/show", _) => PageCommand::Show,
        ("/quit", _) => PageCommand::Quit,
        _ => PageCommand::Unknown(trimmed.to_string()),
    };

    Some(parsed)
}
