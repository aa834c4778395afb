use std::fs;
use std::io::{BufRead, ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chatlog_db::Store;
use tracing::{debug, warn};

use crate::config::Config;
use crate::present;

/// Sender name used when input ends at the "Enter your name" prompt.
const UNKNOWN_SENDER: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    AddUser,
    GetUser,
    GetAllUsers,
    Add,
    GetMessages,
    Exit,
    Empty,
    Invalid,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line {
            "" => Self::Empty,
            "help" => Self::Help,
            "adduser" => Self::AddUser,
            "getuser" => Self::GetUser,
            "getallusers" => Self::GetAllUsers,
            "add" => Self::Add,
            "getmessages" => Self::GetMessages,
            "exit" => Self::Exit,
            _ => Self::Invalid,
        }
    }
}

/// Interactive loop: read a command, prompt for its fields, run it against
/// the store and print the outcome.
pub struct Session<'a, R, W> {
    store: &'a mut Store,
    input: R,
    output: W,
    help_path: PathBuf,
    quiet_unknown_sender: bool,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(store: &'a mut Store, input: R, output: W, config: &Config) -> Self {
        Self {
            store,
            input,
            output,
            help_path: config.help_path.clone(),
            quiet_unknown_sender: config.quiet_unknown_sender,
        }
    }

    /// Runs until `exit` or end of input; both disconnect the store.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let Some(line) = self.prompt("What would you like to do?\n")? else {
                debug!("Input closed, exiting");
                self.dispatch(Command::Exit)?;
                return Ok(());
            };

            let command = Command::parse(&line);
            self.dispatch(command)?;
            if command == Command::Exit {
                return Ok(());
            }
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Empty => {}
            Command::Help => self.help()?,
            Command::AddUser => {
                let username = self.prompt("Enter the username: ")?.unwrap_or_default();
                let outcome = self.store.users().add(&username)?;
                self.say(&present::user_added(&outcome))?;
            }
            Command::GetUser => {
                let username = self.prompt("Enter the username: ")?.unwrap_or_default();
                let user = self.store.users().get(&username)?;
                self.say(&present::user_record(&username, user.as_ref()))?;
            }
            Command::GetAllUsers => {
                let usernames = self.store.users().list_all()?;
                self.say(&present::user_list(&usernames))?;
            }
            Command::Add => {
                let sender = self
                    .prompt("Enter your name: ")?
                    .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
                let content = self.prompt("Enter your message: ")?.unwrap_or_default();
                let outcome = self.store.messages().add(&sender, &content)?;
                if let Some(text) = present::message_added(&outcome, self.quiet_unknown_sender) {
                    self.say(&text)?;
                }
            }
            Command::GetMessages => {
                let lines = self.store.messages().list_all()?;
                self.say(&present::history(&lines))?;
            }
            Command::Exit => {
                let transition = self.store.disconnect()?;
                self.say(&transition.to_string())?;
            }
            Command::Invalid => self.say(present::INVALID_COMMAND)?,
        }
        Ok(())
    }

    fn help(&mut self) -> Result<()> {
        match fs::read_to_string(&self.help_path) {
            Ok(text) => self.say(text.trim_end()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Help file {} missing", self.help_path.display());
                let missing = format!("File not found: {}", self.help_path.display());
                self.say(&missing)?;
                self.say(present::BUILTIN_HELP)
            }
            Err(e) => Err(e)
                .with_context(|| format!("failed to read {}", self.help_path.display())),
        }
    }

    /// Print `text` without a newline and read one line back. `None` at end
    /// of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    use crate::config::BackendKind;

    fn config_in(dir: &TempDir, backend: BackendKind) -> Config {
        Config {
            backend,
            db_path: dir.path().join("chat.db"),
            history_path: dir.path().join("chat_history.txt"),
            users_path: dir.path().join("users.txt"),
            help_path: dir.path().join("help.txt"),
            quiet_unknown_sender: false,
        }
    }

    fn run_script(config: &Config, script: &str) -> String {
        let mut store = config.store();
        store.connect().unwrap();

        let mut output = Vec::new();
        Session::new(&mut store, Cursor::new(script.to_string()), &mut output, config)
            .run()
            .unwrap();
        assert!(!store.is_connected());
        String::from_utf8(output).unwrap()
    }

    /// Output lines with prompts removed.
    fn replies(output: &str) -> Vec<String> {
        let mut text = output.replace("What would you like to do?\n", "");
        for prompt in ["Enter the username: ", "Enter your name: ", "Enter your message: "] {
            text = text.replace(prompt, "");
        }
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("adduser"), Command::AddUser);
        assert_eq!(Command::parse("getmessages"), Command::GetMessages);
        assert_eq!(Command::parse("  help"), Command::Invalid);
        assert_eq!(Command::parse("exit "), Command::Invalid);
        assert_eq!(Command::parse(" "), Command::Invalid);
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("drop table"), Command::Invalid);
    }

    #[test]
    fn test_user_commands() {
        for backend in [BackendKind::Sqlite, BackendKind::File] {
            let dir = TempDir::new().unwrap();
            let config = config_in(&dir, backend);
            let out = run_script(
                &config,
                "getallusers\nadduser\nalice\nadduser\nalice\ngetuser\nalice\ngetuser\nbob\ngetallusers\nexit\n",
            );
            assert_eq!(
                replies(&out),
                vec![
                    "No users found.",
                    "User 'alice' added.",
                    "User 'alice' already exists.",
                    "ID: 1, Username: alice",
                    "User 'bob' not found.",
                    "Users:",
                    "- alice",
                    "Disconnecting from database...",
                ]
            );
        }
    }

    #[test]
    fn test_message_commands() {
        for backend in [BackendKind::Sqlite, BackendKind::File] {
            let dir = TempDir::new().unwrap();
            let config = config_in(&dir, backend);
            let out = run_script(
                &config,
                "getmessages\nadduser\nalice\nadd\nbob\nhi\nadd\nalice\nhello\ngetmessages\nexit\n",
            );
            let lines = replies(&out);
            assert_eq!(lines[0], "No messages found.");
            assert_eq!(lines[1], "User 'alice' added.");
            assert_eq!(lines[2], "User 'bob' not found. Message not stored.");
            assert!(lines[3].starts_with('[') && lines[3].ends_with("] alice: hello"));
            assert_eq!(lines[4], "Chat history:");
            assert_eq!(lines[5], lines[3]);
            assert_eq!(lines[6], "Disconnecting from database...");
        }
    }

    #[test]
    fn test_quiet_unknown_sender() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir, BackendKind::Sqlite);
        config.quiet_unknown_sender = true;
        let out = run_script(&config, "add\nbob\nhi\ngetmessages\nexit\n");
        assert_eq!(
            replies(&out),
            vec!["No messages found.", "Disconnecting from database..."]
        );
    }

    #[test]
    fn test_empty_and_invalid_input() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, BackendKind::Sqlite);
        let out = run_script(&config, "\n\nfoo\nexit\n");
        assert_eq!(replies(&out), vec!["Invalid command", "Disconnecting from database..."]);
    }

    #[test]
    fn test_end_of_input_exits() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, BackendKind::File);
        let out = run_script(&config, "adduser\n");
        assert_eq!(
            replies(&out),
            vec![
                "Username must not be empty or contain control characters.",
                "Disconnecting from database...",
            ]
        );
    }

    #[test]
    fn test_help() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, BackendKind::Sqlite);

        let out = run_script(&config, "help\nexit\n");
        let lines = replies(&out);
        assert_eq!(lines[0], format!("File not found: {}", config.help_path.display()));
        assert_eq!(lines[1], "Commands:");

        fs::write(&config.help_path, "custom help\n").unwrap();
        let out = run_script(&config, "help\nexit\n");
        assert_eq!(replies(&out), vec!["custom help", "Disconnecting from database..."]);
    }
}
