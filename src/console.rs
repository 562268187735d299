// The operator console: numbered menus over a line-based terminal.
//
// The console is generic over its input and output so that whole sessions can
// be replayed in tests. End of input behaves like choosing Exit.

mod admin;
mod commands;
mod voter;

use std::io::{BufRead, Write};

use log::{debug, info, warn};
use snafu::{prelude::*, Snafu};

use smart_voting::{ElectionError, ElectionRepository, ElectionResult, ElectionSystem};

use self::commands::{MainCommand, MenuCommand};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppError {
    #[snafu(display("{source}"))]
    Election { source: ElectionError },

    #[snafu(display("Terminal failure: {source}"))]
    Terminal { source: std::io::Error },

    #[snafu(display("End of input"))]
    EndOfInput {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

pub struct Console<R: ElectionRepository, I: BufRead, O: Write> {
    system: ElectionSystem<R>,
    input: I,
    output: O,
    clear_screen: bool,
}

impl<R: ElectionRepository, I: BufRead, O: Write> Console<R, I, O> {
    pub fn new(system: ElectionSystem<R>, input: I, output: O, clear_screen: bool) -> Self {
        Console {
            system,
            input,
            output,
            clear_screen,
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (ElectionSystem<R>, O) {
        (self.system, self.output)
    }

    /// Runs the main menu until the operator exits or the input ends.
    pub fn run(&mut self) -> AppResult<()> {
        match self.main_menu() {
            Err(AppError::EndOfInput {}) => {
                info!("run: input closed, leaving");
                Ok(())
            }
            res => res,
        }
    }

    fn main_menu(&mut self) -> AppResult<()> {
        loop {
            self.clear()?;
            self.title("SMART VOTING SYSTEM")?;
            self.print_menu::<MainCommand>()?;
            let choice = self.prompt("\nEnter your choice: ")?;
            match MainCommand::parse(&choice) {
                Some(MainCommand::AdminLogin) => self.admin_login()?,
                Some(MainCommand::VoterLogin) => self.voter_login()?,
                Some(MainCommand::Exit) => {
                    self.say("Exiting... Goodbye!")?;
                    return Ok(());
                }
                None => self.invalid_choice(&choice)?,
            }
        }
    }

    // ********* Terminal helpers **********

    fn prompt(&mut self, label: &str) -> AppResult<String> {
        write!(self.output, "{}", label).context(TerminalSnafu)?;
        self.output.flush().context(TerminalSnafu)?;
        let mut line = String::new();
        let read = self.input.read_line(&mut line).context(TerminalSnafu)?;
        ensure!(read > 0, EndOfInputSnafu);
        Ok(line.trim_end_matches(&['\n', '\r'][..]).to_string())
    }

    fn say(&mut self, line: &str) -> AppResult<()> {
        writeln!(self.output, "{}", line).context(TerminalSnafu)
    }

    fn say_lines(&mut self, lines: &[String]) -> AppResult<()> {
        for line in lines {
            self.say(line)?;
        }
        Ok(())
    }

    fn title(&mut self, title: &str) -> AppResult<()> {
        let rule = "=".repeat(40);
        self.say_lines(&[rule.clone(), format!("{:^40}", title), rule])
    }

    fn print_menu<C: MenuCommand>(&mut self) -> AppResult<()> {
        for (idx, cmd) in C::ALL.iter().enumerate() {
            self.say(&format!("{}. {}", idx + 1, cmd.label()))?;
        }
        Ok(())
    }

    fn clear(&mut self) -> AppResult<()> {
        if self.clear_screen {
            write!(self.output, "{}", CLEAR_SCREEN).context(TerminalSnafu)?;
        }
        Ok(())
    }

    fn pause(&mut self) -> AppResult<()> {
        self.prompt("\nPress Enter to continue...")?;
        Ok(())
    }

    fn confirm(&mut self, question: &str) -> AppResult<bool> {
        let answer = self.prompt(&format!("{} (y/n): ", question))?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }

    fn invalid_choice(&mut self, choice: &str) -> AppResult<()> {
        debug!("invalid_choice: {:?}", choice);
        self.say("Invalid choice!")?;
        self.pause()
    }

    /// Storage errors end the session. Any other error is shown to the
    /// operator, who is then sent back to the current menu.
    fn recover<T>(&mut self, res: ElectionResult<T>) -> AppResult<Option<T>> {
        match res {
            Ok(x) => Ok(Some(x)),
            Err(e) if e.is_fatal() => Err(e).context(ElectionSnafu),
            Err(e) => {
                warn!("recover: {}", e);
                self.say(&format!("Error: {}", e))?;
                self.pause()?;
                Ok(None)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use smart_voting::*;

    use super::test_helpers::*;
    use super::*;

    #[test]
    fn exit_and_end_of_input() {
        let (_, out) = replay(system(), &["3"]);
        assert!(out.contains("SMART VOTING SYSTEM"));
        assert!(out.contains("1. Admin Login"));
        assert!(out.contains("Goodbye!"));

        // No Exit: the input simply ends.
        let (_, out) = replay(system(), &["7", ""]);
        assert!(out.contains("Invalid choice!"));
        assert!(!out.contains("Goodbye!"));
    }

    #[test]
    fn screen_is_cleared_unless_disabled() {
        let mut console = Console::new(
            system(),
            Cursor::new(b"3\n".to_vec()),
            Vec::new(),
            true,
        );
        console.run().unwrap();
        let (_, out) = console.into_parts();
        assert!(String::from_utf8(out).unwrap().starts_with(CLEAR_SCREEN));

        let (_, out) = replay(system(), &["3"]);
        assert!(!out.contains(CLEAR_SCREEN));
    }

    #[test]
    fn fatal_errors_end_the_session() {
        let mut console: TestConsole =
            Console::new(system(), Cursor::new(Vec::new()), Vec::new(), false);
        let fatal = ElectionError::StorageFailure {
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            path: "election_data.json".into(),
        };
        assert!(matches!(
            console.recover::<()>(Err(fatal)),
            Err(AppError::Election { .. })
        ));
    }

    #[test]
    fn recoverable_errors_are_shown() {
        let mut console: TestConsole =
            Console::new(system(), Cursor::new(b"\n".to_vec()), Vec::new(), false);
        let res = console
            .recover::<()>(Err(ElectionError::InvalidCredentials {}))
            .unwrap();
        assert!(res.is_none());
        let (_, out) = console.into_parts();
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Error: Invalid credentials"));
    }
}
