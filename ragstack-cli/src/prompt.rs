use std::io::{self, BufRead, Write};

use ragstack_orchestrations::prompt::{is_affirmative, parse_menu_answer, OperatorPrompt};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Menu answers accepted before giving up
const MENU_ATTEMPTS: usize = 3;

/// Operator prompt answered on the terminal
pub struct StdinPrompt;

impl StdinPrompt {
    fn read_answer(&self) -> Option<String> {
        off_runtime(|| read_line_from(io::stdin().lock()))
    }
}

/// Run blocking terminal I/O without stalling the runtime's other tasks
/// (the Ctrl-C handler among them)
fn off_runtime<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn read_line_from(mut reader: impl BufRead) -> Option<String> {
    let mut input = String::new();
    match reader.read_line(&mut input) {
        // EOF: nobody is there to answer
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input),
    }
}

impl OperatorPrompt for StdinPrompt {
    fn confirm(&self, question: &str) -> bool {
        println!();
        print!("{} [y/N]: ", question);
        io::stdout().flush().ok();

        self.read_answer().is_some_and(|answer| is_affirmative(&answer))
    }

    fn choose(&self, question: &str, options: &[String]) -> Vec<String> {
        println!();
        println!("{}", question);
        for (i, option) in options.iter().enumerate() {
            println!("  {}) {}", i + 1, option);
        }

        for _ in 0..MENU_ATTEMPTS {
            print!("Enter numbers (e.g. 1,3), 'a' for all, or 'q' to quit: ");
            io::stdout().flush().ok();

            let Some(answer) = self.read_answer() else {
                return Vec::new();
            };
            match parse_menu_answer(&answer, options) {
                Some(picked) => return picked,
                None => println!("Invalid selection '{}'", answer.trim()),
            }
        }
        Vec::new()
    }
}
