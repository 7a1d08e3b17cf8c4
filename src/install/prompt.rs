//! Yes/no confirmation used by the uninstaller

use log::warn;

pub trait Confirmation {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Asks on the terminal; defaults to "no"
#[derive(Debug, Default)]
pub struct InteractivePrompt;

impl Confirmation for InteractivePrompt {
    fn confirm(&mut self, question: &str) -> bool {
        match inquire::Confirm::new(question)
            .with_default(false)
            .with_help_message("Other applications may rely on this service")
            .prompt()
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!("No answer to '{question}' ({e}); assuming no");
                false
            }
        }
    }
}

/// Pre-decided answer from the command line
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmation for FixedAnswer {
    fn confirm(&mut self, question: &str) -> bool {
        log::info!("{question} {}", if self.0 { "yes" } else { "no" });
        self.0
    }
}
