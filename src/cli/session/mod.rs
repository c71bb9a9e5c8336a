pub mod analysis;
pub mod conversation;
pub mod prompt;

use std::io::Write;
use std::process::ExitCode;

use color_print::cwriteln;
use eyre::Result;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::backend_client::{Backend, HealthInputs};
use analysis::AnalysisFlow;
use conversation::ConversationFlow;

const WELCOME_TEXT: &str = "
Things to try
• /sugar 120              Record a blood sugar reading (mg/dL)
• /medication metformin   Record your medications
• /activity 30 min walk   Record activities and meals
• /analyze                Run an AI health analysis on the fields above
• What should I eat after a high reading?

/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
SugarSense CLI

/sugar <value>       Set the blood sugar field (mg/dL)
/medication <text>   Set the medication field
/activity <text>     Set the activities/meals field
/show                Show the current fields and the latest analysis
/analyze             Run a health analysis on the current fields
/clear               Clear the conversation history
/help                Show this help dialogue
/quit                Quit the application

Anything else is sent to the assistant as a chat message.
";

/// One interactive session: the health input fields, the analysis
/// lifecycle, the conversation log and the backend they talk to.
pub struct SessionContext<B: Backend> {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    backend: B,
    inputs: HealthInputs,
    analysis: AnalysisFlow,
    conversation: ConversationFlow,
}

impl<B: Backend> SessionContext<B> {
    pub fn new(
        backend: B,
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            backend,
            inputs: HealthInputs::default(),
            analysis: AnalysisFlow::new(),
            conversation: ConversationFlow::new(),
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        if self.interactive {
            self.print_welcome()?;
        }

        // Non-interactive mode (single message)
        if let Some(input) = self.input.take() {
            self.handle_input(&input).await?;
            return Ok(ExitCode::SUCCESS);
        }

        if self.interactive {
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        if let Some(turn) = self.conversation.turns().first() {
            cwriteln!(self.output, "<cyan>{}</cyan>", turn.content)?;
        }
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let readline = rl.readline(prompt::PROMPT);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        writeln!(self.output, "Error: {}", e)?;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        let trimmed = input.trim();

        match trimmed {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/clear" => {
                self.conversation = ConversationFlow::new();
                writeln!(self.output, "Conversation cleared.")?;
            }
            "/show" => {
                self.show_status()?;
            }
            "/analyze" => {
                self.run_analysis().await?;
            }
            _ => {
                if let Some(value) = command_arg(trimmed, "/sugar") {
                    self.inputs.sugar = value.to_string();
                    writeln!(self.output, "Blood sugar set to \"{}\".", self.inputs.sugar)?;
                } else if let Some(value) = command_arg(trimmed, "/medication") {
                    self.inputs.medication = value.to_string();
                    writeln!(self.output, "Medication set to \"{}\".", self.inputs.medication)?;
                } else if let Some(value) = command_arg(trimmed, "/activity") {
                    self.inputs.activity = value.to_string();
                    writeln!(self.output, "Activities set to \"{}\".", self.inputs.activity)?;
                } else if trimmed.starts_with('/') {
                    writeln!(
                        self.output,
                        "Unknown command: {}. Type /help for the command list.",
                        trimmed
                    )?;
                } else {
                    self.send_message(input).await?;
                }
            }
        }

        Ok(())
    }

    /// One analysis round trip: validate, issue, await settlement, render.
    /// Validation failure is reported directly and never touches the
    /// result field.
    async fn run_analysis(&mut self) -> Result<()> {
        let ticket = match self.analysis.begin(&self.inputs) {
            Ok(ticket) => ticket,
            Err(e) => {
                writeln!(self.output, "{}", e)?;
                return Ok(());
            }
        };

        debug!("issuing analysis request");
        let outcome = self.backend.analyze(ticket.inputs()).await;
        self.analysis.settle(ticket, outcome);

        if let Some(result) = self.analysis.result() {
            cwriteln!(self.output, "<bold><green>AI Health Analysis</green></bold>")?;
            writeln!(self.output, "{}", result)?;
        }

        Ok(())
    }

    /// One chat round trip. The user turn is appended before the request
    /// is awaited; the settlement appends the assistant turn, which is
    /// then rendered.
    async fn send_message(&mut self, text: &str) -> Result<()> {
        let ticket = match self.conversation.submit(text) {
            Some(ticket) => ticket,
            // Blank input, or the previous reply is still pending.
            None => return Ok(()),
        };

        debug!("issuing chat request");
        let outcome = self.backend.chat(ticket.message()).await;
        self.conversation.settle(ticket, outcome);

        if let Some(turn) = self.conversation.turns().last() {
            writeln!(self.output, "{}", turn.content)?;
        }

        Ok(())
    }

    fn show_status(&mut self) -> Result<()> {
        writeln!(self.output, "Blood sugar: {}", display_or_unset(&self.inputs.sugar))?;
        writeln!(self.output, "Medication:  {}", display_or_unset(&self.inputs.medication))?;
        writeln!(self.output, "Activities:  {}", display_or_unset(&self.inputs.activity))?;

        match self.analysis.result() {
            Some(result) => {
                cwriteln!(self.output, "<bold><green>AI Health Analysis</green></bold>")?;
                writeln!(self.output, "{}", result)?;
            }
            None => {
                writeln!(self.output, "No analysis yet. Fill in a field and run /analyze.")?;
            }
        }

        Ok(())
    }
}

/// Split the value off a field-setting command. Returns None when `input`
/// is some other command that merely shares the prefix.
fn command_arg<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(name)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix(' ')
    }
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}
