pub mod command;
pub mod context;
pub mod conversation_state;
pub mod input_source;
pub mod prompt;
pub mod render;
pub mod speech;
pub mod submission;

use std::future;
use std::io::Write;
use std::process::ExitCode;

use color_print::cstr;
use command::{Command, SelectTarget};
use context::AppState;
use conversation_state::ConversationId;
use input_source::SpeechCapability;
use eyre::Result;
use prompt::generate_prompt;
use rustyline::error::ReadlineError;
use speech::{SpeechOutcome, VoiceInput};
use tracing::{debug, info, warn};

use crate::chat_client::CompletionBackend;
use crate::cli::signup::{self, View};
use crate::config::Config;

const WELCOME_TEXT: &str = cstr!(
    "
<bold>Hi, I'm ArogyaMind.</bold> Ask me anything.

/new          Start a new conversation
/history      Show the chat history
/voice        Speak your question
/help         Show the help dialogue
/quit         Quit the application
"
);

const HELP_TEXT: &str = cstr!(
    "
<bold>ArogyaMind Chat</bold>

/new              Start a new conversation
/history          Show the chat history
/select <<n|id>    Switch to a conversation from the history
/show             Show the current conversation
/voice            Speak your question (Ctrl-C stops listening)
/theme            Toggle the dark and light palette
/sidebar          Toggle showing the history after every reply
/help             Show this help dialogue
/quit             Quit the application
"
);

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    view: View,
    state: AppState,
    backend: Box<dyn CompletionBackend>,
    voice: VoiceInput,
    user_name: String,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        view: View,
        config: &Config,
        backend: Box<dyn CompletionBackend>,
        capability: SpeechCapability,
    ) -> Self {
        Self {
            output,
            input,
            view,
            state: AppState::new(config.theme),
            backend,
            voice: VoiceInput::new(capability),
            user_name: config.user_name.clone(),
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Single query mode
        if let Some(input) = self.input.take() {
            self.submit_query(&input).await?;
            return Ok(ExitCode::SUCCESS);
        }

        let mut rl = prompt::rl()?;

        if self.view == View::Signup {
            signup::render(self.output.as_mut())?;
            match rl.readline("") {
                Ok(_) => {}
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    return Ok(ExitCode::SUCCESS);
                }
                Err(e) => return Err(e.into()),
            }
            self.view = View::Chat;
        }

        self.print_welcome()?;
        if !self.voice.is_available() {
            self.notice("Voice input is unavailable in this environment.")?;
        }

        loop {
            let current_name = self.state.store.current_conversation().map(|c| c.name());
            let prompt_text = generate_prompt(current_name);
            // Text left over from a voice session stays editable.
            let pending = self.state.pending_query().to_string();
            let readline = if pending.is_empty() {
                rl.readline(&prompt_text)
            } else {
                rl.readline_with_initial(&prompt_text, (pending.as_str(), ""))
            };

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        self.state.clear_pending_query();
                        continue;
                    }
                    rl.add_history_entry(line.as_str());

                    if !self.handle_input(&line).await? {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    self.state.clear_pending_query();
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        render::greeting(self.output.as_mut(), self.state.theme(), &self.user_name)?;
        Ok(())
    }

    /// Handles one line of input. Returns `false` when the session should end.
    async fn handle_input(&mut self, line: &str) -> Result<bool> {
        self.state.set_pending_query(line);

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                self.state.clear_pending_query();
                self.notice(&e.to_string())?;
                return Ok(true);
            }
        };
        debug!(?command, "Handling input");

        if !matches!(command, Command::Ask(_)) {
            self.state.clear_pending_query();
        }

        match command {
            Command::Ask(query) => self.submit_query(&query).await?,
            Command::New => {
                self.state.start_new();
                render::greeting(self.output.as_mut(), self.state.theme(), &self.user_name)?;
            }
            Command::History => {
                render::sidebar(self.output.as_mut(), self.state.theme(), &self.state.store)?;
            }
            Command::Select(target) => self.select(target)?,
            Command::Show => self.show_conversation()?,
            Command::Voice => self.run_voice_input().await?,
            Command::Theme => {
                let theme = self.state.toggle_theme();
                self.notice(&format!("Switched to the {} palette.", theme))?;
            }
            Command::Sidebar => {
                let open = self.state.toggle_sidebar();
                let text = if open {
                    "Chat history is shown after every reply."
                } else {
                    "Chat history is hidden."
                };
                self.notice(text)?;
            }
            Command::Help => writeln!(self.output, "{}", HELP_TEXT)?,
            Command::Quit => return Ok(false),
        }

        Ok(true)
    }

    async fn submit_query(&mut self, query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Ok(());
        }
        if self.state.is_loading() {
            self.notice("Please wait for the current reply.")?;
            return Ok(());
        }

        render::thinking(self.output.as_mut(), self.state.theme())?;

        let submitted = submission::submit_until(
            &mut self.state,
            self.backend.as_ref(),
            query,
            interrupted(),
        )
        .await;
        let Some(id) = submitted else {
            return Ok(());
        };

        self.print_reply(&id)?;
        if self.state.sidebar_open() {
            render::sidebar(self.output.as_mut(), self.state.theme(), &self.state.store)?;
        }
        Ok(())
    }

    fn print_reply(&mut self, id: &ConversationId) -> Result<()> {
        let theme = self.state.theme();
        if let Some(reply) = self.state.store.get(id).and_then(|c| c.messages().last()) {
            render::message(self.output.as_mut(), theme, reply)?;
        }
        Ok(())
    }

    fn select(&mut self, target: SelectTarget) -> Result<()> {
        let id = match target {
            SelectTarget::Position(position) => {
                let found = self.state.store.nth(position).map(|c| c.id().clone());
                match found {
                    Some(id) => id,
                    None => {
                        self.notice(&format!("There is no conversation number {}.", position))?;
                        return Ok(());
                    }
                }
            }
            SelectTarget::Id(id) => ConversationId::new(id),
        };

        self.state.select_conversation(id);
        self.show_conversation()
    }

    fn show_conversation(&mut self) -> Result<()> {
        render::conversation(
            self.output.as_mut(),
            self.state.theme(),
            &self.state.store,
            &self.user_name,
        )
    }

    async fn run_voice_input(&mut self) -> Result<()> {
        if let Err(e) = self.voice.start(&mut self.state) {
            return self.notice(&e.to_string());
        }
        info!("Listening for voice input");
        render::transcript(&mut self.output, self.state.theme(), "Listening...")?;

        loop {
            let next = tokio::select! {
                outcome = self.voice.next_outcome(&mut self.state) => Some(outcome),
                _ = interrupted() => None,
            };

            match next {
                None => {
                    self.voice.stop();
                    writeln!(self.output)?;
                    self.notice("Stopped listening.")?;
                    break;
                }
                Some(None) => {
                    self.voice.stop();
                    writeln!(self.output)?;
                    break;
                }
                Some(Some(outcome)) => match outcome {
                    SpeechOutcome::Updated(text) => {
                        render::transcript(&mut self.output, self.state.theme(), &text)?;
                    }
                    SpeechOutcome::Submit(text) => {
                        writeln!(self.output)?;
                        self.submit_query(&text).await?;
                        break;
                    }
                    SpeechOutcome::Ended => {
                        writeln!(self.output)?;
                        self.notice("No speech was captured.")?;
                        break;
                    }
                    SpeechOutcome::Failed(error) => {
                        writeln!(self.output)?;
                        self.notice(&format!("Speech recognition error: {}", error))?;
                        break;
                    }
                    SpeechOutcome::Ignored => {}
                },
            }
        }

        Ok(())
    }

    fn notice(&mut self, text: &str) -> Result<()> {
        render::notice(self.output.as_mut(), self.state.theme(), text)
    }
}

/// Resolves on Ctrl-C. Never resolves when the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        future::pending::<()>().await;
    }
}
