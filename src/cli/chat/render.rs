use std::io::Write;

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::{style, Color, Stylize};
use crossterm::terminal::{Clear, ClearType};
use eyre::Result;

use super::context::Theme;
use super::conversation_state::{ConversationStore, Message, Role};

struct Palette {
    user: Color,
    bot: Color,
    accent: Color,
    muted: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            user: Color::Rgb { r: 16, g: 163, b: 127 },
            bot: Color::Rgb { r: 220, g: 220, b: 230 },
            accent: Color::Rgb { r: 255, g: 140, b: 0 },
            muted: Color::DarkGrey,
        },
        Theme::Light => Palette {
            user: Color::DarkGreen,
            bot: Color::Black,
            accent: Color::DarkYellow,
            muted: Color::Grey,
        },
    }
}

pub fn greeting(out: &mut dyn Write, theme: Theme, user_name: &str) -> Result<()> {
    let p = palette(theme);
    let text = format!("Greetings, {}", user_name);
    writeln!(out, "{}", style(text).with(p.accent).bold())?;
    Ok(())
}

pub fn message(out: &mut dyn Write, theme: Theme, message: &Message) -> Result<()> {
    let p = palette(theme);
    match message.role {
        Role::User => writeln!(out, "{} {}", "You:".with(p.user).bold(), message.content)?,
        Role::Bot => writeln!(
            out,
            "{} {}",
            "Bot:".with(p.accent).bold(),
            style(&message.content).with(p.bot)
        )?,
    }
    Ok(())
}

/// The selected conversation, or the greeting when nothing is selected.
pub fn conversation(
    out: &mut dyn Write,
    theme: Theme,
    store: &ConversationStore,
    user_name: &str,
) -> Result<()> {
    let messages = store.current_messages();
    if messages.is_empty() {
        return greeting(out, theme, user_name);
    }
    for m in messages {
        message(out, theme, m)?;
    }
    Ok(())
}

pub fn sidebar(out: &mut dyn Write, theme: Theme, store: &ConversationStore) -> Result<()> {
    let p = palette(theme);
    writeln!(out, "{}", "Chat History".with(p.accent).bold())?;

    if store.is_empty() {
        writeln!(out, "  {}", "No chats yet".with(p.muted))?;
        return Ok(());
    }

    let current = store.current_id();
    for (i, conversation) in store.conversations().iter().enumerate() {
        let marker = if Some(conversation.id()) == current { "*" } else { " " };
        writeln!(
            out,
            "{} {:>2}. {}",
            marker.with(p.accent),
            i + 1,
            conversation.name()
        )?;
    }
    Ok(())
}

pub fn thinking(out: &mut dyn Write, theme: Theme) -> Result<()> {
    writeln!(out, "{}", "AI is thinking...".with(palette(theme).muted))?;
    out.flush()?;
    Ok(())
}

pub fn notice(out: &mut dyn Write, theme: Theme, text: &str) -> Result<()> {
    writeln!(out, "{}", style(text).with(palette(theme).accent))?;
    Ok(())
}

/// Redraws the transcript on the current line.
pub fn transcript<W: Write>(out: &mut W, theme: Theme, text: &str) -> Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    write!(out, "{} {}", "🎤".with(palette(theme).accent), text)?;
    out.flush()?;
    Ok(())
}
