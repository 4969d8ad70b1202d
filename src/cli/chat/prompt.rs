use rustyline::{Config, Editor, Result};

/// Prompt showing the selected conversation, if any.
pub fn generate_prompt(conversation_name: Option<&str>) -> String {
    match conversation_name {
        Some(name) => format!("[{}] > ", name),
        None => "> ".to_string(),
    }
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .build();
    Editor::with_config(config)
}
