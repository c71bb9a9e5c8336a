use rustyline::{Config, Editor, Result};

pub const PROMPT: &str = "> ";

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .build();
    Editor::with_config(config)
}
