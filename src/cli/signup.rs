use std::io::Write;

use color_print::cstr;
use eyre::Result;

const SIGNUP_TEXT: &str = cstr!(
    "
<bold>Hi, I am ArogyaMind</bold>

  <rgb(255,140,0)>[ Sign up to chat ]</>

  <dim>SIGN UP OR LOGIN TO CHAT</dim>
"
);

/// Which screen the client shows first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Signup,
    Chat,
}

/// Prints the signup screen.
pub fn render(output: &mut dyn Write) -> Result<()> {
    writeln!(output, "{}", SIGNUP_TEXT)?;
    writeln!(output, "Press Enter to continue to the chat.")?;
    output.flush()?;
    Ok(())
}
