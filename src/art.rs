/// Boxed banner printed when the REPL starts.
pub fn welcome_message(title: &str) -> String {
    let width = title.len() + 8;
    let border = format!("+{}+", "-".repeat(width));
    let blank = format!("|{}|", " ".repeat(width));
    format!(
        "{border}\n{blank}\n|    {title}    |\n{blank}\n{border}\n  v{version}, type 'help' for commands\n",
        version = env!("CARGO_PKG_VERSION"),
    )
}
