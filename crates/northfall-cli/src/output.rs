use northfall_core::job::SocketDataKind;
use northfall_core::log::{LineKind, LogLine};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Plain-terminal rendering of one log line.
pub fn render_line(line: &LogLine) -> String {
    match line.kind {
        LineKind::Command => format!("$ {}", line.text),
        LineKind::Error => format!("! {}", line.text),
        LineKind::Socket(SocketDataKind::Stderr) => format!("[stderr] {}", line.text),
        _ => line.text.clone(),
    }
}

pub fn print_lines(lines: &[LogLine]) {
    for line in lines {
        println!("{}", render_line(line));
    }
}
