use std::io::{self, Write};

/// Writes each line to stdout and, when given, mirrors it into `capture`.
///
/// A broken stdout is logged and ignored so that the capture still receives
/// the full text.
pub fn print_lines<S: AsRef<str>>(
    lines: &[S],
    capture: &mut Option<&mut dyn Write>,
) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    for line in lines {
        let line = line.as_ref();
        if let Err(e) = writeln!(stdout, "{line}") {
            tracing::warn!(error = %e, "failed to write to stdout");
        }
        if let Some(w) = capture.as_deref_mut() {
            writeln!(w, "{line}")?;
        }
    }
    Ok(())
}
