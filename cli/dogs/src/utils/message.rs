use std::fmt::Display;

/// Write a message to stderr.
///
/// Results go to stdout, everything addressed to the user goes here.
fn print_message(v: impl Display) {
    #[cfg(test)]
    history::push_message(format!("{v}"));

    eprintln!("{v}");
}

pub(crate) fn error(v: impl Display) {
    print_message(std::format_args!("ERROR: {v}"));
}
pub(crate) fn updated(v: impl Display) {
    print_message(std::format_args!("✅ {v}"));
}
/// double width character, add an additional space for alignment
pub(crate) fn warning(v: impl Display) {
    print_message(std::format_args!("⚠️  {v}"));
}
