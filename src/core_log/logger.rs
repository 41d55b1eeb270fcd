use env_logger::{Builder, Env};
use std::io::Write;

/// Initializes the logger with a `[timestamp] [LEVEL] message` format.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Renders a received command for the log, masking password arguments.
pub fn describe_command(verb: &str, arg: &str) -> String {
    if verb.eq_ignore_ascii_case("PASS") && !arg.is_empty() {
        format!("{} ***", verb)
    } else if arg.is_empty() {
        verb.to_string()
    } else {
        format!("{} {}", verb, arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_masked() {
        assert_eq!(describe_command("PASS", "hunter2"), "PASS ***");
        assert_eq!(describe_command("pass", "hunter2"), "pass ***");
        assert_eq!(describe_command("USER", "alice"), "USER alice");
        assert_eq!(describe_command("NOOP", ""), "NOOP");
    }
}
