/// Splits a command line at the first space into a verb and the argument
/// tail. Trailing spaces are trimmed from the verb only; the tail is kept
/// verbatim so file names containing spaces survive.
pub fn parse_command_line(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((verb, arg)) => {
            // A run of spaces with nothing behind it is verb padding, not an
            // argument.
            let arg = if arg.bytes().all(|b| b == b' ') { "" } else { arg };
            (verb, arg)
        }
        None => (line.trim_end_matches(' '), ""),
    }
}

#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    REIN,
    FEAT,
    OPTS,
    NOOP,
    SYST,
    HELP,
    TYPE,
    MODE,
    STRU,
    PWD,
    CWD,
    CDUP,
    PASV,
    PORT,
    LIST,
    NLST,
    RETR,
    STOR,
    APPE,
    REST,
    RNFR,
    RNTO,
    DELE,
    MKD,
    RMD,
    SIZE,
    MDTM,
    ALLO,
    ABOR,
    SITE,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "REIN" => Some(FtpCommand::REIN),
            "FEAT" => Some(FtpCommand::FEAT),
            "OPTS" => Some(FtpCommand::OPTS),
            "NOOP" => Some(FtpCommand::NOOP),
            "SYST" => Some(FtpCommand::SYST),
            "HELP" => Some(FtpCommand::HELP),
            "TYPE" => Some(FtpCommand::TYPE),
            "MODE" => Some(FtpCommand::MODE),
            "STRU" => Some(FtpCommand::STRU),
            "PWD" => Some(FtpCommand::PWD),
            "XPWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "CDUP" => Some(FtpCommand::CDUP),
            "PASV" => Some(FtpCommand::PASV),
            "PORT" => Some(FtpCommand::PORT),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "APPE" => Some(FtpCommand::APPE),
            "REST" => Some(FtpCommand::REST),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "DELE" => Some(FtpCommand::DELE),
            "MKD" => Some(FtpCommand::MKD),
            "XMKD" => Some(FtpCommand::MKD),
            "RMD" => Some(FtpCommand::RMD),
            "XRMD" => Some(FtpCommand::RMD),
            "SIZE" => Some(FtpCommand::SIZE),
            "MDTM" => Some(FtpCommand::MDTM),
            "ALLO" => Some(FtpCommand::ALLO),
            "ABOR" => Some(FtpCommand::ABOR),
            "SITE" => Some(FtpCommand::SITE),
            _ => None,
        }
    }

    /// Verbs honored before PASS succeeds; everything else replies 530.
    pub fn allowed_before_login(&self) -> bool {
        matches!(
            self,
            FtpCommand::USER
                | FtpCommand::PASS
                | FtpCommand::QUIT
                | FtpCommand::REIN
                | FtpCommand::FEAT
                | FtpCommand::OPTS
                | FtpCommand::NOOP
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(FtpCommand::from_str("retr"), Some(FtpCommand::RETR));
        assert_eq!(FtpCommand::from_str("ReTr"), Some(FtpCommand::RETR));
        assert_eq!(FtpCommand::from_str("RETR"), Some(FtpCommand::RETR));
        assert_eq!(FtpCommand::from_str("XYZZY"), None);
    }

    #[test]
    fn x_aliases_map_to_base_verbs() {
        assert_eq!(FtpCommand::from_str("XPWD"), Some(FtpCommand::PWD));
        assert_eq!(FtpCommand::from_str("xmkd"), Some(FtpCommand::MKD));
        assert_eq!(FtpCommand::from_str("XRMD"), Some(FtpCommand::RMD));
    }

    #[test]
    fn line_splits_at_first_space_only() {
        assert_eq!(parse_command_line("RETR a file.txt"), ("RETR", "a file.txt"));
        assert_eq!(parse_command_line("NOOP"), ("NOOP", ""));
        assert_eq!(parse_command_line("NOOP   "), ("NOOP", ""));
        assert_eq!(parse_command_line("CWD  spaced"), ("CWD", " spaced"));
        assert_eq!(parse_command_line(""), ("", ""));
    }

    #[test]
    fn pre_login_vocabulary_is_closed() {
        assert!(FtpCommand::USER.allowed_before_login());
        assert!(FtpCommand::FEAT.allowed_before_login());
        assert!(!FtpCommand::LIST.allowed_before_login());
        assert!(!FtpCommand::SYST.allowed_before_login());
        assert!(!FtpCommand::RETR.allowed_before_login());
    }
}
