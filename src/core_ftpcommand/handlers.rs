use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::core_ftpcommand::ftpcommand::{parse_command_line, FtpCommand};
use crate::core_ftpcommand::VerbOutcome;
use crate::core_network::{pasv, port};
use crate::helpers::send_response;
use crate::session::Session;

/// Parses one complete command line and routes it to its verb handler,
/// gating everything but the login vocabulary behind authentication.
pub async fn dispatch_command(
    writer: &Arc<Mutex<TcpStream>>,
    config: &Arc<Config>,
    session: &Arc<Mutex<Session>>,
    line: &str,
) -> Result<VerbOutcome, std::io::Error> {
    let (verb, arg) = parse_command_line(line);
    if verb.is_empty() {
        send_response(writer, b"500 Syntax error, command unrecognized.\r\n").await?;
        return Ok(VerbOutcome::Continue);
    }

    let command = match FtpCommand::from_str(verb) {
        Some(command) => command,
        None => {
            send_response(writer, b"502 Command not implemented.\r\n").await?;
            session.lock().await.clear_restart_marker();
            return Ok(VerbOutcome::Continue);
        }
    };

    if !session.lock().await.authenticated && !command.allowed_before_login() {
        send_response(writer, b"530 Not logged in.\r\n").await?;
        session.lock().await.clear_restart_marker();
        return Ok(VerbOutcome::Continue);
    }

    let writer = Arc::clone(writer);
    let config = Arc::clone(config);
    let session_arc = Arc::clone(session);
    let arg = arg.to_string();

    use crate::core_ftpcommand as cmds;
    let outcome = match command {
        FtpCommand::USER => cmds::user::handle_user_command(writer, config, session_arc, arg).await?,
        FtpCommand::PASS => cmds::pass::handle_pass_command(writer, config, session_arc, arg).await?,
        FtpCommand::QUIT => cmds::quit::handle_quit_command(writer, config, session_arc, arg).await?,
        FtpCommand::REIN => cmds::rein::handle_rein_command(writer, config, session_arc, arg).await?,
        FtpCommand::FEAT => cmds::feat::handle_feat_command(writer, config, session_arc, arg).await?,
        FtpCommand::OPTS => cmds::opts::handle_opts_command(writer, config, session_arc, arg).await?,
        FtpCommand::NOOP => cmds::noop::handle_noop_command(writer, config, session_arc, arg).await?,
        FtpCommand::SYST => cmds::syst::handle_syst_command(writer, config, session_arc, arg).await?,
        FtpCommand::HELP => cmds::help::handle_help_command(writer, config, session_arc, arg).await?,
        FtpCommand::TYPE => cmds::type_::handle_type_command(writer, config, session_arc, arg).await?,
        FtpCommand::MODE => cmds::mode::handle_mode_command(writer, config, session_arc, arg).await?,
        FtpCommand::STRU => cmds::stru::handle_stru_command(writer, config, session_arc, arg).await?,
        FtpCommand::PWD => cmds::pwd::handle_pwd_command(writer, config, session_arc, arg).await?,
        FtpCommand::CWD => cmds::cwd::handle_cwd_command(writer, config, session_arc, arg).await?,
        FtpCommand::CDUP => cmds::cdup::handle_cdup_command(writer, config, session_arc, arg).await?,
        FtpCommand::PASV => pasv::handle_pasv_command(writer, config, session_arc, arg).await?,
        FtpCommand::PORT => port::handle_port_command(writer, config, session_arc, arg).await?,
        FtpCommand::LIST => cmds::list::handle_list_command(writer, config, session_arc, arg).await?,
        FtpCommand::NLST => cmds::nlst::handle_nlst_command(writer, config, session_arc, arg).await?,
        FtpCommand::RETR => cmds::retr::handle_retr_command(writer, config, session_arc, arg).await?,
        FtpCommand::STOR => cmds::stor::handle_stor_command(writer, config, session_arc, arg).await?,
        FtpCommand::APPE => cmds::appe::handle_appe_command(writer, config, session_arc, arg).await?,
        FtpCommand::REST => cmds::rest::handle_rest_command(writer, config, session_arc, arg).await?,
        FtpCommand::RNFR => cmds::rnfr::handle_rnfr_command(writer, config, session_arc, arg).await?,
        FtpCommand::RNTO => cmds::rnto::handle_rnto_command(writer, config, session_arc, arg).await?,
        FtpCommand::DELE => cmds::dele::handle_dele_command(writer, config, session_arc, arg).await?,
        FtpCommand::MKD => cmds::mkd::handle_mkd_command(writer, config, session_arc, arg).await?,
        FtpCommand::RMD => cmds::rmd::handle_rmd_command(writer, config, session_arc, arg).await?,
        FtpCommand::SIZE => cmds::size::handle_size_command(writer, config, session_arc, arg).await?,
        FtpCommand::MDTM => cmds::mdtm::handle_mdtm_command(writer, config, session_arc, arg).await?,
        FtpCommand::ALLO => cmds::allo::handle_allo_command(writer, config, session_arc, arg).await?,
        FtpCommand::ABOR => cmds::abor::handle_abor_command(writer, config, session_arc, arg).await?,
        FtpCommand::SITE => cmds::site::handle_site_command(writer, config, session_arc, arg).await?,
    };

    // A restart marker only survives until the verb after REST, whether or
    // not that verb consumed it.
    if command != FtpCommand::REST {
        session.lock().await.clear_restart_marker();
    }
    Ok(outcome)
}
