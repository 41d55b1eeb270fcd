use crate::config::Config;
use crate::core_ftpcommand::VerbOutcome;
use crate::helpers::send_response;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

pub async fn handle_help_command(
    writer: Arc<Mutex<TcpStream>>,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<VerbOutcome, std::io::Error> {
    send_response(
        &writer,
        b"214-The following commands are recognized.\r\n\
          ABOR ALLO APPE CDUP CWD DELE FEAT HELP LIST MDTM MKD MODE\r\n\
          NLST NOOP OPTS PASS PASV PORT PWD QUIT REIN REST RETR RMD\r\n\
          RNFR RNTO SITE SIZE STOR STRU SYST TYPE USER\r\n\
          214 Help OK.\r\n",
    )
    .await?;
    Ok(VerbOutcome::Continue)
}
