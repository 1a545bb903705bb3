//! The command loop: stdin lines in, mount requests out.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use mountlink_bus::SimulatedBus;
use mountlink_core::{CoreError, Flow, Session};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// How long the dispatcher gets to drain the final bus events after detach.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::resolve(global)?;
    let bus = Arc::new(SimulatedBus::start(cfg.to_simulator_config()));
    let session = Session::new(cfg.to_session_config(), bus);

    session.connect_server().map_err(|err| match err {
        CoreError::Bus(source) => CliError::ConnectionFailed {
            server: session.config().server.to_string(),
            source,
        },
        other => other.into(),
    })?;
    session.attach().await?;

    let stdin = BufReader::new(tokio::io::stdin());
    drive(&session, stdin, &mut std::io::stdout()).await
}

/// Feed every line of `input` through the session until `exit` or end of
/// input, then wait for the bus event task to wind down.
///
/// Lines are decoded lossily. A failed write of one operator line is logged
/// and the loop carries on. A read error leaves the bus before it is returned.
pub async fn drive<R>(session: &Session, mut input: R, out: &mut impl Write) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();

    loop {
        raw.clear();
        match input.read_until(b'\n', &mut raw).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "reading commands failed, leaving the bus");
                leave(session).await;
                return Err(e.into());
            }
        }

        let line = String::from_utf8_lossy(&raw);
        match session.execute_line(&line, out) {
            Ok(Flow::Exit) => {
                session.finish(DRAIN_GRACE).await;
                return Ok(());
            }
            Ok(Flow::Continue) => {}
            Err(e) => warn!(error = %e, "could not write command output"),
        }
    }

    info!("command input closed, leaving the bus");
    leave(session).await;
    debug!("session finished");
    Ok(())
}

/// Detach without disconnecting the device and drain the last events.
async fn leave(session: &Session) {
    if let Err(e) = session.close() {
        warn!(error = %e, "detaching at end of input failed");
    }
    session.finish(DRAIN_GRACE).await;
}
