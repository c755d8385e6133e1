use log::debug;
use std::net::TcpListener;

/// Ask the operating system for a free ephemeral port on the loopback interface.
///
/// We bind a transient listener to port `0`, read back the port the OS picked and drop the
/// listener straight away so that the engine runtime can bind it.
///
/// This is not a reservation: another process may grab the port between the moment we release
/// it and the moment the engine binds it. The engine then fails to start with
/// [`EngineStartError::Bind`](crate::EngineStartError::Bind) and the caller can retry with a
/// fresh builder.
pub(crate) fn allocate_port(host: &str) -> Result<u16, std::io::Error> {
    let listener = TcpListener::bind((host, 0))?;
    let port = listener.local_addr()?.port();
    debug!("Allocated port {} on {}.", port, host);
    Ok(port)
}
