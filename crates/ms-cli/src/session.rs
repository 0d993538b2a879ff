use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use ms_core::ScriptError;
use ms_runtime::OutputDispatcher;

use crate::map_cli_session_io;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default sink when no session is connected: display lines on stdout,
/// network fragments on stderr. Keeping the two on separate file descriptors
/// preserves the channel split through shell redirection.
pub(crate) struct ConsoleDispatcher;

impl OutputDispatcher for ConsoleDispatcher {
    fn display(&mut self, text: &str) {
        println!("{}", text);
    }

    fn transmit(&mut self, text: &str) {
        eprintln!("{}", text);
    }
}

/// Routes the network channel to a live TCP session, one CRLF-terminated
/// line per send. Display output stays on the local stdout. The dispatcher
/// itself is infallible; the first write failure is parked and surfaced by
/// the CLI once the run finishes.
#[derive(Debug)]
pub(crate) struct SessionDispatcher {
    stream: TcpStream,
    write_error: Option<std::io::Error>,
}

impl SessionDispatcher {
    pub(crate) fn connect(address: &str) -> Result<Self, ScriptError> {
        let mut addresses = address.to_socket_addrs().map_err(map_cli_session_io)?;
        let resolved = addresses.next().ok_or_else(|| {
            ScriptError::new(
                "CLI_SESSION_ADDR",
                format!("\"{}\" did not resolve to an address.", address),
            )
        })?;
        let stream =
            TcpStream::connect_timeout(&resolved, CONNECT_TIMEOUT).map_err(map_cli_session_io)?;
        Ok(Self {
            stream,
            write_error: None,
        })
    }

    pub(crate) fn take_error(&mut self) -> Option<ScriptError> {
        self.write_error.take().map(map_cli_session_io)
    }
}

impl OutputDispatcher for SessionDispatcher {
    fn display(&mut self, text: &str) {
        println!("{}", text);
    }

    fn transmit(&mut self, text: &str) {
        if self.write_error.is_some() {
            return;
        }
        if let Err(error) = write!(self.stream, "{}\r\n", text) {
            self.write_error = Some(error);
        }
    }
}

#[cfg(test)]
mod session_tests {
    use std::io::Read;
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn transmit_writes_crlf_terminated_lines_to_the_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("addr").to_string();

        let handle = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().expect("accept");
            let mut received = String::new();
            socket.read_to_string(&mut received).expect("read");
            received
        });

        let mut dispatcher = SessionDispatcher::connect(&address).expect("connect");
        dispatcher.transmit("warp 5");
        dispatcher.transmit("look");
        assert!(dispatcher.take_error().is_none());
        drop(dispatcher);

        let received = handle.join().expect("join");
        assert_eq!(received, "warp 5\r\nlook\r\n");
    }

    #[test]
    fn connect_to_an_unresolvable_address_fails() {
        let error = SessionDispatcher::connect("not-an-address").expect_err("connect should fail");
        assert_eq!(error.code, "CLI_SESSION_IO");
    }
}
