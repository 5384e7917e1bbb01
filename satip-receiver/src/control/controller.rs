use std::thread;
use std::time::Duration;

use satip_concurrency::StopRx;
use satip_rtsp_protocol::{self as rtsp, CSeq, Method, Request, Response, Transport, Uri};

use crate::error::{Error, Result};
use crate::target::{self, Target};

use super::connection::{Connection, IO_TIMEOUT};
use super::keepalive;
use super::teardown::{TeardownReport, TeardownStep};

/// Pause after TEARDOWN so the server can release the tuner before a
/// follow-up session is set up.
const TEARDOWN_GRACE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    SettingUp,
    Playing,
    Running,
    TornDown,
}

/// What the server told us in its SETUP response.
#[derive(Debug)]
pub struct Setup {
    pub session: rtsp::Session,
    pub transport: Option<Transport>,
    /// The caller asked to stop while the response was being read.
    pub interrupted: bool,
}

/// Owns the control connection and the RTSP session state on it.
pub struct Controller {
    connection: Connection,
    target: Target,
    state: State,
    cseq: CSeq,
    session_id: Option<String>,
    control_uri: Option<Uri>,
    keepalive_interval: Option<Duration>,
}

impl Controller {
    pub fn connect(target: Target) -> Result<Self> {
        let (host, port) = target.address();
        let connection = Connection::connect(host, port)?;
        Ok(Self {
            connection,
            target,
            state: State::Idle,
            cseq: 0,
            session_id: None,
            control_uri: None,
            keepalive_interval: None,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn control_uri(&self) -> Option<&Uri> {
        self.control_uri.as_ref()
    }

    /// `None` when the server disabled session expiry.
    pub fn keepalive_interval(&self) -> Option<Duration> {
        self.keepalive_interval
    }

    /// Sends SETUP for the target URL. While waiting for the response,
    /// `stop` is checked every `slice`. A server that has not answered
    /// within `timeout` fails the setup with [`Error::Timeout`].
    pub fn setup(
        &mut self,
        transport: &Transport,
        stop: &mut StopRx,
        slice: Duration,
        timeout: Duration,
    ) -> Result<Setup> {
        self.state = State::SettingUp;
        let cseq = self.next_cseq();
        let request = Request::new(Method::Setup, self.target.uri.clone())
            .with_cseq(cseq)
            .with_transport(transport);
        self.connection.send(request)?;

        let reply = self
            .connection
            .read_response_interruptible(cseq, stop, slice, timeout)?;
        let response = self.check_response(Method::Setup, cseq, reply.response)?;

        let session = response.session().ok_or(Error::SessionMissing)??;
        let transport = response.transport().transpose()?;

        let stream_id = match response.stream_id() {
            Some(Ok(stream_id)) => Some(stream_id),
            Some(Err(error)) => {
                tracing::warn!(%error, "ignoring stream id");
                None
            }
            None => {
                tracing::warn!("server did not announce a stream id");
                None
            }
        };
        let control_uri = match response.content_base() {
            Some(content_base) => target::control_uri(content_base, stream_id)?,
            None => target::control_uri(&self.target.default_base(), stream_id)?,
        };

        self.keepalive_interval = keepalive::interval(session.timeout);
        self.session_id = Some(session.id.clone());
        tracing::debug!(
            session = %session.id,
            %control_uri,
            keepalive = ?self.keepalive_interval,
            "session set up",
        );
        self.control_uri = Some(control_uri);

        Ok(Setup {
            session,
            transport,
            interrupted: reply.interrupted,
        })
    }

    pub fn play(&mut self) -> Result<()> {
        self.state = State::Playing;
        let (cseq, request) = self.session_request(Method::Play)?;
        self.connection.send(request)?;
        let response = self.connection.read_response_timeout(cseq, IO_TIMEOUT)?;
        self.check_response(Method::Play, cseq, response)?;
        tracing::debug!("playing");
        Ok(())
    }

    /// Marks the handoff to the receiver loop.
    pub fn set_running(&mut self) {
        self.state = State::Running;
    }

    /// Refreshes the session with OPTIONS. A missed keepalive is not fatal:
    /// the server may still keep the session, and if it does not, the
    /// stream dries up and the idle watchdog ends it.
    pub fn keepalive(&mut self) {
        match self.try_keepalive() {
            Ok(()) => tracing::trace!("keepalive acknowledged"),
            Err(error) => tracing::warn!(%error, "keepalive failed"),
        }
    }

    /// Ends the session on the server and releases the control connection.
    /// Every step is attempted regardless of how the previous one went.
    pub fn teardown(mut self) -> TeardownReport {
        let mut report = TeardownReport::default();

        match self.session_request(Method::Teardown) {
            Ok((cseq, request)) => {
                let sent = self.connection.send(request);
                let sent_ok = sent.is_ok();
                report.record(TeardownStep::Request, sent);
                if sent_ok {
                    let response = self
                        .connection
                        .read_response_timeout(cseq, IO_TIMEOUT)
                        .and_then(|response| self.check_response(Method::Teardown, cseq, response))
                        .map(|_| ());
                    report.record(TeardownStep::Response, response);
                }
            }
            Err(_) => tracing::debug!("no session to tear down"),
        }

        report.record(TeardownStep::Drain, self.connection.drain().map(|_| ()));
        if report.performed(TeardownStep::Request) {
            thread::sleep(TEARDOWN_GRACE);
        }
        report.record(TeardownStep::Release, self.connection.shutdown());

        self.state = State::TornDown;
        tracing::info!(
            peer = self.connection.peer(),
            clean = report.is_clean(),
            "session torn down",
        );
        report
    }

    fn try_keepalive(&mut self) -> Result<()> {
        let (cseq, request) = self.session_request(Method::Options)?;
        self.connection.send(request)?;
        let response = self.connection.read_response_timeout(cseq, IO_TIMEOUT)?;
        self.check_response(Method::Options, cseq, response)?;
        Ok(())
    }

    /// Builds a request addressed to the control URL of the current
    /// session.
    fn session_request(&mut self, method: Method) -> Result<(CSeq, Request)> {
        let session_id = self.session_id.clone().ok_or(Error::NotSetUp)?;
        let uri = self
            .control_uri
            .clone()
            .unwrap_or_else(|| self.target.uri.clone());
        let cseq = self.next_cseq();
        let request = Request::new(method, uri)
            .with_cseq(cseq)
            .with_session(&session_id);
        Ok((cseq, request))
    }

    fn next_cseq(&mut self) -> CSeq {
        self.cseq += 1;
        self.cseq
    }

    fn check_response(&self, method: Method, cseq: CSeq, response: Response) -> Result<Response> {
        match response.cseq() {
            Some(received) if received != cseq => {
                tracing::warn!(%method, expected = cseq, received, "cseq mismatch");
            }
            None => tracing::debug!(%method, "response without cseq"),
            _ => {}
        }

        if response.is_ok() {
            Ok(response)
        } else {
            tracing::warn!(%method, status = response.status, reason = %response.reason, "request rejected");
            Err(Error::StatusNotOk {
                method,
                status: response.status,
                reason: response.reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {

    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Duration;

    use satip_concurrency::stop_channel;
    use satip_rtsp_protocol::Transport;

    use crate::target::Target;

    use super::{Controller, Error, State, TeardownStep};

    const SLICE: Duration = Duration::from_millis(50);
    const SETUP_TIMEOUT: Duration = Duration::from_secs(5);

    /// Reads one request head and returns its lines.
    fn read_request(reader: &mut BufReader<TcpStream>) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 {
                return lines;
            }
            let line = line.trim_end().to_string();
            if line.is_empty() {
                return lines;
            }
            lines.push(line);
        }
    }

    fn scripted_server(
        replies: Vec<&'static str>,
    ) -> (Target, thread::JoinHandle<Vec<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            let mut requests = Vec::new();
            for reply in replies {
                let request = read_request(&mut reader);
                if request.is_empty() {
                    break;
                }
                requests.push(request);
                writer.write_all(reply.as_bytes()).unwrap();
            }
            requests
        });
        let target = Target::resolve(&format!("rtsp://127.0.0.1:{port}/?src=1&freq=11494"), None)
            .unwrap();
        (target, handle)
    }

    const SETUP_OK: &str = "RTSP/1.0 200 OK\r\n\
        CSeq: 1\r\n\
        Session: abc123;timeout=12\r\n\
        Content-Base: rtsp://10.0.0.1/\r\n\
        com.ses.streamID: 4\r\n\
        Transport: RTP/AVP;unicast;client_port=9000-9001\r\n\
        \r\n";

    #[test]
    fn setup_play_teardown() {
        let (target, server) = scripted_server(vec![
            SETUP_OK,
            "RTSP/1.0 200 OK\r\nCSeq: 2\r\nSession: abc123\r\n\r\n",
            "RTSP/1.0 200 OK\r\nCSeq: 3\r\n\r\n",
        ]);

        let setup_uri = target.uri.to_string();
        let mut controller = Controller::connect(target).unwrap();
        let (_stop_tx, mut stop_rx) = stop_channel();
        let setup = controller
            .setup(&Transport::unicast(9000), &mut stop_rx, SLICE, SETUP_TIMEOUT)
            .unwrap();
        assert!(!setup.interrupted);
        assert_eq!(setup.session.id, "abc123");
        assert_eq!(controller.session_id(), Some("abc123"));
        assert_eq!(
            controller.control_uri().unwrap().to_string(),
            "rtsp://10.0.0.1/stream=4"
        );
        assert_eq!(controller.keepalive_interval(), Some(Duration::from_secs(7)));

        controller.play().unwrap();
        assert_eq!(controller.state(), State::Playing);

        let report = controller.teardown();
        assert!(report.is_clean(), "{report:?}");

        let requests = server.join().unwrap();
        assert_eq!(requests[0][0], format!("SETUP {setup_uri} RTSP/1.0"));
        assert!(requests[0].contains(&"CSeq: 1".to_string()));
        assert!(requests[0].contains(&"Transport: RTP/AVP;unicast;client_port=9000-9001".to_string()));
        assert_eq!(requests[1][0], "PLAY rtsp://10.0.0.1/stream=4 RTSP/1.0");
        assert!(requests[1].contains(&"CSeq: 2".to_string()));
        assert!(requests[1].contains(&"Session: abc123".to_string()));
        assert_eq!(requests[2][0], "TEARDOWN rtsp://10.0.0.1/stream=4 RTSP/1.0");
        assert!(requests[2].contains(&"CSeq: 3".to_string()));
    }

    #[test]
    fn setup_rejected() {
        let (target, server) = scripted_server(vec!["RTSP/1.0 503 Service Unavailable\r\nCSeq: 1\r\n\r\n"]);
        let mut controller = Controller::connect(target).unwrap();
        let (_stop_tx, mut stop_rx) = stop_channel();
        let error = controller
            .setup(&Transport::multicast(), &mut stop_rx, SLICE, SETUP_TIMEOUT)
            .unwrap_err();
        assert!(matches!(error, Error::StatusNotOk { status: 503, .. }));
        drop(controller);
        server.join().unwrap();
    }

    #[test]
    fn setup_without_session() {
        let (target, server) = scripted_server(vec!["RTSP/1.0 200 OK\r\nCSeq: 1\r\n\r\n"]);
        let mut controller = Controller::connect(target).unwrap();
        let (_stop_tx, mut stop_rx) = stop_channel();
        assert!(matches!(
            controller.setup(&Transport::multicast(), &mut stop_rx, SLICE, SETUP_TIMEOUT),
            Err(Error::SessionMissing)
        ));
        drop(controller);
        server.join().unwrap();
    }

    #[test]
    fn missing_content_base_and_stream_id() {
        let (target, server) = scripted_server(vec![
            "RTSP/1.0 200 OK\r\nCSeq: 1\r\nSession: xyz;timeout=0\r\n\r\n",
        ]);
        let port = target.port;
        let mut controller = Controller::connect(target).unwrap();
        let (_stop_tx, mut stop_rx) = stop_channel();
        controller
            .setup(&Transport::multicast(), &mut stop_rx, SLICE, SETUP_TIMEOUT)
            .unwrap();
        assert_eq!(
            controller.control_uri().unwrap().to_string(),
            format!("rtsp://127.0.0.1:{port}/")
        );
        assert_eq!(controller.keepalive_interval(), None);
        drop(controller);
        server.join().unwrap();
    }

    #[test]
    fn keepalive_failure_is_not_fatal() {
        let (target, server) = scripted_server(vec![
            SETUP_OK,
            "RTSP/1.0 454 Session Not Found\r\nCSeq: 2\r\n\r\n",
            "RTSP/1.0 200 OK\r\nCSeq: 3\r\n\r\n",
        ]);
        let mut controller = Controller::connect(target).unwrap();
        let (_stop_tx, mut stop_rx) = stop_channel();
        controller
            .setup(&Transport::unicast(9000), &mut stop_rx, SLICE, SETUP_TIMEOUT)
            .unwrap();
        controller.keepalive();

        let report = controller.teardown();
        assert!(report.is_clean());
        let requests = server.join().unwrap();
        assert_eq!(requests[1][0], "OPTIONS rtsp://10.0.0.1/stream=4 RTSP/1.0");
        assert!(requests[1].contains(&"Session: abc123".to_string()));
    }

    #[test]
    fn teardown_without_session_skips_request() {
        let (target, server) = scripted_server(vec![]);
        let controller = Controller::connect(target).unwrap();
        let report = controller.teardown();
        assert!(!report.performed(TeardownStep::Request));
        assert!(report.performed(TeardownStep::Drain));
        assert!(report.performed(TeardownStep::Release));
        assert!(server.join().unwrap().is_empty());
    }

    #[test]
    fn teardown_survives_dead_server() {
        let (target, server) = scripted_server(vec![SETUP_OK]);
        let mut controller = Controller::connect(target).unwrap();
        let (_stop_tx, mut stop_rx) = stop_channel();
        controller
            .setup(&Transport::unicast(9000), &mut stop_rx, SLICE, SETUP_TIMEOUT)
            .unwrap();
        server.join().unwrap();

        let report = controller.teardown();
        assert!(!report.is_clean());
        assert!(report.performed(TeardownStep::Release));
    }
}
