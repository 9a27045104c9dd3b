//! Host side of the ADB connection handshake
//!
//! ```text
//! host                                device
//!  | CNXN(version, max_payload) "host::" |
//!  |------------------------------------>|
//!  |                 AUTH(TOKEN) <token> |
//!  |<------------------------------------|
//!  | AUTH(SIGNATURE) <signed token>      |
//!  |------------------------------------>|
//!  |       CNXN "device::..." or AUTH    |
//!  |<------------------------------------|
//! ```
//!
//! Every message goes out as two bulk writes, header then payload. Incoming
//! headers are decoded and classified before their declared payload is
//! read, and anything other than the expected message ends the session.

mod state;

pub use state::{DeviceBanner, SessionOutcome, SessionState};

use crate::error::{HandshakeStage, HostError, Result};
use crate::usb::classifier::AdbEndpoints;
use crate::usb::transfers::BulkTransport;
use common::TokenSigner;
use protocol::{HEADER_SIZE, HOST_BANNER, MAX_PAYLOAD, MessageHeader, MessageKind, ProtocolError};
use tracing::debug;

/// One handshake with one device
pub struct Handshake<'a, T, S: ?Sized> {
    transport: T,
    endpoints: AdbEndpoints,
    signer: &'a S,
    signature: Vec<u8>,
    state: SessionState,
}

impl<'a, T, S> Handshake<'a, T, S>
where
    T: BulkTransport,
    S: TokenSigner + ?Sized,
{
    pub fn new(transport: T, endpoints: AdbEndpoints, signer: &'a S) -> Self {
        Self {
            transport,
            endpoints,
            signer,
            signature: Vec::new(),
            state: SessionState::AwaitingConnect,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Perform the next transition
    ///
    /// Does nothing once a terminal state has been reached.
    pub fn step(&mut self) -> &SessionState {
        let next = match self.state {
            SessionState::AwaitingConnect => self
                .send_connect()
                .map(|()| SessionState::AwaitingAuthToken),
            SessionState::AwaitingAuthToken => self
                .answer_token()
                .map(|()| SessionState::AwaitingAuthResult),
            SessionState::AwaitingAuthResult => {
                self.await_result().map(SessionState::Authenticated)
            }
            SessionState::Authenticated(_) | SessionState::Failed(_) => return &self.state,
        };

        let next = next.unwrap_or_else(SessionState::Failed);
        debug!("Handshake: {} -> {}", self.state, next);
        self.state = next;
        &self.state
    }

    /// Drive the handshake to a terminal state
    pub fn run(mut self) -> SessionOutcome {
        while !self.state.is_terminal() {
            self.step();
        }

        match self.state {
            SessionState::Authenticated(banner) => SessionOutcome::Authenticated(banner),
            SessionState::Failed(err) => SessionOutcome::Failed(err),
            _ => unreachable!(),
        }
    }

    fn send_connect(&mut self) -> Result<()> {
        let header = MessageHeader::connect(HOST_BANNER);
        self.send(HandshakeStage::SendConnect, &header, HOST_BANNER)
    }

    fn answer_token(&mut self) -> Result<()> {
        let stage = HandshakeStage::ReadToken;
        let (header, kind) = self.read_header(stage)?;
        if kind != MessageKind::AuthToken {
            return Err(HostError::Protocol {
                stage,
                source: ProtocolError::UnexpectedMessage {
                    expected: "AUTH(TOKEN)",
                    actual: kind.to_string(),
                },
            });
        }

        let token = self.read_payload(stage, &header)?;
        debug!("Received {} byte AUTH token", token.len());

        self.signature = self
            .signer
            .sign_token(&token)
            .map_err(HostError::SigningFailure)?;
        Ok(())
    }

    fn await_result(&mut self) -> Result<DeviceBanner> {
        let signature = std::mem::take(&mut self.signature);
        let header = MessageHeader::auth_signature(&signature);
        self.send(HandshakeStage::SendSignature, &header, &signature)?;

        let stage = HandshakeStage::ReadAuthResult;
        let (header, kind) = self.read_header(stage)?;
        match kind {
            MessageKind::Connect { .. } => {
                let payload = self.read_payload(stage, &header)?;
                Ok(DeviceBanner::parse(&payload))
            }
            kind if kind.is_auth() => Err(HostError::ProtocolRejection(kind)),
            kind => Err(HostError::Protocol {
                stage,
                source: ProtocolError::UnexpectedMessage {
                    expected: "CNXN or AUTH",
                    actual: kind.to_string(),
                },
            }),
        }
    }

    /// Header and payload as two separate bulk writes
    fn send(&mut self, stage: HandshakeStage, header: &MessageHeader, payload: &[u8]) -> Result<()> {
        self.write_all(stage, &header.encode())?;
        if !payload.is_empty() {
            self.write_all(stage, payload)?;
        }
        Ok(())
    }

    fn write_all(&mut self, stage: HandshakeStage, data: &[u8]) -> Result<()> {
        let sent = self
            .transport
            .write_bulk(self.endpoints.out_endpoint, data)
            .map_err(|kind| HostError::TransportFailure { stage, kind })?;
        if sent != data.len() {
            return Err(HostError::ShortWrite {
                stage,
                sent,
                expected: data.len(),
            });
        }
        Ok(())
    }

    fn read_header(&mut self, stage: HandshakeStage) -> Result<(MessageHeader, MessageKind)> {
        let mut buf = [0u8; HEADER_SIZE];
        let received = self
            .transport
            .read_bulk(self.endpoints.in_endpoint, &mut buf)
            .map_err(|kind| HostError::TransportFailure { stage, kind })?;

        let header = MessageHeader::decode(&buf[..received])
            .map_err(|source| HostError::Protocol { stage, source })?;
        let kind = MessageKind::from_header(&header);
        debug!("Received {} ({} byte payload)", kind, header.data_length);
        Ok((header, kind))
    }

    /// Read the payload `header` announces, after bounding its length
    fn read_payload(&mut self, stage: HandshakeStage, header: &MessageHeader) -> Result<Vec<u8>> {
        let len = header
            .payload_len(MAX_PAYLOAD)
            .map_err(|source| HostError::Protocol { stage, source })?;

        let mut payload = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let received = self
                .transport
                .read_bulk(self.endpoints.in_endpoint, &mut payload[filled..])
                .map_err(|kind| HostError::TransportFailure { stage, kind })?;
            if received == 0 {
                break;
            }
            filled += received;
        }
        payload.truncate(filled);

        header
            .verify_payload(&payload)
            .map_err(|source| HostError::Protocol { stage, source })?;
        Ok(payload)
    }
}

/// Run a complete handshake over `transport`
pub fn run_handshake<T, S>(transport: T, endpoints: AdbEndpoints, signer: &S) -> SessionOutcome
where
    T: BulkTransport,
    S: TokenSigner + ?Sized,
{
    Handshake::new(transport, endpoints, signer).run()
}
