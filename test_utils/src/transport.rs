use smartcard_kvac::transport::{Exchange, Transport, TransportError};

/// Forwards every exchange to another transport and records the frames. Can corrupt a response or make an
/// exchange fail, to play a faulty reader or a card under attack.
pub struct InterceptingTransport<T> {
    pub inner: T,
    pub commands: Vec<Vec<u8>>,
    pub responses: Vec<Vec<u8>>,
    /// Exchange index, byte index in the response frame and mask xored into that byte
    pub tamper: Option<(usize, usize, u8)>,
    /// Exchange index and the error returned instead of forwarding
    pub fail: Option<(usize, TransportError)>,
}

impl<T: Transport> InterceptingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            commands: Vec::new(),
            responses: Vec::new(),
            tamper: None,
            fail: None,
        }
    }

    pub fn tamper(mut self, exchange: usize, byte: usize, mask: u8) -> Self {
        self.tamper = Some((exchange, byte, mask));
        self
    }

    pub fn fail(mut self, exchange: usize, error: TransportError) -> Self {
        self.fail = Some((exchange, error));
        self
    }
}

impl<T: Transport> Transport for InterceptingTransport<T> {
    fn transmit(
        &mut self,
        command: &[u8],
        response: &mut [u8],
    ) -> Result<Exchange, TransportError> {
        let index = self.commands.len();
        self.commands.push(command.to_vec());
        if let Some((i, error)) = &self.fail {
            if *i == index {
                return Err(error.clone());
            }
        }
        let exchange = self.inner.transmit(command, response)?;
        if let Some((i, byte, mask)) = self.tamper {
            if i == index && byte < exchange.len {
                response[byte] ^= mask;
            }
        }
        self.responses.push(response[..exchange.len].to_vec());
        Ok(exchange)
    }
}
