/*
 *  display/mock.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Mock serial channel, delay and I2C bus for testing without hardware
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, Operation, SevenBitAddress};

use crate::display::channel::SerialChannel;

/// Mock serial channel
///
/// Records every write call separately so tests can check chunking, and
/// serves reads from a scripted queue. An empty queue reports `TimedOut`,
/// the way a non-blocking serial port does.
#[derive(Debug, Clone, Default)]
pub struct MockChannel {
    state: Arc<Mutex<MockChannelState>>,
}

/// Shared state for the mock channel (inspectable from tests)
#[derive(Debug, Default)]
pub struct MockChannelState {
    /// One entry per `write` call
    pub writes: Vec<Vec<u8>>,

    /// Bytes still to be returned by `read`
    pub rx: VecDeque<u8>,

    /// Number of times flush_buffers() was called
    pub flush_count: usize,

    /// Simulate failures (for error testing)
    pub simulate_write_failure: bool,
    pub simulate_read_failure: bool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockChannelState>> {
        Arc::clone(&self.state)
    }

    /// Queue bytes to be read back
    pub fn push_rx(&self, bytes: &[u8]) {
        self.state.lock().unwrap().rx.extend(bytes.iter().copied());
    }

    /// All write calls so far
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Writes decoded as text (for the ASCII family)
    pub fn written_lines(&self) -> Vec<String> {
        self.writes()
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes.len()
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().unwrap().flush_count
    }

    /// Forget recorded writes and flushes
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.writes.clear();
        state.flush_count = 0;
    }
}

impl Read for MockChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if state.simulate_read_failure {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated read failure"));
        }
        if state.rx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }
        let mut n = 0;
        while n < buf.len() {
            match state.rx.pop_front() {
                Some(b) => { buf[n] = b; n += 1; }
                None => break,
            }
        }
        Ok(n)
    }
}

impl Write for MockChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if state.simulate_write_failure {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated write failure"));
        }
        state.writes.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialChannel for MockChannel {
    fn flush_buffers(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().flush_count += 1;
        Ok(())
    }
}

/// Delay that records instead of sleeping
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    log: Arc<Mutex<Vec<u32>>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested delays in milliseconds, in call order
    pub fn delays_ms(&self) -> Vec<u32> {
        self.log.lock().unwrap().clone()
    }

    pub fn total_ms(&self) -> u64 {
        self.log.lock().unwrap().iter().map(|&ms| ms as u64).sum()
    }

    pub fn reset(&self) {
        self.log.lock().unwrap().clear();
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.lock().unwrap().push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.lock().unwrap().push(ms);
    }
}

/// Error raised by [`MockI2c`] when failure is simulated
#[derive(Debug, Clone, Copy)]
pub struct MockI2cError;

impl i2c::Error for MockI2cError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// I2C bus that records register writes as `(address, bytes)`
#[derive(Debug, Clone, Default)]
pub struct MockI2c {
    log: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.log.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl ErrorType for MockI2c {
    type Error = MockI2cError;
}

impl I2c<SevenBitAddress> for MockI2c {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if *self.fail.lock().unwrap() {
            return Err(MockI2cError);
        }
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    self.log.lock().unwrap().push((address, bytes.to_vec()));
                }
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}
