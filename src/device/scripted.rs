//! In-memory ELM327 used by the unit tests

use std::collections::{HashMap, VecDeque};

use super::{Result, SerialComm, DEFAULT_BAUD_RATE};

/// Answers each command line from a table of canned replies, echoing the command first the way
/// an ELM327 does with echo enabled
pub(crate) struct ScriptedComm {
    replies: HashMap<String, String>,
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    written: Vec<String>,
    baud_rate: u32,
    answer_baud_rate: u32,
    broken: bool,
}

impl ScriptedComm {
    /// An adapter plugged into a running vehicle that supports PID 0x1F
    pub(crate) fn vehicle() -> Self {
        ScriptedComm {
            replies: HashMap::new(),
            rx: VecDeque::new(),
            tx: Vec::new(),
            written: Vec::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            answer_baud_rate: DEFAULT_BAUD_RATE,
            broken: false,
        }
        .reply("ATZ", "\r\rELM327 v1.5\r\r")
        .reply("ATSP0", "OK\r\r")
        .reply("ATRV", "12.6V\r\r")
        .reply("0100", "SEARCHING...\r41 00 BE 3F A8 13\r\r")
        .reply("ATDPN", "A6\r\r")
        .reply("011F", "41 1F 0E 10\r\r")
        .reply(
            "0902",
            "014\r0: 49 02 01 31 44 34\r1: 47 50 30 30 52 35 35\r2: 42 31 32 33 34 35 36\r\r",
        )
    }

    pub(crate) fn reply(mut self, command: &str, reply: &str) -> Self {
        self.replies.insert(command.to_owned(), reply.to_owned());
        self
    }

    /// Stay silent unless the link runs at `baud_rate`
    pub(crate) fn answering_at(mut self, baud_rate: u32) -> Self {
        self.answer_baud_rate = baud_rate;
        self
    }

    /// Fail every write, like a port whose device went away
    pub(crate) fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// Every command line received so far
    pub(crate) fn written(&self) -> &[String] {
        &self.written
    }

    fn answer(&mut self, line: String) {
        if self.baud_rate == self.answer_baud_rate {
            let reply = if line.starts_with('\x7F') {
                "?\r\r"
            } else {
                self.replies.get(&line).map(String::as_str).unwrap_or("?\r\r")
            };
            self.rx.extend(line.as_bytes());
            self.rx.push_back(b'\r');
            self.rx.extend(reply.as_bytes());
            self.rx.push_back(b'>');
        }
        self.written.push(line);
    }
}

impl SerialComm for ScriptedComm {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.broken {
            return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into());
        }
        for &b in data {
            match b {
                b'\r' => {
                    let line = String::from_utf8_lossy(&self.tx).into_owned();
                    self.tx.clear();
                    self.answer(line);
                }
                b'\n' => {}
                _ => self.tx.push(b),
            }
        }
        Ok(())
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize> {
        let len = data.len().min(self.rx.len());
        for (slot, b) in data.iter_mut().zip(self.rx.drain(..len)) {
            *slot = b;
        }
        Ok(len)
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.baud_rate = baud_rate;
        Ok(())
    }

    fn purge_buffers(&mut self) -> Result<()> {
        self.rx.clear();
        self.tx.clear();
        Ok(())
    }
}
