use async_trait::async_trait;
use rust_decimal::Decimal;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::Mutex;

use crate::exchange::{DeltaSource, FetchError};
use crate::position::OptionContract;

/// Delta typed in by the trader.
///
/// Re-prompts until a number is entered. End of input is reported as
/// [`FetchError::NoInput`]. A signed put delta such as `-0.4` is accepted
/// and reduced to its magnitude.
pub struct ManualEntry {
    input: Mutex<Input>,
    output: Mutex<Box<dyn Write + Send>>,
}

enum Input {
    /// Process stdin, sharing its buffer with any other prompt in the binary
    Stdin,
    Reader(Box<dyn BufRead + Send>),
}

impl Input {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        match self {
            Input::Stdin => io::stdin().read_line(buf),
            Input::Reader(reader) => reader.read_line(buf),
        }
    }
}

impl ManualEntry {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self {
            input: Mutex::new(Input::Reader(input)),
            output: Mutex::new(output),
        }
    }

    /// Prompt on stdout, read from stdin
    pub fn stdio() -> Self {
        Self {
            input: Mutex::new(Input::Stdin),
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    fn read_delta(&self, contract: &OptionContract) -> Result<Decimal, FetchError> {
        let mut input = self.input.lock().map_err(|_| FetchError::NoInput)?;
        let mut output = self.output.lock().map_err(|_| FetchError::NoInput)?;

        loop {
            write!(output, "Current delta for {} (0.0 - 1.0): ", contract.contract_name())?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(FetchError::NoInput);
            }

            match Decimal::from_str(line.trim()) {
                Ok(delta) => return Ok(delta.abs()),
                Err(_) => writeln!(output, "Invalid number. Try again.")?,
            }
        }
    }
}

#[async_trait]
impl DeltaSource for ManualEntry {
    fn name(&self) -> &str {
        "manual"
    }

    async fn fetch_delta(&self, contract: &OptionContract) -> Result<Decimal, FetchError> {
        self.read_delta(contract)
    }
}
