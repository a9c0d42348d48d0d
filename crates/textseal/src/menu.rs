//! Interactive front end: reads commands and fields line by line and
//! dispatches to the [`Sealer`].
//!
//! The menu owns the [`KeyRing`]; keys never leave it and are never printed.
//! Users refer to them by key id.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use common::protocol::{Command, DecryptResponse, EncryptResponse, ErrorResponse};
use common::SealError;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::config::OutputFormat;
use crate::crypto::{CiphertextBlob, NONCE_LEN, TAG_LEN};
use crate::keys::{EntropySource, KeyHandle, KeyRing, OsEntropy};
use crate::session::Sealer;

/// Longest accepted menu choice or key id line, in bytes.
const SHORT_FIELD_LIMIT: usize = 64;

/// Slack for a trailing `\r\n` on top of a field limit.
const LINE_ENDING_SLACK: usize = 2;

/// Failure of one menu step.
#[derive(Debug, Error)]
enum StepError {
    /// Reported to the user; the loop carries on unless it is fatal.
    #[error(transparent)]
    Seal(#[from] SealError),

    /// The terminal itself failed; the loop stops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What the loop does after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// The menu loop over an input and an output stream.
pub struct Menu<R, W, E = OsEntropy> {
    sealer: Sealer<E>,
    ring: KeyRing,
    format: OutputFormat,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write, E: EntropySource> Menu<R, W, E> {
    pub fn new(sealer: Sealer<E>, format: OutputFormat, input: R, output: W) -> Self {
        Self {
            sealer,
            ring: KeyRing::new(),
            format,
            input,
            output,
        }
    }

    /// Number of keys currently held for this run.
    pub fn keys_held(&self) -> usize {
        self.ring.len()
    }

    /// Run until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the terminal fails, or if a
    /// fatal error (no entropy) makes continuing impossible.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => {
                    info!(keys_held = self.ring.len(), "menu finished");
                    return Ok(());
                }
                Err(StepError::Seal(e)) => {
                    self.report(&e).context("failed to write to terminal")?;
                    if e.is_fatal() {
                        return Err(e).context("cannot continue without secure randomness");
                    }
                }
                Err(StepError::Io(e)) => return Err(e).context("terminal I/O failed"),
            }
        }
    }

    fn step(&mut self) -> Result<Flow, StepError> {
        self.show_menu()?;
        let Some(choice) = self.read_field("Enter your choice: ", SHORT_FIELD_LIMIT)? else {
            return Ok(Flow::Stop);
        };
        match Command::parse(&choice) {
            Some(Command::Encrypt) => self.encrypt(),
            Some(Command::Decrypt) => self.decrypt(),
            Some(Command::Exit) => {
                if self.format == OutputFormat::Text {
                    writeln!(self.output, "Exiting the program. Goodbye!")?;
                }
                Ok(Flow::Stop)
            }
            None => {
                debug!("invalid menu choice");
                self.emit(
                    "Invalid choice. Please try again.",
                    &ErrorResponse::new("invalid_choice", "Invalid choice. Please try again."),
                )?;
                Ok(Flow::Continue)
            }
        }
    }

    fn encrypt(&mut self) -> Result<Flow, StepError> {
        let limit = self.sealer.max_plaintext_len();
        let Some(mut text) = self.read_field("Enter text to encrypt: ", limit)? else {
            return Ok(Flow::Stop);
        };
        let reuse_prompt = "Key id to reuse (blank for a new key): ";
        let key_id = match self.read_field(reuse_prompt, SHORT_FIELD_LIMIT) {
            Ok(Some(id)) => id,
            other => {
                text.zeroize();
                return other.map(|_| Flow::Stop);
            }
        };

        let sealed = self.seal_line(&text, &key_id);
        text.zeroize();
        let (blob, handle) = sealed?;

        info!(key_id = %handle, keys_held = self.ring.len(), "text encrypted");
        let blob_hex = blob.to_hex();
        self.emit(
            format_args!("Encrypted text (hex): {blob_hex}\nKey id: {handle}"),
            &EncryptResponse {
                blob: blob_hex.clone(),
                key_id: handle.to_string(),
            },
        )?;
        Ok(Flow::Continue)
    }

    fn seal_line(
        &mut self,
        text: &str,
        key_id: &str,
    ) -> Result<(CiphertextBlob, KeyHandle), SealError> {
        if key_id.trim().is_empty() {
            let sealed = self.sealer.encrypt_text(text)?;
            let handle = self.ring.insert(sealed.key);
            return Ok((sealed.blob, handle));
        }
        let handle: KeyHandle = key_id.parse()?;
        let key = self.ring.get_mut(&handle)?;
        let blob = self.sealer.encrypt_text_with(key, text)?;
        Ok((blob, handle))
    }

    fn decrypt(&mut self) -> Result<Flow, StepError> {
        let hex_limit = 2 * (NONCE_LEN + self.sealer.max_plaintext_len() + TAG_LEN);
        let blob_prompt = "Enter hex-encoded text to decrypt: ";
        let Some(blob_hex) = self.read_field(blob_prompt, hex_limit)? else {
            return Ok(Flow::Stop);
        };
        let Some(key_id) = self.read_field("Enter key id: ", SHORT_FIELD_LIMIT)? else {
            return Ok(Flow::Stop);
        };

        let blob = self.sealer.decode_blob(&blob_hex)?;
        let handle: KeyHandle = key_id.parse()?;
        let key = self.ring.get(&handle)?;
        let mut plaintext = self.sealer.decrypt_text(&blob, key.key())?;

        info!(key_id = %handle, "text decrypted");
        let written = self.emit(
            format_args!("Decrypted text: {plaintext}"),
            &DecryptResponse {
                plaintext: plaintext.clone(),
            },
        );
        plaintext.zeroize();
        written?;
        Ok(Flow::Continue)
    }

    fn show_menu(&mut self) -> io::Result<()> {
        if self.format != OutputFormat::Text {
            return Ok(());
        }
        writeln!(self.output)?;
        writeln!(self.output, "=== AES Encryption/Decryption Program ===")?;
        writeln!(self.output, "1. Encrypt text")?;
        writeln!(self.output, "2. Decrypt text")?;
        writeln!(self.output, "3. Exit")
    }

    /// Prompt (text mode only) and read one field of at most `limit` bytes.
    ///
    /// Returns `Ok(None)` at end of input. An overlong line is consumed in
    /// full and rejected; it is never truncated into a shorter value.
    fn read_field(&mut self, prompt: &str, limit: usize) -> Result<Option<String>, StepError> {
        if self.format == OutputFormat::Text {
            write!(self.output, "{prompt}")?;
            self.output.flush()?;
        }

        let mut line = Vec::new();
        let mut overlong = false;
        let mut seen_any = false;
        loop {
            let available = self.input.fill_buf()?;
            if available.is_empty() {
                break;
            }
            seen_any = true;
            let (used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };
            if !overlong {
                if line.len() + used > limit + LINE_ENDING_SLACK {
                    overlong = true;
                    line.zeroize();
                    line.clear();
                } else {
                    line.extend_from_slice(&available[..used]);
                }
            }
            self.input.consume(used);
            if done {
                break;
            }
        }

        if !seen_any {
            return Ok(None);
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if overlong || line.len() > limit {
            line.zeroize();
            warn!(limit, "input line over limit rejected");
            let msg = format!("input line exceeds {limit} bytes");
            return Err(SealError::MalformedInput(msg).into());
        }
        match String::from_utf8(line) {
            Ok(s) => Ok(Some(s)),
            Err(e) => {
                e.into_bytes().zeroize();
                Err(SealError::MalformedInput("input is not UTF-8 text".into()).into())
            }
        }
    }

    fn report(&mut self, err: &SealError) -> io::Result<()> {
        warn!(code = err.code(), fatal = err.is_fatal(), "operation failed");
        self.emit(err.user_message(), &ErrorResponse::from(err))
    }

    /// Write one result: `text` in text mode, `record` as a JSON line otherwise.
    fn emit<T: Serialize>(&mut self, text: impl std::fmt::Display, record: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.output, "{text}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.output, record)?;
                writeln!(self.output)?;
            }
        }
        self.output.flush()
    }
}
