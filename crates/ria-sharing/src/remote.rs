// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Out-of-process shared-code analysis over newline-delimited JSON.
//!
//! A worker reads one [`SharedCodeRequest`] per line and answers each with
//! one [`SharedCodeResponse`] line. The first request of a worker session is
//! `initialize` carrying the [`SharedCodeServiceParameters`]; the worker
//! builds its service from them and answers `ready`.

use crate::error::SharingError;
use crate::key::CodeMemberKey;
use crate::params::SharedCodeServiceParameters;
use crate::service::{SharedCodeLookup, SharedCodeService};
use crate::share_kind::CodeMemberShareKind;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// Messages sent to a worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SharedCodeRequest {
    /// Build the worker's service from a parameter bag.
    Initialize {
        /// Service inputs.
        parameters: SharedCodeServiceParameters,
    },
    /// Ask for a share kind.
    ShareKind {
        /// Element in question.
        key: CodeMemberKey,
    },
    /// End the session.
    Shutdown,
}

/// Messages sent back by a worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SharedCodeResponse {
    /// The service is built and accepting queries.
    Ready,
    /// Answer to [`SharedCodeRequest::ShareKind`].
    ShareKind {
        /// Computed share kind.
        kind: CodeMemberShareKind,
    },
    /// The request could not be served.
    Error {
        /// Human-readable reason.
        message: String,
    },
    /// Acknowledges [`SharedCodeRequest::Shutdown`].
    Goodbye,
}

fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<(), SharingError> {
    serde_json::to_writer(&mut *writer, message)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn read_message<R: BufRead, T: DeserializeOwned>(
    reader: &mut R,
) -> Result<Option<T>, SharingError> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return Ok(Some(serde_json::from_str(line.trim())?));
        }
    }
}

/// Answers requests with `service` until EOF or `shutdown`.
///
/// Malformed lines are answered with an error response and the session
/// continues. Returns the number of share-kind requests served.
pub fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    service: &dyn SharedCodeLookup,
) -> Result<usize, SharingError>
where
    R: BufRead,
    W: Write,
{
    let mut served = 0;
    loop {
        let request = match read_message::<_, SharedCodeRequest>(&mut reader) {
            Ok(Some(request)) => request,
            Ok(None) => break,
            Err(SharingError::Serde(err)) => {
                write_message(
                    &mut writer,
                    &SharedCodeResponse::Error {
                        message: format!("malformed request: {err}"),
                    },
                )?;
                continue;
            }
            Err(err) => return Err(err),
        };
        let response = match request {
            SharedCodeRequest::ShareKind { key } => {
                served += 1;
                SharedCodeResponse::ShareKind {
                    kind: service.share_kind(&key),
                }
            }
            SharedCodeRequest::Initialize { .. } => SharedCodeResponse::Error {
                message: "session already initialized".into(),
            },
            SharedCodeRequest::Shutdown => {
                write_message(&mut writer, &SharedCodeResponse::Goodbye)?;
                break;
            }
        };
        write_message(&mut writer, &response)?;
    }
    debug!(served, "shared code session ended");
    Ok(served)
}

/// Runs a full worker session: `initialize`, then [`serve`].
pub fn serve_worker<R, W>(mut reader: R, mut writer: W) -> Result<usize, SharingError>
where
    R: BufRead,
    W: Write,
{
    let parameters = match read_message::<_, SharedCodeRequest>(&mut reader)? {
        Some(SharedCodeRequest::Initialize { parameters }) => parameters,
        Some(other) => {
            let message = format!("expected initialize, got {other:?}");
            write_message(
                &mut writer,
                &SharedCodeResponse::Error {
                    message: message.clone(),
                },
            )?;
            return Err(SharingError::Protocol(message));
        }
        None => return Ok(0),
    };
    let service = match SharedCodeService::from_parameters(&parameters) {
        Ok(service) => service,
        Err(err) => {
            write_message(
                &mut writer,
                &SharedCodeResponse::Error {
                    message: err.to_string(),
                },
            )?;
            return Err(err);
        }
    };
    write_message(&mut writer, &SharedCodeResponse::Ready)?;
    serve(reader, writer, &service)
}

struct Channel<R, W> {
    reader: R,
    writer: W,
    broken: bool,
}

/// [`SharedCodeLookup`] backed by a worker at the other end of a pipe.
///
/// Transport and protocol failures are logged and answered as `Unknown`;
/// after the first failure the channel is considered broken and no further
/// requests are sent.
pub struct RemoteSharedCodeService<R, W>
where
    R: BufRead,
    W: Write,
{
    channel: Mutex<Channel<R, W>>,
}

impl<R: BufRead, W: Write> std::fmt::Debug for RemoteSharedCodeService<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSharedCodeService").finish_non_exhaustive()
    }
}

impl<R, W> RemoteSharedCodeService<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    /// Initializes the worker with `parameters` and waits for `ready`.
    pub fn connect(
        mut reader: R,
        mut writer: W,
        parameters: &SharedCodeServiceParameters,
    ) -> Result<Self, SharingError> {
        write_message(
            &mut writer,
            &SharedCodeRequest::Initialize {
                parameters: parameters.clone(),
            },
        )?;
        match read_message::<_, SharedCodeResponse>(&mut reader)? {
            Some(SharedCodeResponse::Ready) => {}
            Some(SharedCodeResponse::Error { message }) => return Err(SharingError::Remote(message)),
            Some(other) => {
                return Err(SharingError::Protocol(format!(
                    "expected ready, got {other:?}"
                )))
            }
            None => {
                return Err(SharingError::Protocol(
                    "worker closed the channel during initialization".into(),
                ))
            }
        }
        debug!("connected to shared code worker");
        Ok(Self {
            channel: Mutex::new(Channel {
                reader,
                writer,
                broken: false,
            }),
        })
    }

    /// Ends the worker session.
    pub fn shutdown(&self) -> Result<(), SharingError> {
        let mut channel = self.channel.lock();
        if channel.broken {
            return Ok(());
        }
        channel.broken = true;
        write_message(&mut channel.writer, &SharedCodeRequest::Shutdown)?;
        match read_message::<_, SharedCodeResponse>(&mut channel.reader)? {
            Some(SharedCodeResponse::Goodbye) | None => Ok(()),
            Some(other) => Err(SharingError::Protocol(format!(
                "expected goodbye, got {other:?}"
            ))),
        }
    }

    fn request(channel: &mut Channel<R, W>, key: &CodeMemberKey) -> Result<CodeMemberShareKind, SharingError> {
        write_message(
            &mut channel.writer,
            &SharedCodeRequest::ShareKind { key: key.clone() },
        )?;
        match read_message::<_, SharedCodeResponse>(&mut channel.reader)? {
            Some(SharedCodeResponse::ShareKind { kind }) => Ok(kind),
            Some(SharedCodeResponse::Error { message }) => Err(SharingError::Remote(message)),
            Some(other) => Err(SharingError::Protocol(format!(
                "expected share_kind, got {other:?}"
            ))),
            None => Err(SharingError::Protocol("worker closed the channel".into())),
        }
    }
}

impl<R, W> SharedCodeLookup for RemoteSharedCodeService<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn share_kind(&self, key: &CodeMemberKey) -> CodeMemberShareKind {
        let mut channel = self.channel.lock();
        if channel.broken {
            return CodeMemberShareKind::UNKNOWN;
        }
        match Self::request(&mut channel, key) {
            Ok(kind) => kind,
            Err(SharingError::Remote(message)) => {
                warn!(member = %key, %message, "shared code worker could not answer");
                CodeMemberShareKind::UNKNOWN
            }
            Err(err) => {
                warn!(member = %key, error = %err, "shared code worker unreachable; treating as unknown");
                channel.broken = true;
                CodeMemberShareKind::UNKNOWN
            }
        }
    }
}

impl<R: BufRead, W: Write> Drop for RemoteSharedCodeService<R, W> {
    fn drop(&mut self) {
        let channel = self.channel.get_mut();
        if !channel.broken {
            channel.broken = true;
            let _ = write_message(&mut channel.writer, &SharedCodeRequest::Shutdown);
        }
    }
}
