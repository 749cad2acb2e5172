//! Card-reader ingestion: framed JSON over an unreliable byte stream.
//!
//! The reader hardware writes newline-delimited JSON objects of the shape
//! `{"card_uuid": "..."}` with no guarantee about chunk boundaries. The
//! codec reassembles complete frames from arbitrary chunking behind a
//! bounded buffer; the scanner task owns the device handle for exactly the
//! duration of one run and releases it on every exit path.

use std::{io, path::PathBuf};

use anyhow::{bail, Context, Result};
use bytes::BytesMut;
use futures::StreamExt;
use serde::Deserialize;
use thiserror::Error;
use tokio::{fs::File, io::AsyncRead, sync::mpsc};
use tokio_util::{
    codec::{Decoder, FramedRead},
    sync::CancellationToken,
};
use tracing::{info, warn};

/// Upper bound for one frame; reader lines are short.
pub const MAX_FRAME_LEN: usize = 512;

/// Identifier synthesized when the fallback path is enabled and no device
/// is available. Keeps the downstream assign flow exercisable in demos.
pub const FALLBACK_CARD_UUID: &str = "04a224e2-5a0f-4f9a-9d3a-7b61c43d90aa";

/// One decoded frame from the reader.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanFrame {
    /// The scanned card identifier.
    pub card_uuid: String,
}

/// Decoder failures.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The stream produced more than [`MAX_FRAME_LEN`] bytes without a
    /// frame delimiter.
    #[error("scan frame exceeded {MAX_FRAME_LEN} bytes without a delimiter")]
    FrameTooLong,
    /// Underlying stream failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Newline-delimited JSON decoder with a bounded buffer.
///
/// Complete lines that fail to parse are dropped with a warning; the
/// hardware interleaves status noise with frames. A missing delimiter past
/// the buffer bound is an error, not an invitation to scan for braces.
#[derive(Debug, Default)]
pub struct ScanCodec;

impl Decoder for ScanCodec {
    type Item = ScanFrame;
    type Error = ScanError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<ScanFrame>, ScanError> {
        loop {
            match src.iter().position(|byte| *byte == b'\n') {
                Some(index) => {
                    let line = src.split_to(index + 1);
                    let text = String::from_utf8_lossy(&line[..index]);
                    let text = text.trim_end_matches('\r').trim();
                    if text.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ScanFrame>(text) {
                        Ok(frame) => return Ok(Some(frame)),
                        Err(err) => {
                            warn!("discarding unparseable scan line: {err}");
                            continue;
                        }
                    }
                }
                None if src.len() > MAX_FRAME_LEN => return Err(ScanError::FrameTooLong),
                None => return Ok(None),
            }
        }
    }
}

/// Events emitted by the scanner task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Device opened; frames may follow.
    Connected,
    /// A card identifier was read.
    Card(ScanFrame),
    /// The stream ended or the scan was stopped.
    Disconnected,
    /// The scan path failed before or while reading; carries the message
    /// to surface. No further events follow.
    Failed(String),
}

/// Scanner lifecycle, surfaced for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Not running.
    #[default]
    Idle,
    /// Opening the device.
    Connecting,
    /// Device open, reading frames.
    Listening,
}

/// Configuration for the ingestion path.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Device node to read, e.g. `/dev/ttyUSB0`.
    pub device: Option<PathBuf>,
    /// Whether to synthesize [`FALLBACK_CARD_UUID`] when no device is
    /// available. Off by default; demos opt in via configuration.
    pub fallback: bool,
}

/// Reads card frames from the configured device and forwards them as
/// [`ScanEvent`]s.
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner from configuration.
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Run the scan loop until the stream ends or `cancel` fires.
    ///
    /// The device handle is scoped to this call: completion, error, and
    /// cancellation all release it.
    pub async fn run(
        self,
        sender: mpsc::Sender<ScanEvent>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let Some(device) = self.config.device.clone() else {
            return self.emit_fallback(&sender).await;
        };

        match File::open(&device).await {
            Ok(file) => {
                info!("scanner listening on {}", device.display());
                let _ = sender.send(ScanEvent::Connected).await;
                pump(file, &sender, cancel).await;
                let _ = sender.send(ScanEvent::Disconnected).await;
                Ok(())
            }
            Err(err) if self.config.fallback => {
                warn!("scan device {} unavailable ({err}); using fallback identifier", device.display());
                self.emit_fallback(&sender).await
            }
            Err(err) => {
                let message = format!("failed to open scan device {}: {err}", device.display());
                let _ = sender.send(ScanEvent::Failed(message.clone())).await;
                Err(err).context(message)
            }
        }
    }

    async fn emit_fallback(&self, sender: &mpsc::Sender<ScanEvent>) -> Result<()> {
        if !self.config.fallback {
            let _ = sender
                .send(ScanEvent::Failed("no scan device configured".to_string()))
                .await;
            bail!("no scan device configured");
        }
        let _ = sender.send(ScanEvent::Connected).await;
        let _ = sender
            .send(ScanEvent::Card(ScanFrame {
                card_uuid: FALLBACK_CARD_UUID.to_string(),
            }))
            .await;
        let _ = sender.send(ScanEvent::Disconnected).await;
        Ok(())
    }
}

/// Pump frames from any byte stream until it ends, errors, the consumer
/// goes away, or `cancel` fires. Exposed so tests can feed synthetic
/// chunking without a device.
pub async fn pump<R: AsyncRead + Unpin>(
    reader: R,
    sender: &mpsc::Sender<ScanEvent>,
    cancel: CancellationToken,
) {
    let mut frames = FramedRead::new(reader, ScanCodec);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = frames.next() => match frame {
                Some(Ok(frame)) => {
                    // A closed receiver means nobody is consuming; stop
                    // reading rather than buffer unbounded.
                    if sender.send(ScanEvent::Card(frame)).await.is_err() {
                        break;
                    }
                }
                Some(Err(err)) => {
                    warn!("scan stream error: {err}");
                    break;
                }
                None => break,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn codec_reassembles_frames_split_across_chunks() {
        let mut codec = ScanCodec;
        let mut buffer = BytesMut::new();

        buffer.extend_from_slice(b"{\"card_uuid\": \"ab");
        assert!(codec.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(b"c-123\"}\n{\"card_uuid\": \"def-456\"}\n");
        assert_eq!(
            codec.decode(&mut buffer).unwrap().unwrap().card_uuid,
            "abc-123"
        );
        assert_eq!(
            codec.decode(&mut buffer).unwrap().unwrap().card_uuid,
            "def-456"
        );
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn codec_skips_noise_lines() {
        let mut codec = ScanCodec;
        let mut buffer = BytesMut::from(
            &b"READY\r\n\r\n{\"card_uuid\": \"abc-123\"}\r\nstatus: ok\n"[..],
        );
        assert_eq!(
            codec.decode(&mut buffer).unwrap().unwrap().card_uuid,
            "abc-123"
        );
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn codec_rejects_unbounded_garbage() {
        let mut codec = ScanCodec;
        let mut buffer = BytesMut::from(vec![b'x'; MAX_FRAME_LEN + 1].as_slice());
        assert!(matches!(
            codec.decode(&mut buffer),
            Err(ScanError::FrameTooLong)
        ));
    }

    #[tokio::test]
    async fn pump_emits_card_events_and_ends_with_the_stream() {
        let (mut device, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(async move {
            pump(reader, &tx, cancel).await;
        });

        device.write_all(b"{\"card_uuid\": \"abc").await.unwrap();
        device.write_all(b"-123\"}\n").await.unwrap();
        drop(device);

        assert_eq!(
            rx.recv().await,
            Some(ScanEvent::Card(ScanFrame {
                card_uuid: "abc-123".to_string()
            }))
        );
        assert!(rx.recv().await.is_none());
        task.await.unwrap();
    }

    #[tokio::test]
    async fn cancellation_stops_an_open_stream() {
        let (_device, reader) = tokio::io::duplex(64);
        let (tx, _rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = cancel.clone();

        let task = tokio::spawn(async move {
            pump(reader, &tx, cancel).await;
        });

        handle.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn fallback_emits_one_fixed_identifier() {
        let scanner = Scanner::new(ScanConfig {
            device: None,
            fallback: true,
        });
        let (tx, mut rx) = mpsc::channel(8);
        scanner.run(tx, CancellationToken::new()).await.unwrap();

        assert_eq!(rx.recv().await, Some(ScanEvent::Connected));
        assert_eq!(
            rx.recv().await,
            Some(ScanEvent::Card(ScanFrame {
                card_uuid: FALLBACK_CARD_UUID.to_string()
            }))
        );
        assert_eq!(rx.recv().await, Some(ScanEvent::Disconnected));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn fallback_disabled_surfaces_an_error() {
        let scanner = Scanner::new(ScanConfig::default());
        let (tx, mut rx) = mpsc::channel(8);
        assert!(scanner.run(tx, CancellationToken::new()).await.is_err());

        // The consumer learns about the failure too, not just the caller.
        assert_eq!(
            rx.recv().await,
            Some(ScanEvent::Failed("no scan device configured".to_string()))
        );
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn unopenable_device_without_fallback_reports_failure() {
        let scanner = Scanner::new(ScanConfig {
            device: Some(PathBuf::from("/nonexistent/card-reader")),
            fallback: false,
        });
        let (tx, mut rx) = mpsc::channel(8);
        assert!(scanner.run(tx, CancellationToken::new()).await.is_err());

        match rx.recv().await {
            Some(ScanEvent::Failed(message)) => {
                assert!(message.contains("/nonexistent/card-reader"), "message: {message}");
            }
            other => panic!("expected a failure event, got {other:?}"),
        }
        assert!(rx.recv().await.is_none());
    }
}
