//! Background analysis thread.
//!
//! Analysis requests are sent over a channel; the finished text comes back
//! through a [`LatestCell`].  A busy flag keeps at most one request
//! outstanding, and there are no retries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use field_analysis::AnalysisClient;
use log::{debug, info};

use crate::latest::LatestCell;

// ════════════════════════════════════════════════════════════════════════════
// AnalystCommand: sent to the analysis thread
// ════════════════════════════════════════════════════════════════════════════

pub enum AnalystCommand {
    /// Describe the field at these control values.
    Analyze { chaos: f32, scale: f32, query: Option<String> },
    /// Terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// AnalysisWorker
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the analysis thread.
pub struct AnalysisWorker {
    cmd_tx: Sender<AnalystCommand>,
    busy:   Arc<AtomicBool>,
    reply:  LatestCell<String>,
}

impl AnalysisWorker {
    /// Spawn the thread; `client` is consumed by it.
    pub fn spawn(client: AnalysisClient) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AnalystCommand>();
        let busy  = Arc::new(AtomicBool::new(false));
        let reply = LatestCell::new();

        {
            let busy  = Arc::clone(&busy);
            let reply = reply.clone();
            thread::spawn(move || analyst_thread(client, cmd_rx, busy, reply));
        }

        AnalysisWorker { cmd_tx, busy, reply }
    }

    pub fn is_busy(&self) -> bool { self.busy.load(Ordering::Acquire) }

    /// Start an analysis.  Returns false if one is already running or the
    /// thread has gone away.
    pub fn request(&self, chaos: f32, scale: f32, query: Option<String>) -> bool {
        if self.busy.swap(true, Ordering::AcqRel) {
            return false;
        }
        if self.cmd_tx.send(AnalystCommand::Analyze { chaos, scale, query }).is_err() {
            self.busy.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// Finished text, if a reply arrived since the last poll.
    pub fn poll(&self) -> Option<String> { self.reply.take() }

    pub fn quit(&self) { let _ = self.cmd_tx.send(AnalystCommand::Quit); }
}

fn analyst_thread(
    mut client: AnalysisClient,
    cmd_rx:     Receiver<AnalystCommand>,
    busy:       Arc<AtomicBool>,
    reply:      LatestCell<String>,
) {
    for cmd in cmd_rx {
        match cmd {
            AnalystCommand::Analyze { chaos, scale, query } => {
                debug!("[analyst] chaos={:.2} scale={:.2} query={:?}", chaos, scale, query);
                let text = client.generate_analysis(chaos, scale, query.as_deref());
                reply.put(text);
                busy.store(false, Ordering::Release);
            }
            AnalystCommand::Quit => break,
        }
    }
    info!("[analyst] stopped");
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use field_analysis::{
        AnalysisBackend, AnalysisError, ControlReading, LocalAnalyst, FALLBACK_ANALYSIS,
    };
    use std::sync::mpsc::SyncSender;
    use std::time::{Duration, Instant};

    fn wait_reply(w: &AnalysisWorker) -> String {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(t) = w.poll() { return t; }
            assert!(Instant::now() < deadline, "no analysis reply");
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Blocks until the test releases it, so the busy window is observable.
    struct Gated(Receiver<()>, SyncSender<()>);
    impl AnalysisBackend for Gated {
        fn analyze(&mut self, _: &ControlReading, _: Option<&str>) -> Result<String, AnalysisError> {
            let _ = self.1.send(());
            let _ = self.0.recv();
            Ok("gated".to_string())
        }
    }

    struct Down;
    impl AnalysisBackend for Down {
        fn analyze(&mut self, _: &ControlReading, _: Option<&str>) -> Result<String, AnalysisError> {
            Err(AnalysisError::Backend("offline".to_string()))
        }
    }

    #[test]
    fn reply_arrives() {
        let w = AnalysisWorker::spawn(AnalysisClient::new(LocalAnalyst::new()));
        assert!(w.request(0.9, 0.1, None));
        assert!(wait_reply(&w).contains("MAELSTROM"));
        w.quit();
    }

    #[test]
    fn second_request_refused_while_busy() {
        let (release_tx, release_rx) = mpsc::channel();
        let (started_tx, started_rx) = mpsc::sync_channel(1);
        let w = AnalysisWorker::spawn(AnalysisClient::new(Gated(release_rx, started_tx)));

        assert!(w.request(0.5, 0.5, None));
        started_rx.recv().unwrap();
        assert!(w.is_busy());
        assert!(!w.request(0.6, 0.6, None));

        release_tx.send(()).unwrap();
        assert_eq!(wait_reply(&w), "gated");
        w.quit();
    }

    #[test]
    fn backend_failure_yields_fallback_text() {
        let w = AnalysisWorker::spawn(AnalysisClient::new(Down));
        assert!(w.request(0.2, 0.2, Some("status?".to_string())));
        assert_eq!(wait_reply(&w), FALLBACK_ANALYSIS);
        w.quit();
    }
}
