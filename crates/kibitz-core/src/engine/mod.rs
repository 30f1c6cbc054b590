//! UCI engine process client.
//!
//! Owns one child process and speaks the line protocol over its stdio.
//! Key design:
//! - a dedicated reader task pumps stdout lines into a channel; every
//!   receive is wrapped in a deadline, so a silent engine becomes a typed
//!   [`EngineError::Timeout`] instead of a hang
//! - a timed-out call leaves the process running; death is noticed lazily
//!   at the next liveness check or I/O, never by a watchdog
//! - no internal locking: the pool (or a mutex) guarantees one caller at a
//!   time, and all I/O methods take `&mut self`

mod proto;

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, trace, warn};

use crate::breakdown::{self, ClassicalBreakdown};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fen::{self, Color};
use crate::model::{EvaluationResult, SearchLimit};

use proto::{GoReply, InfoLine};

/// One external UCI engine process.
#[derive(Debug)]
pub struct UciEngine {
    config: EngineConfig,
    alive: Arc<AtomicBool>,
    session: Option<Session>,
}

/// Live-process state, present between `start()` and `stop()`.
#[derive(Debug)]
struct Session {
    child: Child,
    stdin: ChildStdin,
    lines: mpsc::UnboundedReceiver<String>,
    reader: tokio::task::JoinHandle<()>,
    version: Option<String>,
}

impl UciEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            alive: Arc::new(AtomicBool::new(false)),
            session: None,
        }
    }

    /// The configured engine binary path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Version string captured during the handshake, if started.
    pub fn version(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.version.as_deref())
    }

    /// OS process id of the running engine, if started.
    pub fn pid(&self) -> Option<u32> {
        self.session.as_ref().and_then(|s| s.child.id())
    }

    /// Shared liveness flag; the pool aggregates these for health checks
    /// while engines are checked out.
    pub(crate) fn alive_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.alive)
    }

    /// Non-blocking liveness check. Does not attempt recovery.
    pub fn is_alive(&mut self) -> bool {
        let alive = match self.session.as_mut() {
            Some(session) => matches!(session.child.try_wait(), Ok(None)),
            None => false,
        };
        if !alive {
            self.alive.store(false, Ordering::Relaxed);
        }
        alive
    }

    /// Spawns the engine and runs the UCI handshake: `uci` → `uciok`
    /// (capturing the `id name` version), thread/hash options when
    /// non-default, then `isready` → `readyok`, all under the startup
    /// deadline. Calling this on a started engine restarts it.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        if self.session.is_some() {
            warn!("engine already started, restarting");
            self.stop().await;
        }
        let session = self.handshake().await?;
        info!(
            version = session.version.as_deref().unwrap_or("unknown"),
            path = %self.config.path.display(),
            "engine started"
        );
        self.alive.store(true, Ordering::Relaxed);
        self.session = Some(session);
        Ok(())
    }

    async fn handshake(&self) -> Result<Session, EngineError> {
        let path = &self.config.path;
        // kill_on_drop: an abandoned handle must not leak a process.
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Startup(format!("cannot spawn {}: {e}", path.display())))?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.start_kill();
            return Err(EngineError::Startup("engine stdout pipe missing".into()));
        };
        let Some(mut stdin) = child.stdin.take() else {
            let _ = child.start_kill();
            return Err(EngineError::Startup("engine stdin pipe missing".into()));
        };

        let (tx, mut lines) = mpsc::unbounded_channel();
        let flag = Arc::clone(&self.alive);
        let reader = tokio::spawn(async move {
            let mut stdout = BufReader::new(stdout).lines();
            loop {
                match stdout.next_line().await {
                    Ok(Some(line)) => {
                        trace!(line = %line, "<- engine");
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!("engine stdout read error: {e}");
                        break;
                    }
                }
            }
            flag.store(false, Ordering::Relaxed);
        });

        let startup = self.config.startup_timeout;
        let handshake: Result<Option<String>, EngineError> = async {
            Self::send(&mut stdin, "uci").await?;
            let greeting = Self::read_until(&mut lines, "uciok", startup).await?;
            let version = greeting
                .iter()
                .find_map(|line| proto::id_name(line.trim()))
                .map(str::to_string);
            if self.config.threads != 1 {
                let cmd = format!("setoption name Threads value {}", self.config.threads);
                Self::send(&mut stdin, &cmd).await?;
            }
            if self.config.hash_mb != 16 {
                let cmd = format!("setoption name Hash value {}", self.config.hash_mb);
                Self::send(&mut stdin, &cmd).await?;
            }
            Self::send(&mut stdin, "isready").await?;
            Self::read_until(&mut lines, "readyok", startup).await?;
            Ok(version)
        }
        .await;

        match handshake {
            Ok(version) => Ok(Session {
                child,
                stdin,
                lines,
                reader,
                version,
            }),
            Err(e) => {
                let _ = child.start_kill();
                reader.abort();
                self.alive.store(false, Ordering::Relaxed);
                Err(EngineError::Startup(e.to_string()))
            }
        }
    }

    /// Sends `quit`, waits briefly for exit, kills on timeout. Always
    /// clears the session, and is safe to call when never started.
    pub async fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        self.alive.store(false, Ordering::Relaxed);
        let _ = Self::send(&mut session.stdin, "quit").await;
        drop(session.stdin);
        match tokio::time::timeout(Duration::from_secs(2), session.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "engine stopped"),
            Ok(Err(e)) => warn!("error waiting for engine exit: {e}"),
            Err(_) => {
                warn!("engine did not exit after quit, killing");
                let _ = session.child.kill().await;
            }
        }
        session.reader.abort();
    }

    /// Clears engine-internal session state (`ucinewgame` + ready-check).
    /// The pool calls this between checkouts; failure means the session is
    /// no longer trustworthy and the pool discards the engine.
    pub async fn new_game(&mut self) -> Result<(), EngineError> {
        let ready = self.config.startup_timeout;
        let session = self.session.as_mut().ok_or(EngineError::NotStarted)?;
        Self::drain_stale(&mut session.lines);
        Self::send(&mut session.stdin, "ucinewgame").await?;
        Self::send(&mut session.stdin, "isready").await?;
        Self::read_until(&mut session.lines, "readyok", ready).await?;
        Ok(())
    }

    /// Evaluates a position.
    ///
    /// The FEN is validated before any process I/O; `multipv` is clamped
    /// into `[1, 10]`; an empty limit searches to the default depth. The
    /// returned score is from the side to move's perspective: the raw
    /// white-relative value is negated when black is to move. A position
    /// with no legal moves yields the empty result.
    pub async fn evaluate(
        &mut self,
        fen_str: &str,
        limit: &SearchLimit,
        multipv: i32,
    ) -> Result<EvaluationResult, EngineError> {
        let side = fen::validate(fen_str)?;
        let session = self.session.as_mut().ok_or(EngineError::NotStarted)?;
        let multipv = multipv.clamp(1, 10);
        let total = self.config.command_timeout;
        Self::drain_stale(&mut session.lines);

        Self::send(
            &mut session.stdin,
            &format!("setoption name MultiPV value {multipv}"),
        )
        .await?;
        Self::send(&mut session.stdin, &format!("position fen {fen_str}")).await?;
        Self::send(&mut session.stdin, &proto::go_command(limit)).await?;

        let deadline = Instant::now() + total;
        // Last reported line per MultiPV index; the map keeps them in
        // engine priority order.
        let mut latest: BTreeMap<u32, InfoLine> = BTreeMap::new();
        let best = loop {
            let line = match Self::read_line(&mut session.lines, deadline, total).await {
                Ok(line) => line,
                Err(e @ EngineError::Timeout(_)) => {
                    // Ask the engine to wind down the search, but leave the
                    // process itself alone; the pool reclaims it lazily.
                    let _ = Self::send(&mut session.stdin, "stop").await;
                    return Err(e);
                }
                Err(e) => return Err(e),
            };
            match proto::parse_go_line(line.trim()) {
                Some(GoReply::Info(info)) => {
                    latest.insert(info.multipv, info);
                }
                Some(GoReply::BestMove(mv)) => break mv,
                None => {}
            }
        };

        if best.is_none() {
            // `bestmove (none)`: checkmate or stalemate, nothing to score.
            return Ok(EvaluationResult::default());
        }

        let mut variations: Vec<EvaluationResult> = latest
            .into_values()
            .map(|info| Self::variation(info, side))
            .collect();
        if variations.is_empty() {
            return Err(EngineError::Protocol(
                "bestmove arrived without any scored info line".into(),
            ));
        }
        let mut primary = variations.remove(0);
        primary.alternatives = variations;
        Ok(primary)
    }

    /// Requests the classical evaluation breakdown table.
    ///
    /// A ready-check is issued right after `eval`; the engine answers
    /// commands in order, so `readyok` arriving before any table header
    /// proves this build does not produce the table
    /// ([`EngineError::EvalNotSupported`]).
    pub async fn breakdown(&mut self, fen_str: &str) -> Result<ClassicalBreakdown, EngineError> {
        fen::validate(fen_str)?;
        let session = self.session.as_mut().ok_or(EngineError::NotStarted)?;
        let total = self.config.command_timeout;
        Self::drain_stale(&mut session.lines);

        Self::send(&mut session.stdin, &format!("position fen {fen_str}")).await?;
        Self::send(&mut session.stdin, "eval").await?;
        Self::send(&mut session.stdin, "isready").await?;

        let deadline = Instant::now() + total;
        let mut rows: Vec<String> = Vec::new();
        let mut in_table = false;
        loop {
            let line = Self::read_line(&mut session.lines, deadline, total).await?;
            if line.trim() == "readyok" {
                if rows.is_empty() {
                    return Err(EngineError::EvalNotSupported);
                }
                return Ok(breakdown::parse_breakdown(rows.iter().map(String::as_str)));
            }
            if proto::is_breakdown_header(&line) {
                in_table = true;
            }
            if in_table {
                let total_row = proto::is_breakdown_total(&line);
                rows.push(line);
                if total_row {
                    // Table complete; keep draining until the sentinel.
                    in_table = false;
                }
            }
        }
    }

    fn variation(info: InfoLine, side: Color) -> EvaluationResult {
        let score = match side {
            Color::White => info.score,
            Color::Black => info.score.negated(),
        };
        EvaluationResult {
            score: Some(score),
            depth: info.depth,
            best_line: info.pv,
            alternatives: Vec::new(),
        }
    }

    async fn send(stdin: &mut ChildStdin, command: &str) -> Result<(), EngineError> {
        debug!(%command, "-> engine");
        stdin
            .write_all(format!("{command}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Protocol(format!("write to engine failed: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| EngineError::Protocol(format!("write to engine failed: {e}")))
    }

    async fn read_line(
        lines: &mut mpsc::UnboundedReceiver<String>,
        deadline: Instant,
        total: Duration,
    ) -> Result<String, EngineError> {
        match timeout_at(deadline, lines.recv()).await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(EngineError::Protocol("engine closed its output".into())),
            Err(_) => Err(EngineError::Timeout(total)),
        }
    }

    async fn read_until(
        lines: &mut mpsc::UnboundedReceiver<String>,
        terminator: &str,
        total: Duration,
    ) -> Result<Vec<String>, EngineError> {
        let deadline = Instant::now() + total;
        let mut seen = Vec::new();
        loop {
            let line = Self::read_line(lines, deadline, total).await?;
            let done = line.trim() == terminator;
            seen.push(line);
            if done {
                return Ok(seen);
            }
        }
    }

    /// Leftovers from a timed-out call must not be mistaken for replies to
    /// the next one.
    fn drain_stale(lines: &mut mpsc::UnboundedReceiver<String>) {
        while let Ok(line) = lines.try_recv() {
            trace!(line = %line, "discarding stale engine output");
        }
    }
}
