#![allow(dead_code)]

//! Fake UCI engines for process-level tests: small `/bin/sh` scripts that
//! speak just enough of the protocol. Every received command is appended
//! to `<script>.log` so tests can assert on the wire traffic.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kibitz_core::EngineConfig;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const AFTER_E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
pub const STALEMATE_FEN: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

const TEMPLATE: &str = r#"#!/bin/sh
LOG="$0.log"
echo $$ >"$0.pid"
while IFS= read -r line; do
  printf '%s\n' "$line" >>"$LOG"
  case "$line" in
    uci)
      echo "id name FakeFish 16"
      echo "id author fake"
      echo "uciok"
      ;;
    isready)
      echo "readyok"
      ;;
    ucinewgame)
@NEWGAME@
      ;;
    go*)
@GO@
      ;;
    eval)
@EVAL@
      ;;
    quit)
      exit 0
      ;;
  esac
done
"#;

/// Default `go` reply: one scored line, then the best move.
pub const GO_CP_34: &str = r#"      echo "info depth 12 seldepth 16 multipv 1 score cp 34 nodes 4242 pv e2e4 e7e5"
      echo "bestmove e2e4""#;

/// Default `eval` reply: an abridged classical breakdown table.
pub const EVAL_TABLE: &str = r#"      cat <<'TABLE'
      Term    |    White    |    Black    |    Total
              |   MG    EG  |   MG    EG  |   MG    EG
------------------------------------------------------
    Material |  +4.12 +4.50|  -4.12 -4.50|  +0.00 +0.00
    Mobility |  +0.45 +0.31|  -0.00 -0.00|  +0.45 +0.31
 King safety |  +0.18 -0.04|  +0.00 +0.00|  +0.18 -0.04
     Threats |  +0.12 +0.00|  -0.00 -0.00|  +0.12 +0.00
------------------------------------------------------
       Total |             |             |  +0.56 +0.41
TABLE"#;

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write fake engine script");
    let mut perms = std::fs::metadata(&path).expect("stat script").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod script");
    path
}

/// An engine answering `go` and `eval` with the given case bodies.
pub fn fake_engine_with(dir: &Path, name: &str, go: &str, eval: &str) -> PathBuf {
    let body = TEMPLATE
        .replace("@GO@", go)
        .replace("@EVAL@", eval)
        .replace("@NEWGAME@", "      :");
    write_script(dir, name, &body)
}

/// The standard well-behaved engine: cp 34 on `go`, full table on `eval`.
pub fn fake_engine(dir: &Path, name: &str) -> PathBuf {
    fake_engine_with(dir, name, GO_CP_34, EVAL_TABLE)
}

/// An engine that ignores `go` entirely; searches never produce output.
pub fn stalling_engine(dir: &Path, name: &str) -> PathBuf {
    fake_engine_with(dir, name, "      :", EVAL_TABLE)
}

/// An engine whose process dies on every `go`.
pub fn crashing_engine(dir: &Path, name: &str) -> PathBuf {
    fake_engine_with(dir, name, "      exit 7", EVAL_TABLE)
}

/// An engine that dies on the first `go` after a fresh install and answers
/// normally once restarted (a marker file survives the respawn).
pub fn crash_once_engine(dir: &Path, name: &str) -> PathBuf {
    let go = r#"      if [ -e "$0.crashed" ]; then
        echo "info depth 12 multipv 1 score cp 34 pv e2e4 e7e5"
        echo "bestmove e2e4"
      else
        : >"$0.crashed"
        exit 7
      fi"#;
    fake_engine_with(dir, name, go, EVAL_TABLE)
}

/// An engine build without the classical evaluation: `eval` prints a
/// one-line summary instead of the table.
pub fn nnue_only_engine(dir: &Path, name: &str) -> PathBuf {
    fake_engine_with(
        dir,
        name,
        GO_CP_34,
        "      echo \"NNUE evaluation: +0.33 (white side)\"",
    )
}

/// A program that talks back but never completes the UCI handshake.
pub fn non_uci_program(dir: &Path, name: &str) -> PathBuf {
    write_script(
        dir,
        name,
        "#!/bin/sh\nwhile IFS= read -r line; do\n  echo \"unknown command: $line\"\ndone\n",
    )
}

/// An engine whose process dies when asked to reset (`ucinewgame`), so a
/// pool release-time reset fails.
pub fn die_on_reset_engine(dir: &Path, name: &str) -> PathBuf {
    let body = TEMPLATE
        .replace("@GO@", GO_CP_34)
        .replace("@EVAL@", EVAL_TABLE)
        .replace("@NEWGAME@", "      exit 7");
    write_script(dir, name, &body)
}

/// An engine that honors the MultiPV option: each `go` answers with one
/// scored `info` line per requested variation (score cp 100-k), so the
/// client-side clamp is observable in the result count.
pub fn multipv_engine(dir: &Path, name: &str) -> PathBuf {
    write_script(
        dir,
        name,
        r#"#!/bin/sh
LOG="$0.log"
echo $$ >"$0.pid"
MULTIPV=1
while IFS= read -r line; do
  printf '%s\n' "$line" >>"$LOG"
  case "$line" in
    uci)
      echo "id name FakeFish 16"
      echo "uciok"
      ;;
    isready)
      echo "readyok"
      ;;
    "setoption name MultiPV value "*)
      MULTIPV="${line##* }"
      ;;
    go*)
      i=1
      while [ "$i" -le "$MULTIPV" ]; do
        echo "info depth 12 multipv $i score cp $((100 - i)) pv e2e4 e7e5"
        i=$((i + 1))
      done
      echo "bestmove e2e4"
      ;;
    quit)
      exit 0
      ;;
  esac
done
"#,
    )
}

/// An engine that counts its spawns in `<script>.spawns` and exits
/// immediately on spawn numbers within `fail_from..=fail_to` (1-based).
/// Everything outside that window behaves normally.
pub fn flaky_spawn_engine(dir: &Path, name: &str, fail_from: u32, fail_to: u32) -> PathBuf {
    let prologue = format!(
        r#"#!/bin/sh
COUNT_FILE="$0.spawns"
N=0
[ -f "$COUNT_FILE" ] && N=$(cat "$COUNT_FILE")
N=$((N + 1))
printf '%s\n' "$N" >"$COUNT_FILE"
if [ "$N" -ge {fail_from} ] && [ "$N" -le {fail_to} ]; then
  exit 1
fi
"#
    );
    let loop_body = TEMPLATE
        .replace("@GO@", GO_CP_34)
        .replace("@EVAL@", EVAL_TABLE)
        .replace("@NEWGAME@", "      :")
        .replacen("#!/bin/sh\n", "", 1);
    write_script(dir, name, &format!("{prologue}{loop_body}"))
}

/// Turns UCI reply lines into an `echo` block for a script case body.
pub fn reply_lines(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| format!("      echo \"{l}\""))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Commands the engine received so far, in order.
pub fn cmdlog(script: &Path) -> Vec<String> {
    let log = PathBuf::from(format!("{}.log", script.display()));
    match std::fs::read_to_string(log) {
        Ok(text) => text.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

/// Pid recorded by the most recently spawned instance of a script. Only
/// meaningful when a single instance runs at a time.
pub fn recorded_pid(script: &Path) -> Option<u32> {
    let path = PathBuf::from(format!("{}.pid", script.display()));
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// How many times a [`flaky_spawn_engine`] script has been spawned so far.
pub fn spawn_count(script: &Path) -> u32 {
    let path = PathBuf::from(format!("{}.spawns", script.display()));
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Whether a process with this pid exists (signal 0 probe).
pub fn process_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

/// Delivers SIGKILL, simulating an engine crash.
pub fn kill_process(pid: u32) {
    let _ = nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(pid as i32),
        nix::sys::signal::Signal::SIGKILL,
    );
}

/// Engine config pointing at a script, with test-friendly deadlines.
pub fn config(path: &Path) -> EngineConfig {
    EngineConfig {
        path: path.to_path_buf(),
        startup_timeout: Duration::from_secs(5),
        command_timeout: Duration::from_secs(5),
        ..EngineConfig::default()
    }
}

/// Opt-in tracing for debugging test runs (`RUST_LOG=trace cargo test`).
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
