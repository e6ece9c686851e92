//! Layout profiling counters
//!
//! Gated behind `PAGEFLOW_LAYOUT_PROFILE=1`; when the variable is unset the
//! timers are no-ops. Counters are process-wide and printed with
//! [`log_layout_profile`], one `key=value` line on stderr.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::OnceLock;
use std::time::Duration;
use std::time::Instant;

#[derive(Copy, Clone, Debug)]
pub enum LayoutKind {
  Paragraph,
  Pile,
  Row,
  Page,
  Balance,
}

impl LayoutKind {
  fn as_usize(self) -> usize {
    match self {
      LayoutKind::Paragraph => 0,
      LayoutKind::Pile => 1,
      LayoutKind::Row => 2,
      LayoutKind::Page => 3,
      LayoutKind::Balance => 4,
    }
  }

  fn name(self) -> &'static str {
    match self {
      LayoutKind::Paragraph => "paragraph",
      LayoutKind::Pile => "pile",
      LayoutKind::Row => "row",
      LayoutKind::Page => "page",
      LayoutKind::Balance => "balance",
    }
  }
}

const KIND_COUNT: usize = 5;

static TIME_NS: [AtomicU64; KIND_COUNT] = [
  AtomicU64::new(0),
  AtomicU64::new(0),
  AtomicU64::new(0),
  AtomicU64::new(0),
  AtomicU64::new(0),
];
static CALLS: [AtomicU64; KIND_COUNT] = [
  AtomicU64::new(0),
  AtomicU64::new(0),
  AtomicU64::new(0),
  AtomicU64::new(0),
  AtomicU64::new(0),
];
static LINES_BUILT: AtomicU64 = AtomicU64::new(0);
static SEGMENTS_SHAPED: AtomicU64 = AtomicU64::new(0);

fn enabled() -> bool {
  static ENABLED: OnceLock<bool> = OnceLock::new();
  *ENABLED.get_or_init(|| {
    std::env::var("PAGEFLOW_LAYOUT_PROFILE")
      .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
      .unwrap_or(false)
  })
}

pub fn layout_profile_enabled() -> bool {
  enabled()
}

pub fn reset_layout_profile() {
  for entry in TIME_NS.iter() {
    entry.store(0, Ordering::Relaxed);
  }
  for entry in CALLS.iter() {
    entry.store(0, Ordering::Relaxed);
  }
  LINES_BUILT.store(0, Ordering::Relaxed);
  SEGMENTS_SHAPED.store(0, Ordering::Relaxed);
}

pub fn count_line_built() {
  if enabled() {
    LINES_BUILT.fetch_add(1, Ordering::Relaxed);
  }
}

pub fn count_segment_shaped() {
  if enabled() {
    SEGMENTS_SHAPED.fetch_add(1, Ordering::Relaxed);
  }
}

pub struct LayoutTimerGuard(Option<(LayoutKind, Instant)>);

impl Drop for LayoutTimerGuard {
  fn drop(&mut self) {
    if let Some((kind, start)) = self.0.take() {
      let idx = kind.as_usize();
      TIME_NS[idx].fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
      CALLS[idx].fetch_add(1, Ordering::Relaxed);
    }
  }
}

pub fn layout_timer(kind: LayoutKind) -> LayoutTimerGuard {
  if enabled() {
    LayoutTimerGuard(Some((kind, Instant::now())))
  } else {
    LayoutTimerGuard(None)
  }
}

pub fn log_layout_profile(total: Duration) {
  if !enabled() {
    return;
  }
  let mut parts = Vec::new();
  for kind in [
    LayoutKind::Paragraph,
    LayoutKind::Pile,
    LayoutKind::Row,
    LayoutKind::Page,
    LayoutKind::Balance,
  ] {
    let idx = kind.as_usize();
    let time = TIME_NS[idx].load(Ordering::Relaxed) as f64 / 1_000_000.0;
    let calls = CALLS[idx].load(Ordering::Relaxed);
    if time > 0.0 || calls > 0 {
      parts.push(format!("{}_ms={:.2} {}_calls={}", kind.name(), time, kind.name(), calls));
    }
  }
  let lines = LINES_BUILT.load(Ordering::Relaxed);
  let segments = SEGMENTS_SHAPED.load(Ordering::Relaxed);
  if lines > 0 || segments > 0 {
    parts.push(format!("lines_built={} segments_shaped={}", lines, segments));
  }
  eprintln!(
    "layout profile: total_ms={:.2} {}",
    total.as_secs_f64() * 1000.0,
    parts.join(" ")
  );
}
