use std::fmt;
use std::time::Instant;

use crate::sprite::SpriteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "thread#{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
  Running,
  /// Parked until the deadline; the scheduler wakes it on the first tick at
  /// or past it.
  WaitingTimed(Instant),
  /// Parked until an answer arrives from outside the runtime.
  WaitingExternal,
  Done,
}

/// Which body of the parent block a frame walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySel {
  Main,
  Inner,
  Else,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameMode {
  /// Run the body once; yield when it completes (if / if-else branches).
  Branch,
  Repeat { remaining: u32 },
  /// `at_boundary` is set after each iteration's yield, so the condition is
  /// re-checked on the next resume before the body restarts.
  Until { at_boundary: bool },
  Forever,
}

/// One level of the continuation: a cursor into a block body plus the loop
/// state that body runs under.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
  pub body: BodySel,
  pub index: usize,
  pub mode: FrameMode,
}

/// Suspension detail carried across ticks alongside the status.
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
  /// Applied when a timed wait completes (say/think for N seconds).
  ClearBubbleAfterWait,
  /// Linear position interpolation, advanced once per yielded tick.
  Glide {
    from: (f64, f64),
    to: (f64, f64),
    start: Instant,
    deadline: Instant,
  },
  /// Fixed tick-counted delay (broadcast-and-wait).
  Ticks(u32),
  /// Outstanding ask-and-wait question, one per thread.
  Ask(String),
}

/// One running instantiation of a script on one actor.
#[derive(Debug, Clone)]
pub struct Thread {
  pub id: ThreadId,
  pub sprite: SpriteId,
  /// Index into the script owner's script list.
  pub script: usize,
  pub frames: Vec<Frame>,
  pub pending: Option<Pending>,
  pub status: Status,
}

impl Thread {
  pub fn new(id: ThreadId, sprite: SpriteId, script: usize) -> Thread {
    Thread {
      id,
      sprite,
      script,
      frames: vec![Frame {
        body: BodySel::Main,
        index: 0,
        mode: FrameMode::Branch,
      }],
      pending: None,
      status: Status::Running,
    }
  }

  pub fn is_done(&self) -> bool {
    self.status == Status::Done
  }
}
