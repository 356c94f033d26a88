use std::collections::HashMap;
use std::time::Instant;

use crate::block::Value;
use crate::event::{self, Event};
use crate::interp::{self, Action, StepCtx};
use crate::script::ScriptStore;
use crate::sprite::SpriteId;
use crate::stage::Stage;
use crate::thread::{Pending, Status, Thread, ThreadId};

/// Session-wide state all threads share: the global variable map, the last
/// resolved answer and the timer epoch.
#[derive(Debug)]
pub struct SharedState {
  pub globals: HashMap<String, Value>,
  pub answer: String,
  pub timer_epoch: Instant,
}

impl SharedState {
  pub fn new() -> SharedState {
    SharedState {
      globals: HashMap::new(),
      answer: String::new(),
      timer_epoch: Instant::now(),
    }
  }

  pub fn timer_secs(&self, now: Instant) -> f64 {
    now.saturating_duration_since(self.timer_epoch).as_secs_f64()
  }
}

impl Default for SharedState {
  fn default() -> SharedState {
    SharedState::new()
  }
}

/// The cooperative scheduler. One external tick source drives it; every
/// thread advances by at most one suspension point per tick, in creation
/// order. There is no parallelism and no preemption.
#[derive(Debug, Default)]
pub struct Runtime {
  threads: Vec<Thread>,
  next_thread: u64,
  running: bool,
  pub shared: SharedState,
}

impl Runtime {
  pub fn new() -> Runtime {
    Runtime {
      threads: Vec::new(),
      next_thread: 0,
      running: false,
      shared: SharedState::new(),
    }
  }

  /// Clears every existing thread, then fires the program-start event for
  /// all actors. Running twice never accumulates threads.
  pub fn start(&mut self, stage: &mut Stage, store: &ScriptStore) {
    self.stop_all(stage);
    self.running = true;
    self.shared.timer_epoch = Instant::now();
    let spawned = self.trigger_event(&Event::ProgramStart, stage, store);
    log::info!("program start, {spawned} thread(s) spawned");
  }

  /// Terminates every thread and drops transient presentation state.
  /// Synchronous and infallible.
  pub fn stop_all(&mut self, stage: &mut Stage) {
    for thread in &mut self.threads {
      thread.status = Status::Done;
    }
    self.threads.clear();
    stage.clear_transient_state();
    self.running = false;
  }

  pub fn is_running(&self) -> bool {
    self.running
  }

  pub fn live_threads(&self) -> usize {
    self.threads.iter().filter(|thread| !thread.is_done()).count()
  }

  pub fn threads_of(&self, sprite: SpriteId) -> usize {
    self
      .threads
      .iter()
      .filter(|thread| thread.sprite == sprite && !thread.is_done())
      .count()
  }

  /// Spawns one thread per script whose leading Hat matches, in actor
  /// declaration order then script declaration order. Spawned threads run
  /// within the tick that created them.
  pub fn trigger_event(&mut self, event: &Event, stage: &Stage, store: &ScriptStore) -> usize {
    let mut spawned = 0;
    for sprite in stage.sprites() {
      if let Some(scope) = event.scope() {
        if sprite.id != scope {
          continue;
        }
      }
      for (index, script) in store.scripts(sprite.script_owner).iter().enumerate() {
        let matched = script.hat().is_some_and(|hat| event::matches(event, hat));
        if matched {
          let id = ThreadId(self.next_thread);
          self.next_thread += 1;
          self.threads.push(Thread::new(id, sprite.id, index));
          spawned += 1;
        }
      }
    }
    if spawned > 0 {
      log::debug!("{event:?} spawned {spawned} thread(s)");
    }
    spawned
  }

  pub fn tick(&mut self, stage: &mut Stage, store: &ScriptStore) {
    self.tick_at(stage, store, Instant::now());
  }

  /// One scheduler pass at the given clock reading. Exposed separately so
  /// embedders (and tests) control time.
  pub fn tick_at(&mut self, stage: &mut Stage, store: &ScriptStore, now: Instant) {
    if !self.running {
      return;
    }
    let mut index = 0;
    while index < self.threads.len() {
      let runnable = match self.threads[index].status {
        Status::Running => true,
        Status::WaitingTimed(deadline) => {
          // wake on the first tick at or past the deadline
          if now >= deadline {
            self.threads[index].status = Status::Running;
            true
          } else {
            false
          }
        }
        Status::WaitingExternal | Status::Done => false,
      };
      if runnable {
        let id = self.threads[index].id;
        let mut actions = Vec::new();
        let result = {
          let Runtime {
            threads, shared, ..
          } = self;
          let mut ctx = StepCtx {
            stage,
            store,
            shared,
            now,
            actions: &mut actions,
          };
          interp::step(&mut threads[index], &mut ctx)
        };
        if let Err(error) = result {
          // a broken thread retires alone; siblings and the scheduler go on
          log::warn!("{id} stopped: {error}");
          self.threads[index].status = Status::Done;
        }
        self.apply_actions(actions, stage, store);
      }
      index += 1;
    }
    self.threads.retain(|thread| !thread.is_done());
  }

  /// Questions raised by ask-and-wait blocks that still await an answer.
  pub fn pending_questions(&self) -> impl Iterator<Item = (ThreadId, &str)> {
    self
      .threads
      .iter()
      .filter(|thread| thread.status == Status::WaitingExternal)
      .filter_map(|thread| match &thread.pending {
        Some(Pending::Ask(question)) => Some((thread.id, question.as_str())),
        _ => None,
      })
  }

  /// Resolves one outstanding ask-and-wait. The thread resumes on the next
  /// tick; other threads are unaffected.
  pub fn submit_answer(&mut self, id: ThreadId, answer: &str) -> bool {
    for thread in &mut self.threads {
      if thread.id == id && thread.status == Status::WaitingExternal {
        thread.status = Status::Running;
        thread.pending = None;
        self.shared.answer = answer.to_string();
        log::debug!("{id} answered");
        return true;
      }
    }
    false
  }

  fn apply_actions(&mut self, actions: Vec<Action>, stage: &mut Stage, store: &ScriptStore) {
    for action in actions {
      match action {
        Action::Broadcast(message) => {
          self.trigger_event(&Event::Message(message), stage, store);
        }
        Action::CreateClone(prototype) => {
          if let Some(clone) = stage.add_clone(prototype) {
            log::debug!("{prototype} cloned as {clone}");
            self.trigger_event(&Event::CloneStart(clone), stage, store);
          }
        }
        Action::DeleteSprite(id) => {
          stage.remove(id);
          for thread in &mut self.threads {
            if thread.sprite == id {
              thread.status = Status::Done;
            }
          }
        }
        Action::StopAll => {
          for thread in &mut self.threads {
            thread.status = Status::Done;
          }
          stage.clear_transient_state();
          self.running = false;
        }
        Action::StopOtherScripts { sprite, keep } => {
          for thread in &mut self.threads {
            if thread.sprite == sprite && thread.id != keep {
              thread.status = Status::Done;
            }
          }
        }
      }
    }
  }
}
