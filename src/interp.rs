use std::time::{Duration, Instant};

use crate::block::{Block, BlockKind, Value};
use crate::condition;
use crate::error::ThreadError;
use crate::runtime::SharedState;
use crate::script::{Script, ScriptStore};
use crate::sprite::{RotationStyle, Sprite, SpriteId};
use crate::stage::{Stage, STAGE_HEIGHT, STAGE_WIDTH};
use crate::thread::{BodySel, Frame, FrameMode, Pending, Status, Thread, ThreadId};

/// Side effects a step cannot apply itself because they touch the live
/// thread set or the actor list. The scheduler applies them at the next
/// yield boundary, which is equivalent to synchronous dispatch in a
/// single-threaded tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  Broadcast(String),
  CreateClone(SpriteId),
  DeleteSprite(SpriteId),
  StopAll,
  StopOtherScripts { sprite: SpriteId, keep: ThreadId },
}

pub struct StepCtx<'a> {
  pub stage: &'a mut Stage,
  pub store: &'a ScriptStore,
  pub shared: &'a mut SharedState,
  pub now: Instant,
  pub actions: &'a mut Vec<Action>,
}

/// Advances one thread to its next suspension point. Returning `Ok` means
/// the thread yielded (or finished); `Err` means the thread is broken and
/// the scheduler should retire it.
pub fn step(thread: &mut Thread, ctx: &mut StepCtx) -> Result<(), ThreadError> {
  let owner = ctx
    .stage
    .get(thread.sprite)
    .ok_or(ThreadError::DanglingActor(thread.sprite))?
    .script_owner;
  // Reborrow the store at full lifetime so block references stay valid while
  // the stage is mutated.
  let store: &ScriptStore = ctx.store;
  let script = store
    .scripts(owner)
    .get(thread.script)
    .ok_or(ThreadError::MissingScript {
      actor: thread.sprite,
      script: thread.script,
    })?;

  if service_pending(thread, ctx)? {
    return Ok(());
  }

  loop {
    // A repeat-until boundary re-checks its condition before restarting.
    if let Some(Frame {
      mode: FrameMode::Until { at_boundary: true },
      ..
    }) = thread.frames.last()
    {
      let parent = enclosing_block(script, &thread.frames)?;
      let finished = parent
        .condition
        .as_ref()
        .map(|cond| condition::evaluate(cond, ctx.stage, thread.sprite))
        .unwrap_or(false);
      let Some(frame) = thread.frames.last_mut() else {
        thread.status = Status::Done;
        return Ok(());
      };
      if finished {
        thread.frames.pop();
        advance(thread);
        continue;
      }
      frame.mode = FrameMode::Until { at_boundary: false };
    }

    let body = body_for(script, &thread.frames)?;
    let depth = thread.frames.len();
    let Some(frame) = thread.frames.last_mut() else {
      thread.status = Status::Done;
      return Ok(());
    };

    if frame.index >= body.len() {
      if depth == 1 {
        thread.status = Status::Done;
        return Ok(());
      }
      match frame.mode {
        FrameMode::Branch => {
          thread.frames.pop();
          advance(thread);
          return Ok(());
        }
        FrameMode::Repeat { remaining } => {
          if remaining <= 1 {
            thread.frames.pop();
            advance(thread);
          } else {
            frame.mode = FrameMode::Repeat {
              remaining: remaining - 1,
            };
            frame.index = 0;
          }
          // one yield per iteration boundary
          return Ok(());
        }
        FrameMode::Until { .. } => {
          frame.index = 0;
          frame.mode = FrameMode::Until { at_boundary: true };
          return Ok(());
        }
        FrameMode::Forever => {
          frame.index = 0;
          return Ok(());
        }
      }
    }

    let block = &body[frame.index];
    match &block.kind {
      BlockKind::MoveSteps => {
        let steps = block.num_input(0, 10.0);
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        let radians = (sprite.direction - 90.0).to_radians();
        sprite.x += radians.cos() * steps;
        sprite.y += radians.sin() * steps;
        advance(thread);
        return Ok(());
      }
      BlockKind::TurnRight => {
        let degrees = block.num_input(0, 15.0);
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        sprite.direction = (sprite.direction + degrees) % 360.0;
        advance(thread);
        return Ok(());
      }
      BlockKind::TurnLeft => {
        let degrees = block.num_input(0, 15.0);
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        sprite.direction = (sprite.direction - degrees + 360.0) % 360.0;
        advance(thread);
        return Ok(());
      }
      BlockKind::GoToXy => {
        let x = block.num_input(0, 0.0);
        let y = block.num_input(1, 0.0);
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        sprite.x = x;
        sprite.y = y;
        advance(thread);
        return Ok(());
      }
      BlockKind::GoToTarget => {
        let target = block.str_input(0, "random position");
        let (mouse_x, mouse_y) = (ctx.stage.input.mouse_x, ctx.stage.input.mouse_y);
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        match target.as_str() {
          "random position" => {
            sprite.x = rand::random_range(-STAGE_WIDTH / 2.0..STAGE_WIDTH / 2.0);
            sprite.y = rand::random_range(-STAGE_HEIGHT / 2.0..STAGE_HEIGHT / 2.0);
          }
          "mouse-pointer" => {
            sprite.x = mouse_x;
            sprite.y = mouse_y;
          }
          _ => {}
        }
        advance(thread);
        return Ok(());
      }
      BlockKind::GlideSecsToXy => {
        let secs = block.num_input(0, 1.0);
        let to = (block.num_input(1, 0.0), block.num_input(2, 0.0));
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        match wait_duration(secs) {
          Some(duration) => {
            thread.pending = Some(Pending::Glide {
              from: (sprite.x, sprite.y),
              to,
              start: ctx.now,
              deadline: ctx.now + duration,
            });
            advance(thread);
            return Ok(());
          }
          None => {
            sprite.x = to.0;
            sprite.y = to.1;
            advance(thread);
          }
        }
      }
      BlockKind::PointInDirection => {
        let degrees = block.num_input(0, 90.0);
        actor_mut(ctx.stage, thread.sprite)?.direction = degrees;
        advance(thread);
        return Ok(());
      }
      BlockKind::PointTowards => {
        let target = block.str_input(0, "mouse-pointer");
        let (tx, ty) = if target == "mouse-pointer" {
          (ctx.stage.input.mouse_x, ctx.stage.input.mouse_y)
        } else {
          (0.0, 0.0)
        };
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        let angle = (ty - sprite.y).atan2(tx - sprite.x);
        sprite.direction = (angle.to_degrees() + 90.0 + 360.0) % 360.0;
        advance(thread);
        return Ok(());
      }
      BlockKind::ChangeX => {
        actor_mut(ctx.stage, thread.sprite)?.x += block.num_input(0, 10.0);
        advance(thread);
        return Ok(());
      }
      BlockKind::SetX => {
        actor_mut(ctx.stage, thread.sprite)?.x = block.num_input(0, 0.0);
        advance(thread);
        return Ok(());
      }
      BlockKind::ChangeY => {
        actor_mut(ctx.stage, thread.sprite)?.y += block.num_input(0, 10.0);
        advance(thread);
        return Ok(());
      }
      BlockKind::SetY => {
        actor_mut(ctx.stage, thread.sprite)?.y = block.num_input(0, 0.0);
        advance(thread);
        return Ok(());
      }
      BlockKind::IfOnEdgeBounce => {
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        let hw = sprite.radius();
        if sprite.x + hw > STAGE_WIDTH / 2.0 {
          sprite.x = STAGE_WIDTH / 2.0 - hw;
          sprite.direction = -sprite.direction;
        }
        if sprite.x - hw < -STAGE_WIDTH / 2.0 {
          sprite.x = -STAGE_WIDTH / 2.0 + hw;
          sprite.direction = -sprite.direction;
        }
        if sprite.y + hw > STAGE_HEIGHT / 2.0 {
          sprite.y = STAGE_HEIGHT / 2.0 - hw;
          sprite.direction = 180.0 - sprite.direction;
        }
        if sprite.y - hw < -STAGE_HEIGHT / 2.0 {
          sprite.y = -STAGE_HEIGHT / 2.0 + hw;
          sprite.direction = 180.0 - sprite.direction;
        }
        sprite.direction = sprite.direction.rem_euclid(360.0);
        advance(thread);
        return Ok(());
      }
      BlockKind::SetRotationStyle => {
        let style = block.str_input(0, "all around");
        if let Some(style) = RotationStyle::from_name(&style) {
          actor_mut(ctx.stage, thread.sprite)?.rotation_style = style;
        }
        advance(thread);
        return Ok(());
      }
      BlockKind::Say => {
        let text = block.str_input(0, "Hello!");
        actor_mut(ctx.stage, thread.sprite)?.say(text);
        advance(thread);
        return Ok(());
      }
      BlockKind::Think => {
        let text = block.str_input(0, "Hmm...");
        actor_mut(ctx.stage, thread.sprite)?.think(text);
        advance(thread);
        return Ok(());
      }
      BlockKind::SayForSecs | BlockKind::ThinkForSecs => {
        let default = if block.kind == BlockKind::SayForSecs {
          "Hello!"
        } else {
          "Hmm..."
        };
        let text = block.str_input(0, default);
        let secs = block.num_input(1, 2.0);
        match wait_duration(secs) {
          Some(duration) => {
            let sprite = actor_mut(ctx.stage, thread.sprite)?;
            if block.kind == BlockKind::SayForSecs {
              sprite.say(text);
            } else {
              sprite.think(text);
            }
            thread.pending = Some(Pending::ClearBubbleAfterWait);
            thread.status = Status::WaitingTimed(ctx.now + duration);
            advance(thread);
            return Ok(());
          }
          None => advance(thread),
        }
      }
      BlockKind::SwitchCostume => {
        let index = block.num_input(0, 0.0).max(0.0) as usize;
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        if sprite.costume_count > 0 {
          sprite.current_costume = index.min(sprite.costume_count - 1);
        }
        advance(thread);
        return Ok(());
      }
      BlockKind::NextCostume => {
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        if sprite.costume_count > 0 {
          sprite.current_costume = (sprite.current_costume + 1) % sprite.costume_count;
        }
        advance(thread);
        return Ok(());
      }
      BlockKind::ChangeSize => {
        actor_mut(ctx.stage, thread.sprite)?.size += block.num_input(0, 10.0);
        advance(thread);
        return Ok(());
      }
      BlockKind::SetSize => {
        actor_mut(ctx.stage, thread.sprite)?.size = block.num_input(0, 100.0);
        advance(thread);
        return Ok(());
      }
      BlockKind::SetEffect => {
        let name = block.str_input(0, "color");
        let value = block.num_input(1, 0.0);
        if let Some(slot) = actor_mut(ctx.stage, thread.sprite)?.effects.by_name_mut(&name) {
          *slot = value;
        }
        advance(thread);
        return Ok(());
      }
      BlockKind::ChangeEffect => {
        let name = block.str_input(0, "color");
        let delta = block.num_input(1, 25.0);
        if let Some(slot) = actor_mut(ctx.stage, thread.sprite)?.effects.by_name_mut(&name) {
          *slot += delta;
        }
        advance(thread);
        return Ok(());
      }
      BlockKind::ClearEffects => {
        actor_mut(ctx.stage, thread.sprite)?.effects.clear();
        advance(thread);
        return Ok(());
      }
      BlockKind::Show => {
        actor_mut(ctx.stage, thread.sprite)?.visible = true;
        advance(thread);
        return Ok(());
      }
      BlockKind::Hide => {
        actor_mut(ctx.stage, thread.sprite)?.visible = false;
        advance(thread);
        return Ok(());
      }
      BlockKind::Broadcast => {
        let message = block.str_input(0, "message1");
        ctx.actions.push(Action::Broadcast(message));
        advance(thread);
        return Ok(());
      }
      BlockKind::BroadcastAndWait => {
        let message = block.str_input(0, "message1");
        ctx.actions.push(Action::Broadcast(message));
        // fixed two-tick delay, not completion tracking of the receivers
        thread.pending = Some(Pending::Ticks(1));
        advance(thread);
        return Ok(());
      }
      BlockKind::WaitSecs => {
        let secs = block.num_input(0, 1.0);
        match wait_duration(secs) {
          Some(duration) => {
            thread.status = Status::WaitingTimed(ctx.now + duration);
            advance(thread);
            return Ok(());
          }
          None => advance(thread),
        }
      }
      BlockKind::Repeat => {
        let times = block.num_input(0, 10.0).ceil();
        if times >= 1.0 {
          thread.frames.push(Frame {
            body: BodySel::Inner,
            index: 0,
            mode: FrameMode::Repeat {
              remaining: times.min(u32::MAX as f64) as u32,
            },
          });
        } else {
          advance(thread);
        }
      }
      BlockKind::Forever => {
        thread.frames.push(Frame {
          body: BodySel::Inner,
          index: 0,
          mode: FrameMode::Forever,
        });
      }
      BlockKind::If => {
        if eval_condition(block, ctx.stage, thread.sprite) {
          thread.frames.push(Frame {
            body: BodySel::Inner,
            index: 0,
            mode: FrameMode::Branch,
          });
        } else {
          advance(thread);
          return Ok(());
        }
      }
      BlockKind::IfElse => {
        let body = if eval_condition(block, ctx.stage, thread.sprite) {
          BodySel::Inner
        } else {
          BodySel::Else
        };
        thread.frames.push(Frame {
          body,
          index: 0,
          mode: FrameMode::Branch,
        });
      }
      BlockKind::WaitUntil => {
        if eval_condition(block, ctx.stage, thread.sprite) {
          advance(thread);
        } else {
          // stay on this block and re-evaluate next tick
          return Ok(());
        }
      }
      BlockKind::RepeatUntil => {
        if eval_condition(block, ctx.stage, thread.sprite) {
          advance(thread);
        } else {
          thread.frames.push(Frame {
            body: BodySel::Inner,
            index: 0,
            mode: FrameMode::Until { at_boundary: false },
          });
        }
      }
      BlockKind::Stop => {
        let what = block.str_input(0, "all");
        match what.as_str() {
          "all" => {
            ctx.actions.push(Action::StopAll);
            thread.status = Status::Done;
            return Ok(());
          }
          "this script" => {
            thread.status = Status::Done;
            return Ok(());
          }
          "other scripts in sprite" => {
            ctx.actions.push(Action::StopOtherScripts {
              sprite: thread.sprite,
              keep: thread.id,
            });
            advance(thread);
            return Ok(());
          }
          _ => advance(thread),
        }
      }
      BlockKind::CreateClone => {
        ctx.actions.push(Action::CreateClone(thread.sprite));
        advance(thread);
        return Ok(());
      }
      BlockKind::DeleteClone => {
        ctx.actions.push(Action::DeleteSprite(thread.sprite));
        thread.status = Status::Done;
        return Ok(());
      }
      BlockKind::AskAndWait => {
        let question = block.str_input(0, "What's your name?");
        thread.pending = Some(Pending::Ask(question));
        thread.status = Status::WaitingExternal;
        advance(thread);
        return Ok(());
      }
      BlockKind::ResetTimer => {
        ctx.shared.timer_epoch = ctx.now;
        advance(thread);
        return Ok(());
      }
      BlockKind::SetDragMode => {
        let mode = block.str_input(0, "draggable");
        actor_mut(ctx.stage, thread.sprite)?.draggable = mode == "draggable";
        advance(thread);
        return Ok(());
      }
      BlockKind::SetVariable => {
        let name = block.str_input(0, "my variable");
        let value = Value::from_literal(
          block
            .raw_input(1)
            .cloned()
            .unwrap_or_else(|| Value::String("0".to_string())),
        );
        crate::variables::set(actor_mut(ctx.stage, thread.sprite)?, &name, value);
        advance(thread);
        return Ok(());
      }
      BlockKind::ChangeVariable => {
        let name = block.str_input(0, "my variable");
        let delta = block.num_input(1, 1.0);
        let sprite = actor_mut(ctx.stage, thread.sprite)?;
        crate::variables::change(sprite, &ctx.shared.globals, &name, delta);
        advance(thread);
        return Ok(());
      }
      BlockKind::ShowVariable | BlockKind::HideVariable => {
        // on-stage variable displays live outside this core
        advance(thread);
        return Ok(());
      }
      BlockKind::WhenFlagClicked
      | BlockKind::WhenKeyPressed
      | BlockKind::WhenSpriteClicked
      | BlockKind::WhenBackdropSwitches
      | BlockKind::WhenGreaterThan
      | BlockKind::WhenMessageReceived
      | BlockKind::WhenCloneStarts => {
        // hats only act as triggers at the script head
        advance(thread);
      }
      BlockKind::Unknown(name) => {
        log::debug!("{}: skipping unknown block kind {name:?}", thread.id);
        advance(thread);
        return Ok(());
      }
    }
  }
}

/// Resumes suspension state left by an earlier step. Returns true when the
/// thread yields again without reaching a new block.
fn service_pending(thread: &mut Thread, ctx: &mut StepCtx) -> Result<bool, ThreadError> {
  match thread.pending.take() {
    Some(Pending::ClearBubbleAfterWait) => {
      actor_mut(ctx.stage, thread.sprite)?.bubble = None;
      Ok(false)
    }
    Some(Pending::Glide {
      from,
      to,
      start,
      deadline,
    }) => {
      let now = ctx.now;
      let sprite = actor_mut(ctx.stage, thread.sprite)?;
      if now >= deadline {
        // snap exactly to the target on completion
        sprite.x = to.0;
        sprite.y = to.1;
        Ok(false)
      } else {
        let total = deadline.duration_since(start).as_secs_f64();
        let elapsed = now.duration_since(start).as_secs_f64();
        let t = if total > 0.0 { elapsed / total } else { 1.0 };
        sprite.x = from.0 + (to.0 - from.0) * t;
        sprite.y = from.1 + (to.1 - from.1) * t;
        thread.pending = Some(Pending::Glide {
          from,
          to,
          start,
          deadline,
        });
        Ok(true)
      }
    }
    Some(Pending::Ticks(ticks)) if ticks > 0 => {
      thread.pending = Some(Pending::Ticks(ticks - 1));
      Ok(true)
    }
    Some(Pending::Ticks(_)) | Some(Pending::Ask(_)) | None => Ok(false),
  }
}

fn eval_condition(block: &Block, stage: &Stage, sprite: SpriteId) -> bool {
  block
    .condition
    .as_ref()
    .map(|cond| condition::evaluate(cond, stage, sprite))
    .unwrap_or(false)
}

fn actor_mut(stage: &mut Stage, id: SpriteId) -> Result<&mut Sprite, ThreadError> {
  stage.get_mut(id).ok_or(ThreadError::DanglingActor(id))
}

fn advance(thread: &mut Thread) {
  if let Some(frame) = thread.frames.last_mut() {
    frame.index += 1;
  }
}

/// Walks the frame stack down the block tree to the body the last frame
/// cursors over.
fn body_for<'s>(script: &'s Script, frames: &[Frame]) -> Result<&'s [Block], ThreadError> {
  let mut body: &[Block] = &script.blocks;
  for pair in frames.windows(2) {
    let parent = body.get(pair[0].index).ok_or(ThreadError::BadCursor)?;
    body = match pair[1].body {
      BodySel::Inner => &parent.body,
      BodySel::Else => &parent.else_body,
      BodySel::Main => return Err(ThreadError::BadCursor),
    };
  }
  Ok(body)
}

/// The c-block owning the last frame's body.
fn enclosing_block<'s>(script: &'s Script, frames: &[Frame]) -> Result<&'s Block, ThreadError> {
  if frames.len() < 2 {
    return Err(ThreadError::BadCursor);
  }
  let body = body_for(script, &frames[..frames.len() - 1])?;
  body
    .get(frames[frames.len() - 2].index)
    .ok_or(ThreadError::BadCursor)
}

fn wait_duration(secs: f64) -> Option<Duration> {
  Duration::try_from_secs_f64(secs)
    .ok()
    .filter(|duration| !duration.is_zero())
}
