use crate::block::{Block, BlockKind};
use crate::sprite::SpriteId;

/// A triggering event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
  ProgramStart,
  SpriteClicked(SpriteId),
  KeyPressed(String),
  Message(String),
  CloneStart(SpriteId),
}

impl Event {
  /// Events scoped to a single actor; the rest address every actor.
  pub fn scope(&self) -> Option<SpriteId> {
    match self {
      Event::SpriteClicked(id) | Event::CloneStart(id) => Some(*id),
      _ => None,
    }
  }
}

/// Does this event fire the given leading Hat block?
pub fn matches(event: &Event, hat: &Block) -> bool {
  match (event, &hat.kind) {
    (Event::ProgramStart, BlockKind::WhenFlagClicked) => true,
    (Event::SpriteClicked(_), BlockKind::WhenSpriteClicked) => true,
    (Event::KeyPressed(key), BlockKind::WhenKeyPressed) => {
      let configured = hat.str_input(0, "space");
      configured == "any" || configured == *key
    }
    (Event::Message(name), BlockKind::WhenMessageReceived) => {
      hat.str_input(0, "message1") == *name
    }
    (Event::CloneStart(_), BlockKind::WhenCloneStarts) => true,
    _ => false,
  }
}
