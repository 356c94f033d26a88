//! Cooperative runtime for a visual block-scripting language.
//!
//! Scripts are trees of typed blocks bound to stage actors. Each script run
//! is a green thread holding an explicit continuation; a single-threaded
//! scheduler advances every thread by at most one suspension point per tick,
//! so a malformed script can never stall or crash the runtime.

pub mod block;
pub mod condition;
pub mod error;
pub mod event;
pub mod interp;
pub mod runtime;
pub mod script;
pub mod sprite;
pub mod stage;
pub mod thread;
pub mod variables;

pub use block::{Block, BlockKind, Value};
pub use condition::Condition;
pub use error::ThreadError;
pub use event::Event;
pub use runtime::{Runtime, SharedState};
pub use script::{Script, ScriptStore};
pub use sprite::{Sprite, SpriteId};
pub use stage::{Stage, STAGE_HEIGHT, STAGE_WIDTH};
pub use thread::{Status, Thread, ThreadId};
