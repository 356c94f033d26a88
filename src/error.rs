use thiserror::Error;

use crate::sprite::SpriteId;

/// Failures that end a single thread. They never cross the scheduler
/// boundary: the runtime logs them and marks only the failing thread done.
#[derive(Debug, Error)]
pub enum ThreadError {
  #[error("{0} no longer exists")]
  DanglingActor(SpriteId),
  #[error("script {script} missing for {actor}")]
  MissingScript { actor: SpriteId, script: usize },
  #[error("continuation desynchronized from its script")]
  BadCursor,
}
