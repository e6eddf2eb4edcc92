use std::collections::HashMap;

use thiserror::Error;

use crate::cursor::{Cursor, CursorError};
use crate::framing::Tag;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    #[error("message payload truncated: {0}")]
    Truncated(#[from] CursorError),
    #[error("malformed payload: {0}")]
    Malformed(&'static str),
}

type Handler<S> = Box<dyn FnMut(&mut S, &mut Cursor<'_>) -> Result<(), DispatchError>>;

/// Routes decoded wire messages to registered handlers.
///
/// Handlers are registered per tag; multiple handlers on one tag run in
/// registration order, each over its own cursor spanning the full payload.
/// Tags with no handlers are ignored. The synthetic [`Tag::CONNECT`] and
/// [`Tag::DISCONNECT`] tags are dispatched by the transport with an empty
/// payload and never appear on the wire.
///
/// `S` is the context the handlers mutate, typically a session. Keeping the
/// registry generic lets replay drive the exact same handler set as a live
/// connection.
pub struct Dispatcher<S> {
    handlers: HashMap<Tag, Vec<Handler<S>>>,
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Dispatcher<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn add_handler<F>(&mut self, tag: Tag, handler: F)
    where
        F: FnMut(&mut S, &mut Cursor<'_>) -> Result<(), DispatchError> + 'static,
    {
        self.handlers
            .entry(tag)
            .or_default()
            .push(Box::new(handler));
    }

    pub fn handler_count(&self, tag: Tag) -> usize {
        self.handlers.get(&tag).map_or(0, Vec::len)
    }

    /// Run every handler registered for `tag` over `payload`.
    ///
    /// Stops at the first handler error; an unknown tag is a successful no-op.
    pub fn dispatch(
        &mut self,
        state: &mut S,
        tag: Tag,
        payload: &[u8],
    ) -> Result<(), DispatchError> {
        let Some(handlers) = self.handlers.get_mut(&tag) else {
            return Ok(());
        };
        for handler in handlers {
            let mut cursor = Cursor::new(payload);
            handler(state, &mut cursor)?;
        }
        Ok(())
    }
}
