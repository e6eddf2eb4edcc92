//! Wire-message handlers that build session state.
//!
//! Each handler decodes one message kind and folds it into a [`Session`].
//! They are registered on a [`Dispatcher`] so that live delivery and capture
//! replay run the identical decode path.

mod names;
mod processors;
mod properties;
mod samples;

pub use processors::IDLE_THREAD_ID;

use emberline_wire::{Dispatcher, Tag};

use crate::session::Session;

/// Register the standard handler set. Heartbeats need no handler; unknown
/// tags are ignored by the dispatcher itself.
pub fn register_handlers(dispatcher: &mut Dispatcher<Session>) {
    dispatcher.add_handler(Tag::SAMPLE_TREE, samples::on_sample_tree);
    dispatcher.add_handler(Tag::SAMPLE_NAME, names::on_sample_name);
    dispatcher.add_handler(Tag::THREAD_NAME, names::on_thread_name);
    dispatcher.add_handler(Tag::PROCESSOR_THREADS, processors::on_processor_threads);
    dispatcher.add_handler(Tag::PROPERTY_SNAPSHOT, properties::on_property_snapshot);
    dispatcher.add_handler(Tag::CONNECT, |session, _| {
        session.on_connected();
        Ok(())
    });
    dispatcher.add_handler(Tag::DISCONNECT, |session, _| {
        session.on_disconnected();
        Ok(())
    });
}
