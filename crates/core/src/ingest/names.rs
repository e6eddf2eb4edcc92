use emberline_wire::{Cursor, DispatchError};

use crate::session::Session;

/// Authoritative sample-name push: `hash:u32, name:string`.
pub(super) fn on_sample_name(
    session: &mut Session,
    cursor: &mut Cursor<'_>,
) -> Result<(), DispatchError> {
    let hash = cursor.read_u32()?;
    let name = cursor.read_string()?;
    session.sample_names.set(hash, &name);
    Ok(())
}

/// Authoritative thread-name push: `hash:u32, length:u32, chars`.
pub(super) fn on_thread_name(
    session: &mut Session,
    cursor: &mut Cursor<'_>,
) -> Result<(), DispatchError> {
    let hash = cursor.read_u32()?;
    let length = cursor.read_u32()? as usize;
    let name = cursor.read_chars(length)?;
    session.thread_names.set(hash, &name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_name_upgrades_placeholder() {
        let mut session = Session::new();
        session.sample_names.get(77);

        let mut payload = 77u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&6u32.to_le_bytes());
        payload.extend_from_slice(b"Render");
        on_sample_name(&mut session, &mut Cursor::new(&payload)).unwrap();

        let name = session.sample_names.lookup(77).unwrap();
        assert_eq!(name.string(), "Render");
        assert!(name.is_resolved());
    }

    #[test]
    fn thread_name_registers() {
        let mut session = Session::new();
        let mut payload = 9u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&4u32.to_le_bytes());
        payload.extend_from_slice(b"Main");
        on_thread_name(&mut session, &mut Cursor::new(&payload)).unwrap();

        assert_eq!(session.thread_names.lookup(9).unwrap().string(), "Main");
    }

    #[test]
    fn name_pushes_apply_even_while_paused() {
        let mut session = Session::new();
        session.on_connected();
        session.pause();

        let mut payload = 1u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&2u32.to_le_bytes());
        payload.extend_from_slice(b"ok");
        on_sample_name(&mut session, &mut Cursor::new(&payload)).unwrap();
        assert_eq!(session.sample_names.len(), 1);
    }
}
