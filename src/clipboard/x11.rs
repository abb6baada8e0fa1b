use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xfixes::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{self, ConnectionExt as _};
use x11rb::rust_connection::RustConnection;

use super::ClipboardError;
use super::counter::EventCounter;

/// Delay between event queue checks when the queue is empty
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Counts CLIPBOARD ownership changes reported by XFixes
///
/// Every copy sets the selection owner again, even when the content is the
/// same, so each copy advances the counter exactly once. Wayland sessions
/// are covered through Xwayland, which mirrors the Wayland selection.
pub struct SelectionListener {
    running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl SelectionListener {
    /// Connect to `$DISPLAY` and start counting into `counter`
    pub fn spawn(counter: Arc<EventCounter>) -> Result<Self, ClipboardError> {
        let connection = connect()?;
        let running = Arc::new(AtomicBool::new(true));

        let thread = {
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("clipwatch-x11".to_string())
                .spawn(move || run(&connection, &running, &counter))
                .map_err(ClipboardError::backend)?
        };

        log::info!("Counting clipboard changes through XFixes");
        Ok(SelectionListener {
            running,
            thread: Some(thread),
        })
    }
}

impl Drop for SelectionListener {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn connect() -> Result<RustConnection, ClipboardError> {
    let (connection, screen_num) = RustConnection::connect(None).map_err(ClipboardError::backend)?;

    let xfixes = connection
        .query_extension(b"XFIXES")
        .map_err(ClipboardError::backend)?
        .reply()
        .map_err(ClipboardError::backend)?;
    if !xfixes.present {
        return Err(ClipboardError::backend("XFIXES extension not present"));
    }
    connection
        .xfixes_query_version(5, 0)
        .map_err(ClipboardError::backend)?
        .reply()
        .map_err(ClipboardError::backend)?;

    let window = connection.generate_id().map_err(ClipboardError::backend)?;
    let screen = &connection.setup().roots[screen_num];
    connection
        .create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            screen.root,
            0,
            0,
            1,
            1,
            0,
            xproto::WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &xproto::CreateWindowAux::default(),
        )
        .map_err(ClipboardError::backend)?;

    let clipboard = connection
        .intern_atom(false, b"CLIPBOARD")
        .map_err(ClipboardError::backend)?
        .reply()
        .map_err(ClipboardError::backend)?
        .atom;
    connection
        .xfixes_select_selection_input(
            window,
            clipboard,
            xfixes::SelectionEventMask::SET_SELECTION_OWNER
                | xfixes::SelectionEventMask::SELECTION_WINDOW_DESTROY
                | xfixes::SelectionEventMask::SELECTION_CLIENT_CLOSE,
        )
        .map_err(ClipboardError::backend)?;
    connection.flush().map_err(ClipboardError::backend)?;

    Ok(connection)
}

fn run(connection: &RustConnection, running: &AtomicBool, counter: &EventCounter) {
    while running.load(Ordering::Acquire) {
        match connection.poll_for_event() {
            Ok(Some(event)) => {
                handle_event(&event, counter);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                log::warn!("Lost X11 connection, clipboard changes are no longer counted: {}", e);
                return;
            }
        }
    }
    log::debug!("Stopped counting XFixes selection events");
}

/// Advance `counter` for selection notifications
/// Returns whether the event was one
fn handle_event(event: &Event, counter: &EventCounter) -> bool {
    match event {
        Event::XfixesSelectionNotify(_) => {
            let count = counter.bump();
            log::trace!("Clipboard owner changed, count {}", count);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_notify_advances_counter() {
        let counter = EventCounter::new();
        let notify = Event::XfixesSelectionNotify(xfixes::SelectionNotifyEvent::default());

        // The same owner copying twice still yields two notifications
        assert!(handle_event(&notify, &counter));
        assert!(handle_event(&notify, &counter));
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_other_events_are_ignored() {
        let counter = EventCounter::new();
        let other = Event::PropertyNotify(xproto::PropertyNotifyEvent::default());

        assert!(!handle_event(&other, &counter));
        assert_eq!(counter.get(), 0);
    }
}
