use maybe_sync::{MaybeSend, MaybeSync};

/// Notifies the host application that the map must be repainted.
pub trait Messenger: MaybeSend + MaybeSync {
    /// Requests a repaint of the map.
    fn request_redraw(&self);
}

impl<T: Fn() + MaybeSend + MaybeSync> Messenger for T {
    fn request_redraw(&self) {
        self()
    }
}
