use super::*;

/// Cloneable stop signal for a running [`Engine`].
///
/// Once fired, [`Engine::process`] refuses new events and [`Engine::run`]
/// returns at the next record boundary.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shutdown(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            info!("shutdown requested");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
