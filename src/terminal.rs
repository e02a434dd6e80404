//! Cbreak terminal mode with restoration on every exit path.
//!
//! [`CbreakGuard`] switches stdin to unbuffered, non-echoing input and puts
//! the original mode back when dropped. A panic hook and a Ctrl+C handler
//! restore the mode too, since neither unwinds through the guard.

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

/// Errors that can occur when changing the terminal mode.
#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("Failed to read terminal attributes: {0}")]
    GetAttr(#[source] std::io::Error),
    #[error("Failed to set terminal attributes: {0}")]
    SetAttr(#[source] std::io::Error),
    #[error("Failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Exit status used when the console is interrupted by Ctrl+C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Static flag to track if cbreak mode is active (for panic and signal handlers)
pub(crate) static CBREAK_ACTIVE: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
mod sys {
    use std::io;
    use std::sync::Mutex;

    /// Terminal attributes saved on entry, restored by every exit path.
    static SAVED: Mutex<Option<libc::termios>> = Mutex::new(None);

    pub fn stdin_is_tty() -> bool {
        unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
    }

    pub fn get() -> io::Result<libc::termios> {
        let mut attrs = std::mem::MaybeUninit::<libc::termios>::uninit();
        let rc = unsafe { libc::tcgetattr(libc::STDIN_FILENO, attrs.as_mut_ptr()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(unsafe { attrs.assume_init() })
    }

    pub fn set(attrs: &libc::termios) -> io::Result<()> {
        let rc = unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, attrs) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Like `tty.setcbreak`: no line buffering, no echo, signals still on.
    pub fn cbreak(mut attrs: libc::termios) -> libc::termios {
        attrs.c_lflag &= !(libc::ICANON | libc::ECHO);
        attrs.c_cc[libc::VMIN] = 1;
        attrs.c_cc[libc::VTIME] = 0;
        attrs
    }

    pub fn save(attrs: libc::termios) {
        if let Ok(mut saved) = SAVED.lock() {
            *saved = Some(attrs);
        }
    }

    /// Put the saved attributes back. Returns whether anything was restored.
    pub fn restore() -> io::Result<bool> {
        let saved = match SAVED.lock() {
            Ok(mut saved) => saved.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match saved {
            Some(attrs) => set(&attrs).map(|_| true),
            None => Ok(false),
        }
    }
}

/// Guard that keeps stdin in cbreak mode until dropped.
///
/// When stdin is not a terminal the guard does nothing, so key scripts can be
/// piped in.
pub struct CbreakGuard {
    /// Whether this guard is responsible for cleanup
    active: bool,
}

impl CbreakGuard {
    /// Enter cbreak mode and return a guard that will restore it on drop.
    ///
    /// Also installs the panic hook and the Ctrl+C handler that restore the
    /// terminal when the guard cannot.
    pub fn enter() -> Result<Self, TerminalError> {
        install_panic_hook();
        install_interrupt_handler()?;

        #[cfg(unix)]
        {
            if !sys::stdin_is_tty() {
                log::debug!("stdin is not a terminal; leaving input mode unchanged");
                return Ok(Self { active: false });
            }

            let original = sys::get().map_err(TerminalError::GetAttr)?;
            sys::save(original);
            sys::set(&sys::cbreak(original)).map_err(TerminalError::SetAttr)?;
            CBREAK_ACTIVE.store(true, Ordering::SeqCst);
            log::debug!("Entered cbreak mode");
            Ok(Self { active: true })
        }

        #[cfg(not(unix))]
        {
            Ok(Self { active: false })
        }
    }

    /// Whether the terminal mode was actually changed.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Manually restore the terminal without dropping the guard.
    /// After calling this, the guard's drop will be a no-op.
    pub fn exit(&mut self) -> Result<(), TerminalError> {
        if self.active {
            self.active = false;
            restore().map_err(TerminalError::SetAttr)?;
        }
        Ok(())
    }
}

impl Drop for CbreakGuard {
    fn drop(&mut self) {
        if self.active {
            // Best-effort cleanup - ignore errors during drop
            let _ = restore();
        }
    }
}

fn restore() -> std::io::Result<()> {
    CBREAK_ACTIVE.store(false, Ordering::SeqCst);
    #[cfg(unix)]
    {
        if sys::restore()? {
            log::debug!("Restored terminal mode");
        }
    }
    Ok(())
}

/// Install a panic hook that restores terminal state before panicking.
pub(crate) fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if CBREAK_ACTIVE.load(Ordering::SeqCst) {
            let _ = restore();
        }
        original_hook(panic_info);
    }));
}

/// Install a Ctrl+C handler that restores the terminal and exits with 130.
///
/// The preview child shares the foreground process group, so it receives
/// the same SIGINT.
fn install_interrupt_handler() -> Result<(), TerminalError> {
    static HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);

    if HANDLER_INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let result = ctrlc::set_handler(|| {
        if CBREAK_ACTIVE.load(Ordering::SeqCst) {
            let _ = restore();
        }
        eprintln!("\nInterrupted, exiting.");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    });
    if result.is_err() {
        HANDLER_INSTALLED.store(false, Ordering::SeqCst);
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cbreak_guard_enter_and_drop() {
        // In CI stdin is usually not a TTY, so the guard is inactive
        match CbreakGuard::enter() {
            Ok(guard) => {
                assert_eq!(guard.is_active(), CBREAK_ACTIVE.load(Ordering::SeqCst));
                drop(guard);
                assert!(!CBREAK_ACTIVE.load(Ordering::SeqCst));
            }
            Err(e) => eprintln!("Skipping test (no terminal): {}", e),
        }
    }

    #[test]
    fn test_cbreak_guard_manual_exit() {
        if let Ok(mut guard) = CbreakGuard::enter() {
            guard.exit().expect("Should restore terminal");
            assert!(!guard.is_active());
            assert!(!CBREAK_ACTIVE.load(Ordering::SeqCst));
            drop(guard);
        }
    }

    #[test]
    fn test_panic_hook_installation() {
        install_panic_hook();
        install_panic_hook(); // Second call should be no-op
    }

    #[cfg(unix)]
    #[test]
    fn test_cbreak_clears_canonical_and_echo() {
        let attrs: libc::termios = unsafe { std::mem::zeroed() };
        let mut attrs = attrs;
        attrs.c_lflag = libc::ICANON | libc::ECHO | libc::ISIG;
        let raw = sys::cbreak(attrs);
        assert_eq!(raw.c_lflag & libc::ICANON, 0);
        assert_eq!(raw.c_lflag & libc::ECHO, 0);
        assert_ne!(raw.c_lflag & libc::ISIG, 0);
        assert_eq!(raw.c_cc[libc::VMIN], 1);
        assert_eq!(raw.c_cc[libc::VTIME], 0);
    }
}
