//! Memory-mapped console and keyboard devices. Both live at fixed
//! addresses above the 32-bit span any assembled program would
//! ordinarily reach, and are polled through ordinary `ld`/`st`
//! instructions rather than interrupts.

pub const CONSOLE_DATA: u32 = 0xFFFF_0000;
pub const CONSOLE_STATUS: u32 = 0xFFFF_0004;
pub const KEYBOARD_DATA: u32 = 0xFFFF_0008;
pub const KEYBOARD_STATUS: u32 = 0xFFFF_000C;

const READY: u32 = 0x8000_0000;
const BUSY: u32 = 0x0000_0000;

/// How many status polls a console write stays busy for before a
/// program sees `READY` again.
const CONSOLE_BUSY_POLLS: u32 = 8;

pub struct Devices {
    console_busy: u32,
    keyboard_data: u32,
    keyboard_ready: bool,
    on_console_write: Option<Box<dyn FnMut(u8)>>,
}

impl Devices {
    pub fn new() -> Devices {
        Devices {
            console_busy: 0,
            keyboard_data: 0,
            keyboard_ready: false,
            on_console_write: None,
        }
    }

    /// Registers the host callback invoked with every byte written to
    /// `CONSOLE_DATA`. `arc-cli` uses this to flush to stdout.
    pub fn on_console_write(&mut self, callback: impl FnMut(u8) + 'static) {
        self.on_console_write = Some(Box::new(callback));
    }

    /// Delivers a keystroke from the host, making it visible at
    /// `KEYBOARD_DATA` with `KEYBOARD_STATUS` reporting ready. The byte
    /// lands in the high byte of the word, matching the low-memory-address
    /// byte of a big-endian word.
    pub fn deliver_keystroke(&mut self, byte: u8) {
        self.keyboard_data = (byte as u32) << 24;
        self.keyboard_ready = true;
    }

    pub fn is_mapped(&self, addr: u32) -> bool {
        matches!(addr, CONSOLE_DATA | CONSOLE_STATUS | KEYBOARD_DATA | KEYBOARD_STATUS)
    }

    pub fn read(&mut self, addr: u32) -> Option<u32> {
        match addr {
            CONSOLE_DATA => Some(0),
            CONSOLE_STATUS => Some(if self.console_busy > 0 { BUSY } else { READY }),
            KEYBOARD_DATA => {
                self.keyboard_ready = false;
                Some(self.keyboard_data)
            }
            KEYBOARD_STATUS => Some(if self.keyboard_ready { READY } else { BUSY }),
            _ => None,
        }
    }

    /// Advances the console busy counter by one executed instruction.
    /// Called once per [`crate::simulator::Simulator`] step, before fetch,
    /// per the ordering guarantee that the busy counter advances strictly
    /// on executed instructions rather than on status polls.
    pub fn tick(&mut self) {
        if self.console_busy > 0 {
            self.console_busy -= 1;
        }
    }

    /// Returns `true` if `addr` was a device register (whether or not
    /// the write had any effect), `false` if the caller should fall
    /// through to ordinary memory.
    pub fn write(&mut self, addr: u32, value: u32) -> bool {
        match addr {
            CONSOLE_DATA => {
                if self.console_busy == 0 {
                    if let Some(callback) = &mut self.on_console_write {
                        callback((value >> 24) as u8);
                    }
                    self.console_busy = CONSOLE_BUSY_POLLS;
                }
                true
            }
            CONSOLE_STATUS | KEYBOARD_DATA | KEYBOARD_STATUS => true,
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.console_busy = 0;
        self.keyboard_data = 0;
        self.keyboard_ready = false;
    }
}

impl Default for Devices {
    fn default() -> Devices {
        Devices::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn console_reports_busy_for_a_handful_of_ticks_after_a_write() {
        let mut devices = Devices::new();
        devices.write(CONSOLE_DATA, (b'A' as u32) << 24);
        assert_eq!(devices.read(CONSOLE_STATUS), Some(BUSY));
        for _ in 0..CONSOLE_BUSY_POLLS {
            devices.tick();
        }
        assert_eq!(devices.read(CONSOLE_STATUS), Some(READY));
    }

    #[test]
    fn polling_status_without_ticking_does_not_advance_the_counter() {
        let mut devices = Devices::new();
        devices.write(CONSOLE_DATA, (b'A' as u32) << 24);
        for _ in 0..CONSOLE_BUSY_POLLS {
            assert_eq!(devices.read(CONSOLE_STATUS), Some(BUSY));
        }
    }

    #[test]
    fn console_write_invokes_the_host_callback_with_the_high_byte() {
        let mut devices = Devices::new();
        let written = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = written.clone();
        devices.on_console_write(move |byte| sink.borrow_mut().push(byte));
        devices.write(CONSOLE_DATA, (b'X' as u32) << 24);
        assert_eq!(*written.borrow(), vec![b'X']);
    }

    #[test]
    fn a_write_while_busy_is_accepted_but_does_not_re_emit_or_reset_the_timer() {
        let mut devices = Devices::new();
        let written = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = written.clone();
        devices.on_console_write(move |byte| sink.borrow_mut().push(byte));
        devices.write(CONSOLE_DATA, (b'A' as u32) << 24);
        for _ in 0..CONSOLE_BUSY_POLLS - 1 {
            devices.tick();
        }
        devices.write(CONSOLE_DATA, (b'B' as u32) << 24);
        assert_eq!(*written.borrow(), vec![b'A']);
        devices.tick();
        assert_eq!(devices.read(CONSOLE_STATUS), Some(READY));
    }

    #[test]
    fn keyboard_starts_not_ready_and_clears_after_read() {
        let mut devices = Devices::new();
        assert_eq!(devices.read(KEYBOARD_STATUS), Some(BUSY));
        devices.deliver_keystroke(b'q');
        assert_eq!(devices.read(KEYBOARD_STATUS), Some(READY));
        assert_eq!(devices.read(KEYBOARD_DATA), Some((b'q' as u32) << 24));
        assert_eq!(devices.read(KEYBOARD_STATUS), Some(BUSY));
    }
}
