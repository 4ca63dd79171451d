//! In-memory output sink

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// A cloneable `Write` whose clones share one buffer, so output handed to an
/// [`Interpreter`](super::Interpreter) can be read back afterwards
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    /// Drain the buffer, returning what it held
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_contents() {
        let buffer = SharedBuffer::new();
        let mut writer = buffer.clone();
        write!(writer, "hello {}", 1).unwrap();
        assert_eq!(buffer.contents(), "hello 1");
        assert_eq!(buffer.take(), "hello 1");
        assert_eq!(buffer.contents(), "");
    }
}
