//! Output sink: the minimal capability set a destination must offer
//!. Callers may supply an in-memory
//! buffer, a file handle, or a pipe — anything implementing `std::io::Write`
//! gets this for free via the blanket impl below.

use crate::error::Error;

pub trait Sink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error>;
    fn finish(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

impl<W: std::io::Write> Sink for W {
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        std::io::Write::write_all(self, bytes).map_err(Error::Io)
    }
}

/// An in-memory sink, used when the caller wants one contiguous allocation
/// back rather than driving a `Write` impl directly.
#[derive(Debug, Default)]
pub struct VecSink(pub Vec<u8>);

impl Sink for VecSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.0.extend_from_slice(bytes);
        Ok(())
    }
}
