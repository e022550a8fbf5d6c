use std::fs::File;
use std::io;

use bytes::Bytes;

/// Positional reads over a fixed-size source.
///
/// Reads do not move any shared cursor, so a reader can serve random `get`s while a sequential
/// scan is in progress over the same handle.
pub trait ReadAt {
    /// Fill `buf` from the bytes starting at `pos`.
    ///
    /// If the source does not hold `buf.len()` bytes at `pos`, this fails with
    /// [`UnexpectedEof`][io::ErrorKind::UnexpectedEof].
    fn read_exact_at(&self, buf: &mut [u8], pos: u64) -> io::Result<()>;

    /// The number of readable bytes.
    fn size(&self) -> io::Result<u64>;
}

impl ReadAt for File {
    #[cfg(unix)]
    fn read_exact_at(&self, buf: &mut [u8], pos: u64) -> io::Result<()> {
        std::os::unix::fs::FileExt::read_exact_at(self, buf, pos)
    }

    #[cfg(windows)]
    fn read_exact_at(&self, mut buf: &mut [u8], mut pos: u64) -> io::Result<()> {
        use std::os::windows::fs::FileExt;

        while !buf.is_empty() {
            match self.seek_read(buf, pos) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => {
                    buf = &mut buf[n..];
                    pos += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn size(&self) -> io::Result<u64> {
        self.metadata().map(|metadata| metadata.len())
    }
}

impl ReadAt for Bytes {
    fn read_exact_at(&self, buf: &mut [u8], pos: u64) -> io::Result<()> {
        let start = usize::try_from(pos).map_err(|_| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        let end = start
            .checked_add(buf.len())
            .filter(|end| *end <= self.len())
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        buf.copy_from_slice(&self[start..end]);
        Ok(())
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn bytes_read_at() {
        let bytes = Bytes::from_static(b"0123456789");
        let mut buf = [0u8; 4];
        bytes.read_exact_at(&mut buf, 3).unwrap();
        assert_eq!(&buf, b"3456");
        assert_eq!(
            bytes.read_exact_at(&mut buf, 8).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
        assert_eq!(bytes.size().unwrap(), 10);
    }

    #[test]
    fn file_read_at() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"abcdef").unwrap();
        let mut buf = [0u8; 2];
        file.read_exact_at(&mut buf, 4).unwrap();
        assert_eq!(&buf, b"ef");
        assert!(file.read_exact_at(&mut buf, 5).is_err());
        assert_eq!(ReadAt::size(&file).unwrap(), 6);
    }
}
