use crate::{Error, ErrorKind};

/// Forward only cursor over decompressed replay data
///
/// All multi-byte values are little endian. Reads that would run past the end
/// of the data fail with [`ErrorKind::Eof`] and leave the cursor untouched.
///
/// ```rust
/// use fafreplay::ReplayReader;
/// let data = [0x07, 0x00, b'u', b'e', b'f', 0x00, 0xff];
/// let mut reader = ReplayReader::new(&data[..]);
/// assert_eq!(reader.read_i16()?, 7);
/// assert_eq!(reader.read_cstr()?, &b"uef"[..]);
/// assert_eq!(reader.position(), 6);
/// assert_eq!(reader.remaining(), 1);
/// assert!(reader.read_i32().is_err());
/// # Ok::<(), fafreplay::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReplayReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ReplayReader<'a> {
    /// Creates a cursor at the start of the data
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        ReplayReader::with_position(data, 0)
    }

    /// Creates a cursor that resumes at a previously recorded position
    #[inline]
    pub fn with_position(data: &'a [u8], position: usize) -> Self {
        ReplayReader {
            data,
            position: position.min(data.len()),
        }
    }

    /// Byte offset of the next read
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total length of the underlying data
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes left to read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns true once every byte has been consumed
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    #[cold]
    #[inline(never)]
    fn eof(&self) -> Error {
        Error::new(ErrorKind::Eof {
            offset: self.position,
        })
    }

    /// Advance a given number of bytes and return them
    #[inline]
    pub fn read_bytes(&mut self, bytes: usize) -> Result<&'a [u8], Error> {
        let data = self.data;
        let end = self.position.checked_add(bytes).ok_or_else(|| self.eof())?;
        let result = data.get(self.position..end).ok_or_else(|| self.eof())?;
        self.position = end;
        Ok(result)
    }

    /// Advance a given number of bytes without looking at them
    #[inline]
    pub fn skip(&mut self, bytes: usize) -> Result<(), Error> {
        self.read_bytes(bytes).map(|_| ())
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let data = self.data;
        let head: &[u8; N] = data[self.position..]
            .first_chunk()
            .ok_or_else(|| self.eof())?;
        self.position += N;
        Ok(*head)
    }

    /// Look at the next byte without consuming it
    #[inline]
    pub fn peek_u8(&self) -> Result<u8, Error> {
        self.data.get(self.position).copied().ok_or_else(|| self.eof())
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.read_array::<1>().map(|[x]| x)
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16, Error> {
        self.read_array().map(i16::from_le_bytes)
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, Error> {
        self.read_array().map(i32::from_le_bytes)
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64, Error> {
        self.read_array().map(i64::from_le_bytes)
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32, Error> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read bytes up to the next zero byte. The terminator is consumed but not
    /// included in the result.
    #[inline]
    pub fn read_cstr(&mut self) -> Result<&'a [u8], Error> {
        let data = self.data;
        let rest = &data[self.position..];
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| self.eof())?;
        self.position += len + 1;
        Ok(&rest[..len])
    }

    /// Read a null terminated string, replacing invalid UTF-8 sequences
    #[inline]
    pub fn read_string(&mut self) -> Result<String, Error> {
        self.read_cstr()
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }
}
