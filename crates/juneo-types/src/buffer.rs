//! Fixed-length byte buffer and the binary codec built on top of it.
//!
//! `JuneoBuffer` is allocated once at its final size and is written with
//! explicit offsets; writes past the end fail instead of growing the buffer.
//! All integers are big-endian and unsigned. `BufferWriter` and
//! `BufferReader` add a cursor on top of the buffer for the wire codec.

use crate::encoding::{self, DecodingError};
use std::fmt;
use thiserror::Error;

/// Largest buffer the codec can describe with a 4-byte length prefix.
pub const MAX_BUFFER_LENGTH: usize = u32::MAX as usize;

/// Errors raised by buffer reads, writes and wire decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
	/// The requested length cannot be represented on the wire.
	#[error("Invalid buffer length: {0}")]
	InvalidLength(usize),
	/// A read or write touched bytes past the end of the buffer.
	#[error("Out of bounds: {width} bytes at offset {offset} exceed buffer length {length}")]
	OutOfBounds {
		offset: usize,
		width: usize,
		length: usize,
	},
	/// A type id did not match any known variant.
	#[error("Unknown type id {type_id} for {context}")]
	UnknownTypeId {
		type_id: u32,
		context: &'static str,
	},
	/// Wire bytes were structurally invalid.
	#[error("Invalid data: {0}")]
	InvalidData(String),
}

/// Owned, fixed-length byte sequence with offset-addressed reads and writes.
///
/// Ordering is byte-lexicographic, which is the order the network expects
/// for sorted outputs and addresses.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JuneoBuffer {
	bytes: Vec<u8>,
}

impl JuneoBuffer {
	/// Allocates a zero-filled buffer of exactly `length` bytes.
	pub fn alloc(length: usize) -> Result<Self, CodecError> {
		if length > MAX_BUFFER_LENGTH {
			return Err(CodecError::InvalidLength(length));
		}
		Ok(Self {
			bytes: vec![0u8; length],
		})
	}

	/// Wraps existing bytes without copying.
	pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
		Self {
			bytes: bytes.into(),
		}
	}

	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes
	}

	fn check_bounds(&self, offset: usize, width: usize) -> Result<usize, CodecError> {
		offset
			.checked_add(width)
			.filter(|end| *end <= self.bytes.len())
			.ok_or(CodecError::OutOfBounds {
				offset,
				width,
				length: self.bytes.len(),
			})
	}

	/// Copies `data` at `offset` and returns the offset just past it.
	pub fn write_bytes(&mut self, data: &[u8], offset: usize) -> Result<usize, CodecError> {
		let end = self.check_bounds(offset, data.len())?;
		self.bytes[offset..end].copy_from_slice(data);
		Ok(end)
	}

	pub fn write_u8(&mut self, value: u8, offset: usize) -> Result<usize, CodecError> {
		self.write_bytes(&[value], offset)
	}

	pub fn write_u16(&mut self, value: u16, offset: usize) -> Result<usize, CodecError> {
		self.write_bytes(&value.to_be_bytes(), offset)
	}

	pub fn write_u32(&mut self, value: u32, offset: usize) -> Result<usize, CodecError> {
		self.write_bytes(&value.to_be_bytes(), offset)
	}

	pub fn write_u64(&mut self, value: u64, offset: usize) -> Result<usize, CodecError> {
		self.write_bytes(&value.to_be_bytes(), offset)
	}

	/// Writes the raw UTF-8 bytes of `text`. No length prefix is added.
	pub fn write_string(&mut self, text: &str, offset: usize) -> Result<usize, CodecError> {
		self.write_bytes(text.as_bytes(), offset)
	}

	/// Borrows exactly `length` bytes starting at `offset`.
	pub fn read_bytes(&self, offset: usize, length: usize) -> Result<&[u8], CodecError> {
		let end = self.check_bounds(offset, length)?;
		Ok(&self.bytes[offset..end])
	}

	fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], CodecError> {
		let mut array = [0u8; N];
		array.copy_from_slice(self.read_bytes(offset, N)?);
		Ok(array)
	}

	pub fn read_u8(&self, offset: usize) -> Result<u8, CodecError> {
		Ok(self.read_array::<1>(offset)?[0])
	}

	pub fn read_u16(&self, offset: usize) -> Result<u16, CodecError> {
		Ok(u16::from_be_bytes(self.read_array(offset)?))
	}

	pub fn read_u32(&self, offset: usize) -> Result<u32, CodecError> {
		Ok(u32::from_be_bytes(self.read_array(offset)?))
	}

	pub fn read_u64(&self, offset: usize) -> Result<u64, CodecError> {
		Ok(u64::from_be_bytes(self.read_array(offset)?))
	}

	/// Reads up to `length` bytes from `start` as text.
	///
	/// Reads past the end are clamped to the available bytes and a negative
	/// `start` yields an empty string. Invalid UTF-8 is replaced lossily.
	pub fn read_string(&self, start: isize, length: usize) -> String {
		let Ok(start) = usize::try_from(start) else {
			return String::new();
		};
		let start = start.min(self.bytes.len());
		let end = start.saturating_add(length).min(self.bytes.len());
		String::from_utf8_lossy(&self.bytes[start..end]).into_owned()
	}

	/// Copies the half-open range `start..end` into a new buffer.
	pub fn copy_of(&self, start: usize, end: usize) -> Result<JuneoBuffer, CodecError> {
		let width = end.checked_sub(start).ok_or(CodecError::OutOfBounds {
			offset: start,
			width: 0,
			length: self.bytes.len(),
		})?;
		Ok(Self::from_bytes(self.read_bytes(start, width)?))
	}

	/// Concatenates buffers in argument order.
	pub fn concat(buffers: &[JuneoBuffer]) -> Result<JuneoBuffer, CodecError> {
		let length = buffers.iter().map(JuneoBuffer::len).sum();
		let mut result = Self::alloc(length)?;
		let mut offset = 0;
		for buffer in buffers {
			offset = result.write_bytes(buffer.as_bytes(), offset)?;
		}
		Ok(result)
	}

	/// Lowercase hex without a `0x` prefix.
	pub fn to_hex(&self) -> String {
		encoding::encode_hex(&self.bytes)
	}

	pub fn to_cb58(&self) -> String {
		encoding::encode_cb58(&self.bytes)
	}

	/// Plain base58 without the checksum suffix.
	pub fn to_base58(&self) -> String {
		encoding::encode_base58(&self.bytes)
	}

	pub fn from_hex(text: &str) -> Result<Self, DecodingError> {
		encoding::decode_hex(text).map(Self::from_bytes)
	}

	pub fn from_cb58(text: &str) -> Result<Self, DecodingError> {
		encoding::decode_cb58(text).map(Self::from_bytes)
	}
}

impl fmt::Debug for JuneoBuffer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "JuneoBuffer(0x{})", self.to_hex())
	}
}

impl AsRef<[u8]> for JuneoBuffer {
	fn as_ref(&self) -> &[u8] {
		&self.bytes
	}
}

impl From<Vec<u8>> for JuneoBuffer {
	fn from(bytes: Vec<u8>) -> Self {
		Self::from_bytes(bytes)
	}
}

/// Cursor over a `JuneoBuffer` used by the wire codec.
///
/// A writer created with [`BufferWriter::sizing`] has no buffer and only
/// counts bytes, which lets serialization allocate the exact size first.
pub struct BufferWriter {
	buffer: Option<JuneoBuffer>,
	offset: usize,
}

impl BufferWriter {
	pub fn new(buffer: JuneoBuffer) -> Self {
		Self {
			buffer: Some(buffer),
			offset: 0,
		}
	}

	/// Creates a counting writer that records sizes without storing bytes.
	pub fn sizing() -> Self {
		Self {
			buffer: None,
			offset: 0,
		}
	}

	pub fn offset(&self) -> usize {
		self.offset
	}

	pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), CodecError> {
		self.offset = match self.buffer.as_mut() {
			Some(buffer) => buffer.write_bytes(data, self.offset)?,
			None => self.offset + data.len(),
		};
		Ok(())
	}

	pub fn write_u8(&mut self, value: u8) -> Result<(), CodecError> {
		self.write_bytes(&[value])
	}

	pub fn write_u16(&mut self, value: u16) -> Result<(), CodecError> {
		self.write_bytes(&value.to_be_bytes())
	}

	pub fn write_u32(&mut self, value: u32) -> Result<(), CodecError> {
		self.write_bytes(&value.to_be_bytes())
	}

	pub fn write_u64(&mut self, value: u64) -> Result<(), CodecError> {
		self.write_bytes(&value.to_be_bytes())
	}

	/// Writes a collection length as a 4-byte count.
	pub fn write_len(&mut self, length: usize) -> Result<(), CodecError> {
		let length = u32::try_from(length).map_err(|_| CodecError::InvalidLength(length))?;
		self.write_u32(length)
	}

	/// Writes bytes preceded by their 4-byte length.
	pub fn write_sized_bytes(&mut self, data: &[u8]) -> Result<(), CodecError> {
		self.write_len(data.len())?;
		self.write_bytes(data)
	}

	/// Writes a count followed by each item in the order supplied.
	pub fn write_list<T: Serializable>(&mut self, items: &[T]) -> Result<(), CodecError> {
		self.write_len(items.len())?;
		for item in items {
			item.write_to(self)?;
		}
		Ok(())
	}

	/// Returns the filled buffer, failing if it was not written to the end.
	pub fn finish(self) -> Result<JuneoBuffer, CodecError> {
		match self.buffer {
			Some(buffer) if buffer.len() == self.offset => Ok(buffer),
			Some(buffer) => Err(CodecError::InvalidData(format!(
				"wrote {} of {} allocated bytes",
				self.offset,
				buffer.len()
			))),
			None => Err(CodecError::InvalidData(
				"sizing writer holds no buffer".to_string(),
			)),
		}
	}
}

/// Types with a canonical wire encoding.
pub trait Serializable {
	/// Writes the wire encoding at the writer's cursor.
	fn write_to(&self, writer: &mut BufferWriter) -> Result<(), CodecError>;

	/// Serializes into a buffer of exactly the encoded size.
	fn serialize(&self) -> Result<JuneoBuffer, CodecError> {
		let mut sizer = BufferWriter::sizing();
		self.write_to(&mut sizer)?;
		let mut writer = BufferWriter::new(JuneoBuffer::alloc(sizer.offset())?);
		self.write_to(&mut writer)?;
		writer.finish()
	}
}

/// Cursor-based reader over a `JuneoBuffer`.
pub struct BufferReader<'a> {
	buffer: &'a JuneoBuffer,
	offset: usize,
}

impl<'a> BufferReader<'a> {
	pub fn new(buffer: &'a JuneoBuffer) -> Self {
		Self { buffer, offset: 0 }
	}

	pub fn offset(&self) -> usize {
		self.offset
	}

	pub fn remaining(&self) -> usize {
		self.buffer.len().saturating_sub(self.offset)
	}

	pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8], CodecError> {
		let bytes = self.buffer.read_bytes(self.offset, length)?;
		self.offset += length;
		Ok(bytes)
	}

	pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
		let mut array = [0u8; N];
		array.copy_from_slice(self.read_bytes(N)?);
		Ok(array)
	}

	pub fn read_u8(&mut self) -> Result<u8, CodecError> {
		let value = self.buffer.read_u8(self.offset)?;
		self.offset += 1;
		Ok(value)
	}

	pub fn read_u16(&mut self) -> Result<u16, CodecError> {
		let value = self.buffer.read_u16(self.offset)?;
		self.offset += 2;
		Ok(value)
	}

	pub fn read_u32(&mut self) -> Result<u32, CodecError> {
		let value = self.buffer.read_u32(self.offset)?;
		self.offset += 4;
		Ok(value)
	}

	pub fn read_u64(&mut self) -> Result<u64, CodecError> {
		let value = self.buffer.read_u64(self.offset)?;
		self.offset += 8;
		Ok(value)
	}

	/// Reads a 4-byte length followed by that many bytes.
	pub fn read_sized_bytes(&mut self) -> Result<&'a [u8], CodecError> {
		let length = self.read_u32()? as usize;
		self.read_bytes(length)
	}

	/// Reads a 4-byte count followed by that many items.
	pub fn read_list<T: Deserializable>(&mut self) -> Result<Vec<T>, CodecError> {
		let count = self.read_u32()? as usize;
		// Every item takes at least one byte, so a larger count is corrupt.
		if count > self.remaining() {
			return Err(CodecError::InvalidData(format!(
				"list of {} items exceeds {} remaining bytes",
				count,
				self.remaining()
			)));
		}
		(0..count).map(|_| T::read_from(self)).collect()
	}
}

/// Types that can be decoded from their wire encoding.
pub trait Deserializable: Sized {
	fn read_from(reader: &mut BufferReader<'_>) -> Result<Self, CodecError>;

	/// Decodes a whole buffer, rejecting trailing bytes.
	fn deserialize(buffer: &JuneoBuffer) -> Result<Self, CodecError> {
		let mut reader = BufferReader::new(buffer);
		let value = Self::read_from(&mut reader)?;
		if reader.remaining() != 0 {
			return Err(CodecError::InvalidData(format!(
				"{} trailing bytes",
				reader.remaining()
			)));
		}
		Ok(value)
	}
}
