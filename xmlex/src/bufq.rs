use std::borrow::Cow;
use std::collections::VecDeque;
use std::io;

pub const ERR_NODATA: &'static str = "no data in buffer";

/**
# Queue of byte chunks

This is the input buffer of the [`PushDriver`](crate::PushDriver). Chunks
may be owned or borrowed for `'x`; they are never copied into a contiguous
buffer.

Reading from an empty queue yields [`std::io::ErrorKind::WouldBlock`] unless
the eof marker has been pushed.
*/
pub struct BufferQueue<'x> {
	q: VecDeque<Cow<'x, [u8]>>,
	offset: usize,
	len: usize,
	eof: bool,
}

impl<'x> BufferQueue<'x> {
	pub fn new() -> BufferQueue<'x> {
		BufferQueue {
			q: VecDeque::new(),
			offset: 0,
			len: 0,
			eof: false,
		}
	}

	/// Append a chunk to the queue.
	///
	/// Empty chunks are ignored.
	///
	/// # Panics
	///
	/// If [`BufferQueue::push_eof`] has been called before.
	pub fn push<'a: 'x, T: Into<Cow<'a, [u8]>>>(&mut self, new: T) {
		if self.eof {
			panic!("cannot push behind eof");
		}
		let new = new.into();
		if new.len() == 0 {
			return;
		}
		let new_len = match self.len.checked_add(new.len()) {
			None => panic!("length overflow"),
			Some(v) => v,
		};
		self.q.push_back(new);
		self.len = new_len;
	}

	/// Number of bytes which have not been read yet.
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn push_eof(&mut self) {
		self.eof = true;
	}

	pub fn eof_pushed(&self) -> bool {
		self.eof
	}

	/// Drop all buffered chunks.
	///
	/// The eof marker is kept.
	pub fn clear(&mut self) {
		self.q.clear();
		self.offset = 0;
		self.len = 0;
	}
}

impl<'x> Default for BufferQueue<'x> {
	fn default() -> Self {
		Self::new()
	}
}

impl io::Read for BufferQueue<'_> {
	fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
		let (read, remaining) = {
			let front = match self.q.front() {
				None => {
					if self.eof {
						return Ok(0);
					} else {
						return Err(io::Error::new(io::ErrorKind::WouldBlock, ERR_NODATA));
					}
				},
				Some(v) => v,
			};
			debug_assert!(self.offset < front.len());
			let effective_len = front.len() - self.offset;
			let to_read = std::cmp::min(dst.len(), effective_len);
			dst[..to_read].copy_from_slice(&front[self.offset..self.offset + to_read]);
			self.offset += to_read;
			(to_read, front.len() - self.offset)
		};
		if remaining == 0 {
			self.q.pop_front();
			self.offset = 0;
		}
		self.len -= read;
		Ok(read)
	}
}

impl io::BufRead for BufferQueue<'_> {
	fn consume(&mut self, amt: usize) {
		if amt == 0 {
			return;
		}
		let remaining = {
			let front = match self.q.front() {
				None => panic!("attempt to consume beyond end of buffer"),
				Some(v) => v,
			};
			debug_assert!(self.offset < front.len());
			let effective_len = front.len() - self.offset;
			if amt > effective_len {
				panic!("attempt to consume beyond end of buffer");
			}
			self.offset += amt;
			front.len() - self.offset
		};
		if remaining == 0 {
			self.q.pop_front();
			self.offset = 0;
		}
		self.len -= amt;
	}

	fn fill_buf(&mut self) -> io::Result<&[u8]> {
		match self.q.front() {
			None => {
				if self.eof {
					Ok(&[])
				} else {
					Err(io::Error::new(io::ErrorKind::WouldBlock, ERR_NODATA))
				}
			},
			Some(v) => Ok(&v[self.offset..]),
		}
	}
}
