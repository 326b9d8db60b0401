//! Protocol Module
//!
//! RESP2 framing on the client side.
//!
//! ### Request Format
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<arg bytes>\r\n   × argc
//! ```
//!
//! ### Response Format
//! ```text
//! +<status>\r\n
//! -<error>\r\n
//! :<integer>\r\n
//! $<len>\r\n<bytes>\r\n       ($-1\r\n is null)
//! *<count>\r\n<frames...>     (*-1\r\n is null)
//! ```

mod encoder;
mod frame;

pub mod decoder;
pub mod errors;
pub mod scanner;

pub use decoder::{read_reply, Header};
pub use encoder::{
    encode_command, encode_inline, encode_static, format_double, Arg, CommandBuilder, CRLF,
};
pub use frame::{ErrorReply, Reply};
