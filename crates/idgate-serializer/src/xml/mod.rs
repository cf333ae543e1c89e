//! XML codec
//!
//! Every value is one element named after its registry tag. Scalars hold
//! their text form, primitive arrays a whitespace-separated token list and
//! composites their constructor arguments as child elements, in the same
//! order the binary codec uses.
//!
//! Text forms:
//! - booleans `true`/`false`, integers in decimal
//! - floats as `NaN`, `inf`, `-inf` or the shortest decimal that reads back
//!   to the same bits
//! - byte arrays in standard base64
//! - characters inside `charArray` as decimal code points

pub mod grammar;
mod reader;
mod writer;

use idgate_connector::value::Value;

pub use grammar::{dtd, dtd_for, MULTI_OBJECT_ELEMENT, XML_PUBLIC_ID, XML_SYSTEM_ID};
pub use reader::XmlObjectReader;
pub use writer::XmlObjectWriter;

/// Receives the values of a multi-object document as they are decoded.
pub trait XmlObjectResultsHandler {
    /// Handle one value. Return `false` to stop reading.
    fn handle(&mut self, value: Value) -> bool;
}

impl<F> XmlObjectResultsHandler for F
where
    F: FnMut(Value) -> bool,
{
    fn handle(&mut self, value: Value) -> bool {
        self(value)
    }
}
