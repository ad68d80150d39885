// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Types that travel as their text form.

use crate::contracts::{ValueReader, ValueWriter};
use crate::dispatch::{read_text, write_text, Value};
use crate::error::Result;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::str::FromStr;

/// Wrapper giving any `Display + FromStr` type a string encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Text<T>(pub T);

impl<T> Deref for Text<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Text<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: fmt::Display> fmt::Display for Text<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: FromStr> FromStr for Text<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        T::from_str(s).map(Text)
    }
}

impl<T: fmt::Display + FromStr + 'static> Value for Text<T> {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        write_text(&self.0, writer)
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        read_text(reader).map(Text)
    }
}

macro_rules! text_value {
    ($($ty:ty),*) => {
        $(
            impl Value for $ty {
                fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
                    write_text(self, writer)
                }

                fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
                    read_text(reader)
                }
            }
        )*
    };
}

text_value!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

impl Value for PathBuf {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_string(&self.to_string_lossy())
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        reader.read_string().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::ValueBuffer;
    use crate::Error;

    #[test]
    fn test_addresses_travel_as_strings() {
        let addr: SocketAddr = "127.0.0.1:7400".parse().unwrap();
        let mut buf = ValueBuffer::new();
        addr.write_value(&mut buf).unwrap();
        assert_eq!(buf.as_str(), Some("127.0.0.1:7400"));
        assert_eq!(SocketAddr::read_value(&mut buf).unwrap(), addr);

        buf.write_string("not an address").unwrap();
        assert!(matches!(
            IpAddr::read_value(&mut buf),
            Err(Error::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn test_text_wrapper() {
        let value = Text(3.25f32);
        let mut buf = ValueBuffer::new();
        value.write_value(&mut buf).unwrap();
        assert_eq!(buf.as_str(), Some("3.25"));
        assert_eq!(Text::<f32>::read_value(&mut buf).unwrap(), value);
    }
}
