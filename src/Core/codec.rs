//! Compact little-endian binary codec.
//!
//! Wire rules:
//! - integers, floats (as IEEE bits), `bool` and `char` are fixed-width little-endian
//! - `usize`/`isize` travel as 64-bit values
//! - tuples and structs encode their fields in order
//! - tagged unions write the active index as `u64`, then the active value
//! - sequences, strings and maps write a `u32` element count, then the elements
//! - fixed arrays write their elements only
//! - raw pointers write their address, valid only inside one process

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};

use crate::Core::error::{Error, Result};
use crate::Core::view::MessageView;
use crate::Core::Buffer::{Frame, Writer};

pub trait Encode {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()>;
}

pub trait Decode: Sized {
    fn decode(view: &mut MessageView<'_>) -> Result<Self>;
}

/// Encode `value` into a fresh frame.
pub fn to_frame<F: Frame, T: Encode + ?Sized>(value: &T) -> Result<F> {
    let mut frame = F::default();
    value.encode(&mut frame)?;
    Ok(frame)
}

/// Decode a `T` from the start of `bytes`. Trailing bytes are ignored.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> Result<T> {
    T::decode(&mut MessageView::new(bytes))
}

pub fn encode_len<W: Writer + ?Sized>(len: usize, out: &mut W) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| Error::TooLarge {
        len,
        max: u32::MAX as usize,
    })?;
    len.encode(out)
}

pub fn decode_len(view: &mut MessageView<'_>) -> Result<usize> {
    Ok(u32::decode(view)? as usize)
}

/// Capacity hint that a hostile length prefix cannot inflate.
fn bounded_capacity(len: usize, view: &MessageView<'_>) -> usize {
    len.min(view.remaining())
}

macro_rules! impl_int {
    ($($t:ty),* $(,)?) => {$(
        impl Encode for $t {
            fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
                out.write(&self.to_le_bytes())
            }
        }

        impl Decode for $t {
            fn decode(view: &mut MessageView<'_>) -> Result<Self> {
                Ok(<$t>::from_le_bytes(view.read_array()?))
            }
        }
    )*};
}

impl_int!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

impl Encode for usize {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        (*self as u64).encode(out)
    }
}

impl Decode for usize {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let raw = u64::decode(view)?;
        usize::try_from(raw).map_err(|_| Error::TooLarge {
            len: usize::MAX,
            max: usize::MAX,
        })
    }
}

impl Encode for isize {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        (*self as i64).encode(out)
    }
}

impl Decode for isize {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let raw = i64::decode(view)?;
        isize::try_from(raw).map_err(|_| Error::discriminant::<isize>(raw as u64))
    }
}

impl Encode for bool {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        (*self as u8).encode(out)
    }
}

impl Decode for bool {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        match u8::decode(view)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::discriminant::<bool>(other as u64)),
        }
    }
}

impl Encode for char {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        (*self as u32).encode(out)
    }
}

impl Decode for char {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let raw = u32::decode(view)?;
        char::from_u32(raw).ok_or_else(|| Error::discriminant::<char>(raw as u64))
    }
}

impl Encode for f32 {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        self.to_bits().encode(out)
    }
}

impl Decode for f32 {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        Ok(f32::from_bits(u32::decode(view)?))
    }
}

impl Encode for f64 {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        self.to_bits().encode(out)
    }
}

impl Decode for f64 {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        Ok(f64::from_bits(u64::decode(view)?))
    }
}

impl Encode for str {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        encode_len(self.len(), out)?;
        out.write(self.as_bytes())
    }
}

impl Encode for String {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        self.as_str().encode(out)
    }
}

impl Decode for String {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let len = decode_len(view)?;
        let bytes = view.read(len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        encode_len(self.len(), out)?;
        self.iter().try_for_each(|item| item.encode(out))
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        self.as_slice().encode(out)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let len = decode_len(view)?;
        let mut items = Vec::with_capacity(bounded_capacity(len, view));
        for _ in 0..len {
            items.push(T::decode(view)?);
        }
        Ok(items)
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        encode_len(self.len(), out)?;
        self.iter().try_for_each(|item| item.encode(out))
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        Ok(Vec::<T>::decode(view)?.into())
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        encode_len(self.len(), out)?;
        self.iter().try_for_each(|item| item.encode(out))
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let len = decode_len(view)?;
        let mut set = BTreeSet::new();
        for _ in 0..len {
            set.insert(T::decode(view)?);
        }
        Ok(set)
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        encode_len(self.len(), out)?;
        for (key, value) in self {
            key.encode(out)?;
            value.encode(out)?;
        }
        Ok(())
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let len = decode_len(view)?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key = K::decode(view)?;
            let value = V::decode(view)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        encode_len(self.len(), out)?;
        for (key, value) in self {
            key.encode(out)?;
            value.encode(out)?;
        }
        Ok(())
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let len = decode_len(view)?;
        let mut map = HashMap::with_capacity_and_hasher(bounded_capacity(len, view), S::default());
        for _ in 0..len {
            let key = K::decode(view)?;
            let value = V::decode(view)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        self.iter().try_for_each(|item| item.encode(out))
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode(view)?);
        }
        items
            .try_into()
            .map_err(|partial: Vec<T>| Error::truncated(N, partial.len()))
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        match self {
            None => 0u64.encode(out),
            Some(value) => {
                1u64.encode(out)?;
                value.encode(out)
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        match u64::decode(view)? {
            0 => Ok(None),
            1 => Ok(Some(T::decode(view)?)),
            other => Err(Error::discriminant::<Self>(other)),
        }
    }
}

impl<T: Encode, E: Encode> Encode for std::result::Result<T, E> {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        match self {
            Ok(value) => {
                0u64.encode(out)?;
                value.encode(out)
            }
            Err(err) => {
                1u64.encode(out)?;
                err.encode(out)
            }
        }
    }
}

impl<T: Decode, E: Decode> Decode for std::result::Result<T, E> {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        match u64::decode(view)? {
            0 => Ok(Ok(T::decode(view)?)),
            1 => Ok(Err(E::decode(view)?)),
            other => Err(Error::discriminant::<Self>(other)),
        }
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        (**self).encode(out)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        Ok(Box::new(T::decode(view)?))
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        (**self).encode(out)
    }
}

impl<T> Encode for *const T {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        (*self as usize as u64).encode(out)
    }
}

impl<T> Decode for *const T {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        Ok(usize::decode(view)? as *const T)
    }
}

impl<T> Encode for *mut T {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        (*self as usize as u64).encode(out)
    }
}

impl<T> Decode for *mut T {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        Ok(usize::decode(view)? as *mut T)
    }
}

macro_rules! impl_tuple {
    ($($name:ident $idx:tt),*) => {
        impl<$($name: Encode),*> Encode for ($($name,)*) {
            #[allow(unused_variables)]
            fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
                $(self.$idx.encode(out)?;)*
                Ok(())
            }
        }

        impl<$($name: Decode),*> Decode for ($($name,)*) {
            #[allow(unused_variables)]
            fn decode(view: &mut MessageView<'_>) -> Result<Self> {
                Ok(($($name::decode(view)?,)*))
            }
        }
    };
}

impl_tuple!();
impl_tuple!(A 0);
impl_tuple!(A 0, B 1);
impl_tuple!(A 0, B 1, C 2);
impl_tuple!(A 0, B 1, C 2, D 3);
impl_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
