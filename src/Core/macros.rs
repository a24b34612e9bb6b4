/// Implement `Encode`/`Decode` for a struct, field by field in the listed order.
///
/// ```
/// use ringwire::codec_struct;
///
/// #[derive(Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
/// codec_struct!(Point { x, y });
/// ```
#[macro_export]
macro_rules! codec_struct {
    ($name:ident { $($field:ident),* $(,)? }) => {
        impl $crate::Core::Encode for $name {
            fn encode<W: $crate::Core::Writer + ?Sized>(&self, out: &mut W) -> $crate::Core::Result<()> {
                let _ = &out;
                $( $crate::Core::Encode::encode(&self.$field, out)?; )*
                Ok(())
            }
        }

        impl $crate::Core::Decode for $name {
            fn decode(view: &mut $crate::Core::MessageView<'_>) -> $crate::Core::Result<Self> {
                let _ = &view;
                Ok(Self {
                    $( $field: $crate::Core::Decode::decode(view)?, )*
                })
            }
        }
    };
}

/// Implement `Encode`/`Decode` for a field-less enum through its integer repr.
///
/// Unknown discriminants fail to decode.
#[macro_export]
macro_rules! codec_enum {
    ($name:ident : $repr:ty { $($variant:ident),+ $(,)? }) => {
        impl $crate::Core::Encode for $name {
            fn encode<W: $crate::Core::Writer + ?Sized>(&self, out: &mut W) -> $crate::Core::Result<()> {
                $crate::Core::Encode::encode(&(*self as $repr), out)
            }
        }

        impl $crate::Core::Decode for $name {
            fn decode(view: &mut $crate::Core::MessageView<'_>) -> $crate::Core::Result<Self> {
                let raw = <$repr as $crate::Core::Decode>::decode(view)?;
                $(
                    if raw == $name::$variant as $repr {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::Core::Error::discriminant::<$name>(raw as u64))
            }
        }
    };
}

/// Implement `Encode`/`Decode` for a tagged enum whose variants each hold one value.
///
/// The index written before the value is the one given in the invocation.
///
/// ```
/// use ringwire::codec_variant;
///
/// #[derive(Debug, PartialEq)]
/// enum Value { Int(i64), Text(String) }
/// codec_variant!(Value { 0 => Int(i64), 1 => Text(String) });
/// ```
#[macro_export]
macro_rules! codec_variant {
    ($name:ident { $($index:literal => $variant:ident($inner:ty)),+ $(,)? }) => {
        impl $crate::Core::Encode for $name {
            fn encode<W: $crate::Core::Writer + ?Sized>(&self, out: &mut W) -> $crate::Core::Result<()> {
                match self {
                    $(
                        $name::$variant(value) => {
                            $crate::Core::Encode::encode(&($index as u64), out)?;
                            $crate::Core::Encode::encode(value, out)
                        }
                    )+
                }
            }
        }

        impl $crate::Core::Decode for $name {
            fn decode(view: &mut $crate::Core::MessageView<'_>) -> $crate::Core::Result<Self> {
                let index = <u64 as $crate::Core::Decode>::decode(view)?;
                match index {
                    $(
                        i if i == $index as u64 => Ok($name::$variant(
                            <$inner as $crate::Core::Decode>::decode(view)?,
                        )),
                    )+
                    other => Err($crate::Core::Error::discriminant::<$name>(other)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::Core::codec::{from_bytes, to_frame};
    use crate::Core::{Error, HybridBuffer};

    #[derive(Debug, Clone, PartialEq)]
    struct Reading {
        sensor: u16,
        values: Vec<f64>,
        label: String,
    }
    codec_struct!(Reading { sensor, values, label });

    #[derive(Debug, Clone, Copy, PartialEq)]
    #[repr(u8)]
    enum Mode {
        Idle = 1,
        Busy = 4,
    }
    codec_enum!(Mode: u8 { Idle, Busy });

    #[derive(Debug, Clone, PartialEq)]
    enum Payload {
        Reading(Reading),
        Mode(Mode),
        Blob(Vec<u8>),
    }
    codec_variant!(Payload { 0 => Reading(Reading), 1 => Mode(Mode), 2 => Blob(Vec<u8>) });

    #[test]
    fn struct_fields_in_order() {
        let reading = Reading {
            sensor: 3,
            values: vec![1.5, -2.25],
            label: "t".into(),
        };
        let frame: HybridBuffer = to_frame(&reading).unwrap();
        assert_eq!(&frame.as_bytes()[..2], &[3, 0]);
        assert_eq!(from_bytes::<Reading>(frame.as_bytes()).unwrap(), reading);
    }

    #[test]
    fn enum_uses_declared_discriminants() {
        let frame: Vec<u8> = to_frame(&Mode::Busy).unwrap();
        assert_eq!(frame, vec![4]);
        assert!(matches!(
            from_bytes::<Mode>(&[2]),
            Err(Error::InvalidDiscriminant { value: 2, .. })
        ));
    }

    #[test]
    fn variant_decodes_only_active_alternative() {
        let values = [
            Payload::Mode(Mode::Idle),
            Payload::Blob(vec![9, 8]),
            Payload::Reading(Reading {
                sensor: 1,
                values: vec![],
                label: String::new(),
            }),
        ];
        for value in values {
            let frame: Vec<u8> = to_frame(&value).unwrap();
            assert_eq!(from_bytes::<Payload>(&frame).unwrap(), value);
        }
        let mut bad: Vec<u8> = to_frame(&7u64).unwrap();
        bad.push(0);
        assert!(from_bytes::<Payload>(&bad).is_err());
    }
}
