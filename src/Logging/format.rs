//! Deferred formatting.
//!
//! A log call encodes its raw arguments. The text is built later, on the
//! consumer thread, by a [`Formatter`]: a plain function pointer instantiated
//! once per call site and argument type list, which knows how to decode those
//! arguments and where the template and source location live.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Display, Write as _};
use std::hash::{BuildHasher, Hash};

use crate::Core::codec::{Decode, Encode};
use crate::Core::error::{Error, Result};
use crate::Core::{MessageView, Writer};
use crate::Logging::message::Location;

/// Output of a formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub location: Location,
    pub text: String,
}

pub type FormatFn = fn(&mut MessageView<'_>) -> Result<Formatted>;

/// Function that turns the encoded arguments of one call site into text.
///
/// Travels as its address, so a record can only be formatted by the
/// process that wrote it.
#[derive(Clone, Copy)]
pub struct Formatter(FormatFn);

impl Formatter {
    pub const fn new(f: FormatFn) -> Self {
        Self(f)
    }

    pub fn format(self, args: &mut MessageView<'_>) -> Result<Formatted> {
        (self.0)(args)
    }

    pub fn address(self) -> usize {
        self.0 as usize
    }
}

impl Encode for Formatter {
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        self.address().encode(out)
    }
}

impl Decode for Formatter {
    fn decode(view: &mut MessageView<'_>) -> Result<Self> {
        let address = usize::decode(view)?;
        if address == 0 {
            return Err(Error::NullFormatter);
        }
        // SAFETY: records are produced by `Formatter::encode` in this process
        // and the address points at a `FormatFn` instantiated there.
        let f = unsafe { std::mem::transmute::<usize, FormatFn>(address) };
        Ok(Self(f))
    }
}

/// Placeholder flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `{}`
    Display,
    /// `{:?}`
    Debug,
}

/// A decoded argument that can be rendered into a template.
pub trait LogValue {
    fn render(&self, out: &mut String, style: Style);
}

fn render_std<T: Display + Debug + ?Sized>(value: &T, out: &mut String, style: Style) {
    // Writing into a String cannot fail.
    let _ = match style {
        Style::Display => write!(out, "{value}"),
        Style::Debug => write!(out, "{value:?}"),
    };
}

/// A value a log call can capture. `Value` is what it decodes back into on
/// the consumer side and must share its encoding.
pub trait LogArg: Encode {
    type Value: LogValue + Decode;
}

macro_rules! impl_scalar {
    ($($t:ty),* $(,)?) => {$(
        impl LogValue for $t {
            fn render(&self, out: &mut String, style: Style) {
                render_std(self, out, style);
            }
        }

        impl LogArg for $t {
            type Value = $t;
        }
    )*};
}

impl_scalar!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char, String);

impl LogArg for str {
    type Value = String;
}

impl<T: LogArg + ?Sized> LogArg for &T {
    type Value = T::Value;
}

impl<T: LogArg + ?Sized> LogArg for Box<T> {
    type Value = T::Value;
}

fn render_list<'a, I>(items: I, open: char, close: char, out: &mut String, style: Style)
where
    I: IntoIterator<Item = &'a dyn LogValue>,
{
    out.push(open);
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.render(out, style);
    }
    out.push(close);
}

impl<T: LogValue> LogValue for Vec<T> {
    fn render(&self, out: &mut String, style: Style) {
        render_list(self.iter().map(|v| v as &dyn LogValue), '[', ']', out, style);
    }
}

impl<T: LogValue, const N: usize> LogValue for [T; N] {
    fn render(&self, out: &mut String, style: Style) {
        render_list(self.iter().map(|v| v as &dyn LogValue), '[', ']', out, style);
    }
}

impl<T: LogArg> LogArg for [T] {
    type Value = Vec<T::Value>;
}

impl<T: LogArg> LogArg for Vec<T> {
    type Value = Vec<T::Value>;
}

impl<T: LogArg, const N: usize> LogArg for [T; N] {
    type Value = [T::Value; N];
}

impl<T: LogValue> LogValue for Option<T> {
    fn render(&self, out: &mut String, style: Style) {
        match self {
            Some(value) => {
                out.push_str("Some(");
                value.render(out, style);
                out.push(')');
            }
            None => out.push_str("None"),
        }
    }
}

impl<T: LogArg> LogArg for Option<T> {
    type Value = Option<T::Value>;
}

impl<A: LogValue, B: LogValue> LogValue for (A, B) {
    fn render(&self, out: &mut String, style: Style) {
        render_list(
            [&self.0 as &dyn LogValue, &self.1 as &dyn LogValue],
            '(',
            ')',
            out,
            style,
        );
    }
}

impl<A: LogArg, B: LogArg> LogArg for (A, B) {
    type Value = (A::Value, B::Value);
}

fn render_map<'a, I>(entries: I, out: &mut String, style: Style)
where
    I: IntoIterator<Item = (&'a dyn LogValue, &'a dyn LogValue)>,
{
    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        key.render(out, style);
        out.push_str(": ");
        value.render(out, style);
    }
    out.push('}');
}

impl<K: LogValue, V: LogValue> LogValue for BTreeMap<K, V> {
    fn render(&self, out: &mut String, style: Style) {
        render_map(
            self.iter().map(|(k, v)| (k as &dyn LogValue, v as &dyn LogValue)),
            out,
            style,
        );
    }
}

impl<K: LogArg, V: LogArg> LogArg for BTreeMap<K, V>
where
    K::Value: Ord,
{
    type Value = BTreeMap<K::Value, V::Value>;
}

impl<K: LogValue, V: LogValue, S> LogValue for HashMap<K, V, S> {
    fn render(&self, out: &mut String, style: Style) {
        render_map(
            self.iter().map(|(k, v)| (k as &dyn LogValue, v as &dyn LogValue)),
            out,
            style,
        );
    }
}

impl<K: LogArg, V: LogArg, S: BuildHasher> LogArg for HashMap<K, V, S>
where
    K::Value: Eq + Hash,
{
    type Value = HashMap<K::Value, V::Value>;
}

/// Decoded arguments of one call site, rendered together.
pub trait RenderArgs {
    fn render(&self, template: &str) -> Result<String>;
}

/// The tuple of arguments captured by a log call.
pub trait ArgPack: Encode {
    type Values: RenderArgs + Decode;
}

macro_rules! impl_pack {
    ($($name:ident $idx:tt),*) => {
        impl<$($name: LogValue),*> RenderArgs for ($($name,)*) {
            fn render(&self, template: &str) -> Result<String> {
                let values: &[&dyn LogValue] = &[$(&self.$idx as &dyn LogValue),*];
                render_template(template, values)
            }
        }

        impl<$($name: LogArg),*> ArgPack for ($($name,)*) {
            type Values = ($($name::Value,)*);
        }
    };
}

impl_pack!();
impl_pack!(A 0);
impl_pack!(A 0, B 1);
impl_pack!(A 0, B 1, C 2);
impl_pack!(A 0, B 1, C 2, D 3);
impl_pack!(A 0, B 1, C 2, D 3, E 4);
impl_pack!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_pack!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_pack!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

/// Substitute `{}` and `{:?}` placeholders in order. `{{` and `}}` escape braces.
pub fn render_template(template: &str, values: &[&dyn LogValue]) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 8 * values.len());
    let mut args = values.iter();
    let mut rest = template;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
        } else if tail.starts_with('{') {
            let end = tail
                .find('}')
                .ok_or_else(|| Error::format("unclosed placeholder"))?;
            let style = match &tail[1..end] {
                "" => Style::Display,
                ":?" => Style::Debug,
                other => return Err(Error::format(format!("unsupported placeholder `{{{other}}}`"))),
            };
            let value = args
                .next()
                .ok_or_else(|| Error::format("more placeholders than arguments"))?;
            value.render(&mut out, style);
            rest = &tail[end + 1..];
        } else {
            return Err(Error::format("unmatched `}`"));
        }
    }
    out.push_str(rest);

    if args.next().is_some() {
        return Err(Error::format("more arguments than placeholders"));
    }
    Ok(out)
}

/// Number of placeholders in `template`, evaluated at compile time by the log macros.
///
/// # Panics
///
/// On any placeholder other than `{}` and `{:?}` and on unbalanced braces,
/// which turns into a compile error inside the macros.
pub const fn placeholder_count(template: &str) -> usize {
    let bytes = template.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        let escaped = i + 1 < bytes.len() && bytes[i + 1] == bytes[i];
        if (bytes[i] == b'{' || bytes[i] == b'}') && escaped {
            i += 2;
            continue;
        }
        if bytes[i] == b'}' {
            panic!("unmatched closing brace in log template");
        }
        if bytes[i] == b'{' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end] != b'}' {
                end += 1;
            }
            if end == bytes.len() {
                panic!("unterminated placeholder in log template");
            }
            let plain = end == start;
            let debug = end == start + 2 && bytes[start] == b':' && bytes[start + 1] == b'?';
            if !plain && !debug {
                panic!("log templates only support Display and Debug placeholders");
            }
            count += 1;
            i = end;
        }
        i += 1;
    }
    count
}

/// Compile-time facts about one log call site.
pub trait CallSite {
    const TEMPLATE: &'static str;
    const LOCATION: Location;
}

fn format_call<C: CallSite, P: ArgPack>(args: &mut MessageView<'_>) -> Result<Formatted> {
    let values = P::Values::decode(args)?;
    Ok(Formatted {
        location: C::LOCATION,
        text: values.render(C::TEMPLATE)?,
    })
}

/// The formatter for call site `C` capturing `P`. The argument only drives inference.
pub fn formatter_for<C: CallSite, P: ArgPack>(_args: &P) -> Formatter {
    Formatter(format_call::<C, P>)
}

/// Log through a [`Logger`](crate::Logging::Logger) at the given severity.
///
/// The template must be a literal; the number of `{}`/`{:?}` placeholders is
/// checked against the arguments at compile time.
///
/// ```
/// use ringwire::{log_at, Logger, Severity};
///
/// let logger = Logger::builder().build().unwrap();
/// log_at!(logger, Severity::Info, "foo {} bar {:?}", 420, "baz");
/// logger.shutdown().unwrap();
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $severity:expr, $template:literal $(, $arg:expr)* $(,)?) => {{
        const _: () = ::std::assert!(
            $crate::Logging::format::placeholder_count($template)
                == <[&str]>::len(&[$(::std::stringify!($arg)),*]),
            "log template placeholders do not match the argument count",
        );

        struct __Site;
        impl $crate::Logging::format::CallSite for __Site {
            const TEMPLATE: &'static str = $template;
            const LOCATION: $crate::Logging::Location = $crate::Logging::Location {
                file: ::std::file!(),
                module: ::std::module_path!(),
                line: ::std::line!(),
                column: ::std::column!(),
            };
        }

        let logger = &$logger;
        let severity = $severity;
        if logger.enabled(severity) {
            let args = ($(&$arg,)*);
            logger.emit(
                severity,
                $crate::Logging::format::formatter_for::<__Site, _>(&args),
                &args,
            );
        }
    }};
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($rest:tt)+) => { $crate::log_at!($logger, $crate::Logging::Severity::Trace, $($rest)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($rest:tt)+) => { $crate::log_at!($logger, $crate::Logging::Severity::Debug, $($rest)+) };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($rest:tt)+) => { $crate::log_at!($logger, $crate::Logging::Severity::Info, $($rest)+) };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($rest:tt)+) => { $crate::log_at!($logger, $crate::Logging::Severity::Warn, $($rest)+) };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($rest:tt)+) => { $crate::log_at!($logger, $crate::Logging::Severity::Error, $($rest)+) };
}

#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($rest:tt)+) => { $crate::log_at!($logger, $crate::Logging::Severity::Fatal, $($rest)+) };
}
