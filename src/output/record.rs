//! Exportable record capability
//!
//! A record describes its own fields as ordered `(export tag, value)` pairs.
//! The exporter never inspects record types any other way, so adding a new
//! record type only needs a [`Record`] impl, usually via [`crate::tabular_record!`].

use std::borrow::Cow;
use std::fmt;

/// Export tag marking a field as excluded.
pub const EXCLUDED_TAG: &str = "-";

/// Value of one field, before formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    /// Nullable field without a value
    Null,
    /// Text, written verbatim
    Text(Cow<'a, str>),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating point, written with 6 decimals
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Ordered sequence, written as `[a,b,...]`
    List(Vec<FieldValue<'a>>),
    /// Anything else, already converted with `Display`
    Other(String),
}

impl FieldValue<'_> {
    /// Wrap any `Display` value.
    pub fn display(value: &dyn fmt::Display) -> FieldValue<'static> {
        FieldValue::Other(value.to_string())
    }

    /// Render the value as a cell.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        use std::fmt::Write;

        match self {
            Self::Null => {}
            Self::Text(text) => out.push_str(text),
            Self::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Self::UInt(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Float(f) => {
                let _ = write!(out, "{f:.6}");
            }
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.render_into(out);
                }
                out.push(']');
            }
            Self::Other(text) => out.push_str(text),
        }
    }
}

/// One described field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<'a> {
    /// Export tag; `None`, empty, or `"-"` means the field is not exported
    pub tag: Option<Cow<'a, str>>,
    /// Current value
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    /// Field exported under `tag`.
    pub fn new(tag: impl Into<Cow<'a, str>>, value: FieldValue<'a>) -> Self {
        Self {
            tag: Some(tag.into()),
            value,
        }
    }

    /// Field without an export tag.
    pub fn untagged(value: FieldValue<'a>) -> Self {
        Self { tag: None, value }
    }

    /// Column header if this field is exported.
    pub fn export_name(&self) -> Option<&str> {
        match self.tag.as_deref() {
            None | Some("") | Some(EXCLUDED_TAG) => None,
            Some(name) => Some(name),
        }
    }
}

/// A value that can be exported as a tabular row.
pub trait Record {
    /// Every field in declaration order, tagged or not.
    fn describe_fields(&self) -> Vec<Field<'_>>;
}

impl<R: Record + ?Sized> Record for &R {
    fn describe_fields(&self) -> Vec<Field<'_>> {
        (**self).describe_fields()
    }
}

/// Conversion of a field's Rust value into a [`FieldValue`].
pub trait ToField {
    /// Borrowing conversion.
    fn to_field(&self) -> FieldValue<'_>;
}

impl ToField for str {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Text(Cow::Borrowed(self))
    }
}

impl ToField for String {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Text(Cow::Borrowed(self.as_str()))
    }
}

impl ToField for bool {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

macro_rules! impl_to_field {
    ($variant:ident as $target:ty: $($ty:ty),*) => {
        $(
            impl ToField for $ty {
                fn to_field(&self) -> FieldValue<'_> {
                    FieldValue::$variant(<$target>::from(*self))
                }
            }
        )*
    };
}

impl_to_field!(Int as i64: i8, i16, i32, i64);
impl_to_field!(UInt as u64: u8, u16, u32, u64);
impl_to_field!(Float as f64: f32, f64);

impl ToField for usize {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::UInt(*self as u64)
    }
}

impl ToField for isize {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Int(*self as i64)
    }
}

impl<T: ToField> ToField for Option<T> {
    fn to_field(&self) -> FieldValue<'_> {
        match self {
            Some(value) => value.to_field(),
            None => FieldValue::Null,
        }
    }
}

impl<T: ToField> ToField for [T] {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::List(self.iter().map(ToField::to_field).collect())
    }
}

impl<T: ToField> ToField for Vec<T> {
    fn to_field(&self) -> FieldValue<'_> {
        self.as_slice().to_field()
    }
}

impl<T: ToField + ?Sized> ToField for &T {
    fn to_field(&self) -> FieldValue<'_> {
        (**self).to_field()
    }
}

impl<T: ToField + ?Sized> ToField for Box<T> {
    fn to_field(&self) -> FieldValue<'_> {
        (**self).to_field()
    }
}

/// Implement [`Record`](crate::output::Record) by listing exported fields.
///
/// Fields are written in the listed order. Fields left out are not exported;
/// a tag of `"-"` keeps a field in the description but excludes it.
///
/// ```
/// use tabular_scraper::tabular_record;
///
/// struct Price {
///     asset_id: String,
///     usd_price: Option<f64>,
/// }
///
/// tabular_record!(Price {
///     asset_id => "asset_id",
///     usd_price => "usd_price",
/// });
/// ```
#[macro_export]
macro_rules! tabular_record {
    ($ty:ty { $($field:ident => $tag:expr),* $(,)? }) => {
        impl $crate::output::Record for $ty {
            fn describe_fields(&self) -> ::std::vec::Vec<$crate::output::Field<'_>> {
                ::std::vec![
                    $(
                        $crate::output::Field::new(
                            $tag,
                            $crate::output::ToField::to_field(&self.$field),
                        )
                    ),*
                ]
            }
        }
    };
}
