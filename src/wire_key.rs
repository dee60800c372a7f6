//! Key types that can appear as JSON object keys.
//!
//! JSON object keys are always strings, so every map key is rendered to a
//! string on encode and parsed back on decode. The supported set is closed:
//! strings, booleans, integers, floats wrapped in [`OrderedFloat`], and
//! `Option`s of those. `None` is written as the string `null`.
//!
//! Non-string keys are parsed back with JSON literal rules, so a key token
//! must be exactly what a JSON number or boolean would be.
//!
//! Any other type may still implement [`WireKey`] with an empty impl so it
//! can key a map; the default methods then reject it with
//! [`CodecError::UnsupportedKeyType`].

use crate::error::CodecError;
use ordered_float::OrderedFloat;
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// How a key type maps to a wire string.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyKind {
    /// No wire form; encode and decode fail.
    Unsupported,
    /// Rendered by its canonical textual form.
    Primitive,
    /// `Option` of a primitive; `None` is the string `null`.
    Nullable,
}

/// A map key that can be rendered as, and parsed from, a JSON object key.
pub trait WireKey: Sized {
    const KIND: KeyKind = KeyKind::Unsupported;

    /// Unquoted, unescaped wire form of the key.
    fn wire_key(&self) -> Result<Cow<'_, str>, CodecError> {
        Err(CodecError::unsupported_key::<Self>())
    }

    /// Parse a decoded object key back into `Self`.
    fn from_wire_key(token: &str) -> Result<Self, CodecError> {
        let _ = token;
        Err(CodecError::unsupported_key::<Self>())
    }
}

impl WireKey for String {
    const KIND: KeyKind = KeyKind::Primitive;

    fn wire_key(&self) -> Result<Cow<'_, str>, CodecError> {
        Ok(Cow::Borrowed(self.as_str()))
    }

    fn from_wire_key(token: &str) -> Result<Self, CodecError> {
        Ok(token.to_owned())
    }
}

/// Parse a key token with JSON number and literal rules, so `+5`, `007`
/// and `1.0` are rejected for integer keys.
fn parse_json_token<T: DeserializeOwned>(token: &str) -> Result<T, CodecError> {
    serde_json::from_str(token).map_err(|e| CodecError::invalid_key::<T>(token, e))
}

macro_rules! impl_wire_key_via_json {
    ($($t:ty),* $(,)?) => {$(
        impl WireKey for $t {
            const KIND: KeyKind = KeyKind::Primitive;

            fn wire_key(&self) -> Result<Cow<'_, str>, CodecError> {
                Ok(Cow::Owned(self.to_string()))
            }

            fn from_wire_key(token: &str) -> Result<Self, CodecError> {
                parse_json_token(token)
            }
        }
    )*};
}

impl_wire_key_via_json!(
    bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
);

macro_rules! impl_wire_key_for_float {
    ($($f:ty),* $(,)?) => {$(
        impl WireKey for OrderedFloat<$f> {
            const KIND: KeyKind = KeyKind::Primitive;

            fn wire_key(&self) -> Result<Cow<'_, str>, CodecError> {
                let v = self.0;
                let text = if v.is_nan() {
                    "NaN".to_owned()
                } else if v.is_infinite() {
                    (if v > 0.0 { "+Inf" } else { "-Inf" }).to_owned()
                } else {
                    shortest_g(&format!("{:e}", v))
                };
                Ok(Cow::Owned(text))
            }

            fn from_wire_key(token: &str) -> Result<Self, CodecError> {
                serde_json::from_str::<$f>(token)
                    .map(OrderedFloat)
                    .map_err(|e| CodecError::invalid_key::<Self>(token, e))
            }
        }
    )*};
}

impl_wire_key_for_float!(f32, f64);

/// Rewrite shortest `{:e}` output in `%g` form: plain decimal when the
/// exponent is in `[-4, 6)`, otherwise `d.ddde±XX`.
fn shortest_g(sci: &str) -> String {
    let (mantissa, exp) = sci
        .split_once('e')
        .expect("LowerExp output of a finite float has an exponent");
    let exp: i32 = exp.parse().expect("LowerExp exponent is an integer");
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(m) => ("-", m),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|&c| c != '.').collect();

    let mut out = String::from(sign);
    if !(-4..6).contains(&exp) {
        out.push_str(mantissa);
        out.push_str(&format!("e{}{:02}", if exp < 0 { '-' } else { '+' }, exp.abs()));
    } else if exp < 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-exp - 1) as usize));
        out.push_str(&digits);
    } else {
        let int_len = exp as usize + 1;
        if digits.len() <= int_len {
            out.push_str(&digits);
            out.push_str(&"0".repeat(int_len - digits.len()));
        } else {
            out.push_str(&digits[..int_len]);
            out.push('.');
            out.push_str(&digits[int_len..]);
        }
    }
    out
}

const NULL_KEY: &str = "null";

impl<T: WireKey> WireKey for Option<T> {
    const KIND: KeyKind = match T::KIND {
        KeyKind::Primitive => KeyKind::Nullable,
        _ => KeyKind::Unsupported,
    };

    fn wire_key(&self) -> Result<Cow<'_, str>, CodecError> {
        if Self::KIND != KeyKind::Nullable {
            return Err(CodecError::unsupported_key::<Self>());
        }
        match self {
            None => Ok(Cow::Borrowed(NULL_KEY)),
            Some(inner) => inner.wire_key(),
        }
    }

    fn from_wire_key(token: &str) -> Result<Self, CodecError> {
        if Self::KIND != KeyKind::Nullable {
            return Err(CodecError::unsupported_key::<Self>());
        }
        if token == NULL_KEY {
            return Ok(None);
        }
        T::from_wire_key(token).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Hash)]
    struct Point {
        x: i32,
        y: i32,
    }
    impl WireKey for Point {}

    fn wire<K: WireKey>(k: K) -> String {
        k.wire_key().unwrap().into_owned()
    }

    #[test]
    fn primitives_render_canonically() {
        assert_eq!(wire("a\"b".to_string()), "a\"b");
        assert_eq!(wire(true), "true");
        assert_eq!(wire(-56i8), "-56");
        assert_eq!(wire(u64::MAX), "18446744073709551615");
        assert_eq!(wire(i128::MIN), i128::MIN.to_string());
    }

    #[test]
    fn options_render_null_or_inner() {
        assert_eq!(wire(None::<i32>), "null");
        assert_eq!(wire(Some(123i32)), "123");
        assert_eq!(wire(Some("abc".to_string())), "abc");
        assert_eq!(Option::<u8>::KIND, KeyKind::Nullable);
    }

    #[test]
    fn parse_round_trips_primitives() {
        assert_eq!(i16::from_wire_key("-300").unwrap(), -300);
        assert!(bool::from_wire_key("false").is_ok_and(|b| !b));
        assert_eq!(Option::<u32>::from_wire_key("null").unwrap(), None);
        assert_eq!(Option::<u32>::from_wire_key("7").unwrap(), Some(7));
        assert_eq!(
            Option::<String>::from_wire_key("x").unwrap(),
            Some("x".to_string())
        );
    }

    #[test]
    fn parse_failure_is_an_invalid_key_not_unsupported() {
        let err = i32::from_wire_key("B").unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidKey { ref key, type_name: "i32", .. } if key == "B"
        ));
        let err = u8::from_wire_key("300").unwrap_err();
        assert!(matches!(err, CodecError::InvalidKey { .. }));
        let err = Option::<bool>::from_wire_key("yes").unwrap_err();
        assert!(matches!(err, CodecError::InvalidKey { .. }));
    }

    #[test]
    fn integer_tokens_follow_json_number_rules() {
        for token in ["+5", "007", "-01", "1.0", "1e3", "0x10", ""] {
            let err = i64::from_wire_key(token).unwrap_err();
            assert!(matches!(err, CodecError::InvalidKey { .. }), "{token:?}");
        }
        assert_eq!(i64::from_wire_key("0").unwrap(), 0);
        assert_eq!(i64::from_wire_key("-0").unwrap(), 0);
        assert!(bool::from_wire_key("True").is_err());
        assert!(u128::from_wire_key(&u128::MAX.to_string()).is_ok_and(|v| v == u128::MAX));
    }

    #[test]
    fn floats_render_like_percent_g() {
        let f = |v: f64| wire(OrderedFloat(v));
        assert_eq!(f(1.23), "1.23");
        assert_eq!(f(0.0), "0");
        assert_eq!(f(-0.0), "-0");
        assert_eq!(f(-1.23), "-1.23");
        assert_eq!(f(100.0), "100");
        assert_eq!(f(123456.0), "123456");
        assert_eq!(f(1e6), "1e+06");
        assert_eq!(f(1234567.0), "1.234567e+06");
        assert_eq!(f(0.0001), "0.0001");
        assert_eq!(f(0.00001), "1e-05");
        assert_eq!(f(1.5e300), "1.5e+300");
        assert_eq!(f(f64::NAN), "NaN");
        assert_eq!(f(f64::NEG_INFINITY), "-Inf");

        // Shortest digits are taken at the key's own width.
        assert_eq!(wire(OrderedFloat(1.2f32)), "1.2");
        assert_eq!(wire(OrderedFloat(0.1f32)), "0.1");
        assert_eq!(wire(Some(OrderedFloat(-5.6f32))), "-5.6");
        assert_eq!(wire(None::<OrderedFloat<f64>>), "null");
    }

    #[test]
    fn floats_parse_json_numbers_only() {
        for v in [1.23, 0.0, -1.23, 1e6, 1.234567e6, 1e-5, 1.5e300] {
            let token = wire(OrderedFloat(v));
            assert_eq!(OrderedFloat::<f64>::from_wire_key(&token).unwrap(), OrderedFloat(v));
        }
        assert_eq!(OrderedFloat::<f32>::from_wire_key("1.2").unwrap(), OrderedFloat(1.2f32));
        assert_eq!(OrderedFloat::<f64>::from_wire_key("5").unwrap(), OrderedFloat(5.0));
        for token in ["NaN", "+Inf", ".5", "+1.5", "1.", "1e"] {
            let err = OrderedFloat::<f64>::from_wire_key(token).unwrap_err();
            assert!(matches!(err, CodecError::InvalidKey { .. }), "{token:?}");
        }
        assert_eq!(
            Option::<OrderedFloat<f32>>::from_wire_key("null").unwrap(),
            None
        );
    }

    #[test]
    fn composite_keys_are_rejected_by_name() {
        let err = Point { x: 1, y: 2 }.wire_key().unwrap_err();
        assert!(err.to_string().starts_with("json: unsupported key type: "));
        assert!(err.to_string().ends_with("Point"));
        assert!(Point::from_wire_key("1").is_err());
    }

    /// Invariant: an optional composite is rejected even when it is `None`.
    #[test]
    fn optional_composite_is_rejected_even_when_none() {
        assert_eq!(Option::<Point>::KIND, KeyKind::Unsupported);
        let err = None::<Point>.wire_key().unwrap_err();
        assert!(err.to_string().contains("Option<"));
        assert!(Option::<Point>::from_wire_key("null").is_err());
        assert_eq!(Option::<Option<i32>>::KIND, KeyKind::Unsupported);
    }
}
