// src/coerce.rs
use crate::errors::{CoerceError, NumberError};
use crate::shape::{ScalarSlot, Slot};
use std::str::FromStr;

/// Write `raw` into `slot`, parsing as the slot's type demands.
///
/// Options are filled with a default first, then coerced into. Booleans are
/// `true` only for the exact text `"true"` and never fail.
pub(crate) fn coerce(slot: Slot<'_>, raw: &str) -> Result<(), CoerceError> {
    match slot {
        Slot::Pointer(pointer) => coerce(pointer.get_or_insert(), raw),
        Slot::Scalar(scalar) => coerce_scalar(scalar, raw),
        Slot::Record(record) => Err(CoerceError::Unsupported(record.type_name())),
        Slot::Unsupported(type_name) => Err(CoerceError::Unsupported(type_name)),
    }
}

fn coerce_scalar(slot: ScalarSlot<'_>, raw: &str) -> Result<(), CoerceError> {
    match slot {
        ScalarSlot::Str(s) => {
            s.clear();
            s.push_str(raw);
        }
        ScalarSlot::I8(v) => *v = parse_int(raw)?,
        ScalarSlot::I16(v) => *v = parse_int(raw)?,
        ScalarSlot::I32(v) => *v = parse_int(raw)?,
        ScalarSlot::I64(v) => *v = parse_int(raw)?,
        ScalarSlot::I128(v) => *v = parse_int(raw)?,
        ScalarSlot::Isize(v) => *v = parse_int(raw)?,
        ScalarSlot::U8(v) => *v = parse_int(raw)?,
        ScalarSlot::U16(v) => *v = parse_int(raw)?,
        ScalarSlot::U32(v) => *v = parse_int(raw)?,
        ScalarSlot::U64(v) => *v = parse_int(raw)?,
        ScalarSlot::U128(v) => *v = parse_int(raw)?,
        ScalarSlot::Usize(v) => *v = parse_int(raw)?,
        ScalarSlot::F32(v) => *v = parse_float(raw)?,
        ScalarSlot::F64(v) => *v = parse_float(raw)?,
        ScalarSlot::Bool(v) => *v = raw == "true",
    }
    Ok(())
}

fn parse_int<T>(raw: &str) -> Result<T, NumberError>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    raw.parse::<T>().map_err(NumberError::from)
}

fn parse_float<T>(raw: &str) -> Result<T, NumberError>
where
    T: FromStr<Err = std::num::ParseFloatError>,
{
    raw.parse::<T>().map_err(NumberError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Field;
    use pretty_assertions::assert_eq;

    fn set<F: Field>(field: &mut F, raw: &str) -> Result<(), CoerceError> {
        coerce(field.slot(), raw)
    }

    #[test]
    fn strings_are_verbatim() {
        let mut s = String::from("previous");
        set(&mut s, " spaced value ").unwrap();
        assert_eq!(s, " spaced value ");
    }

    #[test]
    fn integers_parse_base_ten() {
        let mut a: i64 = 0;
        set(&mut a, "-42").unwrap();
        assert_eq!(a, -42);

        let mut b: u32 = 0;
        set(&mut b, "100000").unwrap();
        assert_eq!(b, 100000);

        let mut c: u8 = 0;
        assert!(matches!(set(&mut c, "256"), Err(CoerceError::Number(NumberError::Int(_)))));
        assert!(matches!(set(&mut c, "-1"), Err(CoerceError::Number(NumberError::Int(_)))));
        assert!(matches!(set(&mut a, "0x10"), Err(CoerceError::Number(NumberError::Int(_)))));
    }

    #[test]
    fn floats_parse_decimal() {
        let mut f: f64 = 0.0;
        set(&mut f, "3.25").unwrap();
        assert_eq!(f, 3.25);

        let mut g: f32 = 0.0;
        assert!(matches!(set(&mut g, "abc"), Err(CoerceError::Number(NumberError::Float(_)))));
    }

    #[test]
    fn booleans_are_exact_match() {
        let mut b = false;
        set(&mut b, "true").unwrap();
        assert!(b);
        for raw in ["True", "1", "", "false", "yes", "TRUE"] {
            set(&mut b, raw).unwrap();
            assert!(!b, "{raw:?} should decode to false");
        }
    }

    #[test]
    fn options_allocate_then_coerce() {
        let mut middle: Option<String> = None;
        set(&mut middle, "Middle").unwrap();
        assert_eq!(middle.as_deref(), Some("Middle"));

        let mut count: Option<u16> = Some(3);
        set(&mut count, "9").unwrap();
        assert_eq!(count, Some(9));

        let mut nested: Option<Option<bool>> = None;
        set(&mut nested, "true").unwrap();
        assert_eq!(nested, Some(Some(true)));
    }

    #[test]
    fn failed_option_coercion_still_allocates() {
        let mut age: Option<i32> = None;
        assert!(set(&mut age, "old").is_err());
        assert_eq!(age, Some(0));
    }

    #[test]
    fn collections_are_unsupported() {
        let mut list: Vec<String> = Vec::new();
        assert!(matches!(set(&mut list, "a"), Err(CoerceError::Unsupported("Vec"))));
        let mut c = 'x';
        assert!(matches!(set(&mut c, "y"), Err(CoerceError::Unsupported("char"))));
    }
}
