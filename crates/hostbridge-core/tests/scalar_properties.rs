//! Property tests for scalar and array conversion

use hostbridge_core::sdk::{wrap_integer, HostValue, ManagedArray, ManagedValue, TypeDescriptor};
use hostbridge_core::{FromHost, Marshaller, ToHost};
use proptest::prelude::*;

fn round_trip(descriptor: &str, value: ManagedValue<'static>) -> ManagedValue<'static> {
    let marshaller = Marshaller::default();
    let descriptor: TypeDescriptor = descriptor.parse().unwrap();
    let host = marshaller.to_host(&descriptor, &value).unwrap();
    marshaller.to_managed(&descriptor, &host).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn i8_round_trip(n in any::<i8>()) {
        prop_assert_eq!(round_trip("i8", ManagedValue::Int8(n)), ManagedValue::Int8(n));
    }

    #[test]
    fn i16_round_trip(n in any::<i16>()) {
        prop_assert_eq!(round_trip("i16", ManagedValue::Int16(n)), ManagedValue::Int16(n));
    }

    #[test]
    fn char_round_trip(c in any::<u16>()) {
        prop_assert_eq!(round_trip("char", ManagedValue::Char(c)), ManagedValue::Char(c));
    }

    #[test]
    fn i32_round_trip(n in any::<i32>()) {
        prop_assert_eq!(round_trip("i32", ManagedValue::Int32(n)), ManagedValue::Int32(n));
    }

    // Exact across the whole range, including beyond 2^53
    #[test]
    fn i64_round_trip(n in any::<i64>()) {
        prop_assert_eq!(round_trip("i64", ManagedValue::Int64(n)), ManagedValue::Int64(n));
    }

    #[test]
    fn f32_round_trip(x in any::<f32>().prop_filter("NaN never compares equal", |x| !x.is_nan())) {
        prop_assert_eq!(round_trip("f32", ManagedValue::Float32(x)), ManagedValue::Float32(x));
    }

    #[test]
    fn f64_round_trip(x in any::<f64>().prop_filter("NaN never compares equal", |x| !x.is_nan())) {
        prop_assert_eq!(round_trip("f64", ManagedValue::Float64(x)), ManagedValue::Float64(x));
    }

    #[test]
    fn text_round_trip(s in ".*") {
        prop_assert_eq!(
            round_trip("text", ManagedValue::Text(s.clone())),
            ManagedValue::Text(s)
        );
    }

    // Narrowing keeps the low bits of the truncated value
    #[test]
    fn i8_narrowing_wraps(n in -1_000_000i64..1_000_000) {
        let host = HostValue::Number(n as f64);
        prop_assert_eq!(i8::from_host(&host).unwrap(), n as i8);
        prop_assert_eq!(i32::from_host(&host).unwrap(), n as i32);
        prop_assert_eq!(u16::from_host(&host).unwrap(), n as u16);
    }

    #[test]
    fn wrap_integer_matches_integer_casts(n in any::<i64>()) {
        // Exactly representable doubles only
        let x = (n >> 11) as f64;
        prop_assert_eq!(wrap_integer(x) as i64, n >> 11);
    }

    #[test]
    fn bigint_host_form_is_exact(n in any::<i64>()) {
        prop_assert_eq!(n.to_host(), HostValue::BigInt(i128::from(n)));
    }

    #[test]
    fn rectangular_arrays_round_trip(
        rows in 0usize..6,
        cols in 0usize..6,
        seed in any::<i32>(),
    ) {
        let array = ManagedArray::Nested(
            (0..rows)
                .map(|r| {
                    ManagedArray::Int32(
                        (0..cols)
                            .map(|c| seed.wrapping_add((r * 7 + c) as i32))
                            .collect(),
                    )
                })
                .collect(),
        );
        let value = ManagedValue::Array(array);
        prop_assert_eq!(round_trip("i32[][]", value.clone()), value);
    }
}
