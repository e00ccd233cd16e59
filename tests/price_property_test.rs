use atelier_api::dto::PriceValue;
use proptest::prelude::*;

proptest! {
    #[test]
    fn grouped_thousands_are_accepted(thousands in 1u32..1000, rest in 0u32..1000, cents in 0u32..100) {
        let grouped = PriceValue::Text(format!("{}.{:03},{:02}", thousands, rest, cents)).normalize();
        let plain = PriceValue::Text(format!("{}{:03}.{:02}", thousands, rest, cents)).normalize();
        prop_assert!(plain.is_ok());
        prop_assert_eq!(grouped, plain);
    }

    #[test]
    fn normalized_prices_have_two_decimals(units in 1u32..100_000, tenths in 0u32..10) {
        let value = PriceValue::Text(format!("{},{}", units, tenths))
            .normalize()
            .expect("positive price");
        prop_assert_eq!(value.scale(), 2);
    }

    #[test]
    fn non_positive_numbers_are_rejected(n in -100_000i64..=0) {
        prop_assert!(PriceValue::Number(n.into()).normalize().is_err());
    }
}
