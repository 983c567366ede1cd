use dn_hedge_log::{
    evaluate_rehedge, HedgeAction, HedgeCalculator, HedgeConvention, NewPosition, OptionType,
    SessionController, Trigger,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::time::Duration;

fn delta() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|n| Decimal::new(n, 4))
}

fn size() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000).prop_map(|n| Decimal::new(n, 3))
}

fn band() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000).prop_map(|n| Decimal::new(n, 5))
}

fn hedge_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..=1_000_000).prop_map(|n| Decimal::new(n, 4))
}

fn option_type() -> impl Strategy<Value = OptionType> {
    prop_oneof![Just(OptionType::Call), Just(OptionType::Put)]
}

fn params(option_type: OptionType, entry_delta: Decimal, size: Decimal, band: Decimal) -> NewPosition {
    NewPosition {
        underlying_symbol: "BTC".to_string(),
        expiry: "29MAR".to_string(),
        option_type,
        strike: Decimal::from(72000),
        size,
        entry_delta,
        band,
    }
}

proptest! {
    #[test]
    fn call_starting_hedge_is_long(entry_delta in delta(), size in size()) {
        let hedge = HedgeCalculator::default()
            .starting_hedge(entry_delta, OptionType::Call, size)
            .unwrap();
        prop_assert_eq!(hedge, entry_delta * size);
        prop_assert!(hedge >= Decimal::ZERO);
    }

    #[test]
    fn put_starting_hedge_is_short(entry_delta in delta(), size in size()) {
        let hedge = HedgeCalculator::default()
            .starting_hedge(entry_delta, OptionType::Put, size)
            .unwrap();
        prop_assert_eq!(hedge, -(entry_delta * size));
        prop_assert!(hedge <= Decimal::ZERO);
    }

    #[test]
    fn long_convention_mirrors_short(d in delta(), size in size(), option_type in option_type()) {
        let short = HedgeCalculator::new(HedgeConvention::ShortOption).hedge(d, option_type, size);
        let long = HedgeCalculator::new(HedgeConvention::LongOption).hedge(d, option_type, size);
        prop_assert_eq!(short, -long);
    }

    #[test]
    fn deviation_on_band_never_triggers(current in hedge_amount(), band in band()) {
        let up = evaluate_rehedge(current + band, current, band);
        let down = evaluate_rehedge(current - band, current, band);
        prop_assert_eq!(up.trigger, Trigger::Ok);
        prop_assert_eq!(down.trigger, Trigger::Ok);
        prop_assert_eq!(up.quantity, Decimal::ZERO);
    }

    #[test]
    fn deviation_past_band_triggers(current in hedge_amount(), band in band(), eps in 1i64..1_000) {
        let eps = Decimal::new(eps, 8);

        let up = evaluate_rehedge(current + band + eps, current, band);
        prop_assert_eq!(up.trigger, Trigger::Rehedge);
        prop_assert_eq!(up.action, HedgeAction::Buy);
        prop_assert_eq!(up.quantity, band + eps);

        let down = evaluate_rehedge(current - band - eps, current, band);
        prop_assert_eq!(down.trigger, Trigger::Rehedge);
        prop_assert_eq!(down.action, HedgeAction::Sell);
        prop_assert_eq!(down.quantity, band + eps);
    }

    #[test]
    fn update_delta_on_band_stays_ok(
        option_type in option_type(),
        entry in (0i64..=5_000).prop_map(|n| Decimal::new(n, 4)),
        step in (1i64..=5_000).prop_map(|n| Decimal::new(n, 4)),
        size in size(),
    ) {
        // observed - entry = step, so |target - current| = step * size exactly
        let band = step * size;
        let observed = entry + step;

        let mut on_band = SessionController::in_memory(HedgeCalculator::default(), Duration::from_secs(1));
        let id = on_band.create_position(params(option_type, entry, size, band)).unwrap().contract_name;
        let decision = on_band.update_delta(&id, observed).unwrap();
        prop_assert_eq!(decision.deviation.abs(), band);
        prop_assert_eq!(decision.trigger, Trigger::Ok);
        prop_assert_eq!(decision.action, HedgeAction::None);

        let narrower = band - Decimal::new(1, 8);
        let mut past_band = SessionController::in_memory(HedgeCalculator::default(), Duration::from_secs(1));
        let id = past_band.create_position(params(option_type, entry, size, narrower)).unwrap().contract_name;
        let decision = past_band.update_delta(&id, observed).unwrap();
        prop_assert_eq!(decision.trigger, Trigger::Rehedge);
        prop_assert_eq!(decision.quantity, band);
        let expected = match option_type {
            OptionType::Call => HedgeAction::Buy,
            OptionType::Put => HedgeAction::Sell,
        };
        prop_assert_eq!(decision.action, expected);
    }

    #[test]
    fn update_delta_never_moves_held_hedge(
        option_type in option_type(),
        entry_delta in delta(),
        size in size(),
        band in band(),
        observations in prop::collection::vec(delta(), 1..20),
    ) {
        let mut session = SessionController::in_memory(HedgeCalculator::default(), Duration::from_secs(1));
        let position = session.create_position(params(option_type, entry_delta, size, band)).unwrap();
        let id = position.contract_name.clone();

        for observed in observations {
            let decision = session.update_delta(&id, observed).unwrap();
            let now = session.position(&id).unwrap();
            prop_assert_eq!(now.current_hedge, position.starting_hedge);
            prop_assert_eq!(now.last_delta, observed);
            prop_assert_eq!(decision.current_hedge, position.starting_hedge);
        }
    }
}
