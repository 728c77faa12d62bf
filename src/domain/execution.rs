//! Signal-to-trade translation and position sizing.
//!
//! Sizing is fixed: each non-hold signal trades `floor(0.1 * cash / price)`
//! whole shares, where `cash` is the cash available at the start of the
//! day. Both the engine and the risk gate size through [`position_size`].

use super::position::{Trade, TradeSide};
use super::signal::{Signal, SignalDirection};

/// Fraction of available cash committed per signal.
pub const POSITION_FRACTION: f64 = 0.1;

/// floor(POSITION_FRACTION * available_cash / price); 0 for a non-positive
/// or non-finite price or cash.
pub fn position_size(available_cash: f64, price: f64) -> u64 {
    if !price.is_finite() || price <= 0.0 || !available_cash.is_finite() || available_cash <= 0.0
    {
        return 0;
    }
    (POSITION_FRACTION * available_cash / price).floor() as u64
}

/// Translate one signal into a trade. Hold signals and zero-quantity sizes
/// yield `None`.
pub fn signal_to_trade(signal: &Signal, available_cash: f64) -> Option<Trade> {
    let side = match signal.direction {
        SignalDirection::Buy => TradeSide::Buy,
        SignalDirection::Sell => TradeSide::Sell,
        SignalDirection::Hold => return None,
    };
    let quantity = position_size(available_cash, signal.price);
    if quantity == 0 {
        return None;
    }
    Some(Trade {
        date: signal.date,
        symbol: signal.symbol.clone(),
        side,
        price: signal.price,
        quantity,
    })
}

/// Trades for one day's batch, all sized against the same opening cash.
pub fn build_day_trades(signals: &[Signal], available_cash: f64) -> Vec<Trade> {
    signals
        .iter()
        .filter_map(|s| signal_to_trade(s, available_cash))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn signal(symbol: &str, direction: SignalDirection, price: f64) -> Signal {
        Signal {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            symbol: symbol.to_string(),
            direction,
            price,
        }
    }

    #[test]
    fn ten_percent_of_one_million_at_100() {
        assert_eq!(position_size(1_000_000.0, 100.0), 1000);
    }

    #[test]
    fn size_truncates_to_whole_shares() {
        // 0.1 * 10_000 / 33 = 30.30...
        assert_eq!(position_size(10_000.0, 33.0), 30);
    }

    #[test]
    fn size_zero_for_bad_inputs() {
        assert_eq!(position_size(1_000.0, 0.0), 0);
        assert_eq!(position_size(1_000.0, f64::NAN), 0);
        assert_eq!(position_size(-5.0, 10.0), 0);
        assert_eq!(position_size(1_000.0, 200.0), 0);
    }

    #[test]
    fn hold_signal_has_no_trade() {
        assert!(signal_to_trade(&signal("A", SignalDirection::Hold, 10.0), 1e6).is_none());
    }

    #[test]
    fn buy_and_sell_sides() {
        let buy = signal_to_trade(&signal("A", SignalDirection::Buy, 100.0), 1e6).unwrap();
        assert_eq!(buy.side, TradeSide::Buy);
        assert_eq!(buy.quantity, 1000);
        let sell = signal_to_trade(&signal("A", SignalDirection::Sell, 100.0), 1e6).unwrap();
        assert_eq!(sell.side, TradeSide::Sell);
        assert_eq!(sell.quantity, 1000);
    }

    #[test]
    fn day_trades_share_opening_cash_and_drop_zero_quantity() {
        let signals = vec![
            signal("A", SignalDirection::Buy, 100.0),
            signal("B", SignalDirection::Hold, 100.0),
            signal("C", SignalDirection::Buy, 50.0),
            signal("D", SignalDirection::Buy, 1e9),
        ];
        let trades = build_day_trades(&signals, 100_000.0);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].quantity, 100);
        assert_eq!(trades[1].quantity, 200);
    }
}
