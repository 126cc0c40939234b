//! Position and account types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Side;

/// An open position in a single asset as reported by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Symbol
    pub symbol: String,
    /// Units held (long only)
    pub quantity: Decimal,
    /// Average entry price
    pub avg_entry_price: Decimal,
    /// Current market price
    pub current_price: Decimal,
    /// Market value (quantity * current_price)
    pub market_value: Decimal,
    /// Unrealized profit/loss
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// Create a new position.
    pub fn new(symbol: impl Into<String>, quantity: Decimal, avg_entry_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_entry_price,
            current_price: avg_entry_price,
            market_value: quantity * avg_entry_price,
            unrealized_pnl: Decimal::ZERO,
        }
    }

    /// Check if the position holds nothing.
    pub fn is_flat(&self) -> bool {
        self.quantity == Decimal::ZERO
    }

    /// Update the current market price and recalculate values.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.market_value = self.quantity * price;
        self.unrealized_pnl = self.market_value - self.quantity * self.avg_entry_price;
    }

    /// Apply a fill to the position.
    /// Returns the realized P&L if the position is being reduced.
    pub fn apply_fill(&mut self, side: Side, quantity: Decimal, price: Decimal) -> Decimal {
        let realized = match side {
            Side::Buy => {
                // Adding to position - update average entry price
                let total_cost = self.quantity * self.avg_entry_price + quantity * price;
                self.quantity += quantity;
                if self.quantity != Decimal::ZERO {
                    self.avg_entry_price = total_cost / self.quantity;
                }
                Decimal::ZERO
            }
            Side::Sell => {
                let close_qty = quantity.min(self.quantity);
                self.quantity -= close_qty;
                close_qty * (price - self.avg_entry_price)
            }
        };

        self.update_price(price);
        realized
    }
}

/// Account snapshot: cash, equity and open positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    /// Available cash
    pub cash: Decimal,
    /// Total equity (cash + market value of positions)
    pub equity: Decimal,
    /// Map of symbol to position
    pub positions: HashMap<String, Position>,
    /// Total realized P&L across closed trades
    pub total_realized_pnl: Decimal,
    /// Initial capital (for calculating returns)
    pub initial_capital: Decimal,
}

impl Portfolio {
    /// Create a new portfolio with initial cash.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            cash: initial_capital,
            equity: initial_capital,
            positions: HashMap::new(),
            total_realized_pnl: Decimal::ZERO,
            initial_capital,
        }
    }

    /// Recompute equity from cash and marked positions.
    pub fn update_equity(&mut self) {
        let market_value: Decimal = self.positions.values().map(|p| p.market_value).sum();
        self.equity = self.cash + market_value;
    }

    /// Calculate total return percentage.
    pub fn total_return(&self) -> Decimal {
        if self.initial_capital == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.equity - self.initial_capital) / self.initial_capital * Decimal::from(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_mark() {
        let mut position = Position::new("ETH/USD", dec!(2), dec!(2000));
        assert_eq!(position.market_value, dec!(4000));

        position.update_price(dec!(2100));
        assert_eq!(position.market_value, dec!(4200));
        assert_eq!(position.unrealized_pnl, dec!(200));
    }

    #[test]
    fn test_position_apply_fill_increase() {
        let mut position = Position::new("ETH/USD", dec!(1), dec!(2000));

        let realized = position.apply_fill(Side::Buy, dec!(1), dec!(2200));
        assert_eq!(realized, Decimal::ZERO);
        assert_eq!(position.quantity, dec!(2));
        assert_eq!(position.avg_entry_price, dec!(2100));
    }

    #[test]
    fn test_position_apply_fill_close() {
        let mut position = Position::new("ETH/USD", dec!(2), dec!(2000));

        let realized = position.apply_fill(Side::Sell, dec!(2), dec!(2100));
        assert_eq!(realized, dec!(200));
        assert!(position.is_flat());
    }

    #[test]
    fn test_portfolio_total_return() {
        let mut portfolio = Portfolio::new(dec!(10000));
        assert_eq!(portfolio.total_return(), Decimal::ZERO);

        portfolio.equity = dec!(12000);
        assert_eq!(portfolio.total_return(), dec!(20));
    }
}
