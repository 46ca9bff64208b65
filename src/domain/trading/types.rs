use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order types supported by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Executes immediately at the current market price
    Market,
    /// Executes once the price crosses the limit price
    Limit,
    /// Automatic sell to cap losses once the price falls to the stop
    StopLoss,
    /// Automatic sell to lock in gains once the price rises to the stop
    TakeProfit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::StopLoss => write!(f, "STOP_LOSS"),
            OrderType::TakeProfit => write!(f, "TAKE_PROFIT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Executed,
    Cancelled,
    Expired,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A simulated order, pending or settled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Limit price, for limit orders
    pub price: Option<Decimal>,
    /// Trigger price, for stop-loss and take-profit orders
    pub stop_price: Option<Decimal>,
    pub status: OrderStatus,
    pub created_at_ms: i64,
    pub executed_at_ms: Option<i64>,
    pub executed_price: Option<Decimal>,
    pub cancel_reason: Option<String>,
}

/// An open holding in one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: Decimal,
    /// Volume-weighted average entry price
    pub average_price: Decimal,
    /// Total cost basis still held
    pub invested: Decimal,
}

impl Position {
    pub fn market_value(&self, current_price: Decimal) -> Decimal {
        self.quantity * current_price
    }

    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        self.market_value(current_price) - self.invested
    }
}

/// A completed round trip with realized profit/loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: u64,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub pnl: Decimal,
    pub pnl_percentage: Decimal,
    pub executed_at_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_unrealized_pnl() {
        let position = Position {
            quantity: dec!(2),
            average_price: dec!(100),
            invested: dec!(200),
        };

        assert_eq!(position.market_value(dec!(110)), dec!(220));
        assert_eq!(position.unrealized_pnl(dec!(110)), dec!(20));
        assert_eq!(position.unrealized_pnl(dec!(90)), dec!(-20));
    }

    #[test]
    fn test_order_type_display() {
        assert_eq!(OrderType::StopLoss.to_string(), "STOP_LOSS");
        assert_eq!(OrderSide::Buy.to_string(), "BUY");
        assert_eq!(OrderStatus::Pending.to_string(), "Pending");
    }
}
