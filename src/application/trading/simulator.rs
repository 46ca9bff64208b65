//! Paper-trading simulator.
//!
//! Tracks a cash balance, open positions and order/trade history without
//! touching a real exchange. Market orders settle immediately at the
//! provided price; limit, stop-loss and take-profit orders wait in the
//! book until [`TradingSimulator::process_pending_orders`] sees a price
//! that triggers them. All money math is `Decimal`. Timestamps are passed
//! in by the caller so the simulator never reads a clock of its own.

use crate::domain::errors::TradingError;
use crate::domain::trading::types::{Order, OrderSide, OrderStatus, OrderType, Position, Trade};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Repository for simulator state, one document per user id
#[async_trait]
pub trait SimulatorStateRepository: Send + Sync {
    async fn save(&self, user_id: &str, simulator: &TradingSimulator, now_ms: i64) -> Result<()>;

    async fn load(&self, user_id: &str) -> Result<Option<TradingSimulator>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSimulator {
    pub initial_balance: Decimal,
    /// Available cash in quote currency
    pub balance: Decimal,
    pub positions: HashMap<String, Position>,
    pub orders: Vec<Order>,
    pub trades: Vec<Trade>,
}

/// Aggregate trading results derived from the trade history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStatistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: Decimal,
    pub total_pnl: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
}

impl TradingSimulator {
    pub fn new(initial_balance: Decimal) -> Self {
        info!("Simulator initialized with balance ${}", initial_balance);
        Self {
            initial_balance,
            balance: initial_balance,
            positions: HashMap::new(),
            orders: Vec::new(),
            trades: Vec::new(),
        }
    }

    /// Total portfolio value: cash plus open positions marked to the given
    /// prices. Positions without a quote keep their cost basis.
    pub fn portfolio_value(&self, current_prices: &HashMap<String, Decimal>) -> Decimal {
        let mut total = self.balance;
        for (symbol, position) in &self.positions {
            match current_prices.get(symbol) {
                Some(price) => total += position.market_value(*price),
                None => total += position.invested,
            }
        }
        total
    }

    /// Absolute and percentage profit/loss against the initial balance
    pub fn pnl(&self, current_prices: &HashMap<String, Decimal>) -> (Decimal, Decimal) {
        let absolute = self.portfolio_value(current_prices) - self.initial_balance;
        if self.initial_balance.is_zero() {
            return (absolute, Decimal::ZERO);
        }
        let percentage = absolute / self.initial_balance * Decimal::ONE_HUNDRED;
        (absolute, percentage)
    }

    /// Creates an order and, for market orders, settles it immediately.
    ///
    /// A market order that cannot settle (insufficient funds or quantity)
    /// is recorded as cancelled with the rejection reason rather than
    /// dropped, so the order history stays complete.
    pub fn create_order(
        &mut self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        quantity: Decimal,
        price: Option<Decimal>,
        stop_price: Option<Decimal>,
        current_price: Option<Decimal>,
        now_ms: i64,
    ) -> Result<Order, TradingError> {
        if quantity <= Decimal::ZERO {
            return Err(TradingError::InvalidOrder {
                reason: format!("quantity must be positive, got {}", quantity),
            });
        }
        match order_type {
            OrderType::Limit if price.is_none() => {
                return Err(TradingError::InvalidOrder {
                    reason: "limit orders require a limit price".to_string(),
                });
            }
            OrderType::StopLoss | OrderType::TakeProfit if stop_price.is_none() => {
                return Err(TradingError::InvalidOrder {
                    reason: format!("{} orders require a stop price", order_type),
                });
            }
            _ => {}
        }

        let mut order = Order {
            id: self.orders.len() as u64 + 1,
            symbol: symbol.to_string(),
            order_type,
            side,
            quantity,
            price,
            stop_price,
            status: OrderStatus::Pending,
            created_at_ms: now_ms,
            executed_at_ms: None,
            executed_price: None,
            cancel_reason: None,
        };

        if order_type == OrderType::Market {
            let current_price = current_price.ok_or_else(|| TradingError::InvalidOrder {
                reason: "market orders require the current price".to_string(),
            })?;
            if let Err(e) = self.execute_order(&mut order, current_price, now_ms) {
                order.status = OrderStatus::Cancelled;
                order.cancel_reason = Some(e.to_string());
            }
        }

        info!(
            "Order {}: {} {} {} @ {:?}",
            order.id, order.side, order.quantity, order.symbol, order.executed_price
        );
        self.orders.push(order.clone());
        Ok(order)
    }

    fn execute_order(
        &mut self,
        order: &mut Order,
        execution_price: Decimal,
        now_ms: i64,
    ) -> Result<(), TradingError> {
        match order.side {
            OrderSide::Buy => self.settle_buy(order, execution_price)?,
            OrderSide::Sell => self.settle_sell(order, execution_price, now_ms)?,
        }

        order.status = OrderStatus::Executed;
        order.executed_at_ms = Some(now_ms);
        order.executed_price = Some(execution_price);
        Ok(())
    }

    fn settle_buy(&mut self, order: &Order, price: Decimal) -> Result<(), TradingError> {
        let cost = order.quantity * price;
        if cost > self.balance {
            return Err(TradingError::InsufficientFunds {
                need: cost,
                available: self.balance,
            });
        }

        self.balance -= cost;
        let position = self
            .positions
            .entry(order.symbol.clone())
            .or_insert(Position {
                quantity: Decimal::ZERO,
                average_price: Decimal::ZERO,
                invested: Decimal::ZERO,
            });

        position.invested += cost;
        position.quantity += order.quantity;
        position.average_price = position.invested / position.quantity;
        Ok(())
    }

    fn settle_sell(
        &mut self,
        order: &Order,
        price: Decimal,
        now_ms: i64,
    ) -> Result<(), TradingError> {
        let position =
            self.positions
                .get_mut(&order.symbol)
                .ok_or_else(|| TradingError::PositionNotFound {
                    symbol: order.symbol.clone(),
                })?;
        if order.quantity > position.quantity {
            return Err(TradingError::InsufficientQuantity {
                symbol: order.symbol.clone(),
                available: position.quantity,
                requested: order.quantity,
            });
        }

        let sale_value = order.quantity * price;
        let cost_basis = order.quantity * position.average_price;
        let pnl = sale_value - cost_basis;
        let entry_price = position.average_price;

        self.balance += sale_value;
        position.quantity -= order.quantity;
        position.invested -= cost_basis;
        if position.quantity.is_zero() {
            self.positions.remove(&order.symbol);
        }

        let pnl_percentage = if cost_basis.is_zero() {
            Decimal::ZERO
        } else {
            pnl / cost_basis * Decimal::ONE_HUNDRED
        };

        self.trades.push(Trade {
            id: self.trades.len() as u64 + 1,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            entry_price,
            exit_price: price,
            pnl,
            pnl_percentage,
            executed_at_ms: now_ms,
        });
        Ok(())
    }

    /// Checks every pending order against the given prices and settles
    /// those whose trigger condition is met. A triggered order that fails
    /// to settle is cancelled with the reason recorded. Returns the ids of
    /// the orders executed this pass.
    pub fn process_pending_orders(
        &mut self,
        current_prices: &HashMap<String, Decimal>,
        now_ms: i64,
    ) -> Vec<u64> {
        let mut executed = Vec::new();

        for i in 0..self.orders.len() {
            if self.orders[i].status != OrderStatus::Pending {
                continue;
            }
            let Some(&price) = current_prices.get(&self.orders[i].symbol) else {
                continue;
            };

            let order = &self.orders[i];
            let should_execute = match order.order_type {
                OrderType::Market => false, // settled at creation
                OrderType::Limit => {
                    let target = order.price.unwrap_or(price);
                    match order.side {
                        OrderSide::Buy => price <= target,
                        OrderSide::Sell => price >= target,
                    }
                }
                OrderType::StopLoss => price <= order.stop_price.unwrap_or(price),
                OrderType::TakeProfit => price >= order.stop_price.unwrap_or(price),
            };
            if !should_execute {
                continue;
            }

            let mut order = self.orders[i].clone();
            match self.execute_order(&mut order, price, now_ms) {
                Ok(()) => {
                    executed.push(order.id);
                    info!("Pending order {} executed at {}", order.id, price);
                }
                Err(e) => {
                    order.status = OrderStatus::Cancelled;
                    order.cancel_reason = Some(e.to_string());
                    info!("Pending order {} cancelled: {}", order.id, e);
                }
            }
            self.orders[i] = order;
        }

        executed
    }

    /// Cancels a pending order. Returns false when the id is unknown or
    /// the order already settled.
    pub fn cancel_order(&mut self, order_id: u64) -> bool {
        for order in &mut self.orders {
            if order.id == order_id && order.status == OrderStatus::Pending {
                order.status = OrderStatus::Cancelled;
                order.cancel_reason = Some("Cancelled by user".to_string());
                return true;
            }
        }
        false
    }

    pub fn statistics(&self) -> TradeStatistics {
        if self.trades.is_empty() {
            return TradeStatistics {
                total_trades: 0,
                winning_trades: 0,
                losing_trades: 0,
                win_rate_pct: Decimal::ZERO,
                total_pnl: Decimal::ZERO,
                avg_win: Decimal::ZERO,
                avg_loss: Decimal::ZERO,
                best_trade: Decimal::ZERO,
                worst_trade: Decimal::ZERO,
            };
        }

        let wins: Vec<Decimal> = self
            .trades
            .iter()
            .map(|t| t.pnl)
            .filter(|pnl| *pnl > Decimal::ZERO)
            .collect();
        let losses: Vec<Decimal> = self
            .trades
            .iter()
            .map(|t| t.pnl)
            .filter(|pnl| *pnl < Decimal::ZERO)
            .collect();

        let total = Decimal::from(self.trades.len());
        let total_pnl: Decimal = self.trades.iter().map(|t| t.pnl).sum();
        let avg = |values: &[Decimal]| {
            if values.is_empty() {
                Decimal::ZERO
            } else {
                values.iter().copied().sum::<Decimal>() / Decimal::from(values.len())
            }
        };

        TradeStatistics {
            total_trades: self.trades.len(),
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate_pct: Decimal::from(wins.len()) / total * Decimal::ONE_HUNDRED,
            total_pnl,
            avg_win: avg(&wins),
            avg_loss: avg(&losses),
            best_trade: self.trades.iter().map(|t| t.pnl).max().unwrap_or_default(),
            worst_trade: self.trades.iter().map(|t| t.pnl).min().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prices(symbol: &str, price: Decimal) -> HashMap<String, Decimal> {
        HashMap::from([(symbol.to_string(), price)])
    }

    fn market_buy(sim: &mut TradingSimulator, qty: Decimal, price: Decimal) -> Order {
        sim.create_order(
            "BTCUSDT",
            OrderType::Market,
            OrderSide::Buy,
            qty,
            None,
            None,
            Some(price),
            1_000,
        )
        .unwrap()
    }

    #[test]
    fn test_market_buy_opens_position() {
        let mut sim = TradingSimulator::new(dec!(10000));

        let order = market_buy(&mut sim, dec!(2), dec!(100));

        assert_eq!(order.status, OrderStatus::Executed);
        assert_eq!(sim.balance, dec!(9800));
        let position = &sim.positions["BTCUSDT"];
        assert_eq!(position.quantity, dec!(2));
        assert_eq!(position.average_price, dec!(100));
    }

    #[test]
    fn test_buys_average_entry_price() {
        let mut sim = TradingSimulator::new(dec!(10000));

        market_buy(&mut sim, dec!(1), dec!(100));
        market_buy(&mut sim, dec!(1), dec!(200));

        let position = &sim.positions["BTCUSDT"];
        assert_eq!(position.quantity, dec!(2));
        assert_eq!(position.average_price, dec!(150));
        assert_eq!(position.invested, dec!(300));
    }

    #[test]
    fn test_insufficient_funds_cancels_market_order() {
        let mut sim = TradingSimulator::new(dec!(100));

        let order = market_buy(&mut sim, dec!(2), dec!(100));

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.cancel_reason.unwrap().contains("Insufficient funds"));
        assert_eq!(sim.balance, dec!(100)); // untouched
        assert!(sim.positions.is_empty());
    }

    #[test]
    fn test_sell_realizes_pnl() {
        let mut sim = TradingSimulator::new(dec!(10000));
        market_buy(&mut sim, dec!(2), dec!(100));

        let order = sim
            .create_order(
                "BTCUSDT",
                OrderType::Market,
                OrderSide::Sell,
                dec!(2),
                None,
                None,
                Some(dec!(110)),
                2_000,
            )
            .unwrap();

        assert_eq!(order.status, OrderStatus::Executed);
        assert_eq!(sim.balance, dec!(10020));
        assert!(sim.positions.is_empty());

        let trade = &sim.trades[0];
        assert_eq!(trade.pnl, dec!(20));
        assert_eq!(trade.pnl_percentage, dec!(10));
    }

    #[test]
    fn test_sell_without_position_is_cancelled() {
        let mut sim = TradingSimulator::new(dec!(10000));

        let order = sim
            .create_order(
                "ETHUSDT",
                OrderType::Market,
                OrderSide::Sell,
                dec!(1),
                None,
                None,
                Some(dec!(100)),
                1_000,
            )
            .unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.cancel_reason.unwrap().contains("Position not found"));
    }

    #[test]
    fn test_limit_buy_triggers_when_price_drops() {
        let mut sim = TradingSimulator::new(dec!(10000));
        sim.create_order(
            "BTCUSDT",
            OrderType::Limit,
            OrderSide::Buy,
            dec!(1),
            Some(dec!(90)),
            None,
            None,
            1_000,
        )
        .unwrap();

        // Above the limit: nothing happens
        assert!(
            sim.process_pending_orders(&prices("BTCUSDT", dec!(95)), 2_000)
                .is_empty()
        );

        let executed = sim.process_pending_orders(&prices("BTCUSDT", dec!(89)), 3_000);
        assert_eq!(executed, vec![1]);
        assert_eq!(sim.positions["BTCUSDT"].quantity, dec!(1));
        // Executed at the observed price, not the limit price
        assert_eq!(sim.balance, dec!(10000) - dec!(89));
    }

    #[test]
    fn test_stop_loss_and_take_profit_triggers() {
        let mut sim = TradingSimulator::new(dec!(10000));
        market_buy(&mut sim, dec!(2), dec!(100));

        sim.create_order(
            "BTCUSDT",
            OrderType::StopLoss,
            OrderSide::Sell,
            dec!(1),
            None,
            Some(dec!(90)),
            None,
            2_000,
        )
        .unwrap();
        sim.create_order(
            "BTCUSDT",
            OrderType::TakeProfit,
            OrderSide::Sell,
            dec!(1),
            None,
            Some(dec!(120)),
            None,
            2_000,
        )
        .unwrap();

        // Price between the two triggers: both stay pending
        assert!(
            sim.process_pending_orders(&prices("BTCUSDT", dec!(100)), 3_000)
                .is_empty()
        );

        // Take-profit fires on the way up
        let executed = sim.process_pending_orders(&prices("BTCUSDT", dec!(125)), 4_000);
        assert_eq!(executed, vec![3]);

        // Stop-loss fires on the way down
        let executed = sim.process_pending_orders(&prices("BTCUSDT", dec!(85)), 5_000);
        assert_eq!(executed, vec![2]);
        assert!(sim.positions.is_empty());
    }

    #[test]
    fn test_cancel_pending_order() {
        let mut sim = TradingSimulator::new(dec!(10000));
        let order = sim
            .create_order(
                "BTCUSDT",
                OrderType::Limit,
                OrderSide::Buy,
                dec!(1),
                Some(dec!(90)),
                None,
                None,
                1_000,
            )
            .unwrap();

        assert!(sim.cancel_order(order.id));
        assert!(!sim.cancel_order(order.id)); // already cancelled
        assert!(!sim.cancel_order(999));
        assert!(
            sim.process_pending_orders(&prices("BTCUSDT", dec!(80)), 2_000)
                .is_empty()
        );
    }

    #[test]
    fn test_statistics() {
        let mut sim = TradingSimulator::new(dec!(10000));
        market_buy(&mut sim, dec!(2), dec!(100));

        // One winning exit (+10), one losing exit (-5)
        sim.create_order(
            "BTCUSDT",
            OrderType::Market,
            OrderSide::Sell,
            dec!(1),
            None,
            None,
            Some(dec!(110)),
            2_000,
        )
        .unwrap();
        sim.create_order(
            "BTCUSDT",
            OrderType::Market,
            OrderSide::Sell,
            dec!(1),
            None,
            None,
            Some(dec!(95)),
            3_000,
        )
        .unwrap();

        let stats = sim.statistics();
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.win_rate_pct, dec!(50));
        assert_eq!(stats.total_pnl, dec!(5));
        assert_eq!(stats.best_trade, dec!(10));
        assert_eq!(stats.worst_trade, dec!(-5));
    }

    #[test]
    fn test_portfolio_value_and_pnl() {
        let mut sim = TradingSimulator::new(dec!(10000));
        market_buy(&mut sim, dec!(2), dec!(100));

        let current = prices("BTCUSDT", dec!(150));
        assert_eq!(sim.portfolio_value(&current), dec!(10100));

        let (absolute, percentage) = sim.pnl(&current);
        assert_eq!(absolute, dec!(100));
        assert_eq!(percentage, dec!(1));
    }

    #[test]
    fn test_state_serde_roundtrip() {
        let mut sim = TradingSimulator::new(dec!(10000));
        market_buy(&mut sim, dec!(1), dec!(100));

        let json = serde_json::to_string(&sim).unwrap();
        let restored: TradingSimulator = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.balance, sim.balance);
        assert_eq!(restored.positions["BTCUSDT"], sim.positions["BTCUSDT"]);
        assert_eq!(restored.orders.len(), 1);
    }
}
