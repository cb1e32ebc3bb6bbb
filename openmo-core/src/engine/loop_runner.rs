//! Bar-by-bar session loop.
//!
//! Per bar:
//! 1. Data quality: skip insane, duplicate or out-of-order bars
//! 2. Session clock: day boundary and phase
//! 3. Day boundary: roll over any open lot, reset the governor, new `DayContext`
//! 4. Risk governor: estimated daily PnL against the loss limit
//! 5. Signal machine: at most one action
//! 6. Broker: execute the action, feed closed trades to governor and aggregator

use crate::domain::{Bar, ClosedTrade, Direction, ExitReason};
use crate::indicators::{precompute_indicators, BarIndicators};
use crate::machine::{Action, DayContext, SignalMachine};
use crate::pnl::DailyPnlAggregator;
use crate::risk::RiskGovernor;
use crate::session::SessionClock;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::broker::{Broker, Instruction};
use super::state::{DaySummary, EngineConfig, EngineError, EventKind, SessionEvent, SessionResult};

/// Run the rule over `bars`, computing indicators first.
pub fn run_session(
    bars: &[Bar],
    config: &EngineConfig,
    broker: &mut dyn Broker,
) -> Result<SessionResult, EngineError> {
    config.params.validate()?;
    let indicators = precompute_indicators(
        bars,
        config.params.atr_period,
        config.params.volume_ma_period,
    );
    run_session_with_indicators(bars, &indicators, config, broker)
}

/// Run the rule over `bars` with one precomputed indicator reading per bar.
pub fn run_session_with_indicators(
    bars: &[Bar],
    indicators: &[BarIndicators],
    config: &EngineConfig,
    broker: &mut dyn Broker,
) -> Result<SessionResult, EngineError> {
    config.params.validate()?;
    let clock = SessionClock::new(&config.session)?;
    if bars.len() != indicators.len() {
        return Err(EngineError::IndicatorLengthMismatch {
            bars: bars.len(),
            indicators: indicators.len(),
        });
    }

    let params = config.params;
    let starting_equity = broker.cash();
    let mut machine = SignalMachine::new(params);
    let mut book = Book {
        broker,
        governor: RiskGovernor::new(params.daily_loss_limit, params.lot_size),
        aggregator: DailyPnlAggregator::new(clock.timezone()),
        lot_size: params.lot_size,
        trades: Vec::new(),
        events: Vec::new(),
    };

    let mut ctx: Option<DayContext> = None;
    let mut days = Vec::new();
    let mut last_bar: Option<&Bar> = None;
    let mut skipped_bars = 0usize;

    for (bar, reading) in bars.iter().zip(indicators) {
        // ─── Data quality ───
        if !bar.is_sane() {
            warn!(ts = %bar.timestamp, "skipping insane bar");
            skipped_bars += 1;
            continue;
        }
        if let Some(prev) = last_bar {
            if bar.timestamp <= prev.timestamp {
                warn!(ts = %bar.timestamp, prev = %prev.timestamp, "skipping out-of-order bar");
                skipped_bars += 1;
                continue;
            }
        }

        let tick = clock.classify(ctx.as_ref().map(|c| c.day), bar);

        // ─── Day boundary ───
        if tick.new_day {
            if let (Some(mut done), Some(prev)) = (ctx.take(), last_bar) {
                if let Some(action) = machine.flatten(ExitReason::SessionRollover) {
                    book.execute(action, prev, done.day)?;
                }
                done.close();
                days.push(DaySummary::from_context(&done, book.broker.equity(prev.close)));
            }
            let equity = book.broker.equity(bar.close);
            book.governor.reset(equity);
            info!(day = %tick.day, equity, "start of day");
            ctx = Some(DayContext::new(tick.day, equity));
        }
        let Some(day_ctx) = ctx.as_mut() else {
            continue;
        };

        // ─── Risk ───
        let breached = book
            .governor
            .evaluate(machine.position(), bar.close, params.point_value);
        if breached {
            let estimated_pnl = book.governor.realized()
                + book
                    .governor
                    .unrealized_estimate(machine.position(), bar.close, params.point_value);
            book.events.push(SessionEvent {
                timestamp: bar.timestamp,
                day: day_ctx.day,
                kind: EventKind::Halted { estimated_pnl },
            });
        }

        // ─── Signal ───
        if let Some(action) = machine.on_bar(day_ctx, bar, tick.phase, reading, breached)? {
            book.execute(action, bar, day_ctx.day)?;
        }

        last_bar = Some(bar);
    }

    // ─── End of data ───
    if let (Some(mut done), Some(last)) = (ctx.take(), last_bar) {
        if let Some(action) = machine.flatten(ExitReason::EndOfData) {
            book.execute(action, last, done.day)?;
        }
        done.close();
        days.push(DaySummary::from_context(&done, book.broker.equity(last.close)));
    }

    let final_equity = book.broker.cash();
    let bars_processed = bars.len() - skipped_bars;
    info!(
        bars_processed,
        skipped_bars,
        trades = book.trades.len(),
        days = days.len(),
        final_equity,
        "session complete"
    );

    Ok(SessionResult {
        daily: book.aggregator.finalize(),
        trades: book.trades,
        days,
        events: book.events,
        bars_processed,
        skipped_bars,
        starting_equity,
        final_equity,
    })
}

/// Everything an executed action touches.
struct Book<'a> {
    broker: &'a mut dyn Broker,
    governor: RiskGovernor,
    aggregator: DailyPnlAggregator,
    lot_size: u32,
    trades: Vec<ClosedTrade>,
    events: Vec<SessionEvent>,
}

impl Book<'_> {
    fn execute(&mut self, action: Action, bar: &Bar, day: NaiveDate) -> Result<(), EngineError> {
        match action {
            Action::Enter { direction } => {
                self.open(direction, bar)?;
            }
            Action::Reverse { to, trigger, .. } => {
                self.close(ExitReason::Reversal(trigger), bar)?;
                self.open(to, bar)?;
            }
            Action::Flatten { reason, .. } => {
                self.close(reason, bar)?;
            }
        }
        self.events.push(SessionEvent {
            timestamp: bar.timestamp,
            day,
            kind: EventKind::Action(action),
        });
        Ok(())
    }

    fn open(&mut self, direction: Direction, bar: &Bar) -> Result<(), EngineError> {
        let instruction = match direction {
            Direction::Long => Instruction::Buy { size: self.lot_size },
            Direction::Short => Instruction::Sell { size: self.lot_size },
            Direction::Flat => return Ok(()),
        };
        self.broker.submit(instruction, bar)?;
        Ok(())
    }

    fn close(&mut self, reason: ExitReason, bar: &Bar) -> Result<(), EngineError> {
        if let Some(trade) = self.broker.submit(Instruction::Close(reason), bar)? {
            self.governor.accumulate_realized(trade.net_pnl);
            self.aggregator.on_trade_closed(&trade)?;
            info!(
                pnl = trade.net_pnl,
                daily_realized = self.governor.realized(),
                ?reason,
                "trade closed"
            );
            debug!(?trade, "closed trade detail");
            self.trades.push(trade);
        }
        Ok(())
    }
}
