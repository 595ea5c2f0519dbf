//! The fixed demo sequence: who am I, what do I hold, buy something, watch.

use std::fmt;
use std::future::Future;
use std::io::Write;

use log::info;
use tokio_util::sync::CancellationToken;
use tonic::Status;

use crate::client::GrpcoinClient;
use crate::proto::{trade_request, Amount, PortfolioResponse, TradeAction, TradeRequest, TradeResponse};
use crate::watch;

pub const DEMO_TRADE_TICKER: &str = "BTC";
pub const DEMO_TRADE_QUANTITY: Amount = Amount {
    units: 0,
    nanos: 99_990_000,
};
pub const DEMO_WATCH_TICKER: &str = "BTC-USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Authenticate,
    Portfolio,
    Trade,
    Watch,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Authenticate => "authentication",
            Step::Portfolio => "portfolio",
            Step::Trade => "trade",
            Step::Watch => "watch",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{step} request failed: {status}")]
    Rpc {
        step: Step,
        #[source]
        status: Status,
    },
    #[error("interrupted before the {0} request completed")]
    Cancelled(Step),
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

impl SessionError {
    pub(crate) fn rpc(step: Step) -> impl FnOnce(Status) -> Self {
        move |status| SessionError::Rpc { step, status }
    }

    /// gRPC status of a failed call, if that is what failed.
    pub fn status(&self) -> Option<&Status> {
        match self {
            SessionError::Rpc { status, .. } => Some(status),
            SessionError::Cancelled(_) | SessionError::Output(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeOrder {
    pub action: TradeAction,
    pub ticker: String,
    pub quantity: Amount,
}

impl TradeOrder {
    pub fn buy(ticker: impl Into<String>, quantity: Amount) -> Self {
        Self {
            action: TradeAction::Buy,
            ticker: ticker.into(),
            quantity,
        }
    }

    pub fn sell(ticker: impl Into<String>, quantity: Amount) -> Self {
        Self {
            action: TradeAction::Sell,
            ..Self::buy(ticker, quantity)
        }
    }

    pub fn to_request(&self) -> TradeRequest {
        TradeRequest {
            action: self.action as i32,
            ticker: Some(trade_request::Ticker {
                ticker: self.ticker.clone(),
            }),
            quantity: Some(self.quantity),
        }
    }
}

impl Default for TradeOrder {
    fn default() -> Self {
        Self::buy(DEMO_TRADE_TICKER, DEMO_TRADE_QUANTITY)
    }
}

pub struct Session {
    client: GrpcoinClient,
    order: TradeOrder,
    watch_ticker: String,
}

impl Session {
    pub fn new(client: GrpcoinClient) -> Self {
        Self {
            client,
            order: TradeOrder::default(),
            watch_ticker: DEMO_WATCH_TICKER.to_string(),
        }
    }

    pub fn with_order(mut self, order: TradeOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_watch_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.watch_ticker = ticker.into();
        self
    }

    /// Unary calls then the quote stream. Returns how many ticks were printed.
    ///
    /// `cancel` covers the whole run: once it fires, the call in flight is
    /// dropped and no later call is issued.
    pub async fn run<W: Write>(
        &mut self,
        out: &mut W,
        cancel: CancellationToken,
    ) -> Result<u64, SessionError> {
        self.run_calls(out, &cancel).await?;
        self.stream_quotes(out, cancel).await
    }

    /// TestAuth, Portfolio and Trade, in that order. The first failure or a
    /// cancellation stops the sequence.
    pub async fn run_calls<W: Write>(
        &mut self,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        let auth = unless_cancelled(cancel, Step::Authenticate, self.client.test_auth()).await?;
        info!("authenticated");
        writeln!(out, "you are user {}", auth.user_id)?;

        let portfolio = unless_cancelled(cancel, Step::Portfolio, self.client.portfolio()).await?;
        print_portfolio(out, &portfolio)?;

        info!(
            "placing order: {} {} {}",
            self.order.action.as_str_name(),
            self.order.quantity,
            self.order.ticker
        );
        let request = self.order.to_request();
        let executed = unless_cancelled(cancel, Step::Trade, self.client.trade(request)).await?;
        print_trade(out, &executed)?;
        Ok(())
    }

    pub async fn stream_quotes<W: Write>(
        &mut self,
        out: &mut W,
        cancel: CancellationToken,
    ) -> Result<u64, SessionError> {
        info!(
            "connecting to stream real-time {} quotes, hit Ctrl-C to quit anytime",
            self.watch_ticker
        );
        let ticks = unless_cancelled(
            &cancel,
            Step::Watch,
            self.client.watch(&self.watch_ticker, cancel.clone()),
        )
        .await?;
        watch::consume(ticks, out).await
    }
}

// A token that already fired wins, so the call is never sent.
async fn unless_cancelled<T, F>(
    cancel: &CancellationToken,
    step: Step,
    call: F,
) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, Status>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SessionError::Cancelled(step)),
        result = call => result.map_err(SessionError::rpc(step)),
    }
}

fn print_portfolio<W: Write>(out: &mut W, portfolio: &PortfolioResponse) -> std::io::Result<()> {
    writeln!(
        out,
        "cash position: USD {}",
        portfolio.cash_usd.unwrap_or_default()
    )?;
    for position in &portfolio.positions {
        let ticker = position
            .ticker
            .as_ref()
            .map_or("?", |t| t.ticker.as_str());
        writeln!(
            out,
            "-> coin position: {} ({})",
            ticker,
            position.amount.unwrap_or_default()
        )?;
    }
    Ok(())
}

fn print_trade<W: Write>(out: &mut W, trade: &TradeResponse) -> std::io::Result<()> {
    let symbol = trade.ticker.as_ref().map_or("?", |t| t.symbol.as_str());
    writeln!(
        out,
        "ORDER EXECUTED: {} [{}] {} at USD[{}]",
        trade.action().as_str_name(),
        trade.quantity.unwrap_or_default(),
        symbol,
        trade.executed_price.unwrap_or_default()
    )
}
