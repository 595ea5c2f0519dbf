//! In-process stand-in for the paper-trading service.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use tokio::sync::Mutex;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use grpcoin_client::proto::account_server::{Account, AccountServer};
use grpcoin_client::proto::paper_trade_server::{PaperTrade, PaperTradeServer};
use grpcoin_client::proto::ticker_info_server::{TickerInfo, TickerInfoServer};
use grpcoin_client::proto::{
    portfolio_position, trade_response, Amount, PortfolioPosition, PortfolioRequest,
    PortfolioResponse, Quote, QuoteTicker, TestAuthRequest, TestAuthResponse, TradeRequest,
    TradeResponse,
};
use grpcoin_client::{connect, Config, GrpcoinClient, Target, Token};

pub const TEST_TOKEN: &str = "test-token";

#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    pub reject_auth: bool,
    // TestAuth never answers
    pub stall_auth: bool,
    pub reject_trade: bool,
    pub ticks: usize,
    // after the ticks: keep the stream open instead of closing it
    pub hold_open: bool,
    pub fail_stream_with: Option<Status>,
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub calls: Vec<&'static str>,
    pub authorization: Vec<Option<String>>,
    pub trades: Vec<TradeRequest>,
    pub watched: Vec<String>,
}

#[derive(Clone)]
pub struct StubService {
    behaviour: Behaviour,
    recorded: Arc<Mutex<Recorded>>,
}

impl StubService {
    async fn record<T>(&self, call: &'static str, request: &Request<T>) {
        let header = request
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let mut recorded = self.recorded.lock().await;
        recorded.calls.push(call);
        recorded.authorization.push(header);
    }
}

#[tonic::async_trait]
impl Account for StubService {
    async fn test_auth(
        &self,
        request: Request<TestAuthRequest>,
    ) -> Result<Response<TestAuthResponse>, Status> {
        self.record("TestAuth", &request).await;
        if self.behaviour.stall_auth {
            std::future::pending::<()>().await;
        }
        if self.behaviour.reject_auth {
            return Err(Status::unauthenticated("token rejected"));
        }
        Ok(Response::new(TestAuthResponse {
            user_id: "github_1234".to_string(),
        }))
    }
}

#[tonic::async_trait]
impl PaperTrade for StubService {
    async fn portfolio(
        &self,
        request: Request<PortfolioRequest>,
    ) -> Result<Response<PortfolioResponse>, Status> {
        self.record("Portfolio", &request).await;
        Ok(Response::new(PortfolioResponse {
            cash_usd: Some(Amount::new(100_000, 0)),
            positions: vec![PortfolioPosition {
                ticker: Some(portfolio_position::Ticker {
                    ticker: "ETH".to_string(),
                }),
                amount: Some(Amount::new(1, 500_000_000)),
            }],
        }))
    }

    async fn trade(
        &self,
        request: Request<TradeRequest>,
    ) -> Result<Response<TradeResponse>, Status> {
        self.record("Trade", &request).await;
        let order = request.into_inner();
        self.recorded.lock().await.trades.push(order.clone());
        if self.behaviour.reject_trade {
            return Err(Status::invalid_argument("insufficient funds"));
        }
        // echo the order back at a fixed price
        Ok(Response::new(TradeResponse {
            t: None,
            action: order.action,
            ticker: order.ticker.map(|t| trade_response::Ticker { symbol: t.ticker }),
            quantity: order.quantity,
            executed_price: Some(Amount::new(50_000, 250_000_000)),
        }))
    }
}

type QuoteStream = Pin<Box<dyn Stream<Item = Result<Quote, Status>> + Send + 'static>>;

#[tonic::async_trait]
impl TickerInfo for StubService {
    type WatchStream = QuoteStream;

    async fn watch(
        &self,
        request: Request<QuoteTicker>,
    ) -> Result<Response<Self::WatchStream>, Status> {
        self.record("Watch", &request).await;
        self.recorded
            .lock()
            .await
            .watched
            .push(request.into_inner().ticker);

        let quotes: Vec<Result<Quote, Status>> = (0..self.behaviour.ticks)
            .map(|i| Ok(quote(i as i64)))
            .collect();
        let tail: Vec<Result<Quote, Status>> =
            self.behaviour.fail_stream_with.clone().map(Err).into_iter().collect();
        let output = stream::iter(quotes).chain(stream::iter(tail));

        let output: QuoteStream = if self.behaviour.hold_open {
            Box::pin(output.chain(stream::pending()))
        } else {
            Box::pin(output)
        };
        Ok(Response::new(output))
    }
}

pub fn quote(i: i64) -> Quote {
    Quote {
        t: Some(prost_types::Timestamp {
            seconds: 1_620_000_000 + i,
            nanos: 0,
        }),
        price: Some(Amount::new(50_000 + i, 0)),
    }
}

pub struct Stub {
    pub addr: SocketAddr,
    pub recorded: Arc<Mutex<Recorded>>,
    handle: tokio::task::JoinHandle<()>,
}

impl Stub {
    pub async fn start(behaviour: Behaviour) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let service = StubService {
            behaviour,
            recorded: Arc::clone(&recorded),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            Server::builder()
                .add_service(AccountServer::new(service.clone()))
                .add_service(PaperTradeServer::new(service.clone()))
                .add_service(TickerInfoServer::new(service))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });

        Self {
            addr,
            recorded,
            handle,
        }
    }

    pub fn client(&self) -> GrpcoinClient {
        client_for(&format!("http://{}", self.addr))
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.recorded.lock().await.calls.clone()
    }
}

impl Drop for Stub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn client_for(address: &str) -> GrpcoinClient {
    let config = Config::new(
        Token::new(TEST_TOKEN).unwrap(),
        Target::custom(address).unwrap(),
    );
    connect(&config).unwrap()
}
