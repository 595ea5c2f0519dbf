//! Authenticated channel and a thin typed facade over the service stubs.

use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, info};
use tokio_util::sync::CancellationToken;
use tonic::codegen::InterceptedService;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::Status;
use url::Url;

use crate::auth::BearerAuth;
use crate::config::{Config, ConfigError};
use crate::proto::account_client::AccountClient;
use crate::proto::paper_trade_client::PaperTradeClient;
use crate::proto::ticker_info_client::TickerInfoClient;
use crate::proto::{
    PortfolioRequest, PortfolioResponse, QuoteTicker, TestAuthRequest, TestAuthResponse,
    TradeRequest, TradeResponse,
};
use crate::tick::Tick;

pub type AuthChannel = InterceptedService<Channel, BearerAuth>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot set up channel: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Builds the channel for `config` without dialing.
///
/// `https` endpoints get TLS with the platform roots; `http` is plaintext and
/// only meant for a server on the local machine. The first RPC opens the
/// connection, so unreachable servers surface as a `Status` there. Must be
/// called inside a tokio runtime.
pub fn connect(config: &Config) -> Result<GrpcoinClient, ClientError> {
    let url = config.target.url()?;
    let mut endpoint = Endpoint::from_shared(url.to_string())?;
    if let Some(domain) = tls_domain(&url)? {
        endpoint = endpoint.tls_config(ClientTlsConfig::new().domain_name(domain))?;
    }
    info!("using endpoint {url}");

    let auth = BearerAuth::new(&config.token)?;
    Ok(GrpcoinClient::new(endpoint.connect_lazy(), auth))
}

/// Server name to verify over TLS, or `None` for a plaintext endpoint.
pub fn tls_domain(url: &Url) -> Result<Option<String>, ConfigError> {
    if url.scheme() != "https" {
        return Ok(None);
    }
    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::MissingHost(url.to_string()))?;
    Ok(Some(host.to_string()))
}

/// One shared channel, one client per service. Cheap to clone.
#[derive(Clone)]
pub struct GrpcoinClient {
    account: AccountClient<AuthChannel>,
    paper_trade: PaperTradeClient<AuthChannel>,
    ticker_info: TickerInfoClient<AuthChannel>,
}

impl GrpcoinClient {
    pub fn new(channel: Channel, auth: BearerAuth) -> Self {
        Self {
            account: AccountClient::with_interceptor(channel.clone(), auth.clone()),
            paper_trade: PaperTradeClient::with_interceptor(channel.clone(), auth.clone()),
            ticker_info: TickerInfoClient::with_interceptor(channel, auth),
        }
    }

    pub async fn test_auth(&mut self) -> Result<TestAuthResponse, Status> {
        debug!("-> Account/TestAuth");
        let response = self.account.test_auth(TestAuthRequest {}).await?;
        Ok(response.into_inner())
    }

    pub async fn portfolio(&mut self) -> Result<PortfolioResponse, Status> {
        debug!("-> PaperTrade/Portfolio");
        let response = self.paper_trade.portfolio(PortfolioRequest {}).await?;
        Ok(response.into_inner())
    }

    pub async fn trade(&mut self, request: TradeRequest) -> Result<TradeResponse, Status> {
        debug!("-> PaperTrade/Trade {request:?}");
        let response = self.paper_trade.trade(request).await?;
        Ok(response.into_inner())
    }

    /// Opens a quote stream for `ticker`.
    ///
    /// The returned stream ends when the server closes it or `cancel` fires.
    /// It cannot be resumed; call `watch` again for a fresh subscription.
    pub async fn watch(
        &mut self,
        ticker: &str,
        cancel: CancellationToken,
    ) -> Result<BoxStream<'static, Result<Tick, Status>>, Status> {
        debug!("-> TickerInfo/Watch {ticker}");
        let request = QuoteTicker {
            ticker: ticker.to_string(),
        };
        let quotes = self.ticker_info.watch(request).await?.into_inner();
        Ok(quotes
            .map(|quote| quote.map(Tick::from))
            .take_until(cancel.cancelled_owned())
            .boxed())
    }
}
