use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::config::{ConfigError, Token};

pub const AUTHORIZATION: &str = "authorization";

/// Attaches `authorization: Bearer <token>` to every outgoing call.
///
/// Runs per call rather than as a static channel header, so swapping the
/// token source later does not touch the channel.
#[derive(Clone)]
pub struct BearerAuth {
    header: MetadataValue<Ascii>,
}

impl BearerAuth {
    pub fn new(token: &Token) -> Result<Self, ConfigError> {
        let header = format!("Bearer {}", token.expose())
            .parse()
            .map_err(|_| ConfigError::InvalidToken)?;
        Ok(Self { header })
    }
}

impl Interceptor for BearerAuth {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert(AUTHORIZATION, self.header.clone());
        Ok(request)
    }
}
