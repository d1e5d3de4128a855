//! The network seam.
//!
//! A rejected fetch (offline, DNS failure, timeout, abort) is an `Err`. Any
//! response that arrived, whatever its status, is an `Ok`.

use async_trait::async_trait;

use crate::Error;
use crate::http::{Request, Response};

#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
