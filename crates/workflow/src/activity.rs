//! Units of work run by the orchestrator.

use async_trait::async_trait;
use gateway::{CallContext, GatewayError, MessageId, Timestamp};
use rpc::Invoker;
use wire::{business_error, WireRequest, WireResponse};

/// The smallest retryable step of a durable execution.
///
/// `execute` may run several times for one execution; `attempt` is 1-based.
/// Implementations must honour `ctx` (cancellation and deadline) and report
/// transient failures as [`GatewayError::Transport`] so they are retried.
#[async_trait]
pub trait Activity: Send + Sync + 'static {
    type Input: Clone + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    /// Stable name for logs.
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        ctx: &CallContext,
        attempt: u32,
        input: &Self::Input,
    ) -> Result<Self::Output, GatewayError>;
}

/// Sends a wire request through the [`Invoker`].
///
/// The first attempt sends the request as stamped. Every later attempt is a
/// new physical send and gets a fresh message id and timestamp; the
/// transaction id never changes. A response carrying an error block becomes
/// a [`GatewayError::Business`].
pub struct InvokeActivity<Req, Resp> {
    name: &'static str,
    invoker: Invoker<Req, Resp>,
}

impl<Req, Resp> InvokeActivity<Req, Resp> {
    pub fn new(name: &'static str, invoker: Invoker<Req, Resp>) -> Self {
        Self { name, invoker }
    }
}

#[async_trait]
impl<Req, Resp> Activity for InvokeActivity<Req, Resp>
where
    Req: WireRequest,
    Resp: WireResponse + Clone + Sync,
{
    type Input = Req;
    type Output = Resp;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(
        &self,
        ctx: &CallContext,
        attempt: u32,
        input: &Req,
    ) -> Result<Resp, GatewayError> {
        let mut request = input.clone();
        if attempt > 1 {
            request.restamp(&MessageId::generate(), Timestamp::now());
        }

        let response = self.invoker.invoke_attempt(ctx, attempt, request).await?;
        match business_error(&response) {
            Some(err) => Err(err),
            None => Ok(response),
        }
    }
}
