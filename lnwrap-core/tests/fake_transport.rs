use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use lnwrap_core::client::{StreamTransport, UnaryTransport, WireMessage};
use std::sync::{Arc, Mutex};
use tonic::Status;

/// Scripted transport standing in for a real channel. Every processed
/// request is recorded so tests can assert on the wire payload.
pub struct FakeTransport {
    pub unary_response: Option<Result<WireMessage, Status>>,
    pub stream_items: Vec<Result<WireMessage, Status>>,
    pub hang_after_items: bool,
    pub fail_subscribe: Option<Status>,
    pub requests: Arc<Mutex<Vec<WireMessage>>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            unary_response: None,
            stream_items: Vec::new(),
            hang_after_items: false,
            fail_subscribe: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeTransport {
    pub fn request_log(&self) -> Arc<Mutex<Vec<WireMessage>>> {
        Arc::clone(&self.requests)
    }
}

impl UnaryTransport for FakeTransport {
    fn call(
        &mut self,
        request: WireMessage,
    ) -> impl Future<Output = Result<WireMessage, Status>> + Send {
        self.requests.lock().unwrap().push(request);
        let response = self
            .unary_response
            .take()
            .unwrap_or_else(|| Err(Status::internal("no scripted response")));
        async move { response }
    }
}

impl StreamTransport for FakeTransport {
    type Stream = BoxStream<'static, Result<WireMessage, Status>>;

    fn subscribe(
        &mut self,
        request: WireMessage,
    ) -> impl Future<Output = Result<Self::Stream, Status>> + Send {
        self.requests.lock().unwrap().push(request);
        let result = match self.fail_subscribe.take() {
            Some(status) => Err(status),
            None => {
                let items = stream::iter(std::mem::take(&mut self.stream_items));
                if self.hang_after_items {
                    Ok(items.chain(stream::pending()).boxed())
                } else {
                    Ok(items.boxed())
                }
            }
        };
        async move { result }
    }
}
