use std::future::Future;

use russh::server::Msg;
use russh::{Channel, ChannelMsg};

use crate::error::SessionError;

/// The byte pipe the fake shell talks through.
///
/// Production sessions use the russh session channel; tests substitute a
/// scripted in-memory channel.
pub trait ShellChannel: Send {
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Next chunk from the client, or `None` once the channel is closed.
    fn receive(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, SessionError>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

impl ShellChannel for Channel<Msg> {
    async fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.data(data).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Vec<u8>>, SessionError> {
        loop {
            match self.wait().await {
                Some(ChannelMsg::Data { data }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => return Ok(None),
                // window adjustments, extended data, requests on an open shell
                Some(_) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Channel::<Msg>::close(self).await?;
        Ok(())
    }
}
