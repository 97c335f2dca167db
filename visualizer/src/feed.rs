use iced::futures::{SinkExt, Stream};
use iced::stream;
use log::warn;
use pathocore::client::RegistryClient;
use std::time::Duration;

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Where the live video comes from. Hashable so the subscription restarts
/// only when the source changes.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FeedSource {
    pub base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub enum FeedEvent {
    Connected,
    Frame(Vec<u8>),
    Lost(String),
}

/// Streams frames from the registry's `/stream` endpoint, reconnecting after
/// a delay whenever the connection drops.
pub fn connect(source: &FeedSource) -> impl Stream<Item = FeedEvent> {
    let source = source.clone();
    stream::channel(4, move |mut output: iced::futures::channel::mpsc::Sender<FeedEvent>| async move {
        loop {
            let client = match RegistryClient::new(
                &source.base_url,
                Duration::from_millis(source.timeout_ms),
            ) {
                Ok(client) => client,
                Err(err) => {
                    let _ = output.send(FeedEvent::Lost(err.to_string())).await;
                    return;
                }
            };

            let reason = match client.open_stream().await {
                Ok(mut frames) => {
                    if output.send(FeedEvent::Connected).await.is_err() {
                        return;
                    }
                    loop {
                        match frames.next_frame().await {
                            Ok(Some(frame)) => {
                                if output.send(FeedEvent::Frame(frame)).await.is_err() {
                                    return;
                                }
                            }
                            Ok(None) => break "stream closed".to_string(),
                            Err(err) => break err.to_string(),
                        }
                    }
                }
                Err(err) => err.to_string(),
            };

            warn!("video feed lost: {}", reason);
            if output.send(FeedEvent::Lost(reason)).await.is_err() {
                return;
            }
            tokio::time::sleep(RETRY_DELAY).await;
        }
    })
}
