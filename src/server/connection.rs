//! Per-client connection task
//!
//! Performs the WebSocket upgrade, then multiplexes two sources until the
//! client goes away: frames read from the socket (dispatched one at a time,
//! in arrival order) and frames queued for this client by the registry.
//! Every outbound frame, acknowledgments included, goes through that queue.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;

use crate::error::Result;
use crate::protocol::OutboundFrame;
use crate::session::Dispatcher;

use super::config::ServerConfig;

/// One accepted client
pub struct ClientConnection {
    socket: TcpStream,
    peer_addr: SocketAddr,
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl ClientConnection {
    /// Wrap an accepted socket
    pub fn new(
        socket: TcpStream,
        peer_addr: SocketAddr,
        config: ServerConfig,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            socket,
            peer_addr,
            config,
            dispatcher,
        }
    }

    /// Run the connection until the client disconnects
    ///
    /// Room cleanup runs on every exit path once the upgrade succeeded.
    pub async fn run(self) -> Result<()> {
        let ws_config = WebSocketConfig::default()
            .max_message_size(Some(self.config.max_message_size))
            .max_frame_size(Some(self.config.max_message_size));

        let ws = tokio_tungstenite::accept_async_with_config(self.socket, Some(ws_config)).await?;
        let (mut sink, mut source) = ws.split();

        let (ctx, mut outbound) = self.dispatcher.connect(self.peer_addr).await;

        let result = loop {
            tokio::select! {
                incoming = source.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        // Acks share the outbound queue so they stay behind
                        // events the same command produced
                        if let Some(reply) = self.dispatcher.handle_text(&ctx, text.as_str()).await {
                            self.dispatcher
                                .rooms()
                                .connections()
                                .send(ctx.connection_id, reply)
                                .await;
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::debug!(
                            connection = %ctx.connection_id,
                            len = data.len(),
                            "Ignoring binary frame"
                        );
                    }
                    Some(Ok(Message::Close(_))) | None => break Ok(()),
                    // Ping/pong replies are handled by tungstenite
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(e.into()),
                },
                frame = outbound.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = send_frame(&mut sink, &frame).await {
                            break Err(e);
                        }
                    }
                    // Registry dropped our queue (re-registered elsewhere)
                    None => break Ok(()),
                },
            }
        };

        self.dispatcher.disconnect(&ctx).await;
        let _ = sink.close().await;

        result
    }
}

async fn send_frame<S>(sink: &mut S, frame: &OutboundFrame) -> Result<()>
where
    S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = frame.to_json()?;
    sink.send(Message::text(text)).await?;
    Ok(())
}
