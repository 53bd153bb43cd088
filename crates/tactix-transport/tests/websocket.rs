//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener and a tokio-tungstenite client to
//! verify that frames, pongs, and close handshakes actually flow.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use tactix_transport::{
        Connection, Incoming, Transport, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on an ephemeral port and pairs one accepted connection
    /// with one connected client.
    async fn pair() -> (tactix_transport::WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap();

        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let (client, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect");

        (server.await.expect("accept task"), client)
    }

    #[tokio::test]
    async fn test_send_and_recv_round_trip() {
        let (conn, mut client) = pair().await;
        assert!(conn.id().into_inner() > 0);

        conn.send(b"hello from server").await.expect("send");
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"hello from server");

        client
            .send(Message::Binary(b"hello from client".to_vec().into()))
            .await
            .unwrap();
        let received = conn.recv().await.expect("recv").expect("data");
        assert_eq!(received, Incoming::Data(b"hello from client".to_vec()));
    }

    #[tokio::test]
    async fn test_text_frames_surface_as_data() {
        let (conn, mut client) = pair().await;
        client
            .send(Message::Text(r#"{"type":"JOIN_QUEUE"}"#.into()))
            .await
            .unwrap();
        let received = conn.recv().await.unwrap().unwrap();
        assert_eq!(
            received,
            Incoming::Data(br#"{"type":"JOIN_QUEUE"}"#.to_vec())
        );
    }

    #[tokio::test]
    async fn test_ping_elicits_pong_event() {
        let (conn, mut client) = pair().await;

        conn.ping().await.expect("ping");

        // The client library auto-answers the ping; pump its stream so
        // the pong is actually written back.
        tokio::spawn(async move { while client.next().await.is_some() {} });

        let received = conn.recv().await.unwrap().unwrap();
        assert_eq!(received, Incoming::Pong);
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (conn, mut client) = pair().await;
        client.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_send_works_while_recv_is_parked() {
        // The regression this guards: a recv() awaiting the peer must
        // not hold a lock that blocks send().
        let (conn, mut client) = pair().await;
        let conn = std::sync::Arc::new(conn);

        let reader = {
            let conn = std::sync::Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };

        // Give the reader time to park inside recv().
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            conn.send(b"unblocked"),
        )
        .await
        .expect("send must not be starved by a pending recv")
        .expect("send");

        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"unblocked");

        client.send(Message::Close(None)).await.unwrap();
        let _ = reader.await;
    }
}
