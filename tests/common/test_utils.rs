use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use gaze_tracking_service::{
    config::ServerConfig,
    gaze::{GazeEstimator, GazeProcessor},
    server,
};
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::Value;
use std::{io::Cursor, net::SocketAddr, time::Duration};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Encode an image as a PNG data URI, the way a browser canvas would
pub fn data_uri(img: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> String {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode PNG");
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// A solid-color frame of the given size
pub fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> String {
    data_uri(&ImageBuffer::from_pixel(width, height, Rgb(rgb)))
}

/// A 200x200 face-less frame with a dark pupil in each default eye region,
/// at the same offset inside both regions
pub fn pupils_frame(rel_x: u32, rel_y: u32) -> String {
    let mut img = ImageBuffer::from_pixel(200, 200, Rgb([200u8, 200, 200]));
    for origin_x in [60, 110] {
        for y in 60 + rel_y..60 + rel_y + 6 {
            for x in origin_x + rel_x..origin_x + rel_x + 6 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }
    data_uri(&img)
}

pub fn frame_message(data: &str) -> String {
    serde_json::json!({ "type": "frame", "data": data }).to_string()
}

pub fn processor(estimator: impl GazeEstimator + 'static) -> GazeProcessor {
    GazeProcessor::new(Box::new(estimator))
}

/// Serve the full application on an ephemeral port
pub async fn spawn_server(processor: GazeProcessor) -> SocketAddr {
    let app = server::app(&ServerConfig::default(), processor).expect("Failed to build app");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    addr
}

pub async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws/gaze", addr))
        .await
        .expect("Failed to connect to WebSocket");
    client
}

pub async fn send_text(client: &mut Client, text: impl Into<String>) {
    client
        .send(Message::text(text.into()))
        .await
        .expect("Failed to send message");
}

/// Next text message parsed as JSON; panics on anything else
pub async fn recv_json(client: &mut Client) -> Value {
    let message = tokio::time::timeout(RECV_TIMEOUT, client.next())
        .await
        .expect("Timed out waiting for a message")
        .expect("Connection ended")
        .expect("WebSocket error");

    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).expect("Reply is not JSON"),
        other => panic!("Expected a text message, got {:?}", other),
    }
}

/// Whether the server ends the connection before sending any other message
pub async fn closed_by_server(client: &mut Client) -> bool {
    match tokio::time::timeout(RECV_TIMEOUT, client.next()).await {
        Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => true,
        Ok(Some(Ok(_))) | Err(_) => false,
    }
}
