use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncBufReadExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

// Minimal interactive client for poking at a running relay server:
// prints the handshake, spawns a player, then forwards stdin lines as
// raw frames and echoes everything received.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:25565".to_string());

    println!("Connecting to {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    let (mut writer, mut reader) = ws_stream.split();

    // Handshake: assigned id, then the current player list
    for _ in 0..2 {
        if let Some(Ok(Message::Text(text))) = reader.next().await {
            println!("<< {}", text);
        }
    }

    writer
        .send(Message::Text(
            "spawn|test-player|Tester|0|0|0|0|0|0".into(),
        ))
        .await?;
    println!("Spawned as test-player. Type raw frames to send them, Ctrl+C to quit.");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            message = reader.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => println!("<< {}", text),
                    Some(Ok(Message::Close(_))) | None => {
                        println!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        eprintln!("Read error: {}", e);
                        break;
                    }
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) if !line.is_empty() => {
                        writer.send(Message::Text(line.into())).await?;
                    }
                    Some(_) => {}
                    None => break,
                }
            }
        }
    }

    Ok(())
}
